mod avatar;
mod page;

use axum::{routing::get, Router};
use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{storage::{ClientStorage, PROFILE_KEY}, threads::now_millis, AppResult, AppState};

pub use avatar::{generate_avatar, Avatar, PALETTE, UNKNOWN_COLOR};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page::profile))
}

const NICKNAMES: [&str; 17] = [
    "吉伊卡蛙", "哆啦J夢", "孫陸空", "炭治狼", "肝鐵人", "籠貓", "鎖龍",
    "奇芽", "謎豆子", "阿妮亞", "滷夫", "撕紙王", "辣布布", "史努嗶",
    "卡皮爸拉", "史笛奇", "鼻卡丘",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorProfile {
    pub nickname: String,
    pub avatar: Avatar,
    pub created_at: i64,
}

/// A roster name plus a two digit suffix. Suffixes containing a 4 are redrawn.
pub fn generate_nickname<R: Rng + ?Sized>(rng: &mut R) -> String {
    let base = NICKNAMES.choose(rng).copied().unwrap_or(NICKNAMES[0]);
    let suffix = loop {
        let n: u8 = rng.random_range(10..100);
        if !n.to_string().contains('4') {
            break n;
        }
    };
    format!("{base}{suffix:02}")
}

pub fn new_profile<R: Rng + ?Sized>(rng: &mut R) -> VisitorProfile {
    let nickname = generate_nickname(rng);
    let avatar = generate_avatar(Some(&nickname));
    VisitorProfile {
        nickname,
        avatar,
        created_at: now_millis(),
    }
}

/// The visitor's profile, created and stored the first time it is asked for.
pub async fn get_or_create_profile(storage: &ClientStorage) -> AppResult<VisitorProfile> {
    if let Some(profile) = storage.get_json::<VisitorProfile>(PROFILE_KEY).await? {
        return Ok(profile);
    }

    let profile = new_profile(&mut rand::rng());
    tracing::info!(client_id = storage.client_id(), nickname = %profile.nickname, "assigned nickname");
    storage.set_json(PROFILE_KEY, &profile).await?;
    Ok(profile)
}

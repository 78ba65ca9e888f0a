use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    storage::{ClientStorage, STATS_KEY, VISITS_KEY},
    threads::ThreadStore,
    AppResult,
};

pub const MIRROR_PATH: &str = "/api/save-stats";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStats {
    pub frames: u64,
    pub valid: u64,
    pub success: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub total_scans: u64,
    pub total_visits: u64,
    pub total_messages: u64,
    pub success_scans: u64,
    pub session_stats: SessionStats,
}

/// The subset kept under the stats key. Visits have a key of their own and
/// the message count always comes from the thread store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredStats<'a> {
    total_scans: u64,
    success_scans: u64,
    session_stats: &'a SessionStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredStats {
    #[serde(flatten)]
    pub stats: Stats,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBoard {
    pub frames: String,
    pub valid: String,
    pub valid_rate: String,
    pub success: String,
    pub success_rate: String,
    pub total_scans: String,
}

pub struct StatsRecorder {
    threads: ThreadStore,
    pub stats: Stats,
}

impl StatsRecorder {
    pub async fn load(threads: ThreadStore) -> AppResult<StatsRecorder> {
        let storage = threads.storage();
        let mut stats: Stats = storage.get_json(STATS_KEY).await?.unwrap_or_default();

        if let Some(visits) = storage.get_item(VISITS_KEY).await? {
            stats.total_visits = visits.trim().parse().unwrap_or(0);
        }
        stats.total_messages = threads.load_all().await.len() as u64;

        Ok(StatsRecorder { threads, stats })
    }

    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    fn storage(&self) -> &ClientStorage {
        self.threads.storage()
    }

    pub async fn save(&self) -> AppResult<()> {
        self.storage()
            .set_json(STATS_KEY, &StoredStats {
                total_scans: self.stats.total_scans,
                success_scans: self.stats.success_scans,
                session_stats: &self.stats.session_stats,
            })
            .await?;
        self.storage()
            .set_item(VISITS_KEY, &self.stats.total_visits.to_string())
            .await?;

        let _ = self.threads.mirror().post_json(MIRROR_PATH, &self.mirrored());
        Ok(())
    }

    pub fn mirrored(&self) -> MirroredStats {
        MirroredStats {
            stats: self.stats.clone(),
            last_updated: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        }
    }

    pub async fn increment_visit(&mut self) -> AppResult<()> {
        self.stats.total_visits += 1;
        self.save().await
    }

    pub async fn increment_scan(&mut self) -> AppResult<()> {
        self.stats.total_scans += 1;
        self.save().await
    }

    /// A successful scan is also a scan.
    pub async fn increment_success(&mut self) -> AppResult<()> {
        self.stats.success_scans += 1;
        self.increment_scan().await
    }

    pub async fn update_session(&mut self, session_stats: SessionStats) -> AppResult<()> {
        self.stats.session_stats = session_stats;
        self.save().await
    }

    pub async fn update_message_count(&mut self) -> AppResult<()> {
        self.stats.total_messages = self.threads.load_all().await.len() as u64;
        self.save().await
    }

    pub fn status_board(&self) -> StatusBoard {
        let SessionStats { frames, valid, success } = self.stats.session_stats;
        StatusBoard {
            frames: format_number(frames),
            valid: format_number(valid),
            valid_rate: percent(valid, frames),
            success: format_number(success),
            success_rate: percent(success, valid),
            total_scans: format_number(self.stats.total_scans),
        }
    }
}

pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "0.0".to_owned();
    }
    format!("{:.1}", part as f64 / whole as f64 * 100.0)
}

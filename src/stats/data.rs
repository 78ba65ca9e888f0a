use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    guestbook::Confirmation,
    profiles::VisitorProfile,
    storage::{ALL_KEYS, MESSAGES_KEY, PROFILE_KEY},
    threads::Message,
    AppResult, ValidationError,
};

use super::{Stats, StatsRecorder};

pub const EXPORT_VERSION: &str = "1.0";

/// Everything a visitor has stored, as one downloadable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub user_profile: Option<VisitorProfile>,
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

pub async fn export(recorder: &StatsRecorder) -> AppResult<ExportBundle> {
    let storage = recorder.threads().storage();
    let export_date = OffsetDateTime::now_utc().format(&Rfc3339)?;

    Ok(ExportBundle {
        stats: Some(recorder.stats.clone()),
        messages: Some(recorder.threads().load_all().await),
        user_profile: storage.get_json(PROFILE_KEY).await?,
        export_date: Some(export_date),
        version: Some(EXPORT_VERSION.to_owned()),
    })
}

/// Overwrites stats, messages and profile with the bundle's. Returns
/// `Ok(false)` when the visitor did not confirm.
pub async fn import(
    recorder: &mut StatsRecorder,
    bundle: ExportBundle,
    confirmation: Confirmation,
) -> AppResult<Result<bool, ValidationError>> {
    let (Some(_), Some(stats)) = (&bundle.version, bundle.stats) else {
        return Ok(Err(ValidationError::UnrecognisedExport));
    };
    if confirmation == Confirmation::Declined {
        return Ok(Ok(false));
    }

    let storage = recorder.threads().storage().clone();
    recorder.stats = stats;
    if let Some(messages) = &bundle.messages {
        storage.set_json(MESSAGES_KEY, messages).await?;
    }
    if let Some(profile) = &bundle.user_profile {
        storage.set_json(PROFILE_KEY, profile).await?;
    }
    recorder.update_message_count().await?;

    tracing::info!(client_id = storage.client_id(), "data imported");
    Ok(Ok(true))
}

/// Wipes every stored key. Needs two separate confirmations; the current
/// visit is counted again afterwards.
pub async fn reset_all(
    recorder: &mut StatsRecorder,
    first: Confirmation,
    second: Confirmation,
) -> AppResult<bool> {
    if first == Confirmation::Declined || second == Confirmation::Declined {
        return Ok(false);
    }

    let storage = recorder.threads().storage().clone();
    for key in ALL_KEYS {
        storage.remove_item(key).await?;
    }

    recorder.stats = Stats {
        total_visits: 1,
        ..Stats::default()
    };
    recorder.save().await?;

    tracing::info!(client_id = storage.client_id(), "all data reset");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        storage::ClientStorage,
        threads::{Mirror, ThreadStore},
    };

    async fn recorder(client_id: &str, db_pool: sqlx::SqlitePool) -> StatsRecorder {
        let threads = ThreadStore::new(ClientStorage::new(db_pool, client_id), Mirror::disabled());
        StatsRecorder::load(threads).await.unwrap()
    }

    #[tokio::test]
    async fn export_then_import_moves_everything() {
        let db_pool = db::connect_in_memory().await.unwrap();
        let mut source = recorder("source", db_pool.clone()).await;
        source
            .threads()
            .append(Message::new(1, "A".into(), "hello".into(), "t".into()))
            .await
            .unwrap();
        source.increment_scan().await.unwrap();
        crate::profiles::get_or_create_profile(source.threads().storage()).await.unwrap();

        let bundle = export(&source).await.unwrap();
        assert_eq!(bundle.version.as_deref(), Some("1.0"));

        let mut target = recorder("target", db_pool).await;
        let imported = import(&mut target, bundle.clone(), Confirmation::Confirmed).await.unwrap();
        assert_eq!(imported, Ok(true));
        assert_eq!(target.stats.total_scans, 1);
        assert_eq!(target.stats.total_messages, 1);
        assert_eq!(target.threads().load_all().await, bundle.messages.unwrap());

        let profile: Option<VisitorProfile> = target.threads().storage().get_json(PROFILE_KEY).await.unwrap();
        assert_eq!(profile, bundle.user_profile);
    }

    #[tokio::test]
    async fn import_rejects_foreign_documents() {
        let db_pool = db::connect_in_memory().await.unwrap();
        let mut rec = recorder("c", db_pool).await;
        let bundle: ExportBundle = serde_json::from_str(r#"{"messages":[]}"#).unwrap();

        let result = import(&mut rec, bundle, Confirmation::Confirmed).await.unwrap();
        assert_eq!(result, Err(ValidationError::UnrecognisedExport));
    }

    #[tokio::test]
    async fn import_without_confirmation_keeps_data() {
        let db_pool = db::connect_in_memory().await.unwrap();
        let mut rec = recorder("c", db_pool).await;
        rec.increment_visit().await.unwrap();

        let mut bundle = export(&rec).await.unwrap();
        bundle.stats = Some(Stats::default());
        assert_eq!(import(&mut rec, bundle, Confirmation::Declined).await.unwrap(), Ok(false));
        assert_eq!(rec.stats.total_visits, 1);
    }

    #[tokio::test]
    async fn reset_wants_both_confirmations() {
        let db_pool = db::connect_in_memory().await.unwrap();
        let mut rec = recorder("c", db_pool).await;
        rec.threads()
            .append(Message::new(1, "A".into(), "hello".into(), "t".into()))
            .await
            .unwrap();
        rec.increment_visit().await.unwrap();
        rec.increment_visit().await.unwrap();

        assert!(!reset_all(&mut rec, Confirmation::Confirmed, Confirmation::Declined).await.unwrap());
        assert_eq!(rec.threads().load_all().await.len(), 1);

        assert!(reset_all(&mut rec, Confirmation::Confirmed, Confirmation::Confirmed).await.unwrap());
        assert!(rec.threads().load_all().await.is_empty());
        assert_eq!(rec.stats.total_visits, 1);

        let reloaded = StatsRecorder::load(rec.threads().clone()).await.unwrap();
        assert_eq!(reloaded.stats.total_visits, 1);
        assert_eq!(reloaded.stats.total_scans, 0);
    }
}

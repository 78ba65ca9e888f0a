use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::AppResult;

/// Reads a JSON file, treating a missing or unparseable file as `T::default()`.
pub(crate) async fn read_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(err) => {
            tracing::debug!(path = %path.display(), "no readable data file, using empty: {err}");
            return T::default();
        }
    };

    serde_json::from_slice(&data).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), "could not parse data file: {err}");
        T::default()
    })
}

pub(crate) async fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(value)?).await?;
    Ok(())
}

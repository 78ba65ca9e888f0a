use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use time::UtcOffset;

use crate::AppResult;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Where mirror writes go. `None` turns mirroring off.
    pub mirror_base_url: Option<String>,
    pub data_dir: PathBuf,
    pub display_offset: UtcOffset,
    pub session_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://planet.db?mode=rwc".to_owned(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            mirror_base_url: None,
            data_dir: PathBuf::from("data"),
            display_offset: UtcOffset::from_hms(8, 0, 0).unwrap_or(UtcOffset::UTC),
            session_days: 30,
        }
    }
}

impl Config {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env() -> AppResult<Config> {
        dotenv::dotenv().ok();
        Config::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Config> {
        let mut config = Config::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", &addr)?;
        }
        config.mirror_base_url = lookup("MIRROR_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty());
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(hours) = lookup("DISPLAY_UTC_OFFSET") {
            let hours: i8 = parse("DISPLAY_UTC_OFFSET", &hours)?;
            config.display_offset = UtcOffset::from_hms(hours, 0, 0)
                .context("DISPLAY_UTC_OFFSET out of range")?;
        }
        if let Some(days) = lookup("SESSION_DAYS") {
            config.session_days = parse("SESSION_DAYS", &days)?;
            if config.session_days <= 0 {
                return Err(anyhow!("SESSION_DAYS must be positive").into());
            }
        }

        Ok(config)
    }

    pub fn messages_file(&self) -> PathBuf {
        self.data_dir.join("messages.json")
    }

    pub fn mirror_file(&self) -> PathBuf {
        self.data_dir.join("mirror.json")
    }

    pub fn stats_file(&self) -> PathBuf {
        self.data_dir.join("stats.json")
    }
}

fn parse<T>(key: &str, value: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(value.trim().parse().with_context(|| format!("invalid {key}: {value:?}"))?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_with(pairs: &[(&str, &str)]) -> AppResult<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.mirror_base_url.is_none());
        assert_eq!(config.display_offset.whole_hours(), 8);
        assert_eq!(config.messages_file(), PathBuf::from("data/messages.json"));
    }

    #[test]
    fn mirror_url_loses_trailing_slash() {
        let config = config_with(&[("MIRROR_BASE_URL", "http://localhost:3000/")]).unwrap();
        assert_eq!(config.mirror_base_url.as_deref(), Some("http://localhost:3000"));

        let config = config_with(&[("MIRROR_BASE_URL", "  ")]).unwrap();
        assert!(config.mirror_base_url.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_with(&[("BIND_ADDR", "not an addr")]).is_err());
        assert!(config_with(&[("DISPLAY_UTC_OFFSET", "99")]).is_err());
        assert!(config_with(&[("SESSION_DAYS", "0")]).is_err());
    }
}

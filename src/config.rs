// src/config.rs
//
// Runtime configuration read from the environment, with an optional
// `.env` file loaded first. Every setting has a default except the bot
// token, which is only required by commands that publish.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::db::get_database_path;
use crate::error::{AppError, AppResult};
use crate::integrations::animefire::client::{DEFAULT_CATALOG_URL, DEFAULT_DOWNLOAD_HOST};
use crate::integrations::jikan::client::DEFAULT_METADATA_URL;
use crate::services::{ChannelSpec, HARD_EXTRACT_LIMIT};

pub const DEFAULT_PLATFORM: &str = "telegram";
pub const DEFAULT_CHAT_NAME: &str = "animestele";
pub const DEFAULT_CHAT_ID: i64 = -1002039517569;
pub const DEFAULT_CHAT_DESCRIPTION: &str = "Novos episódios de anime assim que saem";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub catalog_url: String,
    pub download_host: String,
    pub metadata_url: String,
    pub include_dubbed: bool,
    pub extract_limit: usize,
    pub start_page: u32,
    pub max_episode_scan: u32,
    pub http_timeout: Duration,
    pub publish_retry_delay: Duration,
    pub telegram_token: Option<String>,
    pub platform: String,
    pub channel: ChannelSpec,
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> AppResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(dotenvy::Error::Io(_)) => {}
            Err(err) => return Err(AppError::Config(format!(".env: {}", err))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_path = match var("ANIMESTELE_DATABASE_PATH") {
            Some(path) => PathBuf::from(path),
            None => get_database_path()?,
        };

        let extract_limit: usize = parse_or(&var, "ANIMESTELE_EXTRACT_LIMIT", HARD_EXTRACT_LIMIT)?;
        if extract_limit > HARD_EXTRACT_LIMIT {
            log::warn!(
                "ANIMESTELE_EXTRACT_LIMIT={} exceeds the hard limit, using {}",
                extract_limit,
                HARD_EXTRACT_LIMIT
            );
        }

        Ok(Self {
            database_path,
            catalog_url: var("ANIMESTELE_CATALOG_URL")
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            download_host: var("ANIMESTELE_DOWNLOAD_HOST")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_HOST.to_string()),
            metadata_url: var("ANIMESTELE_METADATA_URL")
                .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string()),
            include_dubbed: parse_bool(&var, "ANIMESTELE_INCLUDE_DUBBED", false)?,
            extract_limit: extract_limit.min(HARD_EXTRACT_LIMIT),
            start_page: parse_or(&var, "ANIMESTELE_START_PAGE", 1)?,
            max_episode_scan: parse_or(&var, "ANIMESTELE_MAX_EPISODE_SCAN", 1000)?,
            http_timeout: Duration::from_secs(parse_or(&var, "ANIMESTELE_HTTP_TIMEOUT_SECS", 30)?),
            publish_retry_delay: Duration::from_millis(parse_or(
                &var,
                "ANIMESTELE_PUBLISH_RETRY_DELAY_MS",
                3000,
            )?),
            telegram_token: var("TELEGRAM_BOT_TOKEN"),
            platform: var("ANIMESTELE_PLATFORM").unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
            channel: ChannelSpec {
                chat_name: Some(
                    var("ANIMESTELE_CHAT_NAME").unwrap_or_else(|| DEFAULT_CHAT_NAME.to_string()),
                ),
                chat_id: Some(parse_or(&var, "ANIMESTELE_CHAT_ID", DEFAULT_CHAT_ID)?),
                description: Some(
                    var("ANIMESTELE_CHAT_DESCRIPTION")
                        .unwrap_or_else(|| DEFAULT_CHAT_DESCRIPTION.to_string()),
                ),
            },
        })
    }

    pub fn require_telegram_token(&self) -> AppResult<&str> {
        self.telegram_token
            .as_deref()
            .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{}='{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool<V>(var: &V, key: &str, default: bool) -> AppResult<bool>
where
    V: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(AppError::Config(format!("{}='{}' is not a boolean", key, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> AppResult<Config> {
        let mut map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry("ANIMESTELE_DATABASE_PATH".to_string())
            .or_insert_with(|| "/tmp/animestele-test.db".to_string());
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();

        assert_eq!(config.catalog_url, "https://animefire.plus");
        assert_eq!(config.download_host, "https://s2.lightspeedst.net/s2/");
        assert_eq!(config.metadata_url, "https://api.jikan.moe/v4");
        assert!(!config.include_dubbed);
        assert_eq!(config.extract_limit, 100);
        assert_eq!(config.start_page, 1);
        assert_eq!(config.max_episode_scan, 1000);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.publish_retry_delay, Duration::from_millis(3000));
        assert_eq!(config.platform, "telegram");
        assert_eq!(config.channel.chat_name.as_deref(), Some("animestele"));
        assert_eq!(config.channel.chat_id, Some(-1002039517569));
        assert!(config.telegram_token.is_none());
        assert!(config.require_telegram_token().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("ANIMESTELE_INCLUDE_DUBBED", "yes"),
            ("ANIMESTELE_START_PAGE", "3"),
            ("ANIMESTELE_CHAT_ID", "-42"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("ANIMESTELE_CATALOG_URL", "https://catalog.test"),
        ])
        .unwrap();

        assert!(config.include_dubbed);
        assert_eq!(config.start_page, 3);
        assert_eq!(config.channel.chat_id, Some(-42));
        assert_eq!(config.require_telegram_token().unwrap(), "123:abc");
        assert_eq!(config.catalog_url, "https://catalog.test");
        assert_eq!(config.database_path, PathBuf::from("/tmp/animestele-test.db"));
    }

    #[test]
    fn test_extract_limit_is_capped() {
        let config = config_with(&[("ANIMESTELE_EXTRACT_LIMIT", "500")]).unwrap();
        assert_eq!(config.extract_limit, HARD_EXTRACT_LIMIT);
    }

    #[test]
    fn test_unparsable_values_name_the_variable() {
        let err = config_with(&[("ANIMESTELE_START_PAGE", "first")]).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("ANIMESTELE_START_PAGE")));

        let err = config_with(&[("ANIMESTELE_INCLUDE_DUBBED", "maybe")]).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("ANIMESTELE_INCLUDE_DUBBED")));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_with(&[("ANIMESTELE_PLATFORM", "   ")]).unwrap();
        assert_eq!(config.platform, "telegram");
    }
}

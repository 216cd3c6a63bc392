use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use dirs::home_dir;
use tracing::{info, warn};

use crate::error::{Result, YatraError};

const DEFAULT_TIMEOUT_SECS: &str = "10";

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub anon_key: String,
    pub service_role_key: Option<String>,
    pub http_timeout: Duration,
    pub db_path: PathBuf,
}

impl Config {
    /// Reads the portal settings from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = required(&lookup, "SUPABASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let anon_key = required(&lookup, "SUPABASE_ANON_KEY")?;
        let service_role_key = lookup("SUPABASE_SERVICE_ROLE_KEY").filter(|k| !k.is_empty());
        if service_role_key.is_none() {
            warn!(
                "SUPABASE_SERVICE_ROLE_KEY not set, fetch functions and wishlists are unavailable"
            );
        }
        let timeout_secs: u64 = try_load(&lookup, "YATRA_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let db_path = db_path_from(&lookup)?;

        Ok(Self {
            supabase_url,
            anon_key,
            service_role_key,
            http_timeout: Duration::from_secs(timeout_secs),
            db_path,
        })
    }
}

/// Location of the offline store. Needs no backend settings.
pub fn db_path() -> Result<PathBuf> {
    db_path_from(&|key: &str| env::var(key).ok())
}

fn db_path_from<F>(lookup: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("YATRA_DB_PATH").filter(|p| !p.is_empty()) {
        Some(path) => Ok(PathBuf::from(path)),
        None => home_dir()
            .map(|home| home.join(".yatra.db3"))
            .ok_or_else(|| {
                YatraError::ConfigError("could not determine home directory".to_string())
            }),
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| YatraError::ConfigError(format!("{key} is not set")))
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| YatraError::ConfigError(format!("invalid {key} value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_required_and_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("YATRA_DB_PATH", "/tmp/yatra-test.db3"),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.service_role_key, None);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.db_path, PathBuf::from("/tmp/yatra-test.db3"));
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let err = Config::from_lookup(lookup_from(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
        assert!(matches!(err, YatraError::ConfigError(msg) if msg.contains("SUPABASE_URL")));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("YATRA_HTTP_TIMEOUT_SECS", "soon"),
            ("YATRA_DB_PATH", "/tmp/yatra-test.db3"),
        ]))
        .unwrap_err();
        assert!(matches!(err, YatraError::ConfigError(_)));
    }
}

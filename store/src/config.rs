use crate::retry::DEFAULT_ATTEMPTS;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum BackendConfig {
    Memory,
    Redis {
        host: String,
        port: u16,
        #[serde(default)]
        db: i64,
        password: Option<String>,
    },
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum CacheConfig {
    /// Entries live in this process and expire passively.
    #[default]
    InProcess,
    /// Entries live in the backend under `prefix` and use its native TTL.
    Backend { prefix: String },
}

fn default_timeout_secs() -> u64 {
    3
}

fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    pub backend: BackendConfig,
    /// Bounds every backend command and is also the pause before a reconnect.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendConfig::Memory,
            timeout_secs: default_timeout_secs(),
            attempts: default_attempts(),
            cache: CacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_with_defaults() {
        let yaml = r#"
backend:
    type: redis
    host: 127.0.0.1
    port: 6379
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Redis {
                host: "127.0.0.1".into(),
                port: 6379,
                db: 0,
                password: None,
            }
        );
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.attempts, 5);
        assert_eq!(config.cache, CacheConfig::InProcess);
    }

    #[test]
    fn test_backend_cache() {
        let yaml = r#"
backend:
    type: memory
attempts: 2
cache:
    type: backend
    prefix: "cache:"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend, BackendConfig::Memory);
        assert_eq!(config.attempts, 2);
        assert_eq!(
            config.cache,
            CacheConfig::Backend {
                prefix: "cache:".into()
            }
        );
    }
}

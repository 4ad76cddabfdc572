//! Configuration loaded from the environment.

use crate::auth::tokens::parse_expiry;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEV_ACCESS_SECRET: &str = "dev-access-secret";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} env var required")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo { uri: String, database: String },
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaBackend {
    Cloudinary(CloudinaryConfig),
    /// Files kept under `<upload_dir>/media` and served by this process.
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
    pub store: StoreBackend,
    pub media: MediaBackend,
    pub tokens: TokenConfig,
    /// Root for staged uploads (`temp/`) and locally stored media (`media/`)
    pub upload_dir: PathBuf,
    /// Base URL under which local media is reachable
    pub public_url: String,
    /// Body limit for JSON and form requests, in bytes
    pub json_limit: usize,
    /// Whether session cookies carry the `Secure` flag
    pub secure_cookies: bool,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let addr = var("ADDR", "127.0.0.1");
        let port = var("PORT", "8000");

        let store = match var("STORE", "mongo").as_str() {
            "mongo" => StoreBackend::Mongo {
                uri: var("MONGODB_URI", "mongodb://127.0.0.1:27017"),
                database: var("DB_NAME", "vidtube"),
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE",
                    value: other.to_string(),
                    reason: "expected mongo or memory".into(),
                })
            }
        };

        // Persistent deployments must bring their own secrets.
        let secret = |key: &'static str, dev: &str| match (get(key), &store) {
            (Some(value), _) => Ok(value),
            (None, StoreBackend::Memory) => Ok(dev.to_string()),
            (None, StoreBackend::Mongo { .. }) => Err(ConfigError::Missing(key)),
        };
        let ttl = |key: &'static str, default: &str| {
            let raw = var(key, default);
            parse_expiry(&raw).map_err(|e| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
        };

        let tokens = TokenConfig {
            access_secret: secret("ACCESS_TOKEN_SECRET", DEV_ACCESS_SECRET)?,
            access_ttl: ttl("ACCESS_TOKEN_EXPIRY", "12h")?,
            refresh_secret: secret("REFRESH_TOKEN_SECRET", DEV_REFRESH_SECRET)?,
            refresh_ttl: ttl("REFRESH_TOKEN_EXPIRY", "20d")?,
        };

        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let media = match var("MEDIA", "local").as_str() {
            "cloudinary" => MediaBackend::Cloudinary(CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
            }),
            "local" => MediaBackend::Local,
            other => {
                return Err(ConfigError::Invalid {
                    key: "MEDIA",
                    value: other.to_string(),
                    reason: "expected cloudinary or local".into(),
                })
            }
        };

        let json_limit_raw = var("JSON_LIMIT", "16384");
        let json_limit = json_limit_raw
            .parse::<usize>()
            .map_err(|e| ConfigError::Invalid {
                key: "JSON_LIMIT",
                value: json_limit_raw.clone(),
                reason: e.to_string(),
            })?;

        let public_url = get("PUBLIC_URL").unwrap_or_else(|| format!("http://{}:{}", addr, port));

        Ok(Self {
            cors_origin: var("CORS_ORIGIN", "*"),
            store,
            media,
            tokens,
            upload_dir: PathBuf::from(var("UPLOAD_DIR", "./public")),
            public_url: public_url.trim_end_matches('/').to_string(),
            json_limit,
            secure_cookies: var("SECURE_COOKIES", "true") != "false",
            addr,
            port,
        })
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.upload_dir.join("temp")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.upload_dir.join("media")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_memory_store_runs_on_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("STORE", "memory")])).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.media, MediaBackend::Local);
        assert_eq!(config.tokens.access_ttl, Duration::from_secs(12 * 3600));
        assert_eq!(config.public_url, "http://127.0.0.1:8000");
        assert_eq!(config.temp_dir(), PathBuf::from("./public/temp"));
    }

    #[test]
    fn test_mongo_store_requires_secrets() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ACCESS_TOKEN_SECRET")));
    }

    #[test]
    fn test_cloudinary_requires_credentials() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORE", "memory"),
            ("MEDIA", "cloudinary"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLOUDINARY_API_KEY")));
    }

    #[test]
    fn test_bad_expiry_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORE", "memory"),
            ("REFRESH_TOKEN_EXPIRY", "forever"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "REFRESH_TOKEN_EXPIRY",
                ..
            }
        ));
    }

    #[test]
    fn test_full_mongo_configuration() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://db:27017"),
            ("DB_NAME", "tube"),
            ("ACCESS_TOKEN_SECRET", "a"),
            ("REFRESH_TOKEN_SECRET", "r"),
            ("PUBLIC_URL", "https://tube.example/"),
        ]))
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Mongo {
                uri: "mongodb://db:27017".into(),
                database: "tube".into()
            }
        );
        assert_eq!(config.public_url, "https://tube.example");
    }
}

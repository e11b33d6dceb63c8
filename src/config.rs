use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of rendered pages kept at once.
    pub capacity: usize,
    /// Lifetime of a cached page, in seconds.
    pub page_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Where anonymous callers are sent for protected actions.
    pub login_url: String,
    /// Request header carrying the authenticated username.
    pub identity_header: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/postboard.db".to_string()),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            cache: CacheConfig {
                capacity: env::var("CACHE_CAPACITY")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .unwrap_or(1000),
                page_ttl_secs: env::var("PAGE_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
            },
            media: MediaConfig {
                root: PathBuf::from(env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string())),
            },
            auth: AuthConfig {
                login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/".to_string()),
                identity_header: env::var("IDENTITY_HEADER")
                    .unwrap_or_else(|_| "x-remote-user".to_string())
                    .to_ascii_lowercase(),
            },
        })
    }

    /// In-memory database, media under the given directory.
    pub fn for_tests(media_root: impl Into<PathBuf>) -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            cache: CacheConfig {
                capacity: 100,
                page_ttl_secs: 20,
            },
            media: MediaConfig {
                root: media_root.into(),
            },
            auth: AuthConfig {
                login_url: "/".to_string(),
                identity_header: "x-remote-user".to_string(),
            },
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn page_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.page_ttl_secs)
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub stories: StoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub max_retries: u32,
    pub dispatch_interval_secs: u64,
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    pub ttl_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/feedsync.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            remote: RemoteConfig {
                base_url: "http://localhost:8080/api".to_string(),
                connect_timeout_secs: 10,
                request_timeout_secs: 30,
                access_token: None,
            },
            sync: SyncConfig {
                max_retries: 3,
                dispatch_interval_secs: 300, // 5 minutes
                run_on_startup: true,
            },
            stories: StoryConfig { ttl_hours: 24 },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FEEDSYNC_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.database.url = trimmed.to_string();
            }
        }
        if let Some(value) = env_parse::<u32>("FEEDSYNC_DATABASE_MAX_CONNECTIONS") {
            cfg.database.max_connections = value.max(1);
        }

        if let Ok(v) = std::env::var("FEEDSYNC_API_BASE_URL") {
            let trimmed = v.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                cfg.remote.base_url = trimmed.to_string();
            }
        }
        if let Some(value) = env_parse::<u64>("FEEDSYNC_CONNECT_TIMEOUT_SECS") {
            cfg.remote.connect_timeout_secs = value.max(1);
        }
        if let Some(value) = env_parse::<u64>("FEEDSYNC_REQUEST_TIMEOUT_SECS") {
            cfg.remote.request_timeout_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("FEEDSYNC_ACCESS_TOKEN") {
            let trimmed = v.trim();
            cfg.remote.access_token = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }

        if let Some(value) = env_parse::<u32>("FEEDSYNC_MAX_RETRIES") {
            cfg.sync.max_retries = value;
        }
        if let Some(value) = env_parse::<u64>("FEEDSYNC_DISPATCH_INTERVAL_SECS") {
            cfg.sync.dispatch_interval_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("FEEDSYNC_RUN_ON_STARTUP") {
            cfg.sync.run_on_startup = parse_bool(&v, cfg.sync.run_on_startup);
        }

        if let Some(value) = env_parse::<i64>("FEEDSYNC_STORY_TTL_HOURS") {
            cfg.stories.ttl_hours = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.remote.base_url.trim().is_empty() {
            return Err("Remote base_url must not be empty".to_string());
        }
        if self.remote.request_timeout_secs == 0 {
            return Err("Remote request_timeout_secs must be greater than 0".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.stories.ttl_hours <= 0 {
            return Err("Story ttl_hours must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn story_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stories.ttl_hours)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

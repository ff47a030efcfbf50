mod env;

pub const ENDPOINT_ENV: &str = "JOTSYNC_ENDPOINT";
pub const API_KEY_ENV: &str = "JOTSYNC_API_KEY";
pub const USER_ID_ENV: &str = "JOTSYNC_USER_ID";
pub const SOURCE_ENV: &str = "JOTSYNC_SOURCE";
pub const TIMEOUT_MS_ENV: &str = "JOTSYNC_TIMEOUT_MS";
pub const MAX_RETRIES_ENV: &str = "JOTSYNC_MAX_RETRIES";
pub const FLUSH_INTERVAL_SECS_ENV: &str = "JOTSYNC_FLUSH_INTERVAL_SECS";
pub const REQUEST_LOG_ENV: &str = "JOTSYNC_REQUEST_LOG";

/// Runtime knobs for the sync core. Everything has a sane default so a bare
/// `SyncConfig::default()` works for embedded/test use; production clients
/// read the `JOTSYNC_*` environment.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub user_id: String,
    pub source: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub flush_interval_secs: u64,
    pub request_log: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            user_id: "local".to_string(),
            source: "app".to_string(),
            timeout_ms: 2000,
            max_retries: 5,
            flush_interval_secs: 30,
            request_log: true,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::read_non_empty_env(ENDPOINT_ENV),
            api_key: env::read_non_empty_env(API_KEY_ENV),
            user_id: env::read_non_empty_env(USER_ID_ENV).unwrap_or(defaults.user_id),
            source: env::read_non_empty_env(SOURCE_ENV).unwrap_or(defaults.source),
            timeout_ms: env::read_env_u64(TIMEOUT_MS_ENV, defaults.timeout_ms, 1),
            max_retries: env::read_env_u32(MAX_RETRIES_ENV, defaults.max_retries, 1),
            flush_interval_secs: env::read_env_u64(
                FLUSH_INTERVAL_SECS_ENV,
                defaults.flush_interval_secs,
                1,
            ),
            request_log: env::parse_enabled_default_true(
                std::env::var(REQUEST_LOG_ENV).ok().as_deref(),
            ),
        }
    }
}

//! Application configuration. Backend endpoint, identity, offline switch.

use serde::Deserialize;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:6969";
pub const DEFAULT_USERNAME: &str = "User";
pub const DEFAULT_OWNER_NAMES: &str = "you";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Analysis backend root. Read from WA_INSIGHT_BACKEND_URL.
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Name sent with uploads. Read from WA_INSIGHT_USERNAME.
    #[serde(default)]
    pub username: Option<String>,

    /// Comma-separated sender names treated as "me" when parsing locally. Read from WA_INSIGHT_OWNER_NAMES.
    #[serde(default)]
    pub owner_names: Option<String>,

    /// Parse exports locally and answer with the local analyzer only. Read from WA_INSIGHT_OFFLINE.
    #[serde(default)]
    pub offline: Option<bool>,

    /// HTTP timeout for backend requests. Read from WA_INSIGHT_REQUEST_TIMEOUT_SECS.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("WA_INSIGHT_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        // Environment wins over the config file.
        c = c.add_source(config::Environment::with_prefix("WA_INSIGHT"));
        c.build()?.try_deserialize()
    }

    /// Returns the backend URL. Defaults to the local development server.
    pub fn backend_url_or_default(&self) -> String {
        self.backend_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn username_or_default(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }

    /// Owner names, trimmed, empty items dropped. Defaults to `you`.
    pub fn owner_names(&self) -> Vec<String> {
        let names: Vec<String> = self
            .owner_names
            .as_deref()
            .unwrap_or(DEFAULT_OWNER_NAMES)
            .split(',')
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            vec![DEFAULT_OWNER_NAMES.to_string()]
        } else {
            names
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    /// Returns request timeout in seconds. Defaults to 60 if unset or zero.
    pub fn request_timeout_secs_or_default(&self) -> u64 {
        self.request_timeout_secs
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

use crate::core::config::data::Config;
use crate::core::constants::DEFAULT_BASE_URL;

/// Keys accepted by `ragchat set` / `ragchat unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BaseUrl,
    LogLevel,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 2] = [ConfigKey::BaseUrl, ConfigKey::LogLevel];

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "base-url" => Some(ConfigKey::BaseUrl),
            "log-level" => Some(ConfigKey::LogLevel),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::LogLevel => "log-level",
        }
    }
}

impl Config {
    /// Base URL to use, preferring an explicit override.
    pub fn resolve_base_url(&self, override_url: Option<&str>) -> String {
        override_url
            .filter(|url| !url.trim().is_empty())
            .or(self.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::BaseUrl => self.base_url.as_deref(),
            ConfigKey::LogLevel => self.log_level.as_deref(),
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: String) {
        match key {
            ConfigKey::BaseUrl => self.base_url = Some(value),
            ConfigKey::LogLevel => self.log_level = Some(value),
        }
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::BaseUrl => self.base_url = None,
            ConfigKey::LogLevel => self.log_level = None,
        }
    }
}

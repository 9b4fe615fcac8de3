//! Error types for settings operations.

use std::fmt;

/// Errors that can occur when modifying configuration settings.
#[derive(Debug)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The value is not an http(s) URL.
    InvalidUrl { input: String, reason: String },
    /// The value is not a valid tracing filter directive.
    InvalidLogLevel { input: String, reason: String },
    /// Required arguments are missing.
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    /// An error occurred while loading or persisting the configuration.
    ConfigError(String),
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Known keys: base-url, log-level");
            }
            SettingError::InvalidUrl { input, reason } => {
                eprintln!("❌ Invalid base URL: {input} ({reason})");
                eprintln!("   Use an http:// or https:// URL, e.g. http://localhost:8000");
            }
            SettingError::InvalidLogLevel { input, reason } => {
                eprintln!("❌ Invalid log level: {input} ({reason})");
                eprintln!("   Use a level such as warn, info or debug, or a filter like ragchat=debug");
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            SettingError::ConfigError(msg) => {
                eprintln!("❌ Failed to save configuration: {msg}");
            }
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::InvalidUrl { input, reason } => {
                write!(f, "Invalid base URL {input}: {reason}")
            }
            SettingError::InvalidLogLevel { input, reason } => {
                write!(f, "Invalid log level {input}: {reason}")
            }
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
            SettingError::ConfigError(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}

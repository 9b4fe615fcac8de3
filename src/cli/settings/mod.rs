//! Settings management for CLI set/unset commands.

pub mod error;

pub use error::SettingError;

use reqwest::Url;
use tracing_subscriber::EnvFilter;

use crate::core::config::data::Config;
use crate::core::config::defaults::ConfigKey;

fn parse_key(key: &str) -> Result<ConfigKey, SettingError> {
    ConfigKey::parse(key).ok_or_else(|| SettingError::UnknownKey(key.to_string()))
}

fn validate_base_url(input: &str) -> Result<String, SettingError> {
    let url = Url::parse(input).map_err(|err| SettingError::InvalidUrl {
        input: input.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(input.to_string()),
        other => Err(SettingError::InvalidUrl {
            input: input.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn validate_log_level(input: &str) -> Result<String, SettingError> {
    EnvFilter::try_new(input)
        .map(|_| input.to_string())
        .map_err(|err| SettingError::InvalidLogLevel {
            input: input.to_string(),
            reason: err.to_string(),
        })
}

/// Applies `set <key> <args...>` to `config` and returns the message to show.
pub fn apply_set(config: &mut Config, key: &str, args: &[String]) -> Result<String, SettingError> {
    let key = parse_key(key)?;
    let value = args.join(" ");
    let value = value.trim();
    if value.is_empty() {
        return Err(match key {
            ConfigKey::BaseUrl => SettingError::MissingArgs {
                hint: "To set the backend URL, specify it:",
                example: "ragchat set base-url http://localhost:8000",
            },
            ConfigKey::LogLevel => SettingError::MissingArgs {
                hint: "To set the log level, specify a level or filter:",
                example: "ragchat set log-level info",
            },
        });
    }

    let value = match key {
        ConfigKey::BaseUrl => validate_base_url(value)?,
        ConfigKey::LogLevel => validate_log_level(value)?,
    };
    let message = format!("✅ Set {} to: {value}", key.as_str());
    config.set(key, value);
    Ok(message)
}

/// Applies `unset <key>` to `config` and returns the message to show.
pub fn apply_unset(config: &mut Config, key: &str) -> Result<String, SettingError> {
    let key = parse_key(key)?;
    config.unset(key);
    Ok(format!("✅ Unset {}", key.as_str()))
}

fn persist(config: &Config) -> Result<(), SettingError> {
    config
        .save()
        .map_err(|err| SettingError::ConfigError(err.to_string()))
}

/// `ragchat set [KEY [VALUE...]]`. Without a value the configuration is
/// printed.
pub fn handle_set(key: Option<String>, value: Option<Vec<String>>) -> Result<(), SettingError> {
    let mut config = Config::load().map_err(|err| SettingError::ConfigError(err.to_string()))?;
    let args = value.unwrap_or_default();
    match key {
        Some(key) if !args.is_empty() => {
            let message = apply_set(&mut config, &key, &args)?;
            persist(&config)?;
            println!("{message}");
        }
        Some(key) => {
            parse_key(&key)?;
            config.print_all();
        }
        None => config.print_all(),
    }
    Ok(())
}

/// `ragchat unset KEY`.
pub fn handle_unset(key: String) -> Result<(), SettingError> {
    let mut config = Config::load().map_err(|err| SettingError::ConfigError(err.to_string()))?;
    let message = apply_unset(&mut config, &key)?;
    persist(&config)?;
    println!("{message}");
    Ok(())
}

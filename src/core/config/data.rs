use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent settings read from `config.toml`.
///
/// The API key is never stored here. It comes from the command line, the
/// environment or the interactive `/key` command.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend root, e.g. `http://localhost:8000`.
    pub base_url: Option<String>,
    /// Tracing filter used when neither `RUST_LOG` nor `-v` is given.
    pub log_level: Option<String>,
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

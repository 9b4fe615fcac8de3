use crate::core::config::data::Config;
use crate::core::config::defaults::ConfigKey;
use crate::core::constants::DEFAULT_BASE_URL;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.describe() {
            println!("  {line}");
        }
    }

    pub(crate) fn describe(&self) -> Vec<String> {
        ConfigKey::ALL
            .iter()
            .map(|key| match (key, self.get(*key)) {
                (_, Some(value)) => format!("{}: {value}", key.as_str()),
                (ConfigKey::BaseUrl, None) => {
                    format!("{}: (unset, using {DEFAULT_BASE_URL})", key.as_str())
                }
                (_, None) => format!("{}: (unset)", key.as_str()),
            })
            .collect()
    }
}

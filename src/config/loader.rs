//! Configuration loader with environment variable expansion

use super::{Config, ConfigError};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, expand, parse and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let expanded = Self::expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Expand `${VAR_NAME}` and `${VAR_NAME:-default}` references.
    ///
    /// A reference with no matching variable and no default keeps its
    /// placeholder, so a missing secret shows up verbatim in the validation
    /// error instead of silently becoming an empty key.
    fn expand_env_vars(content: &str) -> String {
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
        let mut result = String::with_capacity(content.len());
        let mut last_match = 0;

        for cap in re.captures_iter(content) {
            let full_match = cap.get(0).unwrap();
            result.push_str(&content[last_match..full_match.start()]);

            let var_name = cap.get(1).unwrap().as_str();
            match std::env::var(var_name) {
                Ok(value) => result.push_str(&value),
                Err(_) => match cap.get(2) {
                    Some(default) => result.push_str(default.as_str()),
                    None => result.push_str(full_match.as_str()),
                },
            }

            last_match = full_match.end();
        }

        result.push_str(&content[last_match..]);
        result
    }
}

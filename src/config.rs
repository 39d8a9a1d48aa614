use crate::error::{Result, TablecheckError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Run configuration for a full data-quality pass. Every path and parameter
/// is explicit; the core functions never reach for defaults on their own.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub store_path: String,
    pub source_path: String,
    pub table_name: String,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChecksConfig {
    pub format: Option<FormatConfig>,
    pub range: Option<RangeConfig>,
    pub threshold: Option<ThresholdConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FormatConfig {
    pub column: String,
    /// Regex override; the email shape pattern applies when absent.
    pub pattern: Option<String>,
    #[serde(default)]
    pub allow_null: bool,
}

#[derive(Debug, Deserialize)]
pub struct RangeConfig {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdConfig {
    pub key_column: String,
    pub value_column: String,
    pub minimum: i64,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsConfig {
    pub top_n: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            TablecheckError::Config(format!("failed to read config file '{}': {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_full_run_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
store_path = "users.db"
source_path = "users.csv"
table_name = "users"

[checks.format]
column = "email"

[checks.range]
column = "age"
min = 20.0
max = 40.0

[checks.threshold]
key_column = "id"
value_column = "age"
minimum = 18

[analytics]
top_n = 3
"#
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.table_name, "users");
        assert_eq!(config.checks.range.unwrap().max, 40.0);
        assert!(!config.checks.format.as_ref().unwrap().allow_null);
        assert_eq!(config.analytics.top_n, 3);
    }

    #[test]
    fn checks_section_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "store_path = \"a.db\"\nsource_path = \"a.csv\"\ntable_name = \"a\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.checks.format.is_none());
        assert_eq!(config.analytics.top_n, 5);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load("no-such-file.toml").unwrap_err();
        assert!(matches!(err, TablecheckError::Config(_)));
    }
}

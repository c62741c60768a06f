use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "CHILLER_LOSS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Locations of the reference tables loaded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub saturation_csv: PathBuf,
    pub altitude_csv: PathBuf,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            saturation_csv: PathBuf::from("data/saturation.csv"),
            altitude_csv: PathBuf::from("data/altitude.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub company: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            company: "Company".into(),
        }
    }
}

/// Application settings read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reference: ReferenceConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Config path from `CHILLER_LOSS_CONFIG`, else `config.toml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads `path`, or writes and returns the defaults when it does not exist.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&content)?;
        Ok(cfg)
    } else {
        let cfg = Config::default();
        cfg.save(path)?;
        Ok(cfg)
    }
}

impl Config {
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chiller_cfg_{}_{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("config.toml")
    }

    #[test]
    fn missing_file_writes_defaults() {
        let path = temp_path("defaults");
        let _ = fs::remove_file(&path);
        let cfg = load_or_default(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
        assert_eq!(load_or_default(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_remaining_sections() {
        let path = temp_path("partial");
        fs::write(&path, "[report]\ncompany = \"Acme Cooling\"\n").unwrap();
        let cfg = load_or_default(&path).unwrap();
        assert_eq!(cfg.report.company, "Acme Cooling");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.reference, ReferenceConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = temp_path("bad");
        fs::write(&path, "[logging\nlevel = 3").unwrap();
        assert!(matches!(load_or_default(&path), Err(ConfigError::Parse(_))));
    }
}

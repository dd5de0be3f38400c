use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between status checks of the running process.
    pub sample_interval: f64,
    /// Seconds covered by each aggregated report window.
    pub report_interval: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            sample_interval: 1.0,
            report_interval: 60.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
    pub summary: bool,
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            pretty: true,
            summary: false,
            log_level: "warn".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("runmon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.monitor.sample_interval, 1.0);
        assert_eq!(config.monitor.report_interval, 60.0);
        assert!(config.output.pretty);
        assert!(!config.output.summary);
        assert_eq!(config.output.log_level, "warn");
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[monitor]
sample_interval = 0.25
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.sample_interval, 0.25);
        // Other fields should be defaults
        assert_eq!(config.monitor.report_interval, 60.0);
        assert!(config.output.pretty);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[monitor]
sample_interval = 2.0
report_interval = 30.0

[output]
pretty = false
summary = true
log_level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.sample_interval, 2.0);
        assert_eq!(config.monitor.report_interval, 30.0);
        assert!(!config.output.pretty);
        assert!(config.output.summary);
        assert_eq!(config.output.log_level, "debug");
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.monitor.sample_interval, 1.0);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("runmon_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.monitor.report_interval, 60.0);
        let _ = std::fs::remove_file(&temp);
    }
}

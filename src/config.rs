use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub camera: CameraConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub classifier: ClassifierConfig,
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub snapshot_url: String,
    #[serde(default = "default_camera_name")]
    pub name: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_diff_threshold")]
    pub diff_threshold: f64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            diff_threshold: default_diff_threshold(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "camera.poll_interval_ms must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detection.diff_threshold) {
            return Err(ConfigError::Invalid(
                "detection.diff_threshold must be in [0, 1]".into(),
            ));
        }
        if self.detection.cooldown_ms < 0 {
            return Err(ConfigError::Invalid(
                "detection.cooldown_ms must not be negative".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.classifier.confidence_threshold) {
            return Err(ConfigError::Invalid(
                "classifier.confidence_threshold must be in [0, 100]".into(),
            ));
        }
        if self.smtp.recipients.is_empty() {
            return Err(ConfigError::Invalid(
                "smtp.recipients must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_camera_name() -> String {
    "camera".into()
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_diff_threshold() -> f64 {
    0.1
}
fn default_cooldown_ms() -> i64 {
    5000
}
fn default_confidence_threshold() -> f64 {
    80.0
}
fn default_classifier_timeout() -> u64 {
    10
}
fn default_smtp_port() -> u16 {
    587
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    const MINIMAL: &str = r#"
        [camera]
        snapshot_url = "http://cam.local/snapshot.jpg"

        [classifier]
        endpoint = "https://vision.example.com/v1/labels"
        api_key = "key-123"

        [smtp]
        host = "smtp.example.com"
        username = "watcher"
        password = "hunter2"
        from = "watcher@example.com"
        recipients = ["alerts@example.com"]
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.camera.name, "camera");
        assert_eq!(config.camera.poll_interval_ms, 1000);
        assert_eq!(config.detection.diff_threshold, 0.1);
        assert_eq!(config.detection.cooldown_ms, 5000);
        assert_eq!(config.classifier.confidence_threshold, 80.0);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_snapshot_url_is_a_parse_error() {
        let result = parse(
            r#"
            [camera]
            name = "porch"

            [classifier]
            endpoint = "https://vision.example.com/v1/labels"
            api_key = "key-123"

            [smtp]
            host = "smtp.example.com"
            username = "watcher"
            password = "hunter2"
            from = "watcher@example.com"
            recipients = ["alerts@example.com"]
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_recipients_rejected() {
        let toml_str = MINIMAL.replace(
            r#"recipients = ["alerts@example.com"]"#,
            "recipients = []",
        );
        let result = parse(&toml_str);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn out_of_range_diff_threshold_rejected() {
        let toml_str = format!(
            "{MINIMAL}\n[detection]\ndiff_threshold = 1.5\n"
        );
        let result = parse(&toml_str);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}

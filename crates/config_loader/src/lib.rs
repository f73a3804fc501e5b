//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `SenderConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("sender.toml")).unwrap();
//! println!("Service: {}", config.service_name);
//! ```

mod parser;
mod validator;

pub use contracts::SenderConfig;
pub use parser::ConfigFormat;
pub use validator::SIMULATED_PARAMS;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Format is detected from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<SenderConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<SenderConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already parsed config
    pub fn validate(config: &SenderConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Non-fatal findings for a valid config
    pub fn warnings(config: &SenderConfig) -> Vec<String> {
        validator::warnings(config)
    }

    /// Serialize SenderConfig to TOML string
    pub fn to_toml(config: &SenderConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize SenderConfig to JSON string
    pub fn to_json(config: &SenderConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SIMULATED_TOML: &str = r#"
service_name = "checkout"

[retry]
base_delay_ms = 200
max_delay_ms = 10000
jitter_ratio = 0.2

[transport]
name = "sim"
transport_type = "simulated"
[transport.params]
max_batch_records = "50"
backoff_rate = "0.1"
wait_rate = "0.05"
wait_ms = "300"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(SIMULATED_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.service_name, "checkout");
        assert_eq!(config.retry.base_delay_ms, 200);
        assert_eq!(config.transport.params.len(), 4);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(SIMULATED_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.service_name, again.service_name);
        assert_eq!(config.transport.params, again.transport.params);
        assert_eq!(config.retry.max_delay_ms, again.retry.max_delay_ms);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(SIMULATED_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.transport.name, again.transport.name);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
service_name = "checkout"

[retry]
base_delay_ms = 5000
max_delay_ms = 100

[transport]
transport_type = "log"
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
        assert!(err.to_string().contains("max_delay_ms"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SIMULATED_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.transport.name, "sim");
    }

    #[test]
    fn test_load_from_path_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/sender.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }
}

//! SDK configuration loading
//!
//! The build agent drops a `.sdk.json` file into the plugin data directory
//! (named by the `bk_data_dir` environment variable). It carries the gateway
//! address and the per-build credentials attached to every gateway request.

use std::path::{
    Path,
    PathBuf,
};

use secrecy::{
    ExposeSecret,
    SecretString,
};
use serde::{
    Deserialize,
    Deserializer,
};
use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;

pub const DATA_DIR_ENV: &str = "bk_data_dir";
pub const INPUT_FILE_ENV: &str = "bk_data_input";
pub const OUTPUT_FILE_ENV: &str = "bk_data_output";

pub const SDK_CONFIG_FILE: &str = ".sdk.json";
pub const DEFAULT_INPUT_FILE: &str = "input.json";
pub const DEFAULT_OUTPUT_FILE: &str = "output.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    DataDirNotSet(&'static str),

    #[error("SDK config not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read SDK config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("SDK config is empty: {0}")]
    Empty(PathBuf),

    #[error("Failed to parse SDK config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("SDK config field missing: {0}")]
    MissingField(&'static str),

    #[error("SDK config field {0} is not a valid header value")]
    InvalidHeader(&'static str),

    #[error("Failed to initialise HTTP transport: {0}")]
    Transport(#[from] TransportError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resolves the plugin data directory from `bk_data_dir`.
pub fn data_dir_from_env() -> ConfigResult<PathBuf> {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .ok_or(ConfigError::DataDirNotSet(DATA_DIR_ENV))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSdkConfig {
    build_type: Option<String>,
    project_id: Option<String>,
    agent_id: Option<String>,
    secret_key: Option<String>,
    gateway: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    build_id: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    vm_seq_id: Option<String>,
}

// Some agents write numeric ids.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Gateway address and build credentials, immutable once loaded.
#[derive(Debug)]
pub struct SdkConfig {
    pub gateway: String,
    pub build_type: String,
    pub project_id: String,
    pub agent_id: String,
    pub secret_key: SecretString,
    pub build_id: String,
    pub vm_seq_id: String,
}

impl SdkConfig {
    /// Loads `.sdk.json` from the directory named by `bk_data_dir`.
    pub fn from_env() -> ConfigResult<Self> {
        let dir = data_dir_from_env()?;
        Self::load(&dir.join(SDK_CONFIG_FILE))
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(ConfigError::Empty(path.to_path_buf()));
        }

        tracing::debug!("Loading SDK config from {}", path.display());
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        let raw: RawSdkConfig = serde_json::from_str(content)?;

        // Checked in the order the agent documents them.
        Ok(Self {
            build_type: required(raw.build_type, "buildType")?,
            project_id: required(raw.project_id, "projectId")?,
            agent_id: required(raw.agent_id, "agentId")?,
            secret_key: SecretString::from(required(raw.secret_key, "secretKey")?),
            gateway: required(raw.gateway, "gateway")?,
            build_id: required(raw.build_id, "buildId")?,
            vm_seq_id: required(raw.vm_seq_id, "vmSeqId")?,
        })
    }

    /// Full URL for a gateway-relative path. A gateway without a scheme is
    /// reached over plain HTTP.
    pub fn gateway_url(&self, path: &str) -> String {
        let gateway = self.gateway.trim_end_matches('/');
        let path = path.trim_start_matches('/');

        if gateway.starts_with("http://") || gateway.starts_with("https://") {
            format!("{gateway}/{path}")
        } else {
            format!("http://{gateway}/{path}")
        }
    }

    pub(crate) fn secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

fn required(value: Option<String>, field: &'static str) -> ConfigResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const SAMPLE: &str = r#"{
        "gateway": "devops.example.com",
        "buildType": "WORKER",
        "projectId": "demo",
        "agentId": "agent-1",
        "secretKey": "s3cret",
        "buildId": "b-42",
        "vmSeqId": "1"
    }"#;

    #[test]
    fn test_parse_complete_config() {
        let config = SdkConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.gateway, "devops.example.com");
        assert_eq!(config.build_type, "WORKER");
        assert_eq!(config.project_id, "demo");
        assert_eq!(config.agent_id, "agent-1");
        assert_eq!(config.secret(), "s3cret");
        assert_eq!(config.build_id, "b-42");
        assert_eq!(config.vm_seq_id, "1");
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = SdkConfig::parse(SAMPLE).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn test_missing_field() {
        let content = r#"{"gateway": "g", "buildType": "WORKER", "projectId": "p",
            "agentId": "a", "buildId": "b", "vmSeqId": "1"}"#;
        let err = SdkConfig::parse(content).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("secretKey")));
    }

    #[test]
    fn test_empty_field_counts_as_missing() {
        let content = SAMPLE.replace("\"agent-1\"", "\"\"");
        let err = SdkConfig::parse(&content).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("agentId")));
    }

    #[test]
    fn test_numeric_ids() {
        let content = SAMPLE
            .replace("\"b-42\"", "42")
            .replace("\"vmSeqId\": \"1\"", "\"vmSeqId\": 1");
        let config = SdkConfig::parse(&content).unwrap();
        assert_eq!(config.build_id, "42");
        assert_eq!(config.vm_seq_id, "1");
    }

    #[test]
    fn test_invalid_json() {
        let err = SdkConfig::parse("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = SdkConfig::load(&temp_dir.path().join(SDK_CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SDK_CONFIG_FILE);
        std::fs::write(&path, "  \n").unwrap();

        let err = SdkConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(_)));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SDK_CONFIG_FILE);
        std::fs::write(&path, SAMPLE).unwrap();

        let config = SdkConfig::load(&path).unwrap();
        assert_eq!(config.project_id, "demo");
    }

    #[test]
    fn test_gateway_url() {
        let mut config = SdkConfig::parse(SAMPLE).unwrap();
        assert_eq!(
            config.gateway_url("/ticket/api/x"),
            "http://devops.example.com/ticket/api/x"
        );

        config.gateway = "https://devops.example.com/".to_string();
        assert_eq!(
            config.gateway_url("ticket/api/x"),
            "https://devops.example.com/ticket/api/x"
        );
    }
}

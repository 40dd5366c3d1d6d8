//! Plugin input parameters
//!
//! The agent writes the step's parameters and a set of well-known pipeline
//! metadata keys to a JSON object in the data directory before starting the
//! plugin. It is read once and never modified.

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};

use chrono::{
    DateTime,
    Utc,
};
use serde_json::Value;
use thiserror::Error;

use crate::artifact::BuildScope;

pub mod keys {
    pub const PROJECT_NAME: &str = "project.name";
    pub const PROJECT_NAME_CN: &str = "project.name.chinese";
    pub const PIPELINE_ID: &str = "pipeline.id";
    pub const PIPELINE_NAME: &str = "pipeline.name";
    pub const PIPELINE_BUILD_ID: &str = "pipeline.build.id";
    pub const PIPELINE_BUILD_NUM: &str = "pipeline.build.num";
    pub const PIPELINE_START_TYPE: &str = "pipeline.start.type";
    pub const PIPELINE_START_USER_ID: &str = "pipeline.start.user.id";
    pub const PIPELINE_START_USER_NAME: &str = "pipeline.start.user.name";
    pub const PIPELINE_CREATOR: &str = "BK_CI_PIPELINE_CREATE_USER";
    pub const PIPELINE_MODIFIER: &str = "BK_CI_PIPELINE_UPDATE_USER";
    pub const PIPELINE_TIME_START: &str = "pipeline.time.start";
    pub const PIPELINE_VERSION: &str = "pipeline.version";
    pub const WORKSPACE: &str = "bkWorkspace";
    pub const TEST_VERSION_FLAG: &str = "testVersionFlag";
    pub const SENSITIVE_CONF: &str = "bkSensitiveConfInfo";
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read input file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse input file: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct InputParams {
    params: HashMap<String, Value>,
}

impl InputParams {
    pub fn new(params: HashMap<String, Value>) -> Self {
        Self { params }
    }

    pub fn load(path: &Path) -> Result<Self, InputError> {
        if !path.exists() {
            return Err(InputError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, InputError> {
        let params: HashMap<String, Value> = serde_json::from_str(content)?;
        Ok(Self { params })
    }

    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// String form of a scalar value; `null` and empty strings are absent.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.params.get(key)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn project_name(&self) -> Option<String> {
        self.get_string(keys::PROJECT_NAME)
    }

    pub fn project_name_cn(&self) -> Option<String> {
        self.get_string(keys::PROJECT_NAME_CN)
    }

    pub fn pipeline_id(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_ID)
    }

    pub fn pipeline_name(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_NAME)
    }

    pub fn pipeline_build_id(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_BUILD_ID)
    }

    pub fn pipeline_build_num(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_BUILD_NUM)
    }

    pub fn pipeline_start_type(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_START_TYPE)
    }

    pub fn pipeline_start_user_id(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_START_USER_ID)
    }

    pub fn pipeline_start_user_name(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_START_USER_NAME)
    }

    pub fn pipeline_creator(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_CREATOR)
    }

    pub fn pipeline_modifier(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_MODIFIER)
    }

    /// Start time in epoch milliseconds, as the agent reports it.
    pub fn pipeline_time_start_millis(&self) -> Option<i64> {
        self.get_string(keys::PIPELINE_TIME_START)?.parse().ok()
    }

    pub fn pipeline_start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.pipeline_time_start_millis()?)
    }

    pub fn pipeline_version(&self) -> Option<String> {
        self.get_string(keys::PIPELINE_VERSION)
    }

    pub fn workspace(&self) -> Option<PathBuf> {
        self.get_string(keys::WORKSPACE).map(PathBuf::from)
    }

    pub fn test_version_flag(&self) -> Option<String> {
        self.get_string(keys::TEST_VERSION_FLAG)
    }

    pub fn is_test_version(&self) -> bool {
        self.test_version_flag()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"))
    }

    /// Looks up `key` in the sensitive configuration block.
    pub fn sensitive_conf(&self, key: &str) -> Option<&Value> {
        self.params
            .get(keys::SENSITIVE_CONF)?
            .as_object()?
            .get(key)
    }

    /// The pipeline build this step belongs to, when the agent supplied it.
    pub fn build_scope(&self) -> Option<BuildScope> {
        Some(BuildScope {
            pipeline_id: self.pipeline_id()?,
            build_id: self.pipeline_build_id()?,
        })
    }
}

//! Plugin output contract
//!
//! The plugin reports its result by writing one JSON object to the output
//! file in the data directory. The agent reads it after the process exits.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output file: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStatus {
    Success,
    Failure,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Default,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportType {
    Internal,
    Thirdparty,
}

/// Who is at fault for a failed step. Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    User,
    ThirdParty,
    Pipeline,
    Plugin,
}

impl ErrorType {
    pub fn code(&self) -> u8 {
        match self {
            ErrorType::User => 1,
            ErrorType::ThirdParty => 2,
            ErrorType::Pipeline => 3,
            ErrorType::Plugin => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ErrorType::User),
            2 => Some(ErrorType::ThirdParty),
            3 => Some(ErrorType::Pipeline),
            4 => Some(ErrorType::Plugin),
            _ => None,
        }
    }
}

impl Serialize for ErrorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        ErrorType::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error type {code}")))
    }
}

/// One named output variable of the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputField {
    String {
        value: String,
    },
    Artifact {
        value: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Report {
        label: String,
        path: String,
        target: String,
        report_type: ReportType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enable_email: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_receivers: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_title: Option<String>,
    },
}

impl OutputField {
    pub fn string(value: impl Into<String>) -> Self {
        OutputField::String {
            value: value.into(),
        }
    }

    pub fn artifact<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OutputField::Artifact {
            value: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// A report rendered from a file in the workspace.
    pub fn internal_report(
        label: impl Into<String>, path: impl Into<String>, target: impl Into<String>,
    ) -> Self {
        OutputField::Report {
            label: label.into(),
            path: path.into(),
            target: target.into(),
            report_type: ReportType::Internal,
            url: None,
            enable_email: None,
            email_receivers: None,
            email_title: None,
        }
    }

    /// A report hosted elsewhere.
    pub fn third_party_report(label: impl Into<String>, url: impl Into<String>) -> Self {
        OutputField::Report {
            label: label.into(),
            path: String::new(),
            target: String::new(),
            report_type: ReportType::Thirdparty,
            url: Some(url.into()),
            enable_email: None,
            email_receivers: None,
            email_title: None,
        }
    }
}

/// The object written to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputResult {
    pub status: OutputStatus,
    pub message: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, OutputField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_data: Option<Value>,
}

impl OutputResult {
    pub fn success(
        message: impl Into<String>, data: BTreeMap<String, OutputField>, quality_data: Option<Value>,
    ) -> Self {
        let template_type = if quality_data.is_some() {
            TemplateType::Quality
        } else {
            TemplateType::Default
        };

        Self {
            status: OutputStatus::Success,
            message: message.into(),
            template_type,
            data: Some(data),
            error_type: None,
            error_code: None,
            quality_data,
        }
    }

    pub fn failure(error_type: ErrorType, error_code: i32, message: impl Into<String>) -> Self {
        Self {
            status: OutputStatus::Failure,
            message: message.into(),
            template_type: TemplateType::Default,
            data: None,
            error_type: Some(error_type),
            error_code: Some(error_code),
            quality_data: None,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), OutputError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, OutputError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

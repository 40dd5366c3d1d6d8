//! Per-process plugin context
//!
//! [`AtomContext`] is built once at startup. It owns the parsed input and
//! knows where the SDK config and output file live; everything else borrows
//! from it. Plugin logic returns an [`AtomOutcome`] and the binary hands it
//! to [`AtomContext::finish`], which writes the output file and yields the
//! process exit code.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::client::GatewayClient;
use crate::config::{
    self,
    ConfigError,
    SdkConfig,
};
use crate::input::{
    InputError,
    InputParams,
};
use crate::output::{
    ErrorType,
    OutputField,
    OutputResult,
};
use crate::transport::Transport;

pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for an unusable environment: missing data directory, unreadable
/// input, invalid SDK config, or an output file that could not be written.
pub const EXIT_FATAL: i32 = 255;

/// Conventional step error codes.
pub mod error_code {
    pub const OK: i32 = 0;
    pub const UNSPECIFIED: i32 = 2199000;
    pub const PLUGIN_ERROR: i32 = 2199001;
    pub const USER_CONFIG_ERROR: i32 = 2199002;
}

pub const DEFAULT_SUCCESS_MESSAGE: &str = "run succ";
pub const DEFAULT_FAILURE_MESSAGE: &str = "failed";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// A successful step result.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSuccess {
    pub message: String,
    pub data: BTreeMap<String, OutputField>,
    pub quality_data: Option<Value>,
}

impl Default for AtomSuccess {
    fn default() -> Self {
        Self {
            message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            data: BTreeMap::new(),
            quality_data: None,
        }
    }
}

impl AtomSuccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field: OutputField) -> Self {
        self.data.insert(name.into(), field);
        self
    }

    pub fn with_quality_data(mut self, quality_data: Value) -> Self {
        self.quality_data = Some(quality_data);
        self
    }
}

/// A failed step result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error_type: {}, error_code: {error_code}, error_msg: {message}", .error_type.code())]
pub struct AtomFailure {
    pub error_type: ErrorType,
    pub error_code: i32,
    pub message: String,
}

impl AtomFailure {
    pub fn new(error_type: ErrorType, error_code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            error_type,
            error_code,
            message: if message.is_empty() {
                DEFAULT_FAILURE_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    pub fn user(error_code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorType::User, error_code, message)
    }

    pub fn plugin(error_code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorType::Plugin, error_code, message)
    }

    pub fn third_party(error_code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorType::ThirdParty, error_code, message)
    }
}

/// A PLUGIN failure with `PLUGIN_ERROR` and the default message.
impl Default for AtomFailure {
    fn default() -> Self {
        Self::plugin(error_code::PLUGIN_ERROR, DEFAULT_FAILURE_MESSAGE)
    }
}

impl From<ConfigError> for AtomFailure {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorType::Pipeline, EXIT_FATAL, err.to_string())
    }
}

pub type AtomOutcome = Result<AtomSuccess, AtomFailure>;

#[derive(Debug)]
pub struct AtomContext {
    data_dir: PathBuf,
    input: InputParams,
    output_path: PathBuf,
}

impl AtomContext {
    pub fn new(data_dir: impl Into<PathBuf>, input: InputParams, output_path: PathBuf) -> Self {
        Self {
            data_dir: data_dir.into(),
            input,
            output_path,
        }
    }

    /// Reads `bk_data_dir`, `bk_data_input` and `bk_data_output`, then loads
    /// the input file.
    pub fn from_env() -> Result<Self, ContextError> {
        let data_dir = config::data_dir_from_env()?;
        let input_name = std::env::var(config::INPUT_FILE_ENV)
            .unwrap_or_else(|_| config::DEFAULT_INPUT_FILE.to_string());
        let output_name = std::env::var(config::OUTPUT_FILE_ENV)
            .unwrap_or_else(|_| config::DEFAULT_OUTPUT_FILE.to_string());

        Self::load(data_dir, &input_name, &output_name)
    }

    pub fn load(
        data_dir: impl Into<PathBuf>, input_name: &str, output_name: &str,
    ) -> Result<Self, ContextError> {
        let data_dir = data_dir.into();
        let input = InputParams::load(&data_dir.join(input_name))?;
        let output_path = data_dir.join(output_name);

        tracing::debug!("Loaded {} input parameters", input.as_map().len());
        Ok(Self::new(data_dir, input, output_path))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn input(&self) -> &InputParams {
        &self.input
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn sdk_config_path(&self) -> PathBuf {
        self.data_dir.join(config::SDK_CONFIG_FILE)
    }

    /// Gateway client over `reqwest`, configured from the data directory.
    pub fn gateway(&self) -> Result<GatewayClient, ConfigError> {
        let client = GatewayClient::new(SdkConfig::load(&self.sdk_config_path())?)?;
        Ok(self.scoped(client))
    }

    pub fn gateway_with(&self, transport: Arc<dyn Transport>) -> Result<GatewayClient, ConfigError> {
        let client = GatewayClient::from_config_file(&self.sdk_config_path(), transport)?;
        Ok(self.scoped(client))
    }

    fn scoped(&self, client: GatewayClient) -> GatewayClient {
        client
            .with_download_dir(&self.data_dir)
            .with_build_scope(self.input.build_scope())
    }

    /// Writes the output file for `outcome` and returns the exit code.
    ///
    /// Consumes the context, so a process reports at most one result.
    pub fn finish(self, outcome: AtomOutcome) -> i32 {
        let succeeded = outcome.is_ok();
        let (result, code) = match outcome {
            Ok(success) => (
                OutputResult::success(success.message, success.data, success.quality_data),
                EXIT_SUCCESS,
            ),
            Err(failure) => {
                tracing::error!("{failure}");
                let code = failure.error_code;
                (
                    OutputResult::failure(failure.error_type, failure.error_code, failure.message),
                    code,
                )
            }
        };

        if let Err(e) = result.write(&self.output_path) {
            tracing::error!(
                "Failed to write output to {}: {}",
                self.output_path.display(),
                e
            );
            return EXIT_FATAL;
        }

        if succeeded {
            tracing::info!("finish");
        }
        code
    }
}

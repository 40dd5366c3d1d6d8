//! SDK for pipeline build-step plugins ("atoms")
//!
//! A plugin is a short-lived process started by the build agent. It reads
//! its parameters once, optionally calls the gateway API for credentials,
//! artifacts, repositories or build context, and reports a single result
//! before exiting.
//!
//! # Modules
//!
//! - `context` - per-process context and the exit driver
//! - `input` / `output` - the local parameter and result files
//! - `client` / `gateway` - the authenticated gateway API client
//! - `config` - `.sdk.json` loading
//!
//! # Example
//!
//! ```no_run
//! use atom_sdk::{
//!     AtomContext,
//!     AtomFailure,
//!     AtomSuccess,
//!     OutputField,
//! };
//!
//! let ctx = AtomContext::from_env().expect("plugin environment");
//! let outcome = match ctx.input().get_string("greeting") {
//!     Some(greeting) => {
//!         Ok(AtomSuccess::new().with_field("echo", OutputField::string(greeting)))
//!     }
//!     None => Err(AtomFailure::user(2199002, "greeting is None")),
//! };
//! std::process::exit(ctx.finish(outcome));
//! ```

pub mod artifact;
pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod input;
pub mod logging;
pub mod output;
pub mod retry;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use artifact::{
    ArtifactSource,
    BuildRef,
    BuildScope,
};
pub use client::GatewayClient;
pub use config::{
    ConfigError,
    SdkConfig,
};
pub use context::{
    error_code,
    AtomContext,
    AtomFailure,
    AtomOutcome,
    AtomSuccess,
    ContextError,
    EXIT_FATAL,
    EXIT_SUCCESS,
};
pub use envelope::ResponseEnvelope;
pub use error::{
    GatewayError,
    GatewayResult,
};
pub use input::InputParams;
pub use output::{
    ErrorType,
    OutputField,
    OutputResult,
    OutputStatus,
    ReportType,
    TemplateType,
};
pub use retry::RetryPolicy;
pub use transport::{
    ReqwestTransport,
    Transport,
    TransportError,
};
pub use types::{
    ArtifactFileDetail,
    ArtifactProperty,
    Credential,
    RepositoryInfo,
};

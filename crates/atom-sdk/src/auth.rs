//! Gateway authentication headers

use reqwest::header::{
    HeaderMap,
    HeaderName,
    HeaderValue,
};

use crate::config::{
    ConfigError,
    ConfigResult,
    SdkConfig,
};

pub const HEADER_BUILD_TYPE: &str = "X-DEVOPS-BUILD-TYPE";
pub const HEADER_PROJECT_ID: &str = "X-DEVOPS-PROJECT-ID";
pub const HEADER_AGENT_ID: &str = "X-DEVOPS-AGENT-ID";
pub const HEADER_AGENT_SECRET_KEY: &str = "X-DEVOPS-AGENT-SECRET-KEY";
pub const HEADER_BUILD_ID: &str = "X-DEVOPS-BUILD-ID";
pub const HEADER_VM_SEQ_ID: &str = "X-DEVOPS-VM-SEQ-ID";

/// Fixed header set derived from [`SdkConfig`].
///
/// The base set never changes after construction; per-call headers are
/// layered on top with [`AuthHeaders::overlay`], which returns a fresh map.
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    base: HeaderMap,
}

impl AuthHeaders {
    pub fn from_config(config: &SdkConfig) -> ConfigResult<Self> {
        let mut base = HeaderMap::new();

        insert(&mut base, HEADER_BUILD_TYPE, &config.build_type, false)?;
        insert(&mut base, HEADER_PROJECT_ID, &config.project_id, false)?;
        insert(&mut base, HEADER_AGENT_ID, &config.agent_id, false)?;
        insert(&mut base, HEADER_AGENT_SECRET_KEY, config.secret(), true)?;
        insert(&mut base, HEADER_BUILD_ID, &config.build_id, false)?;
        insert(&mut base, HEADER_VM_SEQ_ID, &config.vm_seq_id, false)?;

        Ok(Self { base })
    }

    pub fn base(&self) -> &HeaderMap {
        &self.base
    }

    /// Base headers with `extra` merged in; `extra` wins on conflicts.
    pub fn overlay(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = self.base.clone();
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

fn insert(
    headers: &mut HeaderMap, name: &'static str, value: &str, sensitive: bool,
) -> ConfigResult<()> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeader(name))?;
    let mut header_value =
        HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader(name))?;
    header_value.set_sensitive(sensitive);
    headers.insert(header_name, header_value);
    Ok(())
}

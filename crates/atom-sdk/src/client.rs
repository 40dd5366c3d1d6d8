//! Authenticated gateway client

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::artifact::BuildScope;
use crate::auth::AuthHeaders;
use crate::config::{
    ConfigResult,
    SdkConfig,
};
use crate::envelope;
use crate::error::{
    GatewayError,
    GatewayResult,
};
use crate::retry::RetryPolicy;
use crate::transport::{
    ByteStream,
    GatewayRequest,
    ReqwestTransport,
    Transport,
    TransportError,
};

pub const GET_TIMEOUT: Duration = Duration::from_secs(60);
pub const POST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gateway API client.
///
/// Holds one pooled transport for the life of the process. Calls are meant
/// to be awaited one after another; nothing here coordinates concurrent use.
pub struct GatewayClient {
    config: SdkConfig,
    headers: AuthHeaders,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    download_dir: PathBuf,
    scope: Option<BuildScope>,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .field("download_dir", &self.download_dir)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Builds a client over `reqwest`.
    pub fn new(config: SdkConfig) -> ConfigResult<Self> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: SdkConfig, transport: Arc<dyn Transport>) -> ConfigResult<Self> {
        let headers = AuthHeaders::from_config(&config)?;
        Ok(Self {
            config,
            headers,
            transport,
            retry: RetryPolicy::default(),
            download_dir: PathBuf::from("."),
            scope: None,
        })
    }

    /// Loads `.sdk.json` from `path` and builds a client over `transport`.
    ///
    /// An unusable config fails here, before the transport sees any request.
    pub fn from_config_file(path: &Path, transport: Arc<dyn Transport>) -> ConfigResult<Self> {
        let config = SdkConfig::load(path).inspect_err(|e| {
            tracing::error!("gateway client init failed: {e}");
        })?;
        Self::with_transport(config, transport)
    }

    /// Directory downloads are written under.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Pipeline and build used to namespace pipeline artifact paths.
    pub fn with_build_scope(mut self, scope: Option<BuildScope>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub(crate) fn build_scope(&self) -> Option<&BuildScope> {
        self.scope.as_ref()
    }

    /// URL for a gateway path plus percent-encoded query parameters.
    pub fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = self.config.gateway_url(path);
        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    /// GET with auth headers, retried on connection failure.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> GatewayResult<T> {
        let request =
            GatewayRequest::get(url, self.headers.base().clone()).with_timeout(GET_TIMEOUT);

        let response = self
            .retry
            .retry(|| self.transport.send(request.clone()))
            .await
            .map_err(|e| log_transport(url, e))?;

        envelope::decode(&response)
    }

    /// POST with auth headers plus `extra_headers` for this call only.
    pub async fn post<T: DeserializeOwned>(
        &self, url: &str, extra_headers: &HeaderMap, body: Option<Vec<u8>>,
    ) -> GatewayResult<T> {
        let request = GatewayRequest::post(url, self.headers.overlay(extra_headers), body)
            .with_timeout(POST_TIMEOUT);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| log_transport(url, e))?;

        envelope::decode(&response)
    }

    /// Streams `file_url` to disk under the download directory.
    ///
    /// The local name defaults to the last path segment of the URL with any
    /// query string removed.
    pub async fn download_url(
        &self, file_url: &str, local_name: Option<&str>,
    ) -> GatewayResult<PathBuf> {
        let request = GatewayRequest::get(file_url, self.headers.base().clone());
        let mut stream = self
            .retry
            .retry(|| self.transport.open(request.clone()))
            .await
            .map_err(|e| log_transport(file_url, e))?;

        let status = stream.status();
        if status != 200 {
            tracing::error!("download file failed, status_code is {status}");
            return Err(GatewayError::Http {
                status,
                message: format!("download of {file_url} failed"),
            });
        }

        let file_name = match local_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => file_name_from_url(file_url)?,
        };
        let local_path = self.download_dir.join(file_name);

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GatewayError::io(parent, e))?;
        }

        let mut file = tokio::fs::File::create(&local_path)
            .await
            .map_err(|e| GatewayError::io(&local_path, e))?;

        let written = match write_stream(&mut *stream, &mut file, file_url, &local_path).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&local_path).await {
                    tracing::warn!(
                        "Failed to remove partial download {}: {}",
                        local_path.display(),
                        remove_err
                    );
                }
                return Err(e);
            }
        };

        tracing::info!("Downloaded {} bytes to {}", written, local_path.display());
        Ok(local_path)
    }
}

async fn write_stream(
    stream: &mut dyn ByteStream, file: &mut tokio::fs::File, file_url: &str, local_path: &Path,
) -> GatewayResult<usize> {
    let mut written = 0usize;
    while let Some(chunk) = stream.next_chunk().await.map_err(|e| log_transport(file_url, e))? {
        file.write_all(&chunk)
            .await
            .map_err(|e| GatewayError::io(local_path, e))?;
        written += chunk.len();
    }
    file.flush()
        .await
        .map_err(|e| GatewayError::io(local_path, e))?;
    Ok(written)
}

fn log_transport(url: &str, err: TransportError) -> GatewayError {
    tracing::error!("request to {url} failed: {err}");
    GatewayError::Transport(err)
}

fn file_name_from_url(url: &str) -> GatewayResult<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(|name| {
            urlencoding::decode(name)
                .map(|n| n.into_owned())
                .unwrap_or_else(|_| name.to_string())
        })
        .ok_or_else(|| {
            GatewayError::InvalidArgument(format!("can not derive a file name from {url}"))
        })
}

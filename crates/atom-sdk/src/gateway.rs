//! Gateway API operations
//!
//! Each method shapes one request and hands it to [`GatewayClient`]. They
//! all return a [`GatewayResult`]; failures are logged by the client and
//! surface as values, so plugin code can branch on them directly.

use std::collections::HashMap;
use std::path::PathBuf;

use reqwest::header::{
    HeaderMap,
    HeaderValue,
    CONTENT_TYPE,
};
use serde_json::Value;

use crate::artifact::{
    qualified_path,
    ArtifactSource,
    BuildRef,
};
use crate::client::GatewayClient;
use crate::error::{
    GatewayError,
    GatewayResult,
};
use crate::types::{
    ArtifactFileDetail,
    Credential,
    RepositoryInfo,
};

/// Lifetime of resolved download URLs, in seconds.
pub const DOWNLOAD_URL_TTL: u64 = 3600 * 24;

impl GatewayClient {
    /// Fetches a credential's content by its id.
    pub async fn get_credential(&self, credential_id: &str) -> GatewayResult<Credential> {
        let path = format!(
            "/ticket/api/build/credentials/{}/detail",
            urlencoding::encode(credential_id)
        );
        self.get(&self.url(&path, &[])).await
    }

    /// Resolves download URLs for archived artifacts matching `file_path`.
    pub async fn get_artifacts_url(
        &self, source: ArtifactSource, file_path: &str, build: &BuildRef,
    ) -> GatewayResult<Vec<String>> {
        let mut params = vec![
            ("artifactoryType", source.to_string()),
            ("path", file_path.to_string()),
            ("ttl", DOWNLOAD_URL_TTL.to_string()),
        ];
        params.extend(build.query_params()?);

        let url = self.url(
            "/artifactory/api/build/artifactories/thirdPartyDownloadUrl",
            &params,
        );
        let urls: Option<Vec<String>> = self.get(&url).await?;
        Ok(urls.unwrap_or_default())
    }

    /// Fetches metadata for archived artifacts matching `file_path`.
    pub async fn get_artifacts_properties(
        &self, source: ArtifactSource, file_path: &str, build: &BuildRef,
    ) -> GatewayResult<Vec<ArtifactFileDetail>> {
        let mut params = vec![
            ("artifactoryType", source.to_string()),
            ("path", file_path.to_string()),
        ];
        params.extend(build.query_params()?);

        let url = self.url(
            "/artifactory/api/build/artifactories/getPropertiesByRegex",
            &params,
        );
        let details: Option<Vec<ArtifactFileDetail>> = self.get(&url).await?;
        Ok(details.unwrap_or_default())
    }

    /// Downloads the single artifact matching `file_path`.
    ///
    /// Zero or several matches are an error; this never picks one for the
    /// caller.
    pub async fn download_file(
        &self, source: ArtifactSource, file_path: &str, build: &BuildRef,
        local_name: Option<&str>,
    ) -> GatewayResult<PathBuf> {
        let urls = self.get_artifacts_url(source, file_path, build).await?;

        match urls.as_slice() {
            [url] => self.download_url(url, local_name).await,
            [] => {
                let err = GatewayError::ArtifactNotFound {
                    file_src: source.to_string(),
                    path: file_path.to_string(),
                };
                tracing::error!("{err}");
                Err(err)
            }
            many => {
                let err = GatewayError::AmbiguousArtifact {
                    path: file_path.to_string(),
                    count: many.len(),
                };
                tracing::error!("{err}");
                Err(err)
            }
        }
    }

    /// Looks up a code repository by id or alias.
    pub async fn get_repo_info(
        &self, identity: &str, identity_type: &str,
    ) -> GatewayResult<RepositoryInfo> {
        let url = self.url(
            "/repository/api/build/repositories/",
            &[
                ("repositoryId", identity.to_string()),
                ("repositoryType", identity_type.to_string()),
            ],
        );
        self.get(&url).await
    }

    /// Replaces the metadata of an archived artifact.
    ///
    /// Pipeline artifact paths are resolved under the current pipeline build,
    /// so the client needs a build scope for [`ArtifactSource::Pipeline`].
    pub async fn set_properties(
        &self, source: ArtifactSource, file_path: &str, properties: &HashMap<String, String>,
    ) -> GatewayResult<()> {
        let path = qualified_path(source, file_path, self.build_scope())?;
        let url = self.url(
            "/artifactory/api/build/artifactories/properties",
            &[("artifactoryType", source.to_string()), ("path", path)],
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = serde_json::to_vec(properties)?;

        let _: Value = self.post(&url, &headers, Some(body)).await?;
        Ok(())
    }

    /// Reads a build-context variable of the current build.
    ///
    /// The value is returned as the gateway sent it; an unset variable is
    /// `Value::Null`.
    pub async fn get_context_by_name(&self, context_name: &str) -> GatewayResult<Value> {
        let url = self.url(
            "/process/api/build/variable/get_build_context",
            &[
                ("contextName", context_name.to_string()),
                ("check", "true".to_string()),
            ],
        );
        self.get(&url).await
    }
}

//! Artifact addressing
//!
//! An artifact lives in one of two storage roots: the files archived by a
//! pipeline build, or a project's custom directory. Lookups may also target
//! another pipeline's build, which requires both the project and pipeline id.

use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::{
    GatewayError,
    GatewayResult,
};

/// Build number meaning "the most recent build".
pub const LATEST_BUILD: &str = "-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactSource {
    Pipeline,
    CustomDir,
}

impl ArtifactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactSource::Pipeline => "PIPELINE",
            ArtifactSource::CustomDir => "CUSTOM_DIR",
        }
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactSource {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PIPELINE" => Ok(ArtifactSource::Pipeline),
            "CUSTOM_DIR" => Ok(ArtifactSource::CustomDir),
            other => Err(GatewayError::InvalidArgument(format!(
                "unknown artifact source: {other}"
            ))),
        }
    }
}

/// The pipeline and build the plugin is running in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildScope {
    pub pipeline_id: String,
    pub build_id: String,
}

/// Selects which build's artifacts a lookup reads.
///
/// Empty strings count as absent. With neither id the gateway uses the
/// current build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRef {
    pub project_id: Option<String>,
    pub pipeline_id: Option<String>,
    pub build_no: Option<String>,
}

impl BuildRef {
    /// The build the plugin is running in.
    pub fn current() -> Self {
        Self::default()
    }

    /// The most recent build of another pipeline.
    pub fn latest(project_id: impl Into<String>, pipeline_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            pipeline_id: Some(pipeline_id.into()),
            build_no: None,
        }
    }

    pub fn build(
        project_id: impl Into<String>, pipeline_id: impl Into<String>, build_no: impl Into<String>,
    ) -> Self {
        Self {
            project_id: Some(project_id.into()),
            pipeline_id: Some(pipeline_id.into()),
            build_no: Some(build_no.into()),
        }
    }

    /// Validates the id pairing and returns the query parameters it adds.
    pub fn query_params(&self) -> GatewayResult<Vec<(&'static str, String)>> {
        let project_id = non_empty(&self.project_id);
        let pipeline_id = non_empty(&self.pipeline_id);
        let build_no = non_empty(&self.build_no);

        match (project_id, pipeline_id) {
            (Some(project_id), Some(pipeline_id)) => Ok(vec![
                ("projectId", project_id.to_string()),
                ("pipelineId", pipeline_id.to_string()),
                ("buildNo", build_no.unwrap_or(LATEST_BUILD).to_string()),
            ]),
            (Some(_), None) => Err(GatewayError::InvalidArgument(
                "pipelineId is null".to_string(),
            )),
            (None, Some(_)) => Err(GatewayError::InvalidArgument(
                "projectId is null".to_string(),
            )),
            (None, None) if build_no.is_some() => Err(GatewayError::InvalidArgument(
                "buildNo requires both projectId and pipelineId".to_string(),
            )),
            (None, None) => Ok(Vec::new()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Namespaces `file_path` under its storage root.
///
/// Pipeline artifacts live under `/{pipeline_id}/{build_id}/`; custom
/// directory artifacts sit at the root. At most one leading slash of
/// `file_path` is dropped.
pub fn qualified_path(
    source: ArtifactSource, file_path: &str, scope: Option<&BuildScope>,
) -> GatewayResult<String> {
    let relative = file_path.strip_prefix('/').unwrap_or(file_path);

    match source {
        ArtifactSource::Pipeline => {
            let scope = scope.ok_or_else(|| {
                GatewayError::InvalidArgument("pipeline.id is null".to_string())
            })?;
            Ok(format!(
                "/{}/{}/{}",
                scope.pipeline_id, scope.build_id, relative
            ))
        }
        ArtifactSource::CustomDir => Ok(format!("/{relative}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> BuildScope {
        BuildScope {
            pipeline_id: "p-1".to_string(),
            build_id: "b-1".to_string(),
        }
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(ArtifactSource::Pipeline.to_string(), "PIPELINE");
        assert_eq!(ArtifactSource::CustomDir.to_string(), "CUSTOM_DIR");
        assert_eq!(
            "CUSTOM_DIR".parse::<ArtifactSource>().unwrap(),
            ArtifactSource::CustomDir
        );
        assert!("custom".parse::<ArtifactSource>().is_err());
        assert_eq!(
            serde_json::to_string(&ArtifactSource::CustomDir).unwrap(),
            "\"CUSTOM_DIR\""
        );
    }

    #[test]
    fn test_current_build_adds_nothing() {
        assert!(BuildRef::current().query_params().unwrap().is_empty());
    }

    #[test]
    fn test_latest_build_defaults_build_no() {
        let params = BuildRef::latest("proj", "pipe").query_params().unwrap();
        assert_eq!(
            params,
            vec![
                ("projectId", "proj".to_string()),
                ("pipelineId", "pipe".to_string()),
                ("buildNo", "-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_explicit_build_no() {
        let params = BuildRef::build("proj", "pipe", "17").query_params().unwrap();
        assert_eq!(params[2], ("buildNo", "17".to_string()));
    }

    #[test]
    fn test_missing_pipeline_id() {
        let build = BuildRef {
            project_id: Some("proj".to_string()),
            ..Default::default()
        };
        let err = build.query_params().unwrap_err();
        assert_eq!(err.to_string(), "pipelineId is null");
    }

    #[test]
    fn test_missing_project_id() {
        let build = BuildRef {
            pipeline_id: Some("pipe".to_string()),
            project_id: Some(String::new()),
            ..Default::default()
        };
        let err = build.query_params().unwrap_err();
        assert_eq!(err.to_string(), "projectId is null");
    }

    #[test]
    fn test_build_no_without_ids() {
        let build = BuildRef {
            build_no: Some("3".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build.query_params(),
            Err(GatewayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pipeline_path() {
        let s = scope();
        assert_eq!(
            qualified_path(ArtifactSource::Pipeline, "/dist/app.zip", Some(&s)).unwrap(),
            "/p-1/b-1/dist/app.zip"
        );
        assert_eq!(
            qualified_path(ArtifactSource::Pipeline, "dist/app.zip", Some(&s)).unwrap(),
            "/p-1/b-1/dist/app.zip"
        );
    }

    #[test]
    fn test_custom_dir_path_strips_one_slash() {
        assert_eq!(
            qualified_path(ArtifactSource::CustomDir, "//release/app.zip", None).unwrap(),
            "//release/app.zip"
        );
        assert_eq!(
            qualified_path(ArtifactSource::CustomDir, "release/app.zip", None).unwrap(),
            "/release/app.zip"
        );
    }

    #[test]
    fn test_pipeline_path_requires_scope() {
        assert!(qualified_path(ArtifactSource::Pipeline, "a.txt", None).is_err());
    }
}

//! Gateway payload types
//!
//! Each type describes the `data` field of one endpoint's envelope. Fields
//! the SDK does not model are kept in `extra` rather than dropped.

use std::collections::HashMap;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(default)]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub v1: Option<String>,
    #[serde(default)]
    pub v2: Option<String>,
    #[serde(default)]
    pub v3: Option<String>,
    #[serde(default)]
    pub v4: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    #[serde(default)]
    pub alias_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub repository_hash_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default, rename = "@type")]
    pub repository_type: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactProperty {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactFileDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub full_path: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub folder: Option<bool>,
    #[serde(default)]
    pub modified_time: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<ArtifactProperty>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ArtifactFileDetail {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_keeps_unknown_fields() {
        let credential: Credential = serde_json::from_value(serde_json::json!({
            "credentialType": "USERNAME_PASSWORD",
            "publicKey": "pk",
            "v1": "user",
            "v2": "pass",
            "allowAcrossProject": true
        }))
        .unwrap();

        assert_eq!(credential.credential_type.as_deref(), Some("USERNAME_PASSWORD"));
        assert_eq!(credential.v1.as_deref(), Some("user"));
        assert!(credential.v3.is_none());
        assert_eq!(credential.extra["allowAcrossProject"], Value::Bool(true));
    }

    #[test]
    fn test_repository_type_tag() {
        let repo: RepositoryInfo = serde_json::from_value(serde_json::json!({
            "@type": "codeGit",
            "aliasName": "backend",
            "url": "https://git.example.com/org/backend.git"
        }))
        .unwrap();

        assert_eq!(repo.repository_type.as_deref(), Some("codeGit"));
        assert_eq!(repo.alias_name.as_deref(), Some("backend"));
    }

    #[test]
    fn test_artifact_property_lookup() {
        let detail: ArtifactFileDetail = serde_json::from_value(serde_json::json!({
            "name": "app.tar.gz",
            "fullPath": "/p-1/b-1/app.tar.gz",
            "size": 1024,
            "folder": false,
            "properties": [{"key": "commit", "value": "abc123"}]
        }))
        .unwrap();

        assert_eq!(detail.property("commit"), Some("abc123"));
        assert_eq!(detail.property("missing"), None);
        assert_eq!(detail.size, Some(1024));
    }

    #[test]
    fn test_null_property_value() {
        let detail: ArtifactFileDetail = serde_json::from_value(serde_json::json!({
            "name": "a",
            "properties": [{"key": "k", "value": null}, {"key": "commit", "value": "abc"}]
        }))
        .unwrap();

        assert_eq!(detail.property("k"), Some(""));
        assert_eq!(detail.property("commit"), Some("abc"));
    }

    #[test]
    fn test_null_properties() {
        let detail: ArtifactFileDetail =
            serde_json::from_value(serde_json::json!({"name": "a", "properties": null})).unwrap();
        assert!(detail.properties.is_empty());
    }
}

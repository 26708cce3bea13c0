//! # OCI Manifest Types and Discriminator
//!
//! The `v1/oci_manifest` capability answers with one of two incompatible
//! documents wrapped in an untyped object:
//!
//! ```json
//! { "image": { "schemaVersion": 2, "mediaType": "...manifest...", "config": {...}, "layers": [...] } }
//! { "index": { "schemaVersion": 2, "mediaType": "...index...",    "manifests": [...] } }
//! ```
//!
//! The wrapper key alone is not trusted. [`classify`] decides the variant
//! from the nested `mediaType` string:
//!
//! ```text
//!                      ┌───────────────┐
//!                      │ Unclassified  │
//!                      └───────┬───────┘
//!      image.mediaType ∈       │       index.mediaType ∈
//!      IMAGE_MANIFEST_MEDIA_   │       IMAGE_INDEX_MEDIA_TYPES
//!      TYPES                   │
//!         ┌────────────────────┼────────────────────┐
//!         ▼                    ▼                    ▼
//!     ┌───────┐          ┌──────────┐          ┌───────┐
//!     │ Image │          │ Rejected │          │ Index │
//!     └───────┘          └──────────┘          └───────┘
//! ```
//!
//! Anything else (unknown media type, missing media type, neither key) is
//! rejected with "cannot decode response". An image manifest that the host
//! labels with an index media type is rejected, not reinterpreted.
//!
//! No other field takes part in the decision. Every field of the typed
//! views defaults when absent, and a nested document whose fields have the
//! wrong JSON types still classifies: its typed view keeps only the media
//! type.
//!
//! ## Field Names
//!
//! Field names follow the OCI image spec (`mediaType`, `os.version`,
//! `rootfs.diff_ids`, `Env`, ...). Camel-case aliases emitted by some
//! hosts are accepted on input.

use crate::constants::{IMAGE_INDEX_MEDIA_TYPES, IMAGE_MANIFEST_MEDIA_TYPES};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Reason attached to every rejected classification.
pub const CANNOT_DECODE_RESPONSE: &str = "cannot decode response";

// =============================================================================
// OCI Image Spec Types
// =============================================================================

/// Reference to content in a registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub digest: String,
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
    /// Embedded content, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Platform hint; set on index entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
}

/// Platform an image runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(
        rename = "os.version",
        alias = "osVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub os_version: Option<String>,
    #[serde(
        rename = "os.features",
        alias = "osFeatures",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub os_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Single-platform image manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageManifest {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

/// Multi-platform image index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageIndex {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl ImageIndex {
    /// Finds the entry for `os`/`architecture`, if the index has one.
    pub fn find_platform(&self, os: &str, architecture: &str) -> Option<&Descriptor> {
        self.manifests.iter().find(|d| {
            d.platform
                .as_ref()
                .is_some_and(|p| p.os == os && p.architecture == architecture)
        })
    }
}

/// Image configuration blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub architecture: String,
    pub os: String,
    #[serde(
        rename = "os.version",
        alias = "osVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ContainerConfig>,
    #[serde(default)]
    pub rootfs: RootFs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<History>>,
}

/// Execution defaults baked into an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, alias = "exposedPorts", skip_serializing_if = "Option::is_none")]
    pub exposed_ports: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, alias = "env", skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,
    #[serde(default, alias = "entrypoint", skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    #[serde(default, alias = "cmd", skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
    #[serde(default, alias = "volumes", skip_serializing_if = "Option::is_none")]
    pub volumes: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, alias = "workingDir", skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, alias = "labels", skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default, alias = "stopSignal", skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<String>,
    #[serde(default, alias = "argsEscaped", skip_serializing_if = "Option::is_none")]
    pub args_escaped: Option<bool>,
}

/// Layer content addresses of the root filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootFs {
    #[serde(rename = "type", default)]
    pub fs_type: String,
    #[serde(default, alias = "diffIds")]
    pub diff_ids: Vec<String>,
}

/// One step of the image build history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, alias = "createdBy", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, alias = "emptyLayer", skip_serializing_if = "Option::is_none")]
    pub empty_layer: Option<bool>,
}

// =============================================================================
// Discriminator
// =============================================================================

/// Response of the `v1/oci_manifest` capability.
///
/// Always exactly one variant; the tag is computed by [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum OciManifestResponse {
    /// Single-platform image manifest.
    Image(ImageManifest),
    /// Multi-platform image index.
    Index(ImageIndex),
}

impl OciManifestResponse {
    /// Returns the image manifest, if this is one.
    pub fn image(&self) -> Option<&ImageManifest> {
        match self {
            Self::Image(manifest) => Some(manifest),
            Self::Index(_) => None,
        }
    }

    /// Returns the image index, if this is one.
    pub fn index(&self) -> Option<&ImageIndex> {
        match self {
            Self::Index(index) => Some(index),
            Self::Image(_) => None,
        }
    }

    /// Returns the media type the variant was classified from.
    pub fn media_type(&self) -> Option<&str> {
        match self {
            Self::Image(manifest) => manifest.media_type.as_deref(),
            Self::Index(index) => index.media_type.as_deref(),
        }
    }
}

/// Returns true if `media_type` names an image manifest.
pub fn is_image_manifest_media_type(media_type: &str) -> bool {
    IMAGE_MANIFEST_MEDIA_TYPES.contains(&media_type)
}

/// Returns true if `media_type` names an image index.
pub fn is_image_index_media_type(media_type: &str) -> bool {
    IMAGE_INDEX_MEDIA_TYPES.contains(&media_type)
}

/// Classifies a raw `v1/oci_manifest` reply.
///
/// # Errors
///
/// Returns [`Error::Decode`] with reason [`CANNOT_DECODE_RESPONSE`] if the
/// bytes are not JSON or [`classify`] rejects them.
pub fn classify_reply(bytes: &[u8]) -> Result<OciManifestResponse> {
    let value = serde_json::from_slice(bytes).map_err(|_| rejected())?;
    classify(value)
}

/// Classifies a decoded `v1/oci_manifest` reply.
///
/// The decision depends only on the nested `mediaType` strings.
///
/// # Errors
///
/// Returns [`Error::Decode`] with reason [`CANNOT_DECODE_RESPONSE`] if
/// neither key carries an accepted media type.
pub fn classify(value: serde_json::Value) -> Result<OciManifestResponse> {
    let serde_json::Value::Object(mut wrapper) = value else {
        return Err(rejected());
    };

    if let Some(image) = wrapper.remove("image")
        && let Some(media_type) = nested_media_type(&image)
        && is_image_manifest_media_type(media_type)
    {
        let manifest = serde_json::from_value(image.clone()).unwrap_or_else(|e| {
            warn!("keeping media type only for image manifest: {}", e);
            ImageManifest {
                media_type: Some(media_type.to_string()),
                ..Default::default()
            }
        });
        return Ok(OciManifestResponse::Image(manifest));
    }

    if let Some(index) = wrapper.remove("index")
        && let Some(media_type) = nested_media_type(&index)
        && is_image_index_media_type(media_type)
    {
        let index_view = serde_json::from_value(index.clone()).unwrap_or_else(|e| {
            warn!("keeping media type only for image index: {}", e);
            ImageIndex {
                media_type: Some(media_type.to_string()),
                ..Default::default()
            }
        });
        return Ok(OciManifestResponse::Index(index_view));
    }

    Err(rejected())
}

fn nested_media_type(value: &serde_json::Value) -> Option<&str> {
    value.get("mediaType").and_then(serde_json::Value::as_str)
}

fn rejected() -> Error {
    Error::decode("OciManifestResponse", CANNOT_DECODE_RESPONSE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use serde_json::json;

    #[test]
    fn non_object_is_rejected() {
        assert!(classify(json!("application/vnd.oci.image.index.v1+json")).is_err());
        assert!(classify(json!(null)).is_err());
    }

    #[test]
    fn missing_media_type_is_rejected() {
        let value = json!({"image": {
            "schemaVersion": 2,
            "config": {"mediaType": OCI_IMAGE_CONFIG_MEDIA_TYPE, "digest": "sha256:a", "size": 1},
            "layers": []
        }});
        assert!(classify(value).is_err());
    }

    #[test]
    fn falls_through_to_index_when_image_type_unknown() {
        let value = json!({
            "image": {"schemaVersion": 2, "mediaType": OCI_DESCRIPTOR_MEDIA_TYPE},
            "index": {"schemaVersion": 2, "mediaType": OCI_IMAGE_INDEX_MEDIA_TYPE, "manifests": []}
        });
        assert!(classify(value).unwrap().index().is_some());
    }

    #[test]
    fn wrong_field_types_keep_media_type() {
        let value = json!({
            "image": {"mediaType": OCI_IMAGE_MANIFEST_MEDIA_TYPE, "schemaVersion": "two"}
        });
        let response = classify(value).unwrap();
        let manifest = response.image().unwrap();
        assert_eq!(manifest.media_type.as_deref(), Some(OCI_IMAGE_MANIFEST_MEDIA_TYPE));
        assert_eq!(manifest.schema_version, 0);
    }

    #[test]
    fn non_json_reply_is_rejected() {
        let err = classify_reply(b"<html>").unwrap_err();
        assert!(err.to_string().contains(CANNOT_DECODE_RESPONSE));
    }

    #[test]
    fn find_platform_matches_os_and_arch() {
        let index: ImageIndex = serde_json::from_value(json!({
            "schemaVersion": 2,
            "manifests": [
                {"mediaType": OCI_IMAGE_MANIFEST_MEDIA_TYPE, "digest": "sha256:arm", "size": 1,
                 "platform": {"architecture": "arm64", "os": "linux"}},
                {"mediaType": OCI_IMAGE_MANIFEST_MEDIA_TYPE, "digest": "sha256:amd", "size": 1,
                 "platform": {"architecture": "amd64", "os": "linux", "os.version": "6.1"}}
            ]
        }))
        .unwrap();
        let found = index.find_platform("linux", "amd64").unwrap();
        assert_eq!(found.digest, "sha256:amd");
        assert_eq!(found.platform.as_ref().unwrap().os_version.as_deref(), Some("6.1"));
        assert!(index.find_platform("windows", "amd64").is_none());
    }
}

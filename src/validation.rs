//! # Request and Response Envelopes
//!
//! One [`ValidationRequest`] is read per invocation and one
//! [`PolicyResponse`] is written. The admission payload and the policy
//! settings are carried as opaque JSON: the bridge never interprets them,
//! the policy deserializes them against its own schema.
//!
//! ## Wire Shapes
//!
//! ```json
//! { "request": { "uid": "...", "kind": {...}, "object": {...} }, "settings": {...} }
//! ```
//!
//! ```json
//! { "accepted": false, "message": "privileged containers are not allowed", "code": 403 }
//! { "valid": true }
//! ```
//!
//! Absent optional fields are omitted from the output, never sent as `null`.

use crate::constants::{ACTION_VALIDATE, ACTION_VALIDATE_SETTINGS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Action Selector
// =============================================================================

/// Entry point selected by the process argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    /// Validate an admission request.
    Validate,
    /// Validate the policy settings.
    ValidateSettings,
}

impl FromStr for PolicyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ACTION_VALIDATE => Ok(Self::Validate),
            ACTION_VALIDATE_SETTINGS => Ok(Self::ValidateSettings),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => f.write_str(ACTION_VALIDATE),
            Self::ValidateSettings => f.write_str(ACTION_VALIDATE_SETTINGS),
        }
    }
}

// =============================================================================
// Request Envelope
// =============================================================================

/// Top-level input for the `validate` action.
///
/// `S` is the policy's settings type; it defaults to raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest<S = serde_json::Value> {
    /// The admission request forwarded by the API server.
    pub request: AdmissionRequest,
    /// Policy settings as configured by the operator.
    pub settings: S,
}

/// Kubernetes admission request.
///
/// `object`, `old_object` and `options` are opaque resource documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Unique identifier of this admission call.
    pub uid: String,
    /// Kind of the object being admitted.
    pub kind: GroupVersionKind,
    /// Resource being admitted.
    pub resource: GroupVersionResource,
    /// Subresource, if any (e.g. `status`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    /// Kind originally requested, when the API server converted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_kind: Option<GroupVersionKind>,
    /// Resource originally requested, when the API server converted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_resource: Option<GroupVersionResource>,
    /// Subresource originally requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_sub_resource: Option<String>,
    /// Object name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Object namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Operation (`CREATE`, `UPDATE`, `DELETE`, `CONNECT`).
    pub operation: String,
    /// Requesting user.
    #[serde(default)]
    pub user_info: UserInfo,
    /// New object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
    /// Existing object, for updates and deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_object: Option<serde_json::Value>,
    /// Whether the request is a dry run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    /// Operation options (e.g. `CreateOptions`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

/// API group, version and kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

/// API group, version and resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub resource: String,
}

/// Identity of the requesting user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<HashMap<String, Vec<String>>>,
}

// =============================================================================
// Response Envelope
// =============================================================================

/// The single document written at the end of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyResponse {
    /// Result of `validate`.
    Validation(ValidationResponse),
    /// Result of `validate-settings`.
    Settings(SettingsValidationResponse),
}

impl From<ValidationResponse> for PolicyResponse {
    fn from(response: ValidationResponse) -> Self {
        Self::Validation(response)
    }
}

impl From<SettingsValidationResponse> for PolicyResponse {
    fn from(response: SettingsValidationResponse) -> Self {
        Self::Settings(response)
    }
}

/// Result of settings validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsValidationResponse {
    /// Whether the settings are usable.
    pub valid: bool,
    /// Explanation, usually present when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SettingsValidationResponse {
    /// Settings are valid.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// Settings are invalid for the given reason.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Result of request validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Whether the request is admitted.
    pub accepted: bool,
    /// Explanation shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// HTTP-style status code for rejections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Replacement object for mutating policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutated_object: Option<serde_json::Value>,
    /// Annotations recorded in the audit log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_annotations: Option<HashMap<String, String>>,
    /// Warnings returned to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ValidationResponse {
    /// Adds an audit annotation.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.audit_annotations
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Adds a client warning.
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.get_or_insert_with(Vec::new).push(warning.into());
        self
    }
}

/// Admits the request unchanged.
#[must_use]
pub fn accept_request() -> ValidationResponse {
    ValidationResponse {
        accepted: true,
        ..Default::default()
    }
}

/// Rejects the request.
#[must_use]
pub fn reject_request(message: impl Into<String>, code: Option<u16>) -> ValidationResponse {
    ValidationResponse {
        accepted: false,
        message: Some(message.into()),
        code,
        ..Default::default()
    }
}

/// Admits the request with `object` replacing the submitted one.
#[must_use]
pub fn mutate_request(object: serde_json::Value) -> ValidationResponse {
    ValidationResponse {
        accepted: true,
        mutated_object: Some(object),
        ..Default::default()
    }
}

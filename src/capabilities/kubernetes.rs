//! Kubernetes API access through the host.
//!
//! Resources come back as opaque documents. Callers pick the type: raw
//! [`serde_json::Value`], or their own struct for the kind they asked for.

use super::call_capability;
use crate::constants::{
    HOST_BINDING, NAMESPACE_KUBERNETES, OP_CAN_I, OP_GET_RESOURCE, OP_LIST_RESOURCES_ALL,
    OP_LIST_RESOURCES_BY_NAMESPACE,
};
use crate::error::Result;
use crate::host::{CapabilityAddress, Dispatcher, HostBackend};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const GET_RESOURCE: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_KUBERNETES, OP_GET_RESOURCE);

pub const LIST_RESOURCES_BY_NAMESPACE: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_KUBERNETES, OP_LIST_RESOURCES_BY_NAMESPACE);

pub const LIST_RESOURCES_ALL: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_KUBERNETES, OP_LIST_RESOURCES_ALL);

pub const CAN_I: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_KUBERNETES, OP_CAN_I);

// =============================================================================
// Requests
// =============================================================================

/// Fetch one object by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResourceRequest {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    /// Omitted for cluster-scoped kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Bypass the host's cache.
    #[serde(default)]
    pub disable_cache: bool,
}

/// List objects in one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResourcesByNamespaceRequest {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_selector: Option<String>,
}

/// List objects across the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAllResourcesRequest {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_selector: Option<String>,
}

/// Ask whether a subject may perform a verb on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanIRequest {
    pub subject_access_review: SubjectAccessReview,
    #[serde(default)]
    pub disable_cache: bool,
}

/// Subject and resource of an access review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAccessReview {
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    pub resource_attributes: ResourceAttributes,
}

/// The resource half of an access review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub verb: String,
    /// API group; empty for the core group.
    #[serde(default)]
    pub group: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subresource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// A Kubernetes list document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Outcome of an access review.
///
/// A denial is a valid result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAccessReviewStatus {
    pub allowed: bool,
    #[serde(default)]
    pub denied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_error: Option<String>,
}

// =============================================================================
// Codecs
// =============================================================================

/// Fetches a single object.
pub fn get_resource<B, T>(host: &mut Dispatcher<B>, request: &GetResourceRequest) -> Result<T>
where
    B: HostBackend,
    T: DeserializeOwned,
{
    call_capability(host, &GET_RESOURCE, request)
}

/// Lists objects in a namespace.
pub fn list_resources_by_namespace<B, T>(
    host: &mut Dispatcher<B>,
    request: &ListResourcesByNamespaceRequest,
) -> Result<ObjectList<T>>
where
    B: HostBackend,
    T: DeserializeOwned,
{
    call_capability(host, &LIST_RESOURCES_BY_NAMESPACE, request)
}

/// Lists objects across all namespaces.
pub fn list_all_resources<B, T>(
    host: &mut Dispatcher<B>,
    request: &ListAllResourcesRequest,
) -> Result<ObjectList<T>>
where
    B: HostBackend,
    T: DeserializeOwned,
{
    call_capability(host, &LIST_RESOURCES_ALL, request)
}

/// Runs a subject access review.
pub fn can_i<B: HostBackend>(
    host: &mut Dispatcher<B>,
    request: &CanIRequest,
) -> Result<SubjectAccessReviewStatus> {
    call_capability(host, &CAN_I, request)
}

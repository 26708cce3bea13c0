//! OCI registry queries through the host.
//!
//! All three capabilities take the image reference as a JSON string, e.g.
//! `"ghcr.io/kubewarden/policies/pod-privileged:v0.1.10"`.

use super::{call_capability, call_raw};
use crate::constants::{
    HOST_BINDING, NAMESPACE_OCI, OP_MANIFEST_DIGEST, OP_OCI_MANIFEST, OP_OCI_MANIFEST_CONFIG,
};
use crate::error::Result;
use crate::host::{CapabilityAddress, Dispatcher, HostBackend};
use crate::manifest::{self, ImageConfiguration, ImageManifest, OciManifestResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MANIFEST_DIGEST: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_OCI, OP_MANIFEST_DIGEST);

pub const OCI_MANIFEST: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_OCI, OP_OCI_MANIFEST);

pub const OCI_MANIFEST_CONFIG: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_OCI, OP_OCI_MANIFEST_CONFIG);

/// Reply of `v1/manifest_digest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDigestResponse {
    pub digest: String,
}

/// Reply of `v1/oci_manifest_config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestAndConfigResponse {
    pub manifest: ImageManifest,
    pub digest: String,
    pub config: ImageConfiguration,
}

/// Returns the digest of the object `image` refers to.
pub fn manifest_digest<B: HostBackend>(host: &mut Dispatcher<B>, image: &str) -> Result<String> {
    let response: ManifestDigestResponse = call_capability(host, &MANIFEST_DIGEST, image)?;
    Ok(response.digest)
}

/// Fetches the manifest of `image`, which may be an image or an index.
///
/// The variant is decided by [`manifest::classify`]. A reply that is not
/// JSON is rejected the same way as an unclassifiable one.
pub fn manifest<B: HostBackend>(
    host: &mut Dispatcher<B>,
    image: &str,
) -> Result<OciManifestResponse> {
    let reply = call_raw(host, &OCI_MANIFEST, image)?;
    let response = manifest::classify_reply(&reply)?;
    debug!(image, media_type = ?response.media_type(), "classified manifest");
    Ok(response)
}

/// Fetches the image manifest, its digest, and its configuration blob.
pub fn manifest_and_config<B: HostBackend>(
    host: &mut Dispatcher<B>,
    image: &str,
) -> Result<ManifestAndConfigResponse> {
    call_capability(host, &OCI_MANIFEST_CONFIG, image)
}

//! # Bridge Constants
//!
//! Fixed values shared by the byte channel, the host call dispatcher and the
//! capability codecs. These constants are the **single source of truth** for
//! the wire contract between the guest and the host.
//!
//! ## Modification Guidelines
//!
//! Capability addresses and media types are part of the host contract.
//! Changing any of them breaks compatibility with deployed hosts:
//! 1. Confirm the host exposes the new name
//! 2. Update the address table in [`crate::host`] docs
//! 3. Update `tests/constants_tests.rs`
//!
//! ## Cross-References
//!
//! - [`crate::channel`]: Uses descriptors and chunk size
//! - [`crate::capabilities`]: Uses namespaces and operations
//! - [`crate::manifest`]: Uses the media type allow-lists

// =============================================================================
// Byte Channel
// =============================================================================

/// Input descriptor carrying the request envelope and every host reply.
pub const STDIN_FD: u32 = 0;

/// Output descriptor carrying the response envelope.
pub const STDOUT_FD: u32 = 1;

/// Size of the fixed buffer handed to each blocking read (1 KiB).
///
/// Input length is unbounded; this only sets how many bytes a single read
/// may return. The assembled buffer grows to the sum of all chunks.
pub const READ_CHUNK_SIZE: usize = 1024;

// =============================================================================
// Capability Addresses
// =============================================================================
//
// Every host call is addressed by (binding, namespace, operation). The
// binding is the same literal for every call this bridge makes.
// =============================================================================

/// Vendor binding used for every host call.
pub const HOST_BINDING: &str = "kubewarden";

/// Namespace for certificate trust checks.
pub const NAMESPACE_CRYPTO: &str = "crypto";

/// Namespace for network lookups.
pub const NAMESPACE_NET: &str = "net";

/// Namespace for Kubernetes API access.
pub const NAMESPACE_KUBERNETES: &str = "kubernetes";

/// Namespace for OCI registry access and signature verification.
pub const NAMESPACE_OCI: &str = "oci";

/// Certificate trust verification.
pub const OP_IS_CERTIFICATE_TRUSTED: &str = "v1/is_certificate_trusted";

/// DNS hostname resolution.
pub const OP_DNS_LOOKUP_HOST: &str = "v1/dns_lookup_host";

/// Kubernetes single resource get.
pub const OP_GET_RESOURCE: &str = "get_resource";

/// Kubernetes namespace-scoped list.
pub const OP_LIST_RESOURCES_BY_NAMESPACE: &str = "list_resources_by_namespace";

/// Kubernetes cluster-wide list.
pub const OP_LIST_RESOURCES_ALL: &str = "list_resources_all";

/// Kubernetes subject access review.
pub const OP_CAN_I: &str = "can_i";

/// OCI manifest digest lookup.
pub const OP_MANIFEST_DIGEST: &str = "v1/manifest_digest";

/// OCI manifest fetch (image manifest or image index).
pub const OP_OCI_MANIFEST: &str = "v1/oci_manifest";

/// OCI manifest and config fetch.
pub const OP_OCI_MANIFEST_CONFIG: &str = "v1/oci_manifest_config";

/// Signature verification, all four modes.
pub const OP_VERIFY_V2: &str = "v2/verify";

// =============================================================================
// OCI Media Types
// =============================================================================
//
// Reference: <https://github.com/opencontainers/image-spec/blob/main/media-types.md>
// =============================================================================

/// OCI Image Manifest media type (single-platform image).
pub const OCI_IMAGE_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// OCI Image Index media type (multi-platform manifest list).
pub const OCI_IMAGE_INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";

/// OCI Image Config media type.
pub const OCI_IMAGE_CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.image.config.v1+json";

/// OCI Descriptor media type.
pub const OCI_DESCRIPTOR_MEDIA_TYPE: &str = "application/vnd.oci.descriptor.v1+json";

/// OCI Layer media type (gzip-compressed tar archive).
pub const OCI_LAYER_MEDIA_TYPE_GZIP: &str = "application/vnd.oci.image.layer.v1.tar+gzip";

/// Docker Image Manifest V2, Schema 2.
pub const DOCKER_IMAGE_MANIFEST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.v2+json";

/// Docker Manifest List (multi-platform).
pub const DOCKER_MANIFEST_LIST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";

/// Media types accepted as an image manifest.
pub const IMAGE_MANIFEST_MEDIA_TYPES: [&str; 2] = [
    OCI_IMAGE_MANIFEST_MEDIA_TYPE,
    DOCKER_IMAGE_MANIFEST_MEDIA_TYPE,
];

/// Media types accepted as an image index.
pub const IMAGE_INDEX_MEDIA_TYPES: [&str; 2] =
    [OCI_IMAGE_INDEX_MEDIA_TYPE, DOCKER_MANIFEST_LIST_MEDIA_TYPE];

// =============================================================================
// Process Actions
// =============================================================================

/// Action selecting request validation.
pub const ACTION_VALIDATE: &str = "validate";

/// Action selecting settings validation.
pub const ACTION_VALIDATE_SETTINGS: &str = "validate-settings";

/// Message of the fixed rejection produced for an unknown action.
pub const WRONG_INVOCATION_MESSAGE: &str = "wrong invocation";

// =============================================================================
// Configuration Keys
// =============================================================================

/// Environment variable selecting the log level.
pub const ENV_LOG_LEVEL: &str = "KUBEBRIDGE_LOG";

/// Environment variable selecting how an absent certificate expiry is sent.
pub const ENV_NOT_AFTER: &str = "KUBEBRIDGE_NOT_AFTER";

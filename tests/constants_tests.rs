//! Tests for constants module.
//!
//! The host matches addresses and media types byte for byte, so these
//! values are pinned.

use kubebridge::capabilities::{crypto, kubernetes, net, oci, verify};
use kubebridge::constants::*;

// =============================================================================
// Channel
// =============================================================================

#[test]
fn test_standard_descriptors() {
    assert_eq!(STDIN_FD, 0);
    assert_eq!(STDOUT_FD, 1);
}

#[test]
fn test_read_chunk_size() {
    assert_eq!(READ_CHUNK_SIZE, 1024);
}

// =============================================================================
// Capability Addresses
// =============================================================================

#[test]
fn test_addresses_use_single_binding() {
    let addresses = [
        crypto::IS_CERTIFICATE_TRUSTED,
        net::DNS_LOOKUP_HOST,
        kubernetes::GET_RESOURCE,
        kubernetes::LIST_RESOURCES_BY_NAMESPACE,
        kubernetes::LIST_RESOURCES_ALL,
        kubernetes::CAN_I,
        oci::MANIFEST_DIGEST,
        oci::OCI_MANIFEST,
        oci::OCI_MANIFEST_CONFIG,
        verify::VERIFY_V2,
    ];

    for address in addresses {
        assert_eq!(address.binding, HOST_BINDING, "{} uses another binding", address);
    }
}

#[test]
fn test_address_strings() {
    assert_eq!(
        crypto::IS_CERTIFICATE_TRUSTED.to_string(),
        "kubewarden/crypto/v1/is_certificate_trusted"
    );
    assert_eq!(net::DNS_LOOKUP_HOST.to_string(), "kubewarden/net/v1/dns_lookup_host");
    assert_eq!(kubernetes::CAN_I.to_string(), "kubewarden/kubernetes/can_i");
    assert_eq!(oci::OCI_MANIFEST_CONFIG.to_string(), "kubewarden/oci/v1/oci_manifest_config");
    assert_eq!(verify::VERIFY_V2.to_string(), "kubewarden/oci/v2/verify");
}

// =============================================================================
// Media Types
// =============================================================================

#[test]
fn test_allow_lists_are_disjoint() {
    for media_type in IMAGE_MANIFEST_MEDIA_TYPES {
        assert!(
            !IMAGE_INDEX_MEDIA_TYPES.contains(&media_type),
            "{} is in both lists",
            media_type
        );
    }
}

#[test]
fn test_allow_lists_contents() {
    assert!(IMAGE_MANIFEST_MEDIA_TYPES.contains(&OCI_IMAGE_MANIFEST_MEDIA_TYPE));
    assert!(IMAGE_MANIFEST_MEDIA_TYPES.contains(&DOCKER_IMAGE_MANIFEST_MEDIA_TYPE));
    assert!(IMAGE_INDEX_MEDIA_TYPES.contains(&OCI_IMAGE_INDEX_MEDIA_TYPE));
    assert!(IMAGE_INDEX_MEDIA_TYPES.contains(&DOCKER_MANIFEST_LIST_MEDIA_TYPE));
    assert!(!IMAGE_MANIFEST_MEDIA_TYPES.contains(&OCI_IMAGE_CONFIG_MEDIA_TYPE));
}

// =============================================================================
// Entry
// =============================================================================

#[test]
fn test_actions() {
    assert_eq!(ACTION_VALIDATE, "validate");
    assert_eq!(ACTION_VALIDATE_SETTINGS, "validate-settings");
    assert_eq!(WRONG_INVOCATION_MESSAGE, "wrong invocation");
}

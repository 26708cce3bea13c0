//! Sigstore signature verification through the host.
//!
//! Four verification modes share one capability address and one response
//! shape. The mode travels as the `type` tag of the request:
//!
//! | Mode | Tag | Function |
//! |------|-----|----------|
//! | Public keys | `SigstorePubKeyVerify` | [`verify_pub_keys_image`] |
//! | Keyless, exact subject | `SigstoreKeylessVerify` | [`verify_keyless_exact_match`] |
//! | Keyless, subject prefix | `SigstoreKeylessPrefixVerify` | [`verify_keyless_prefix_match`] |
//! | Keyless, GitHub Actions | `SigstoreGithubActionsVerify` | [`verify_keyless_github_actions`] |

use super::call_capability;
use crate::constants::{HOST_BINDING, NAMESPACE_OCI, OP_VERIFY_V2};
use crate::error::Result;
use crate::host::{CapabilityAddress, Dispatcher, HostBackend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const VERIFY_V2: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_OCI, OP_VERIFY_V2);

/// OIDC issuer and exact subject of a keyless signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeylessInfo {
    pub issuer: String,
    pub subject: String,
}

/// OIDC issuer and subject URL prefix of a keyless signature.
///
/// The host normalizes `url_prefix` to end with `/`, so
/// `https://github.com/org` does not match `https://github.com/org-evil`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeylessPrefixInfo {
    pub issuer: String,
    pub url_prefix: String,
}

/// A verification request, tagged by mode.
///
/// `annotations` must have been supplied by every signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerifyRequest {
    SigstorePubKeyVerify {
        image: String,
        pub_keys: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<HashMap<String, String>>,
    },
    SigstoreKeylessVerify {
        image: String,
        keyless: Vec<KeylessInfo>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<HashMap<String, String>>,
    },
    SigstoreKeylessPrefixVerify {
        image: String,
        keyless_prefix: Vec<KeylessPrefixInfo>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<HashMap<String, String>>,
    },
    SigstoreGithubActionsVerify {
        image: String,
        owner: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repo: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<HashMap<String, String>>,
    },
}

/// Verdict shared by all modes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub is_trusted: bool,
    /// Digest of the verified object.
    pub digest: String,
}

/// Sends any verification request.
pub fn verify<B: HostBackend>(
    host: &mut Dispatcher<B>,
    request: &VerifyRequest,
) -> Result<VerificationResponse> {
    call_capability(host, &VERIFY_V2, request)
}

/// Verifies `image` was signed by every key in `pub_keys` (PEM).
pub fn verify_pub_keys_image<B: HostBackend>(
    host: &mut Dispatcher<B>,
    image: &str,
    pub_keys: Vec<String>,
    annotations: Option<HashMap<String, String>>,
) -> Result<VerificationResponse> {
    verify(
        host,
        &VerifyRequest::SigstorePubKeyVerify {
            image: image.to_string(),
            pub_keys,
            annotations,
        },
    )
}

/// Verifies keyless signatures with exact issuer and subject.
pub fn verify_keyless_exact_match<B: HostBackend>(
    host: &mut Dispatcher<B>,
    image: &str,
    keyless: Vec<KeylessInfo>,
    annotations: Option<HashMap<String, String>>,
) -> Result<VerificationResponse> {
    verify(
        host,
        &VerifyRequest::SigstoreKeylessVerify {
            image: image.to_string(),
            keyless,
            annotations,
        },
    )
}

/// Verifies keyless signatures whose subject starts with a URL prefix.
pub fn verify_keyless_prefix_match<B: HostBackend>(
    host: &mut Dispatcher<B>,
    image: &str,
    keyless_prefix: Vec<KeylessPrefixInfo>,
    annotations: Option<HashMap<String, String>>,
) -> Result<VerificationResponse> {
    verify(
        host,
        &VerifyRequest::SigstoreKeylessPrefixVerify {
            image: image.to_string(),
            keyless_prefix,
            annotations,
        },
    )
}

/// Verifies keyless signatures produced by a GitHub Actions workflow of
/// `owner` (and `repo`, when given).
pub fn verify_keyless_github_actions<B: HostBackend>(
    host: &mut Dispatcher<B>,
    image: &str,
    owner: &str,
    repo: Option<&str>,
    annotations: Option<HashMap<String, String>>,
) -> Result<VerificationResponse> {
    verify(
        host,
        &VerifyRequest::SigstoreGithubActionsVerify {
            image: image.to_string(),
            owner: owner.to_string(),
            repo: repo.map(str::to_string),
            annotations,
        },
    )
}

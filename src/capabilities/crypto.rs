//! Certificate trust checks through the host.
//!
//! The host verifies a certificate against a chain (intermediates first,
//! root last) and, optionally, against an expiry deadline. An empty chain
//! means the certificate is trusted on its own; an absent deadline means it
//! never expires.
//!
//! How an absent deadline is put on the wire is selected by
//! [`ExpiryEncoding`]: omitted by default, or sent as an empty string.

use super::call_capability;
use crate::config::ExpiryEncoding;
use crate::constants::{HOST_BINDING, NAMESPACE_CRYPTO, OP_IS_CERTIFICATE_TRUSTED};
use crate::error::Result;
use crate::host::{CapabilityAddress, Dispatcher, HostBackend};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const IS_CERTIFICATE_TRUSTED: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_CRYPTO, OP_IS_CERTIFICATE_TRUSTED);

/// Encoding of certificate bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateEncoding {
    Der,
    Pem,
}

/// An X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub encoding: CertificateEncoding,
    /// Raw bytes; sent as an array of numbers.
    pub data: Vec<u8>,
}

impl Certificate {
    /// Wraps PEM text.
    #[must_use]
    pub fn pem(text: &str) -> Self {
        Self {
            encoding: CertificateEncoding::Pem,
            data: text.as_bytes().to_vec(),
        }
    }

    /// Wraps DER bytes.
    #[must_use]
    pub fn der(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            encoding: CertificateEncoding::Der,
            data: bytes.into(),
        }
    }

    /// Returns the data as UTF-8 text, lossily.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// A certificate and the chain to verify it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateVerificationRequest {
    pub cert: Certificate,
    #[serde(default)]
    pub cert_chain: Vec<Certificate>,
    /// RFC 3339 instant the certificate must still be valid at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<String>,
}

impl CertificateVerificationRequest {
    /// Creates a request with no expiry deadline.
    #[must_use]
    pub fn new(cert: Certificate, cert_chain: Vec<Certificate>) -> Self {
        Self {
            cert,
            cert_chain,
            not_after: None,
        }
    }

    /// Sets the expiry deadline.
    #[must_use]
    pub fn with_not_after(mut self, not_after: impl Into<String>) -> Self {
        self.not_after = Some(not_after.into());
        self
    }
}

/// Verdict of a trust check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateVerificationResponse {
    pub trusted: bool,
    /// Explanation; empty when trusted.
    #[serde(default)]
    pub reason: String,
}

/// Asks the host whether the certificate is trusted.
///
/// An untrusted certificate is a normal result (`trusted == false`);
/// errors are reserved for failed calls and malformed replies.
pub fn verify_cert<B: HostBackend>(
    host: &mut Dispatcher<B>,
    request: &CertificateVerificationRequest,
    encoding: ExpiryEncoding,
) -> Result<CertificateVerificationResponse> {
    match (encoding, &request.not_after) {
        (ExpiryEncoding::EmptyString, None) => {
            let wire = request.clone().with_not_after("");
            call_capability(host, &IS_CERTIFICATE_TRUSTED, &wire)
        }
        _ => call_capability(host, &IS_CERTIFICATE_TRUSTED, request),
    }
}

//! # Envelope Codec
//!
//! UTF-8 JSON encoding for every value that crosses the guest boundary:
//! the request and response envelopes, and each capability payload.
//!
//! Both directions are pure. Failures name the Rust type involved so a
//! host-side log line points straight at the mismatched shape:
//!
//! ```text
//! cannot serialize CertificateVerificationRequest: key must be a string
//! cannot decode SubjectAccessReviewStatus: missing field `allowed` at line 1 column 2
//! ```

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encodes `value` as compact UTF-8 JSON.
///
/// # Errors
///
/// Returns [`Error::Serialization`] naming `T` if the value has members
/// JSON cannot represent (e.g. maps with non-string keys).
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::serialization(type_label::<T>(), e))
}

/// Decodes UTF-8 JSON `bytes` into `T`.
///
/// # Errors
///
/// Returns [`Error::Decode`] naming `T` if the bytes are not well-formed
/// JSON or lack a field `T` requires.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::decode(type_label::<T>(), e))
}

/// Returns the name of `T` without its module path, for error messages.
///
/// Generic arguments are kept verbatim, so
/// `kubebridge::capabilities::kubernetes::ObjectList<serde_json::value::Value>`
/// becomes `ObjectList<serde_json::value::Value>`.
pub fn type_label<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

//! # Capability Codecs
//!
//! One module per host capability. Every codec has the same four steps:
//!
//! ```text
//! typed params ──► request value ──encode──► bytes ──invoke──► reply ──decode──► response
//!                  (optional fields           (Serialization   (HostCall   (Decode error
//!                   omitted, not null)         error)           error)      names the type)
//! ```
//!
//! Codecs are stateless free functions taking the [`Dispatcher`]; nothing
//! is cached between calls.
//!
//! | Capability | Function | Address |
//! |------------|----------|---------|
//! | Kubernetes get | [`kubernetes::get_resource`] | `kubernetes` / `get_resource` |
//! | Kubernetes list (namespace) | [`kubernetes::list_resources_by_namespace`] | `kubernetes` / `list_resources_by_namespace` |
//! | Kubernetes list (all) | [`kubernetes::list_all_resources`] | `kubernetes` / `list_resources_all` |
//! | Kubernetes can-I | [`kubernetes::can_i`] | `kubernetes` / `can_i` |
//! | OCI manifest digest | [`oci::manifest_digest`] | `oci` / `v1/manifest_digest` |
//! | OCI manifest | [`oci::manifest`] | `oci` / `v1/oci_manifest` |
//! | OCI manifest+config | [`oci::manifest_and_config`] | `oci` / `v1/oci_manifest_config` |
//! | DNS lookup | [`net::dns_lookup`] | `net` / `v1/dns_lookup_host` |
//! | Certificate trust | [`crypto::verify_cert`] | `crypto` / `v1/is_certificate_trusted` |
//! | Signature verification | [`verify`] (four modes) | `oci` / `v2/verify` |

pub mod crypto;
pub mod kubernetes;
pub mod net;
pub mod oci;
pub mod verify;

use crate::envelope;
use crate::error::Result;
use crate::host::{CapabilityAddress, Dispatcher, HostBackend};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encodes `request`, calls `address`, and decodes the reply as `Resp`.
pub(crate) fn call_capability<B, Req, Resp>(
    host: &mut Dispatcher<B>,
    address: &CapabilityAddress,
    request: &Req,
) -> Result<Resp>
where
    B: HostBackend,
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let reply = call_raw(host, address, request)?;
    envelope::decode(&reply)
}

/// Encodes `request` and calls `address`, returning the undecoded reply.
pub(crate) fn call_raw<B, Req>(
    host: &mut Dispatcher<B>,
    address: &CapabilityAddress,
    request: &Req,
) -> Result<Vec<u8>>
where
    B: HostBackend,
    Req: Serialize + ?Sized,
{
    let payload = envelope::encode(request)?;
    host.invoke(address, &payload)
}

//! # kubebridge
//!
//! **Guest-side Host Capability Bridge for WebAssembly admission policies**
//!
//! A policy compiled to WASM cannot reach the network, the cluster, or a
//! registry on its own. It asks its host through a single imported
//! function and exchanges JSON with it. This crate is the guest half of
//! that conversation.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            kubebridge                               │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                       entry::run                            │    │
//! │  │   action → read stdin → decode → Policy → one response      │    │
//! │  └─────────────────────────────────────────────────────────────┘    │
//! │                              │                                      │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │                   Capability Codecs                       │      │
//! │  │  crypto │ net │ kubernetes │ oci (+ manifest) │ verify    │      │
//! │  └───────────────────────────┼───────────────────────────────┘      │
//! │                              │                                      │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │                 Dispatcher<HostBackend>                   │      │
//! │  │  call(binding, namespace, operation, payload) → reply     │      │
//! │  └───────────────────────────┼───────────────────────────────┘      │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌───────────────┐  ┌──────────────┐              │
//! │  │  GuestHost   │  │ScriptedBackend│  │   envelope   │              │
//! │  │ host import  │  │  test double  │  │  JSON codec  │              │
//! │  │ + stdin/out  │  │               │  │              │              │
//! │  └──────────────┘  └───────────────┘  └──────────────┘              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Host Protocol
//!
//! Every capability is addressed by `(binding, namespace, operation)`. The
//! guest passes the JSON payload to the host import, which returns a status.
//! Whatever the status, the host then leaves a reply on stdin: the
//! capability's JSON on success, a UTF-8 error message otherwise.
//!
//! | Namespace | Operations |
//! |-----------|------------|
//! | `crypto` | `v1/is_certificate_trusted` |
//! | `net` | `v1/dns_lookup_host` |
//! | `kubernetes` | `get_resource`, `list_resources_by_namespace`, `list_resources_all`, `can_i` |
//! | `oci` | `v1/manifest_digest`, `v1/oci_manifest`, `v1/oci_manifest_config`, `v2/verify` |
//!
//! # Example
//!
//! ```rust,ignore
//! use kubebridge::{Dispatcher, GuestHost, Policy, entry};
//!
//! fn main() {
//!     let action = std::env::args().nth(1).unwrap_or_default();
//!     let mut host = Dispatcher::new(GuestHost::new());
//!     let _ = entry::run(&MyPolicy, &action, &mut std::io::stdin(), &mut std::io::stdout(), &mut host);
//! }
//! ```

pub mod capabilities;
pub mod channel;
pub mod config;
pub mod constants;
pub mod entry;
pub mod envelope;
pub mod error;
pub mod host;
pub mod logging;
pub mod manifest;
pub mod probe;
pub mod validation;

// Re-exports
pub use config::{BridgeConfig, ExpiryEncoding};
pub use constants::*;
pub use entry::{Policy, run};
pub use error::{Error, ErrorKind, Result};
pub use host::{CapabilityAddress, Dispatcher, GuestHost, HostBackend, ScriptedBackend};
pub use manifest::{ImageIndex, ImageManifest, OciManifestResponse};
pub use validation::{
    PolicyAction, PolicyResponse, SettingsValidationResponse, ValidationRequest,
    ValidationResponse, accept_request, mutate_request, reject_request,
};

//! # Host Call Dispatcher
//!
//! Every external effect the guest needs is requested from the host by
//! name. A request is addressed by a [`CapabilityAddress`] and carries an
//! opaque byte payload; the host answers with a success flag and a reply
//! document on the input channel.
//!
//! ## Call Sequence
//!
//! ```text
//! Guest                                   Host
//!   |  call(binding, ns, op, payload)       |
//!   |-------------------------------------->|
//!   |            flag (true/false)          |
//!   |<--------------------------------------|
//!   |  read fd 0 to end-of-stream           |
//!   |<======================================|  reply bytes
//!   |                                       |
//!   flag = true  → reply is the payload
//!   flag = false → reply is the error text
//! ```
//!
//! The reply is read regardless of the flag; the flag only decides how the
//! bytes are interpreted. There are no retries and no timeouts on this
//! side: one call is one round trip, and a stalled host stalls the guest.
//!
//! ## Substituting the Host
//!
//! [`Dispatcher`] is generic over [`HostBackend`]. Production guests use
//! [`GuestHost`]; tests inject [`ScriptedBackend`] and assert on the calls
//! it recorded.

use crate::channel::StdChannel;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, warn};

// =============================================================================
// Capability Address
// =============================================================================

/// Three-part name of one host-exposed function.
///
/// Equality is exact string match on all three parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityAddress {
    /// Vendor binding.
    pub binding: &'static str,
    /// Capability namespace (e.g. `oci`).
    pub namespace: &'static str,
    /// Operation within the namespace (e.g. `v1/manifest_digest`).
    pub operation: &'static str,
}

impl CapabilityAddress {
    /// Creates an address.
    #[must_use]
    pub const fn new(
        binding: &'static str,
        namespace: &'static str,
        operation: &'static str,
    ) -> Self {
        Self {
            binding,
            namespace,
            operation,
        }
    }
}

impl fmt::Display for CapabilityAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.binding, self.namespace, self.operation)
    }
}

// =============================================================================
// Backend Trait
// =============================================================================

/// The raw host surface: a call primitive plus the reply channel.
pub trait HostBackend {
    /// Invokes the capability at `address` and returns the host's flag.
    fn call(&mut self, address: &CapabilityAddress, payload: &[u8]) -> bool;

    /// Reads the reply document for the most recent call.
    fn read_reply(&mut self) -> Result<Vec<u8>>;
}

impl<B: HostBackend + ?Sized> HostBackend for &mut B {
    fn call(&mut self, address: &CapabilityAddress, payload: &[u8]) -> bool {
        (**self).call(address, payload)
    }

    fn read_reply(&mut self) -> Result<Vec<u8>> {
        (**self).read_reply()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Invokes host capabilities and interprets their success flag.
#[derive(Debug)]
pub struct Dispatcher<B> {
    backend: B,
}

impl<B: HostBackend> Dispatcher<B> {
    /// Creates a dispatcher over `backend`.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Calls the capability at `address` with `payload`.
    ///
    /// Exactly one reply is read after the call, whatever the flag.
    ///
    /// # Errors
    ///
    /// - [`Error::HostCall`] if the host reports failure; the message is the
    ///   reply decoded as UTF-8 (lossy, never fails)
    /// - [`Error::Io`] if the reply cannot be read
    pub fn invoke(&mut self, address: &CapabilityAddress, payload: &[u8]) -> Result<Vec<u8>> {
        debug!(capability = %address, bytes = payload.len(), "host call");

        let successful = self.backend.call(address, payload);
        let reply = self.backend.read_reply()?;

        if successful {
            debug!(capability = %address, bytes = reply.len(), "host call succeeded");
            return Ok(reply);
        }

        let message = String::from_utf8_lossy(&reply).into_owned();
        warn!(capability = %address, "host call failed: {}", message);
        Err(Error::HostCall {
            capability: address.to_string(),
            message,
        })
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consumes the dispatcher and returns the backend.
    pub fn into_inner(self) -> B {
        self.backend
    }
}

// =============================================================================
// Guest Backend
// =============================================================================

#[cfg(target_arch = "wasm32")]
mod ffi {
    use super::CapabilityAddress;

    #[link(wasm_import_module = "host")]
    unsafe extern "C" {
        /// The host's call primitive. A zero status means success.
        fn call(
            bd_ptr: *const u8,
            bd_len: usize,
            ns_ptr: *const u8,
            ns_len: usize,
            op_ptr: *const u8,
            op_len: usize,
            ptr: *const u8,
            len: usize,
        ) -> usize;
    }

    pub(super) fn host_call(address: &CapabilityAddress, payload: &[u8]) -> bool {
        // SAFETY: each pointer/length pair is taken from a slice that stays
        // borrowed for the whole call; the host only reads through them.
        let status = unsafe {
            call(
                address.binding.as_ptr(),
                address.binding.len(),
                address.namespace.as_ptr(),
                address.namespace.len(),
                address.operation.as_ptr(),
                address.operation.len(),
                payload.as_ptr(),
                payload.len(),
            )
        };
        status == 0
    }
}

/// Message returned for host calls made outside a WebAssembly guest.
#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
const HOST_UNAVAILABLE: &str = "host capabilities are only available inside a WebAssembly guest";

/// The real host, reached through the `host` import module.
///
/// Replies are read from stdin. Outside `wasm32` there is no host to call:
/// every call fails with a fixed message so native builds of a policy still
/// produce a well-formed response.
#[derive(Debug, Default)]
pub struct GuestHost {
    channel: StdChannel,
    pending: Option<Vec<u8>>,
}

impl GuestHost {
    /// Creates the guest backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostBackend for GuestHost {
    #[cfg(target_arch = "wasm32")]
    fn call(&mut self, address: &CapabilityAddress, payload: &[u8]) -> bool {
        ffi::host_call(address, payload)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn call(&mut self, address: &CapabilityAddress, _payload: &[u8]) -> bool {
        warn!(capability = %address, "{}", HOST_UNAVAILABLE);
        self.pending = Some(HOST_UNAVAILABLE.as_bytes().to_vec());
        false
    }

    fn read_reply(&mut self) -> Result<Vec<u8>> {
        match self.pending.take() {
            Some(reply) => Ok(reply),
            None => self.channel.read_all(),
        }
    }
}

// =============================================================================
// Scripted Backend
// =============================================================================

/// One call observed by [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Address the guest called.
    pub address: CapabilityAddress,
    /// Payload bytes exactly as sent.
    pub payload: Vec<u8>,
}

impl RecordedCall {
    /// Parses the payload as JSON.
    pub fn payload_json(&self) -> Result<serde_json::Value> {
        crate::envelope::decode(&self.payload)
    }
}

/// Host double that replays queued replies and records every call.
///
/// Replies are consumed in order. A call with no reply queued fails, and
/// the failure text names the address.
///
/// ```rust,ignore
/// let backend = ScriptedBackend::new().reply_ok(r#"{"digest":"sha256:abc"}"#);
/// let mut host = Dispatcher::new(backend);
/// let digest = oci::manifest_digest(&mut host, "busybox:1.36")?;
/// assert_eq!(host.backend().calls().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: VecDeque<(bool, Vec<u8>)>,
    calls: Vec<RecordedCall>,
    pending: Option<Vec<u8>>,
}

impl ScriptedBackend {
    /// Creates a backend with no replies queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    #[must_use]
    pub fn reply_ok(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.replies.push_back((true, body.into()));
        self
    }

    /// Queues a failed reply carrying `body` as the error text.
    #[must_use]
    pub fn reply_err(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.replies.push_back((false, body.into()));
        self
    }

    /// Queues a successful reply serialized from a JSON value.
    #[must_use]
    pub fn reply_json(self, value: &serde_json::Value) -> Self {
        self.reply_ok(value.to_string())
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Number of queued replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl HostBackend for ScriptedBackend {
    fn call(&mut self, address: &CapabilityAddress, payload: &[u8]) -> bool {
        self.calls.push(RecordedCall {
            address: *address,
            payload: payload.to_vec(),
        });

        let (successful, body) = self
            .replies
            .pop_front()
            .unwrap_or_else(|| (false, format!("no scripted reply for {address}").into_bytes()));
        self.pending = Some(body);
        successful
    }

    fn read_reply(&mut self) -> Result<Vec<u8>> {
        Ok(self.pending.take().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: CapabilityAddress =
        CapabilityAddress::new("kubewarden", "net", "v1/dns_lookup_host");

    #[test]
    fn address_display_joins_parts() {
        assert_eq!(ADDR.to_string(), "kubewarden/net/v1/dns_lookup_host");
    }

    #[test]
    fn unscripted_call_fails_with_address() {
        let mut host = Dispatcher::new(ScriptedBackend::new());
        let err = host.invoke(&ADDR, b"\"example.com\"").unwrap_err();
        assert!(err.host_message().unwrap().contains("kubewarden/net/v1/dns_lookup_host"));
    }

    #[test]
    fn invalid_utf8_reply_does_not_fail_decoding() {
        let mut host = Dispatcher::new(ScriptedBackend::new().reply_err(vec![0xff, b'o', b'k']));
        let err = host.invoke(&ADDR, b"{}").unwrap_err();
        assert_eq!(err.host_message(), Some("\u{fffd}ok"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn guest_host_fails_outside_wasm() {
        let mut host = Dispatcher::new(GuestHost::new());
        let err = host.invoke(&ADDR, b"\"example.com\"").unwrap_err();
        assert_eq!(err.host_message(), Some(HOST_UNAVAILABLE));
    }
}

//! Network lookups through the host.

use super::call_capability;
use crate::constants::{HOST_BINDING, NAMESPACE_NET, OP_DNS_LOOKUP_HOST};
use crate::error::Result;
use crate::host::{CapabilityAddress, Dispatcher, HostBackend};
use serde::{Deserialize, Serialize};

pub const DNS_LOOKUP_HOST: CapabilityAddress =
    CapabilityAddress::new(HOST_BINDING, NAMESPACE_NET, OP_DNS_LOOKUP_HOST);

/// Addresses a hostname resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsLookupResponse {
    /// IPv4 and IPv6 addresses in textual form.
    pub ips: Vec<String>,
}

/// Resolves `hostname`. The payload is the hostname as a JSON string.
pub fn dns_lookup<B: HostBackend>(
    host: &mut Dispatcher<B>,
    hostname: &str,
) -> Result<DnsLookupResponse> {
    call_capability(host, &DNS_LOOKUP_HOST, hostname)
}

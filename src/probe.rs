//! # Capability Probe Policy
//!
//! A policy that exercises one host capability per invocation and reports
//! what happened. Hosts use it to check their capability implementations
//! end to end through a real guest.
//!
//! The settings pick a scenario by name, `<capability>-success` or
//! `<capability>-failure`:
//!
//! ```json
//! { "testScenario": "oci-manifest-digest-success" }
//! ```
//!
//! | Expectation | Host result | Verdict |
//! |-------------|-------------|---------|
//! | success | positive | accept, with annotations |
//! | success | negative or error | reject |
//! | failure | error or negative | accept |
//! | failure | positive | reject |
//!
//! Without a scenario every request is accepted.

use crate::capabilities::crypto::{self, Certificate, CertificateVerificationRequest};
use crate::capabilities::kubernetes::{
    self, CanIRequest, GetResourceRequest, ListAllResourcesRequest,
    ListResourcesByNamespaceRequest, ObjectList, ResourceAttributes, SubjectAccessReview,
};
use crate::capabilities::verify::{self, KeylessInfo, KeylessPrefixInfo, VerificationResponse};
use crate::capabilities::{net, oci};
use crate::config::BridgeConfig;
use crate::entry::Policy;
use crate::error::{Error, Result};
use crate::host::{Dispatcher, HostBackend};
use crate::manifest::OciManifestResponse;
use crate::validation::{
    SettingsValidationResponse, ValidationRequest, ValidationResponse, accept_request,
    reject_request,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

// =============================================================================
// Scenarios
// =============================================================================

/// Capability a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeCapability {
    OciManifestDigest,
    DnsLookup,
    OciManifest,
    OciManifestAndConfig,
    GetResource,
    ListAllResources,
    ListResourcesByNamespace,
    CanI,
    SigstoreVerifyPubkey,
    SigstoreVerifyKeylessExact,
    SigstoreVerifyKeylessPrefix,
    SigstoreVerifyGithubActions,
    CryptoVerifyCert,
}

impl ProbeCapability {
    /// Every capability, in scenario-name order.
    pub const ALL: [ProbeCapability; 13] = [
        Self::OciManifestDigest,
        Self::DnsLookup,
        Self::OciManifest,
        Self::OciManifestAndConfig,
        Self::GetResource,
        Self::ListAllResources,
        Self::ListResourcesByNamespace,
        Self::CanI,
        Self::SigstoreVerifyPubkey,
        Self::SigstoreVerifyKeylessExact,
        Self::SigstoreVerifyKeylessPrefix,
        Self::SigstoreVerifyGithubActions,
        Self::CryptoVerifyCert,
    ];

    /// Scenario name prefix.
    pub fn name(self) -> &'static str {
        match self {
            Self::OciManifestDigest => "oci-manifest-digest",
            Self::DnsLookup => "dns-lookup",
            Self::OciManifest => "oci-manifest",
            Self::OciManifestAndConfig => "oci-manifest-and-config",
            Self::GetResource => "get-resource",
            Self::ListAllResources => "list-all-resources",
            Self::ListResourcesByNamespace => "list-resources-by-namespace",
            Self::CanI => "can-i",
            Self::SigstoreVerifyPubkey => "sigstore-verify-pubkey",
            Self::SigstoreVerifyKeylessExact => "sigstore-verify-keyless-exact",
            Self::SigstoreVerifyKeylessPrefix => "sigstore-verify-keyless-prefix",
            Self::SigstoreVerifyGithubActions => "sigstore-verify-github-actions",
            Self::CryptoVerifyCert => "crypto-verify-cert",
        }
    }
}

/// What the scenario expects from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expectation {
    Success,
    Failure,
}

/// A named probe: one capability and one expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scenario {
    pub capability: ProbeCapability,
    pub expectation: Expectation,
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (prefix, expectation) = if let Some(prefix) = s.strip_suffix("-success") {
            (prefix, Expectation::Success)
        } else if let Some(prefix) = s.strip_suffix("-failure") {
            (prefix, Expectation::Failure)
        } else {
            return Err(format!("unknown testScenario: {s}"));
        };

        ProbeCapability::ALL
            .iter()
            .find(|c| c.name() == prefix)
            .map(|&capability| Scenario {
                capability,
                expectation,
            })
            .ok_or_else(|| format!("unknown testScenario: {s}"))
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.expectation {
            Expectation::Success => "success",
            Expectation::Failure => "failure",
        };
        write!(f, "{}-{}", self.capability.name(), suffix)
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Settings of the probe policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_scenario: Option<String>,
}

impl ProbeSettings {
    /// Parses the configured scenario, if any.
    pub fn scenario(&self) -> Result<Option<Scenario>> {
        self.test_scenario
            .as_deref()
            .map(|name| name.parse().map_err(Error::InvalidSettings))
            .transpose()
    }
}

/// The probe policy.
#[derive(Debug, Clone, Default)]
pub struct CapabilityProbe {
    config: BridgeConfig,
}

impl CapabilityProbe {
    /// Creates a probe using `config` for codec options.
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

impl Policy for CapabilityProbe {
    type Settings = ProbeSettings;

    fn validate<B: HostBackend>(
        &self,
        request: ValidationRequest<ProbeSettings>,
        host: &mut Dispatcher<B>,
    ) -> Result<ValidationResponse> {
        let Some(scenario) = request.settings.scenario()? else {
            return Ok(accept_request());
        };
        info!(%scenario, uid = %request.request.uid, "running probe");
        Ok(run_scenario(host, scenario, &self.config))
    }

    fn validate_settings(&self, settings: &ProbeSettings) -> Result<SettingsValidationResponse> {
        Ok(match settings.scenario() {
            Ok(_) => SettingsValidationResponse::valid(),
            Err(Error::InvalidSettings(reason)) => SettingsValidationResponse::invalid(reason),
            Err(e) => return Err(e),
        })
    }
}

// =============================================================================
// Execution
// =============================================================================

/// What a capability returned, reduced to a yes/no plus annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the host's answer was affirmative.
    pub positive: bool,
    /// Key facts to record in the audit log.
    pub annotations: Vec<(String, String)>,
}

impl Outcome {
    fn new(positive: bool) -> Self {
        Self {
            positive,
            annotations: Vec::new(),
        }
    }

    fn annotate(mut self, key: &str, value: impl Into<String>) -> Self {
        self.annotations.push((key.to_string(), value.into()));
        self
    }
}

/// Runs `scenario` and turns the outcome into a verdict.
pub fn run_scenario<B: HostBackend>(
    host: &mut Dispatcher<B>,
    scenario: Scenario,
    config: &BridgeConfig,
) -> ValidationResponse {
    let name = scenario.capability.name();
    let result = probe(host, scenario, config);

    match (scenario.expectation, result) {
        (Expectation::Success, Ok(outcome)) if outcome.positive => {
            annotated(accept_request(), outcome)
        }
        (Expectation::Success, Ok(outcome)) => {
            let message = format!("{name} returned a negative result");
            annotated(reject_request(message, None), outcome)
        }
        (Expectation::Success, Err(e)) => reject_request(e.to_string(), None),
        (Expectation::Failure, Ok(outcome)) if outcome.positive => {
            let message = format!("unexpectedly succeeded in {name}");
            annotated(reject_request(message, None), outcome)
        }
        (Expectation::Failure, Ok(outcome)) => annotated(accept_request(), outcome),
        (Expectation::Failure, Err(e)) => {
            let reason = e.host_message().map_or_else(|| e.to_string(), str::to_string);
            accept_request().with_annotation("error", reason)
        }
    }
}

fn annotated(response: ValidationResponse, outcome: Outcome) -> ValidationResponse {
    outcome
        .annotations
        .into_iter()
        .fold(response, |response, (key, value)| {
            response.with_annotation(key, value)
        })
}

/// Calls the scenario's capability with inputs matching its expectation.
pub fn probe<B: HostBackend>(
    host: &mut Dispatcher<B>,
    scenario: Scenario,
    config: &BridgeConfig,
) -> Result<Outcome> {
    let expect_success = scenario.expectation == Expectation::Success;
    let pick = |success: &'static str, failure: &'static str| {
        if expect_success { success } else { failure }
    };

    match scenario.capability {
        ProbeCapability::OciManifestDigest => {
            let image = pick(BUSYBOX_IMAGE, "registry.testing.lan/nonexistent-image:1.0.0");
            let digest = oci::manifest_digest(host, image)?;
            Ok(Outcome::new(!digest.is_empty()).annotate("digest", digest))
        }
        ProbeCapability::DnsLookup => {
            let hostname = pick("google.com", "invalid.nonexistent.tld");
            let response = net::dns_lookup(host, hostname)?;
            let ips = response.ips.join(", ");
            Ok(Outcome::new(!response.ips.is_empty()).annotate("ips", ips))
        }
        ProbeCapability::OciManifest => {
            let image = pick(BUSYBOX_IMAGE, "example.test/nonexistent-image:1.0.0");
            let response = oci::manifest(host, image)?;
            let kind = match &response {
                OciManifestResponse::Image(_) => "image",
                OciManifestResponse::Index(_) => "index",
            };
            Ok(Outcome::new(true)
                .annotate("manifestKind", kind)
                .annotate("mediaType", response.media_type().unwrap_or_default()))
        }
        ProbeCapability::OciManifestAndConfig => {
            let image = pick(BUSYBOX_IMAGE, "example.test/nonexistent-image");
            let response = oci::manifest_and_config(host, image)?;
            Ok(Outcome::new(true)
                .annotate("digest", response.digest)
                .annotate("os", response.config.os)
                .annotate("architecture", response.config.architecture))
        }
        ProbeCapability::GetResource => {
            let request = GetResourceRequest {
                api_version: "v1".to_string(),
                kind: "Namespace".to_string(),
                name: "test-policy".to_string(),
                namespace: None,
                disable_cache: false,
            };
            let namespace: serde_json::Value = kubernetes::get_resource(host, &request)?;
            let labelled = namespace
                .pointer("/metadata/labels/demo-namespace")
                .and_then(serde_json::Value::as_str)
                == Some("true");
            Ok(Outcome::new(labelled).annotate("labelled", labelled.to_string()))
        }
        ProbeCapability::ListAllResources => {
            let request = ListAllResourcesRequest {
                api_version: "v1".to_string(),
                kind: pick("Pod", "InvalidResource").to_string(),
                label_selector: expect_success.then(|| "app=nginx".to_string()),
                field_selector: None,
            };
            let list: ObjectList<serde_json::Value> =
                kubernetes::list_all_resources(host, &request)?;
            Ok(list_outcome(&list))
        }
        ProbeCapability::ListResourcesByNamespace => {
            let request = ListResourcesByNamespaceRequest {
                api_version: "v1".to_string(),
                kind: pick("ConfigMap", "Pod").to_string(),
                namespace: pick("kube-system", "nonexistent-namespace").to_string(),
                label_selector: expect_success.then(|| "component=kube-proxy".to_string()),
                field_selector: None,
            };
            let list: ObjectList<serde_json::Value> =
                kubernetes::list_resources_by_namespace(host, &request)?;
            Ok(list_outcome(&list))
        }
        ProbeCapability::CanI => {
            let request = if expect_success {
                can_i_request(
                    "system:serviceaccount:default:my-service-account",
                    "create",
                    "pods",
                    None,
                )
            } else {
                can_i_request(
                    "system:serviceaccount:kubewarden:kubewarden-controller",
                    "delete",
                    "nodes",
                    Some(String::new()),
                )
            };
            let status = kubernetes::can_i(host, &request)?;
            Ok(Outcome::new(status.allowed)
                .annotate("allowed", status.allowed.to_string())
                .annotate("reason", status.reason.unwrap_or_default()))
        }
        ProbeCapability::SigstoreVerifyPubkey => {
            let image = pick(
                "registry.example.com/signed-app:v1.0.0",
                "registry.example.com/unsigned-app:v1.0.0",
            );
            let keys = vec![PROBE_PUBLIC_KEY.to_string()];
            let response = verify::verify_pub_keys_image(host, image, keys, None)?;
            Ok(verification_outcome(response, "public_key"))
        }
        ProbeCapability::SigstoreVerifyKeylessExact => {
            let image = pick(
                "registry.example.com/ci-signed-app:v1.0.0",
                "registry.example.com/untrusted-app:v1.0.0",
            );
            let keyless = vec![KeylessInfo {
                issuer: PROBE_OIDC_ISSUER.to_string(),
                subject: pick("user@example.com", "untrusted@example.com").to_string(),
            }];
            let response = verify::verify_keyless_exact_match(host, image, keyless, None)?;
            Ok(verification_outcome(response, "keyless_exact"))
        }
        ProbeCapability::SigstoreVerifyKeylessPrefix => {
            let image = pick(
                "registry.example.com/org-signed-app:v1.0.0",
                "registry.example.com/untrusted-org-app:v1.0.0",
            );
            let keyless_prefix = vec![KeylessPrefixInfo {
                issuer: PROBE_OIDC_ISSUER.to_string(),
                url_prefix: "https://github.com/trusted-org/".to_string(),
            }];
            let response =
                verify::verify_keyless_prefix_match(host, image, keyless_prefix, None)?;
            Ok(verification_outcome(response, "keyless_prefix"))
        }
        ProbeCapability::SigstoreVerifyGithubActions => {
            let image = pick(
                "registry.example.com/github-actions-app:v1.0.0",
                "registry.example.com/untrusted-github-app:v1.0.0",
            );
            let owner = pick("trusted-org", "untrusted-org");
            let repo = pick("trusted-repo", "untrusted-repo");
            let response =
                verify::verify_keyless_github_actions(host, image, owner, Some(repo), None)?;
            Ok(verification_outcome(response, "github_actions")
                .annotate("owner", owner)
                .annotate("repo", repo))
        }
        ProbeCapability::CryptoVerifyCert => {
            let cert = Certificate::pem(pick("certificate0", "invalid certificate data"));
            let request = CertificateVerificationRequest::new(cert, Vec::new())
                .with_not_after(pick("2025-12-31T23:59:59Z", "2020-01-01T00:00:00Z"));
            let response = crypto::verify_cert(host, &request, config.expiry_encoding)?;
            Ok(Outcome::new(response.trusted)
                .annotate("trusted", response.trusted.to_string())
                .annotate("reason", response.reason))
        }
    }
}

/// Image every success scenario of the registry capabilities asks about.
const BUSYBOX_IMAGE: &str = "docker.io/library/busybox:1.36";

/// OIDC issuer used by the keyless scenarios.
const PROBE_OIDC_ISSUER: &str = "https://github.com/login/oauth";

/// Placeholder key sent by the public-key scenarios.
const PROBE_PUBLIC_KEY: &str =
    "-----BEGIN PUBLIC KEY-----\nMIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA...\n-----END PUBLIC KEY-----";

fn list_outcome(list: &ObjectList<serde_json::Value>) -> Outcome {
    Outcome::new(!list.items.is_empty()).annotate("count", list.items.len().to_string())
}

fn can_i_request(
    user: &str,
    verb: &str,
    resource: &str,
    namespace: Option<String>,
) -> CanIRequest {
    CanIRequest {
        subject_access_review: SubjectAccessReview {
            user: user.to_string(),
            groups: None,
            resource_attributes: ResourceAttributes {
                namespace,
                verb: verb.to_string(),
                resource: resource.to_string(),
                ..Default::default()
            },
        },
        disable_cache: false,
    }
}

fn verification_outcome(response: VerificationResponse, method: &str) -> Outcome {
    Outcome::new(response.is_trusted)
        .annotate("is_trusted", response.is_trusted.to_string())
        .annotate("digest", response.digest)
        .annotate("verification_method", method)
}

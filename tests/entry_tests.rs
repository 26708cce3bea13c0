//! Tests for the policy entry point.
//!
//! Whatever happens inside, one invocation writes exactly one well-formed
//! response.

use kubebridge::capabilities::oci;
use kubebridge::entry::{self, Policy};
use kubebridge::host::{Dispatcher, HostBackend, ScriptedBackend};
use kubebridge::validation::{
    SettingsValidationResponse, ValidationRequest, ValidationResponse, accept_request,
    reject_request,
};
use kubebridge::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};

/// Rejects images whose digest the host cannot resolve.
struct DigestPolicy;

#[derive(Debug, Deserialize)]
struct DigestSettings {
    image: String,
}

impl Policy for DigestPolicy {
    type Settings = DigestSettings;

    fn validate<B: HostBackend>(
        &self,
        request: ValidationRequest<DigestSettings>,
        host: &mut Dispatcher<B>,
    ) -> Result<ValidationResponse> {
        let digest = oci::manifest_digest(host, &request.settings.image)?;
        if digest.starts_with("sha256:") {
            Ok(accept_request().with_annotation("digest", digest))
        } else {
            Ok(reject_request("unexpected digest algorithm", Some(400)))
        }
    }

    fn validate_settings(&self, settings: &DigestSettings) -> Result<SettingsValidationResponse> {
        if settings.image.is_empty() {
            return Err(Error::InvalidSettings("image must not be empty".to_string()));
        }
        Ok(SettingsValidationResponse::valid())
    }
}

fn request_bytes(settings: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "request": {
            "uid": "uid-1",
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "operation": "CREATE",
            "object": {"metadata": {"name": "nginx"}}
        },
        "settings": settings
    }))
    .expect("fixture")
}

fn run(action: &str, input: &[u8], backend: ScriptedBackend) -> (Value, ScriptedBackend) {
    let mut host = Dispatcher::new(backend);
    let mut output = Vec::new();
    entry::run(&DigestPolicy, action, &mut &input[..], &mut output, &mut host).expect("run");

    let response = serde_json::from_slice(&output).expect("one JSON response");
    (response, host.into_inner())
}

// =============================================================================
// Action Selection
// =============================================================================

#[test]
fn test_unknown_action_is_wrong_invocation() {
    for action in ["", "Validate", "validate_settings", "mutate"] {
        let (response, backend) = run(action, b"", ScriptedBackend::new());
        assert_eq!(
            response,
            json!({"accepted": false, "message": "wrong invocation"}),
            "action {:?}",
            action
        );
        assert!(backend.calls().is_empty(), "no host call for {:?}", action);
    }
}

#[test]
fn test_unknown_action_does_not_read_input() {
    let mut host = Dispatcher::new(ScriptedBackend::new());
    let mut input: &[u8] = b"left for someone else";
    let mut output = Vec::new();
    entry::run(&DigestPolicy, "bogus", &mut input, &mut output, &mut host).expect("run");

    assert_eq!(input, b"left for someone else");
}

// =============================================================================
// Validate
// =============================================================================

#[test]
fn test_validate_accepts_with_annotation() {
    let backend = ScriptedBackend::new().reply_json(&json!({"digest": "sha256:abc"}));
    let input = request_bytes(json!({"image": "docker.io/library/busybox:1.36"}));
    let (response, backend) = run("validate", &input, backend);

    assert_eq!(response["accepted"], true);
    assert_eq!(response["audit_annotations"]["digest"], "sha256:abc");
    assert_eq!(backend.calls()[0].payload, br#""docker.io/library/busybox:1.36""#);
}

#[test]
fn test_validate_policy_rejection_passes_through() {
    let backend = ScriptedBackend::new().reply_json(&json!({"digest": "md5:abc"}));
    let input = request_bytes(json!({"image": "busybox"}));
    let (response, _) = run("validate", &input, backend);

    assert_eq!(
        response,
        json!({"accepted": false, "message": "unexpected digest algorithm", "code": 400})
    );
}

#[test]
fn test_validate_host_failure_becomes_rejection() {
    let backend = ScriptedBackend::new().reply_err("registry unreachable");
    let input = request_bytes(json!({"image": "busybox"}));
    let (response, _) = run("validate", &input, backend);

    assert_eq!(response["accepted"], false);
    let message = response["message"].as_str().expect("message");
    assert!(message.contains("registry unreachable"), "message: {}", message);
}

#[test]
fn test_validate_malformed_input_becomes_rejection() {
    let (response, backend) = run("validate", b"{not json", ScriptedBackend::new());

    assert_eq!(response["accepted"], false);
    assert!(response["message"].as_str().is_some_and(|m| m.contains("cannot decode")));
    assert!(backend.calls().is_empty());
}

#[test]
fn test_validate_wrong_settings_shape_becomes_rejection() {
    let input = request_bytes(json!({"registry": "docker.io"}));
    let (response, _) = run("validate", &input, ScriptedBackend::new());

    assert_eq!(response["accepted"], false);
    assert!(response["message"].as_str().is_some_and(|m| m.contains("image")));
}

// =============================================================================
// Validate Settings
// =============================================================================

#[test]
fn test_validate_settings_valid() {
    let (response, _) = run("validate-settings", br#"{"image":"busybox"}"#, ScriptedBackend::new());
    assert_eq!(response, json!({"valid": true}));
}

#[test]
fn test_validate_settings_error_becomes_invalid() {
    let (response, _) = run("validate-settings", br#"{"image":""}"#, ScriptedBackend::new());
    assert_eq!(
        response,
        json!({"valid": false, "message": "invalid settings: image must not be empty"})
    );
}

#[test]
fn test_validate_settings_decode_error_becomes_invalid() {
    let (response, _) = run("validate-settings", b"[]", ScriptedBackend::new());

    assert_eq!(response["valid"], false);
    assert!(response["message"].as_str().is_some_and(|m| m.contains("DigestSettings")));
}

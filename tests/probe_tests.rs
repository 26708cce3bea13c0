//! Tests for the capability probe policy.

use kubebridge::config::BridgeConfig;
use kubebridge::entry;
use kubebridge::host::{Dispatcher, ScriptedBackend};
use kubebridge::probe::{
    CapabilityProbe, Expectation, ProbeCapability, ProbeSettings, Scenario, probe, run_scenario,
};
use serde_json::{Value, json};

fn scenario(name: &str) -> Scenario {
    name.parse().expect("known scenario")
}

fn run_named(name: &str, backend: ScriptedBackend) -> (Value, ScriptedBackend) {
    let mut host = Dispatcher::new(backend);
    let response = run_scenario(&mut host, scenario(name), &BridgeConfig::default());
    (serde_json::to_value(response).expect("json"), host.into_inner())
}

fn invoke(action: &str, input: Value, backend: ScriptedBackend) -> Value {
    let bytes = serde_json::to_vec(&input).expect("fixture");
    let mut host = Dispatcher::new(backend);
    let mut output = Vec::new();
    entry::run(
        &CapabilityProbe::default(),
        action,
        &mut bytes.as_slice(),
        &mut output,
        &mut host,
    )
    .expect("run");
    serde_json::from_slice(&output).expect("response")
}

fn admission(settings: Value) -> Value {
    json!({
        "request": {
            "uid": "probe-uid",
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "operation": "CREATE"
        },
        "settings": settings
    })
}

// =============================================================================
// Scenario Names
// =============================================================================

#[test]
fn test_scenario_names_parse() {
    assert_eq!(
        scenario("oci-manifest-digest-success"),
        Scenario {
            capability: ProbeCapability::OciManifestDigest,
            expectation: Expectation::Success,
        }
    );
    assert_eq!(
        scenario("crypto-verify-cert-failure"),
        Scenario {
            capability: ProbeCapability::CryptoVerifyCert,
            expectation: Expectation::Failure,
        }
    );
    assert_eq!(
        scenario("oci-manifest-success").capability,
        ProbeCapability::OciManifest,
        "prefix must not be confused with oci-manifest-digest"
    );
}

#[test]
fn test_unknown_scenario_is_invalid_settings() {
    let settings = ProbeSettings {
        test_scenario: Some("teleport-success".to_string()),
    };
    let err = settings.scenario().expect_err("should fail");
    assert!(err.to_string().contains("teleport-success"));

    let response = invoke(
        "validate-settings",
        json!({"testScenario": "teleport-success"}),
        ScriptedBackend::new(),
    );
    assert_eq!(response["valid"], false);
    assert_eq!(response["message"], "unknown testScenario: teleport-success");
}

#[test]
fn test_empty_settings_are_valid() {
    let response = invoke("validate-settings", json!({}), ScriptedBackend::new());
    assert_eq!(response, json!({"valid": true}));
}

// =============================================================================
// Verdicts
// =============================================================================

#[test]
fn test_no_scenario_accepts_without_host_calls() {
    let backend = ScriptedBackend::new();
    let mut host = Dispatcher::new(backend);
    let bytes = serde_json::to_vec(&admission(json!({}))).expect("fixture");
    let mut output = Vec::new();
    entry::run(
        &CapabilityProbe::default(),
        "validate",
        &mut bytes.as_slice(),
        &mut output,
        &mut host,
    )
    .expect("run");

    assert_eq!(output, br#"{"accepted":true}"#);
    assert!(host.backend().calls().is_empty());
}

#[test]
fn test_digest_success_annotates() {
    let backend = ScriptedBackend::new().reply_json(&json!({"digest": "sha256:abc"}));
    let response = invoke(
        "validate",
        admission(json!({"testScenario": "oci-manifest-digest-success"})),
        backend,
    );

    assert_eq!(response["accepted"], true);
    assert_eq!(response["audit_annotations"]["digest"], "sha256:abc");
}

#[test]
fn test_success_expected_but_host_failed() {
    let backend = ScriptedBackend::new().reply_err("no such host");
    let (response, _) = run_named("dns-lookup-success", backend);

    assert_eq!(response["accepted"], false);
    assert!(response["message"].as_str().is_some_and(|m| m.contains("no such host")));
}

#[test]
fn test_failure_expected_and_host_failed() {
    let backend = ScriptedBackend::new().reply_err("manifest unknown");
    let (response, backend) = run_named("oci-manifest-digest-failure", backend);

    assert_eq!(response["accepted"], true);
    assert_eq!(response["audit_annotations"]["error"], "manifest unknown");
    assert_eq!(
        backend.calls()[0].payload,
        br#""registry.testing.lan/nonexistent-image:1.0.0""#
    );
}

#[test]
fn test_failure_expected_but_host_succeeded() {
    let backend = ScriptedBackend::new().reply_json(&json!({"ips": ["10.0.0.1"]}));
    let (response, _) = run_named("dns-lookup-failure", backend);

    assert_eq!(response["accepted"], false);
    assert_eq!(response["message"], "unexpectedly succeeded in dns-lookup");
}

#[test]
fn test_negative_answer_satisfies_failure_scenario() {
    let backend = ScriptedBackend::new()
        .reply_json(&json!({"allowed": false, "reason": "User lacks permissions"}));
    let (response, backend) = run_named("can-i-failure", backend);

    assert_eq!(response["accepted"], true);
    assert_eq!(response["audit_annotations"]["reason"], "User lacks permissions");

    let payload = backend.calls()[0].payload_json().expect("json");
    let attributes = &payload["subject_access_review"]["resource_attributes"];
    assert_eq!(attributes["verb"], "delete");
    assert_eq!(attributes["resource"], "nodes");
    assert_eq!(attributes["namespace"], "");
}

#[test]
fn test_negative_answer_fails_success_scenario() {
    let backend = ScriptedBackend::new().reply_json(&json!({"is_trusted": false, "digest": ""}));
    let (response, _) = run_named("sigstore-verify-pubkey-success", backend);

    assert_eq!(response["accepted"], false);
    assert_eq!(response["message"], "sigstore-verify-pubkey returned a negative result");
    assert_eq!(response["audit_annotations"]["verification_method"], "public_key");
}

#[test]
fn test_index_manifest_satisfies_success_scenario() {
    let reply = json!({"index": {
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.index.v1+json",
        "manifests": []
    }});
    let backend = ScriptedBackend::new().reply_json(&reply);
    let (response, _) = run_named("oci-manifest-success", backend);

    assert_eq!(response["accepted"], true);
    assert_eq!(response["audit_annotations"]["manifestKind"], "index");
}

#[test]
fn test_unclassifiable_manifest_fails_success_scenario() {
    let reply = json!({"image": {"mediaType": "application/vnd.oci.image.config.v1+json"}});
    let backend = ScriptedBackend::new().reply_json(&reply);
    let (response, _) = run_named("oci-manifest-success", backend);

    assert_eq!(response["accepted"], false);
    assert!(response["message"].as_str().is_some_and(|m| m.contains("cannot decode response")));
}

#[test]
fn test_get_resource_checks_label() {
    let labelled = json!({
        "metadata": {"name": "test-policy", "labels": {"demo-namespace": "true"}}
    });
    let backend = ScriptedBackend::new().reply_json(&labelled);
    let (response, _) = run_named("get-resource-success", backend);
    assert_eq!(response["accepted"], true);

    let plain = json!({"metadata": {"name": "test-policy"}});
    let backend = ScriptedBackend::new().reply_json(&plain);
    let (response, _) = run_named("get-resource-success", backend);
    assert_eq!(response["accepted"], false);
}

#[test]
fn test_github_actions_inputs_follow_expectation() {
    let reply = json!({"is_trusted": false, "digest": ""});
    let (_, backend) = run_named(
        "sigstore-verify-github-actions-failure",
        ScriptedBackend::new().reply_json(&reply),
    );
    let payload = backend.calls()[0].payload_json().expect("json");

    assert_eq!(payload["type"], "SigstoreGithubActionsVerify");
    assert_eq!(payload["owner"], "untrusted-org");
    assert_eq!(payload["repo"], "untrusted-repo");
}

#[test]
fn test_every_scenario_makes_exactly_one_call() {
    for capability in ProbeCapability::ALL {
        for expectation in [Expectation::Success, Expectation::Failure] {
            let scenario = Scenario {
                capability,
                expectation,
            };
            let mut host = Dispatcher::new(ScriptedBackend::new().reply_err("unavailable"));
            let result = probe(&mut host, scenario, &BridgeConfig::default());

            assert!(result.is_err(), "{} should surface the host failure", scenario);
            assert_eq!(host.backend().calls().len(), 1, "{} should call once", scenario);
        }
    }
}

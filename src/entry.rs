//! # Policy Entry Point
//!
//! [`run`] drives one guest invocation from start to finish:
//!
//! ```text
//! action ──parse──► Validate ─────────► read input ─► decode ValidationRequest ─► Policy::validate
//!                   ValidateSettings ─► read input ─► decode Settings ──────────► Policy::validate_settings
//!                   unknown ──────────► fixed rejection
//!                                                   │
//!                               every outcome ──────┴──► exactly one PolicyResponse on output
//! ```
//!
//! This is the only place that turns bridge errors into a response.
//! Serialization, decode and host call failures raised anywhere below end
//! up as a rejection (or an invalid-settings verdict) carrying the error
//! text, never as an aborted process.

use crate::channel;
use crate::constants::WRONG_INVOCATION_MESSAGE;
use crate::envelope;
use crate::error::Result;
use crate::host::{Dispatcher, HostBackend};
use crate::validation::{
    PolicyAction, PolicyResponse, SettingsValidationResponse, ValidationRequest,
    ValidationResponse, reject_request,
};
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use tracing::{info, warn};

/// Business logic of an admission policy.
///
/// Implementations receive decoded values and a dispatcher for host
/// capabilities. Returning an error is allowed: [`run`] reports it as a
/// rejection.
pub trait Policy {
    /// Settings schema the operator configures.
    type Settings: DeserializeOwned;

    /// Decides on an admission request.
    fn validate<B: HostBackend>(
        &self,
        request: ValidationRequest<Self::Settings>,
        host: &mut Dispatcher<B>,
    ) -> Result<ValidationResponse>;

    /// Checks the settings before the policy is deployed.
    fn validate_settings(&self, settings: &Self::Settings) -> Result<SettingsValidationResponse>;
}

/// Runs one invocation and writes its response to `output`.
///
/// `input` is read to end-of-stream only for known actions.
///
/// # Errors
///
/// Only a failure to write the response is returned. Everything else is
/// folded into the response.
pub fn run<P, B, R, W>(
    policy: &P,
    action: &str,
    input: &mut R,
    output: &mut W,
    host: &mut Dispatcher<B>,
) -> Result<()>
where
    P: Policy,
    B: HostBackend,
    R: Read,
    W: Write,
{
    let response = respond(policy, action, input, host);
    channel::write_all(output, &response)
}

/// Computes the response for `action` without writing it.
pub fn respond<P, B, R>(
    policy: &P,
    action: &str,
    input: &mut R,
    host: &mut Dispatcher<B>,
) -> PolicyResponse
where
    P: Policy,
    B: HostBackend,
    R: Read,
{
    let action = match action.parse::<PolicyAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!("{}", e);
            return reject_request(WRONG_INVOCATION_MESSAGE, None).into();
        }
    };
    info!(%action, "running policy");

    match action {
        PolicyAction::Validate => match validate(policy, input, host) {
            Ok(response) => response.into(),
            Err(e) => {
                warn!("validation failed: {}", e);
                reject_request(e.to_string(), None).into()
            }
        },
        PolicyAction::ValidateSettings => match validate_settings(policy, input) {
            Ok(response) => response.into(),
            Err(e) => {
                warn!("settings validation failed: {}", e);
                SettingsValidationResponse::invalid(e.to_string()).into()
            }
        },
    }
}

fn validate<P, B, R>(
    policy: &P,
    input: &mut R,
    host: &mut Dispatcher<B>,
) -> Result<ValidationResponse>
where
    P: Policy,
    B: HostBackend,
    R: Read,
{
    let bytes = channel::read_all(input)?;
    let request: ValidationRequest<P::Settings> = envelope::decode(&bytes)?;
    policy.validate(request, host)
}

fn validate_settings<P, R>(policy: &P, input: &mut R) -> Result<SettingsValidationResponse>
where
    P: Policy,
    R: Read,
{
    let bytes = channel::read_all(input)?;
    let settings: P::Settings = envelope::decode(&bytes)?;
    policy.validate_settings(&settings)
}

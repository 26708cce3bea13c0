//! kubebridge-probe - Capability Probe Policy
//!
//! A guest policy that calls one host capability per request and reports
//! the outcome. The host runs it once per action:
//!
//! ```sh
//! kubebridge-probe validate           < request.json
//! kubebridge-probe validate-settings  < settings.json
//! ```
//!
//! Exactly one JSON response is written to stdout. Logs go to stderr,
//! filtered by `KUBEBRIDGE_LOG`.

use kubebridge::config::BridgeConfig;
use kubebridge::entry;
use kubebridge::host::{Dispatcher, GuestHost};
use kubebridge::logging;
use kubebridge::probe::CapabilityProbe;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Ignored settings are logged once the subscriber exists.
    let (config, ignored) = BridgeConfig::from_env_reporting();
    logging::init(&config, &ignored);

    // A missing action is answered like any other unknown one.
    let action = std::env::args().nth(1).unwrap_or_default();

    let policy = CapabilityProbe::new(config);
    let mut host = Dispatcher::new(GuestHost::new());

    // Plain handles: GuestHost reads replies from the same stdin.
    let result = entry::run(
        &policy,
        &action,
        &mut std::io::stdin(),
        &mut std::io::stdout(),
        &mut host,
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

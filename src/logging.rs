//! Stderr logging for the guest.
//!
//! Standard output belongs to the response envelope, so every log line goes
//! to standard error. The host forwards guest stderr to its own log.

use crate::config::BridgeConfig;
use tracing::warn;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

/// Installs the global tracing subscriber writing to stderr, then logs
/// the configuration values that were ignored while loading `config`.
///
/// Returns `false` if a subscriber was already installed; that is reported
/// on stderr and the existing subscriber keeps receiving events. A logging
/// failure never aborts the invocation.
pub fn init(config: &BridgeConfig, ignored: &[String]) -> bool {
    init_with_writer(config, ignored, std::io::stderr)
}

/// Same as [`init`], writing through `writer`.
pub fn init_with_writer<W>(config: &BridgeConfig, ignored: &[String], writer: W) -> bool
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .finish();

    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    if !installed {
        eprintln!("warning: tracing subscriber already installed; keeping it");
    }

    for message in ignored {
        warn!("{}", message);
    }

    installed
}

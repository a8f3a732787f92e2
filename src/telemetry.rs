// src/telemetry.rs
// =============================================================================
// Logging setup.
//
// Everything goes through `tracing`. The subscriber writes to stderr so that
// `--json` output on stdout stays machine-readable. RUST_LOG overrides the
// default filter, e.g. RUST_LOG=script_scout=trace.
// =============================================================================

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,script_scout=debug";

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

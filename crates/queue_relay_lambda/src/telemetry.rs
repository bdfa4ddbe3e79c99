use tracing_subscriber::EnvFilter;

/// Installs the process-wide JSON subscriber. `RUST_LOG` overrides the
/// default `info` filter.
///
/// Timestamps are left to the log sink; the Lambda log stream stamps each
/// line on ingestion.
pub fn init_tracing() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_current_span(false)
        .without_time()
        .try_init()
}

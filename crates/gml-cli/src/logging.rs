use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a stderr subscriber; `RUST_LOG` wins unless `verbose` is set.
/// Later calls in the same process keep the first subscriber.
pub(crate) fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .try_init();
}

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Default filter directive for the given verbosity flags. `RUST_LOG` overrides it.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Install a stderr subscriber so diagnostics never mix with report output on stdout.
pub fn init(verbose: bool, quiet: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let formatting_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = Registry::default()
        .with(env_filter)
        .with(formatting_layer)
        .try_init();
}

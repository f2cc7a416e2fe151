//! Log setup. Everything goes to stderr so stdout only carries results.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
fn default_directive(serve: bool, verbose: bool) -> &'static str {
    match (serve, verbose) {
        (_, true) => "websearch=debug,tower_http=debug,info",
        (true, false) => "websearch=info,tower_http=info,warn",
        (false, false) => "warn",
    }
}

pub fn init(serve: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(serve, verbose)));

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

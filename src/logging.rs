//! Tracing subscriber setup for the command-line binary

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log verbosity requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "roster_sort=warn",
            Verbosity::Normal => "roster_sort=info",
            Verbosity::Debug => "roster_sort=debug",
        }
    }
}

/// Install a stderr fmt subscriber. `RUST_LOG` overrides the default level.
///
/// Stdout is reserved for sorted output.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}

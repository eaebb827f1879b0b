//! Structured logging, grounded on the teacher's `tracing` +
//! `tracing-subscriber` + `tracing-error` stack (`git-branchless-invoke`),
//! minus the chrome-trace profiling layer that crate also carries (no
//! counterpart in this tool's scope).

use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `verbosity` is the number of `-v`
/// flags on the command line; each one lowers the default level by one
/// step, but `RUST_LOG` always takes precedence when set.
pub fn install_tracing(verbosity: u8) -> eyre::Result<()> {
    let default_level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|err| eyre::eyre!("failed to install tracing subscriber: {err}"))
}

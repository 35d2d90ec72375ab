//! Tracing subscriber setup for the binary and tests.

use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt as subscriber_fmt, prelude::*};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to `default_level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(default_level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let _ = Registry::default()
        .with(filter)
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init(Level::WARN);
        init(Level::DEBUG);
        tracing::info!("logging initialised");
    }
}

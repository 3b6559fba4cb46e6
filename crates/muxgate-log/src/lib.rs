// ABOUTME: Shared logging setup for muxgate binaries
// ABOUTME: init() for daemons on stderr, init_for() for crate-filtered output

use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
/// Used by the daemon binary.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Crate-filtered logging to stderr. Default: INFO for the named crate,
/// WARN for everything else. Useful when muxgate crates are embedded in a
/// larger host process.
pub fn init_for(crate_name: &str) {
    let directive = format!("{crate_name}=info");
    let filter = EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into())
        .add_directive(
            directive
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        );

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn exports_init() {
        let _ = super::init as fn();
    }

    #[test]
    fn exports_init_for() {
        let _ = super::init_for as fn(&str);
    }
}

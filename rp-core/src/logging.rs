//! Process-wide `tracing` subscriber setup.
use tracing::debug;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `verbosity` is any `EnvFilter` directive (`info`, `rp_ch=debug,warn`, ...). `RUST_LOG` wins
/// when it is set so that ad-hoc debugging does not need a rebuild of the command line.
pub fn setup(verbosity: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(verbosity));

    // A second call (e.g. from tests) keeps the first subscriber.
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .try_init()
        .is_ok();
    debug!(installed, "logging configured");
}

/// Parses `verbosity`, falling back to `info` when it is not a valid directive.
fn build_filter(verbosity: &str) -> EnvFilter {
    EnvFilter::try_new(verbosity).unwrap_or_else(|err| {
        eprintln!("invalid verbosity {verbosity:?} ({err}), falling back to info");
        EnvFilter::new("info")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_keeps_directives() {
        let filter = build_filter("rp_ch=debug,warn");
        assert!(filter.to_string().contains("rp_ch=debug"));
    }

    #[test]
    fn test_build_filter_falls_back_to_info() {
        let filter = build_filter("rp_ch=notalevel");
        assert_eq!(filter.to_string(), EnvFilter::new("info").to_string());
    }

    #[test]
    fn test_setup_twice_does_not_panic() {
        setup("info");
        setup("debug");
    }
}

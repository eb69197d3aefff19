//! Logging infrastructure for Drinking Buddy.
//!
//! Log lines go to stderr so that `--json` output on stdout stays parseable.
//! `BUDDY_LOG` takes a full filter directive (e.g. `buddy_core=debug`) and
//! wins over the verbosity flag.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "BUDDY_LOG";

/// Default level for a `-v` count: quiet by default, `-v` shows session
/// mutations, `-vv` shows file locking and recall bookkeeping
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize logging for the CLI
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().without_time().with_writer(std::io::stderr))
        .init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "trace");
    }

    #[test]
    fn test_levels_parse_as_filters() {
        for verbose in 0..4 {
            assert!(EnvFilter::try_new(level_for_verbosity(verbose)).is_ok());
        }
    }
}

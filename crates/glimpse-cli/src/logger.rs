//! Logging setup for the glimpse CLI.
//!
//! Level selection, first match wins:
//! 1. `--verbose`: debug for glimpse crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. `settings.log_level` from the project's configuration
//! 5. info for glimpse crates

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "glimpse_cli=debug,glimpse_core=debug,glimpse_config=debug";
const QUIET_FILTER: &str = "glimpse_cli=error,glimpse_core=error,glimpse_config=error";
const DEFAULT_FILTER: &str = "glimpse_cli=info,glimpse_core=info,glimpse_config=info";

const CRATES: [&str; 3] = ["glimpse_cli", "glimpse_core", "glimpse_config"];

/// A bare level applies to the glimpse crates; anything else is used as a
/// filter directive as is.
fn configured_filter(log_level: &str) -> Option<EnvFilter> {
    let level = log_level.trim().to_ascii_lowercase();
    let directives = match level.as_str() {
        "" => return None,
        "trace" | "debug" | "info" | "warn" | "error" | "off" => CRATES
            .iter()
            .map(|krate| format!("{krate}={level}"))
            .collect::<Vec<_>>()
            .join(","),
        _ => log_level.trim().to_string(),
    };
    EnvFilter::try_new(directives).ok()
}

/// Build the filter for the given flags and configured level.
pub fn filter_for(verbose: bool, quiet: bool, log_level: Option<&str>) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env()
            .ok()
            .or_else(|| log_level.and_then(configured_filter))
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Call once, before any logging.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool, log_level: Option<&str>) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    // A subscriber may already be set (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet, log_level))
        .with(fmt_layer)
        .try_init();
}

/// `NO_COLOR` wins, then `FORCE_COLOR`, then terminal detection.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_no_color_wins_over_force_color() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_colors());
        unsafe {
            std::env::remove_var("NO_COLOR");
        }
        assert!(should_use_colors());
        unsafe {
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    fn test_filters_parse() {
        let verbose = filter_for(true, false, Some("warn")).to_string();
        assert!(verbose.contains("glimpse_core=debug"));
        let quiet = filter_for(false, true, None).to_string();
        assert!(quiet.contains("glimpse_cli=error"));
    }

    #[test]
    #[serial]
    fn test_configured_level_applies_without_rust_log() {
        unsafe {
            std::env::remove_var("RUST_LOG");
        }
        let configured = filter_for(false, false, Some("Debug")).to_string();
        assert!(configured.contains("glimpse_core=debug"));
        assert!(configured.contains("glimpse_config=debug"));

        let directive = filter_for(false, false, Some("glimpse_core=trace")).to_string();
        assert!(directive.contains("glimpse_core=trace"));

        let fallback = filter_for(false, false, Some("  ")).to_string();
        assert!(fallback.contains("glimpse_cli=info"));
    }

    #[test]
    #[serial]
    fn test_rust_log_wins_over_configured_level() {
        unsafe {
            std::env::set_var("RUST_LOG", "glimpse_cli=trace");
        }
        let filter = filter_for(false, false, Some("error")).to_string();
        unsafe {
            std::env::remove_var("RUST_LOG");
        }
        assert!(filter.contains("glimpse_cli=trace"));
        assert!(!filter.contains("glimpse_core=error"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logger(false, true, true, None);
        init_logger(true, false, true, Some("info"));
    }
}

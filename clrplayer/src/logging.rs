//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the level comes from
//! `host.logger.min_level`.
//!
//! ```no_run
//! use clrconfig::get_config;
//!
//! clrplayer::logging::init_logging(&get_config());
//! ```

use clrconfig::Config;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Level filter configured in `host.logger.min_level` (INFO when unset or unknown).
pub fn configured_level(config: &Config) -> LevelFilter {
    config
        .get_log_min_level()
        .ok()
        .and_then(|l| string_to_level(&l))
        .map(LevelFilter::from_level)
        .unwrap_or(LevelFilter::INFO)
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &Config) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(configured_level(config).into()));

    let enable_console = config.get_log_enable_console().unwrap_or(true);

    if enable_console {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(string_to_level("debug"), Some(Level::DEBUG));
        assert_eq!(string_to_level(" Warning "), Some(Level::WARN));
        assert_eq!(string_to_level("loud"), None);
    }

    #[test]
    fn test_configured_level() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(configured_level(&config), LevelFilter::INFO);

        config.set_log_min_level("trace".to_string()).unwrap();
        assert_eq!(configured_level(&config), LevelFilter::TRACE);

        config.set_log_min_level("chatty".to_string()).unwrap();
        assert_eq!(configured_level(&config), LevelFilter::INFO);
    }

    #[test]
    fn test_second_init_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}

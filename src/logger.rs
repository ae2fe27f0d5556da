//! Logging initialisation via tracing-subscriber.

use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence; `level` is the fallback.
pub fn init(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::default().add_directive(parse_level(level)?.into()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Level for the `--log-level` flag. Surrounding whitespace is ignored
/// and the name is case-insensitive; `off` silences everything.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    let name = level.trim();
    LevelFilter::from_str(name)
        .ok()
        .filter(|_| !name.is_empty())
        .ok_or_else(|| Error::Config(format!("--log-level '{level}' is not one of off, error, warn, info, debug, trace")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_levels() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level(" DEBUG ").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn unknown_level_names_the_flag() {
        let err = parse_level("chatty").unwrap_err();
        assert!(err.to_string().contains("--log-level 'chatty'"));
        assert!(parse_level("  ").is_err());
    }
}

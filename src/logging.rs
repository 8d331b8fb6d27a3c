//! Console logging setup
//!
//! `FIXPACE_LOG` picks the level (`error`..`trace`, default `info`).
//! `FIXPACE_LOG_MODULE=0` hides the module path.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub include_module: bool,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::parse(
            std::env::var("FIXPACE_LOG").ok().as_deref(),
            std::env::var("FIXPACE_LOG_MODULE").ok().as_deref(),
        )
    }

    fn parse(level: Option<&str>, include_module: Option<&str>) -> Self {
        Self {
            level: level
                .and_then(|v| v.parse::<LevelFilter>().ok())
                .unwrap_or(LevelFilter::Info),
            include_module: include_module.map(|v| v != "0").unwrap_or(true),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Install the global logger. Calling it again is a no-op.
pub fn init(config: &LogConfig) {
    let mut builder = Builder::new();
    builder.filter_level(config.level);

    let include_module = config.include_module;
    builder.format(move |buf, record| {
        let ts = buf.timestamp_millis();
        if include_module {
            writeln!(
                buf,
                "[{ts} {:<5} {}] {}",
                record.level(),
                record.module_path().unwrap_or("?"),
                record.args()
            )
        } else {
            writeln!(buf, "[{ts} {:<5}] {}", record.level(), record.args())
        }
    });

    if builder.try_init().is_err() {
        log::debug!("logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let config = LogConfig::parse(None, None);
        assert_eq!(config.level, LevelFilter::Info);
        assert!(config.include_module);
    }

    #[test]
    fn test_parse_values() {
        let config = LogConfig::parse(Some("trace"), Some("0"));
        assert_eq!(config.level, LevelFilter::Trace);
        assert!(!config.include_module);

        let bogus = LogConfig::parse(Some("loud"), Some("1"));
        assert_eq!(bogus.level, LevelFilter::Info);
        assert!(bogus.include_module);
    }

    #[test]
    fn test_init_twice() {
        let config = LogConfig::parse(Some("warn"), None);
        init(&config);
        init(&config);
    }
}

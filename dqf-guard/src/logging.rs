//! Logging configuration and subscriber setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary. [`setup::init_logging`] builds the usual one: an `EnvFilter`
//! that honors `RUST_LOG` and a plain-text or JSON formatting layer.

/// Default cap on the length of free-form values written into log fields.
pub const MAX_FIELD_LENGTH: usize = 256;

/// Truncates a string to the maximum field length if needed.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for binaries embedding dqf-guard.
pub mod setup {
    use crate::prelude::*;
    use tracing::Level;

    /// Configuration for the logging subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside dqf
        pub level: Level,
        /// Log level for the dqf crates
        pub dqf_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                dqf_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                dqf_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                dqf_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets the log level for dependencies.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for the dqf crates.
        pub fn with_dqf_level(mut self, level: Level) -> Self {
            self.dqf_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                return filter.clone();
            }
            let level = self.level.as_str().to_lowercase();
            let dqf = self.dqf_level.as_str().to_lowercase();
            format!("{level},dqf_guard={dqf},dqf={dqf}")
        }
    }

    /// Installs the global subscriber. `RUST_LOG` takes precedence over the
    /// configured levels.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dqf_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| DqfError::Configuration(format!("cannot install logger: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;
    use tracing::Level;

    #[test]
    fn test_env_filter() {
        let config = LoggingConfig::default();
        assert_eq!(config.env_filter(), "warn,dqf_guard=info,dqf=info");

        let config = LoggingConfig::production().with_dqf_level(Level::DEBUG);
        assert!(config.json_format);
        assert_eq!(config.env_filter(), "warn,dqf_guard=debug,dqf=debug");

        let config = LoggingConfig::development().with_env_filter("dqf_guard=trace");
        assert_eq!(config.env_filter(), "dqf_guard=trace");
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        // never splits a multi-byte character
        assert_eq!(truncate_field("héllo", 2), "h...(truncated)");
    }
}

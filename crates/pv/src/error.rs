//! CLI error types.

use pv_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The Tokio runtime could not be built.
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Ctrl-C handling could not be installed while watching.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),

    #[error("Preview server failed: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_messages_name_the_failing_part() {
        let runtime = CliError::Runtime(std::io::Error::other("no threads"));
        let signal = CliError::Signal(std::io::Error::other("no handler"));
        let server = CliError::Server("address in use".to_owned());

        assert_eq!(
            runtime.to_string(),
            "Failed to start async runtime: no threads"
        );
        assert_eq!(
            signal.to_string(),
            "Failed to listen for shutdown signal: no handler"
        );
        assert_eq!(server.to_string(), "Preview server failed: address in use");
    }

    #[test]
    fn test_config_error_passes_through() {
        let err = CliError::from(ConfigError::Validation("server.port cannot be 0".to_owned()));

        assert_eq!(
            err.to_string(),
            "Configuration error: server.port cannot be 0"
        );
    }
}

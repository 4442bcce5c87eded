use mmtop::engine::config::ConfigError;
use mmtop::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_their_message() {
        let err: CliError = ConfigError::MissingParameter("complex").into();
        assert_eq!(
            err.to_string(),
            format!("Configuration error: {}", ConfigError::MissingParameter("complex"))
        );
    }

    #[test]
    fn engine_errors_are_transparent() {
        let err: CliError = EngineError::MissingMutationSpec.into();
        assert_eq!(err.to_string(), "No residue for mutation was defined");
    }
}

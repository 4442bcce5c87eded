use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::config::{ConfigError, ResidueSpecifier};
use crate::core::io::pdb::PdbError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{tool} failed when {operation} (exit status: {})", describe_status(.status))]
    ExternalTool {
        tool: String,
        operation: String,
        status: Option<i32>,
    },

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Residue {spec} not found")]
    ResidueNotFound { spec: ResidueSpecifier },

    #[error("No residue for mutation was defined")]
    MissingMutationSpec,

    #[error("Failed to process structure {path:?}: {source}")]
    Structure {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_tool_error_names_tool_operation_and_status() {
        let err = EngineError::ExternalTool {
            tool: "gmx trjconv".into(),
            operation: "extracting the complex snapshot".into(),
            status: Some(1),
        };
        assert_eq!(
            err.to_string(),
            "gmx trjconv failed when extracting the complex snapshot (exit status: 1)"
        );
    }

    #[test]
    fn signal_termination_is_reported_without_status() {
        let err = EngineError::ExternalTool {
            tool: "tleap".into(),
            operation: "building topologies".into(),
            status: None,
        };
        assert!(err.to_string().ends_with("(exit status: terminated by signal)"));
    }

    #[test]
    fn residue_not_found_uses_chain_number_form() {
        let err = EngineError::ResidueNotFound {
            spec: "A:99".parse().unwrap(),
        };
        assert_eq!(err.to_string(), "Residue A:99 not found");
    }
}

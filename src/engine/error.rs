//! Engine error taxonomy

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::ExecutionResult;
use crate::languages::Language;

/// Why a process did not complete successfully
#[derive(Debug, Error)]
pub enum ProcessFailureReason {
    #[error("failed to start: {0}")]
    Spawn(#[source] io::Error),
    #[error("failed while collecting output: {0}")]
    Wait(#[source] io::Error),
    #[error("{}", describe_exit(.0))]
    Exit(Option<i32>),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(Language),

    #[error("failed to write source to {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to feed stdin: {0}")]
    StdinFailure(#[source] io::Error),

    #[error("failed to capture stderr: {0}")]
    StderrPipeFailure(#[source] io::Error),

    /// Spawn error, wait error or non-zero exit. `output` holds whatever was
    /// captured before the failure (empty when the process never started).
    #[error("process {reason}")]
    ProcessFailure {
        #[source]
        reason: ProcessFailureReason,
        output: ExecutionResult,
    },

    #[error("execution timed out after {}ms", .0.as_millis())]
    ExecutionTimeout(Duration),

    #[error("execution cancelled")]
    ExecutionCancelled,

    #[error("failed to remove {}: {source}", path.display())]
    CleanupFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    pub(crate) fn process(reason: ProcessFailureReason, output: ExecutionResult) -> Self {
        EngineError::ProcessFailure { reason, output }
    }

    /// Output captured before a process failure, if any
    pub fn partial_output(&self) -> Option<&ExecutionResult> {
        match self {
            EngineError::ProcessFailure { output, .. } => Some(output),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::UnsupportedLanguage(Language::Go);
        assert_eq!(err.to_string(), "unsupported language: go");

        let err = EngineError::process(ProcessFailureReason::Exit(Some(2)), ExecutionResult::default());
        assert_eq!(err.to_string(), "process exited with status 2");

        let err = EngineError::process(ProcessFailureReason::Exit(None), ExecutionResult::default());
        assert_eq!(err.to_string(), "process terminated by signal");

        let err = EngineError::ExecutionTimeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "execution timed out after 1500ms");
    }

    #[test]
    fn test_partial_output_only_for_process_failure() {
        let output = ExecutionResult {
            stdout: "partial".into(),
            stderr: "boom".into(),
        };
        let err = EngineError::process(ProcessFailureReason::Exit(Some(1)), output.clone());
        assert_eq!(err.partial_output(), Some(&output));

        assert!(EngineError::ExecutionCancelled.partial_output().is_none());
    }
}

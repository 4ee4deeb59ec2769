//! Execution engine
//!
//! Turns (language, source text) into a captured run:
//! - `write_code` materializes the source as an artifact under the temp dir
//! - `run` executes the artifact once per input
//! - `delete_code` removes the artifact, logging (never returning) failures
//!
//! An artifact is owned by whoever called `write_code` and must not be run
//! concurrently with itself. Distinct artifacts share nothing but the
//! read-only language registry.

mod context;
mod error;
mod executer;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::languages::Language;

pub use context::ExecutionContext;
pub use error::{EngineError, ProcessFailureReason};
pub use executer::ExecutionEngine;

/// A source file written for one submission
#[derive(Debug, PartialEq)]
pub struct Code {
    pub path: PathBuf,
    pub language: Language,
}

/// Captured output of one run; trailing newlines are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
}

/// What the request handler needs from an engine
#[async_trait]
pub trait CodeEngine: Send + Sync {
    /// Write `source` to a fresh artifact for `language`
    async fn write_code(&self, language: Language, source: &str) -> Result<Code, EngineError>;

    /// Run `code`, feeding `input` to stdin when non-empty
    async fn run(
        &self,
        ctx: &ExecutionContext,
        code: &Code,
        input: &[u8],
    ) -> Result<ExecutionResult, EngineError>;

    /// Remove the artifact; failures are only logged
    async fn delete_code(&self, code: Code);
}

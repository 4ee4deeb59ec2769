use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Code, CodeEngine, EngineError, ExecutionContext, ExecutionResult, ProcessFailureReason};
use crate::languages::{Language, LanguageRegistry};
use crate::runner::{Executor, LocalExecutor, Process};
use crate::workspace::{FileManager, LocalFileManager};

/// Engine that writes artifacts through a `FileManager` and runs them
/// through an `Executor`
pub struct ExecutionEngine<E = LocalExecutor, F = LocalFileManager> {
    temp_dir: PathBuf,
    file_prefix: String,
    languages: &'static LanguageRegistry,
    executor: E,
    files: F,
}

impl ExecutionEngine {
    /// Create an engine that runs programs on the host and writes artifacts
    /// as `<temp_dir>/<file_prefix>-<uuid>.<extension>`
    pub fn new(
        temp_dir: impl AsRef<Path>,
        file_prefix: impl Into<String>,
        languages: &'static LanguageRegistry,
    ) -> Self {
        Self {
            temp_dir: temp_dir.as_ref().to_path_buf(),
            file_prefix: file_prefix.into(),
            languages,
            executor: LocalExecutor,
            files: LocalFileManager,
        }
    }
}

impl<E, F> ExecutionEngine<E, F> {
    pub fn with_executor<E2>(self, executor: E2) -> ExecutionEngine<E2, F> {
        ExecutionEngine {
            temp_dir: self.temp_dir,
            file_prefix: self.file_prefix,
            languages: self.languages,
            executor,
            files: self.files,
        }
    }

    pub fn with_file_manager<F2>(self, files: F2) -> ExecutionEngine<E, F2> {
        ExecutionEngine {
            temp_dir: self.temp_dir,
            file_prefix: self.file_prefix,
            languages: self.languages,
            executor: self.executor,
            files,
        }
    }

    /// Each call yields a fresh name so concurrent submissions never collide
    fn artifact_path(&self, extension: &str) -> PathBuf {
        let base_name = format!("{}-{}", self.file_prefix, Uuid::new_v4().simple());
        self.temp_dir.join(format!("{}.{}", base_name, extension))
    }
}

#[async_trait]
impl<E, F> CodeEngine for ExecutionEngine<E, F>
where
    E: Executor,
    F: FileManager,
{
    async fn write_code(&self, language: Language, source: &str) -> Result<Code, EngineError> {
        let config = self.languages.lookup(language)?;
        let path = self.artifact_path(&config.extension);

        let written = async {
            let mut file = self.files.create(&path).await?;
            file.write_all(source.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(source) = written {
            if let Err(e) = self.files.remove(&path).await {
                warn!("Failed to remove partial artifact {}: {}", path.display(), e);
            }
            return Err(EngineError::WriteFailure { path, source });
        }

        debug!(
            "Wrote {} bytes of {} source to {}",
            source.len(),
            language,
            path.display()
        );

        Ok(Code { path, language })
    }

    async fn run(
        &self,
        ctx: &ExecutionContext,
        code: &Code,
        input: &[u8],
    ) -> Result<ExecutionResult, EngineError> {
        let config = self.languages.lookup(code.language)?;
        let cmd = config.command_for(&code.path).with_stdin(!input.is_empty());

        if ctx.is_cancelled() {
            return Err(EngineError::ExecutionCancelled);
        }

        debug!("Running {:?} with {} bytes of input", cmd.to_vec(), input.len());

        let mut process = self.executor.spawn(&cmd).map_err(|e| {
            EngineError::process(ProcessFailureReason::Spawn(e), ExecutionResult::default())
        })?;

        let stdin = if input.is_empty() {
            None
        } else {
            Some(process.take_stdin().map_err(EngineError::StdinFailure)?)
        };
        let mut stderr = process
            .take_stderr()
            .map_err(EngineError::StderrPipeFailure)?;

        let feed_stdin = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input).await?;
                stdin.shutdown().await?;
                // Closing the pipe signals end-of-input to the child
                drop(stdin);
            }
            Ok::<_, std::io::Error>(())
        };

        let drain_stderr = async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        };

        // Dropping this future kills the process group and releases the drain
        let completion = async {
            tokio::join!(feed_stdin, process.collect_output(), drain_stderr)
        };

        let (fed, exit, stderr) = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                warn!("Run of {} cancelled", code.path.display());
                return Err(EngineError::ExecutionCancelled);
            }
            _ = ctx.deadline() => {
                let timeout = ctx.timeout().unwrap_or_default();
                warn!("Run of {} timed out after {:?}", code.path.display(), timeout);
                return Err(EngineError::ExecutionTimeout(timeout));
            }
            completed = completion => completed,
        };

        let stderr_text = stderr
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        let exit = match exit {
            Ok(exit) => exit,
            Err(e) => {
                let output = ExecutionResult {
                    stdout: String::new(),
                    stderr: stderr_text,
                };
                return Err(EngineError::process(ProcessFailureReason::Wait(e), output));
            }
        };

        let output = ExecutionResult {
            stdout: String::from_utf8_lossy(&exit.stdout).into_owned(),
            stderr: stderr_text,
        };

        if !exit.success() {
            debug!(
                "Run of {} failed with {:?}; keeping {} bytes of stdout",
                code.path.display(),
                exit.code,
                output.stdout.len()
            );
            return Err(EngineError::process(
                ProcessFailureReason::Exit(exit.code),
                output,
            ));
        }

        stderr.map_err(EngineError::StderrPipeFailure)?;
        fed.map_err(EngineError::StdinFailure)?;

        Ok(output)
    }

    async fn delete_code(&self, code: Code) {
        match self.files.remove(&code.path).await {
            Ok(()) => debug!("Removed {}", code.path.display()),
            Err(source) => {
                let err = EngineError::CleanupFailure {
                    path: code.path,
                    source,
                };
                warn!("{}", err);
            }
        }
    }
}

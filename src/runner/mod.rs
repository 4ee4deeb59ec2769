//! Runner module - Process abstraction layer
//!
//! This module describes how a program is started and how its streams are
//! reached, without deciding what to do with them:
//! - `Executor`: starts a `CommandSpec` as a `Process`
//! - `Process`: hands out the stdin/stderr pipes and collects stdout + exit
//! - `LocalExecutor`: the real implementation on top of tokio's process API
//!
//! The runner module does NOT:
//! - Know about languages or source files
//! - Enforce timeouts (the engine races the run against its context)
//! - Interpret exit codes

pub mod local;

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Whether the child gets a stdin pipe (otherwise stdin is null)
    pub pipe_stdin: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            pipe_stdin: false,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_stdin(mut self, pipe_stdin: bool) -> Self {
        self.pipe_stdin = pipe_stdin;
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        Self::new(program).with_args(iter.cloned())
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.iter().cloned());
        v
    }
}

/// Stdout and exit status of a finished process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessExit {
    /// Exit code (None if killed by a signal)
    pub code: Option<i32>,
    /// Everything the process wrote to stdout
    pub stdout: Vec<u8>,
}

impl ProcessExit {
    /// Check if the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Starts external commands
pub trait Executor: Send + Sync {
    type Process: Process;

    /// Start `cmd`; stdout and stderr are always piped
    fn spawn(&self, cmd: &CommandSpec) -> io::Result<Self::Process>;
}

/// A started process whose streams have not been consumed yet
///
/// Dropping a process (or the future returned by `collect_output`) before it
/// finishes must terminate the child.
#[async_trait]
pub trait Process: Send + 'static {
    type Stdin: AsyncWrite + Unpin + Send + 'static;
    type Stderr: AsyncRead + Unpin + Send + 'static;

    /// Take the write end of the child's stdin
    fn take_stdin(&mut self) -> io::Result<Self::Stdin>;

    /// Take the read end of the child's stderr
    fn take_stderr(&mut self) -> io::Result<Self::Stderr>;

    /// Read stdout to completion and wait for the child to exit
    async fn collect_output(self) -> io::Result<ProcessExit>;
}

pub use local::LocalExecutor;

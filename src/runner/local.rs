//! Local runner implementation
//!
//! Starts programs directly on the host through tokio's process API.
//!
//! Every child leads its own process group. A process dropped before it has
//! been waited on takes the whole group down with it, so programs started by
//! the child (`go run` builds and execs the real binary, `sh` forks its
//! commands) die on timeout too.

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io;
use std::process::Stdio;
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tracing::{debug, warn};

use super::{CommandSpec, Executor, Process, ProcessExit};

/// Executor that starts programs directly on the host
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutor;

impl Executor for LocalExecutor {
    type Process = LocalProcess;

    fn spawn(&self, cmd: &CommandSpec) -> io::Result<LocalProcess> {
        debug!("Spawning {:?} with args: {:?}", cmd.program, cmd.args);

        let stdin = if cmd.pipe_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()?;

        let group = child.id().map(|pid| ProcessGroup::new(Pid::from_raw(pid as i32)));

        Ok(LocalProcess { child, group })
    }
}

/// SIGKILLs a process group when dropped, unless disarmed
#[derive(Debug)]
struct ProcessGroup {
    pgid: Pid,
    armed: bool,
}

impl ProcessGroup {
    fn new(pgid: Pid) -> Self {
        Self { pgid, armed: true }
    }

    /// The leader has been reaped; its id may be reused from now on
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match killpg(self.pgid, Signal::SIGKILL) {
            Ok(()) => debug!("Killed process group {}", self.pgid),
            Err(Errno::ESRCH) => {}
            Err(e) => warn!("Failed to kill process group {}: {}", self.pgid, e),
        }
    }
}

/// A child started by `LocalExecutor`; its process group is killed if
/// dropped while running
#[derive(Debug)]
pub struct LocalProcess {
    child: Child,
    group: Option<ProcessGroup>,
}

#[async_trait]
impl Process for LocalProcess {
    type Stdin = ChildStdin;
    type Stderr = ChildStderr;

    fn take_stdin(&mut self) -> io::Result<ChildStdin> {
        self.child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin is not piped"))
    }

    fn take_stderr(&mut self) -> io::Result<ChildStderr> {
        self.child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stderr is not piped"))
    }

    async fn collect_output(self) -> io::Result<ProcessExit> {
        let LocalProcess { child, mut group } = self;
        let output = child.wait_with_output().await?;
        if let Some(group) = group.as_mut() {
            group.disarm();
        }
        Ok(ProcessExit {
            code: output.status.code(),
            stdout: output.stdout,
        })
    }
}

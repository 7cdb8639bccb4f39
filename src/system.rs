use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use crate::terminal;

/// A program and its arguments, kept as plain strings so it can be logged,
/// compared in tests and handed to either a bounded run or `exec`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Result of looking a program up on `PATH`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolAvailability {
    Available(PathBuf),
    NotFound,
    Error(String),
}

/// How a bounded run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    NotFound,
    Failed(String),
}

/// Process-level side effects of the launcher.
pub trait System {
    fn probe(&self, program: &str) -> ToolAvailability;

    /// Runs `cmd` to completion, giving up after `limit`.
    fn run_bounded(&self, cmd: &CommandSpec, limit: Duration) -> RunOutcome;

    /// Replaces the current process with `cmd`. Only returns on failure.
    fn replace_process(&self, cmd: &CommandSpec) -> io::Error;
}

/// The real system: `which` lookups, tokio child processes, `exec`.
pub struct HostSystem {
    runtime: tokio::runtime::Runtime,
}

impl HostSystem {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }
}

impl System for HostSystem {
    fn probe(&self, program: &str) -> ToolAvailability {
        match which::which(program) {
            Ok(path) => ToolAvailability::Available(path),
            Err(which::Error::CannotFindBinaryPath) => ToolAvailability::NotFound,
            Err(err) => ToolAvailability::Error(err.to_string()),
        }
    }

    fn run_bounded(&self, cmd: &CommandSpec, limit: Duration) -> RunOutcome {
        self.runtime.block_on(async {
            let output = tokio::process::Command::new(&cmd.program)
                .args(&cmd.args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output();

            match tokio::time::timeout(limit, output).await {
                Err(_) => RunOutcome::TimedOut,
                Ok(Err(err)) if err.kind() == io::ErrorKind::NotFound => RunOutcome::NotFound,
                Ok(Err(err)) => RunOutcome::Failed(err.to_string()),
                Ok(Ok(output)) => RunOutcome::Exited {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                },
            }
        })
    }

    #[cfg(unix)]
    fn replace_process(&self, cmd: &CommandSpec) -> io::Error {
        use std::os::unix::process::CommandExt;

        if let Err(err) = terminal::suspend() {
            return err;
        }
        let err = std::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .exec();
        if let Err(resume_err) = terminal::resume() {
            log::warn!("failed to restore terminal after exec error: {resume_err}");
        }
        err
    }

    #[cfg(not(unix))]
    fn replace_process(&self, cmd: &CommandSpec) -> io::Error {
        if let Err(err) = terminal::suspend() {
            return err;
        }
        match std::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .status()
        {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(err) => {
                if let Err(resume_err) = terminal::resume() {
                    log::warn!("failed to restore terminal after spawn error: {resume_err}");
                }
                err
            }
        }
    }
}

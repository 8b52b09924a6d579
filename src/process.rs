use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Child shares the harness's stdin/stdout/stderr.
    Inherit,
    /// All three streams go to the null device.
    Ignore,
}

/// Stream mode for a spawn: the caller's choice, else silent under `--quiet`.
pub fn resolve_stdio(requested: Option<StdioMode>, quiet: bool) -> StdioMode {
    match requested {
        Some(mode) => mode,
        None if quiet => StdioMode::Ignore,
        None => StdioMode::Inherit,
    }
}

/// An external command to run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub stdio: Option<StdioMode>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdio: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn stdio(mut self, mode: StdioMode) -> Self {
        self.stdio = Some(mode);
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` was terminated by a signal")]
    Signal { program: String },

    #[error("non-zero exit code: {0}")]
    NonZeroExit(i32),
}

/// Spawns commands and waits for them. The contract is exit-code based:
/// `Ok(())` for status 0, an error otherwise.
pub trait Runner: Sync {
    fn run(&self, cmd: &CommandSpec) -> Result<(), RunError>;
}

pub struct SystemRunner {
    quiet: bool,
}

impl SystemRunner {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Runner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<(), RunError> {
        let mode = resolve_stdio(cmd.stdio, self.quiet);
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(cwd) = &cmd.cwd {
            command.current_dir(cwd);
        }
        if mode == StdioMode::Ignore {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }

        debug!(command = %cmd, cwd = ?cmd.cwd, stdio = ?mode, "spawning");
        let status = command.status().map_err(|source| RunError::Spawn {
            program: cmd.program.clone(),
            source,
        })?;
        check_status(&cmd.program, status)
    }
}

fn check_status(program: &str, status: ExitStatus) -> Result<(), RunError> {
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(RunError::NonZeroExit(code)),
        None => Err(RunError::Signal {
            program: program.to_string(),
        }),
    }
}

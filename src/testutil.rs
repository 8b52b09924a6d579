use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::process::{CommandSpec, RunError, Runner, StdioMode};

/// One recorded spawn.
#[derive(Debug, Clone)]
pub struct Call {
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub stdio: Option<StdioMode>,
}

type Response = Box<dyn Fn(&str, Option<&Path>) -> Result<(), RunError> + Send + Sync>;

/// A `Runner` that records every command instead of spawning it. The
/// response closure sees the rendered command line and the cwd.
pub struct RecordingRunner {
    calls: Mutex<Vec<Call>>,
    respond: Response,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingRunner {
    pub fn with_response(
        respond: impl Fn(&str, Option<&Path>) -> Result<(), RunError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_response(|_, _| Ok(()))
    }

    /// Every `standard --verbose ...` lint fails; fix and git succeed.
    pub fn failing_lint() -> Self {
        Self::with_response(|cmd, _| {
            if cmd.starts_with("standard --verbose") {
                Err(RunError::NonZeroExit(1))
            } else {
                Ok(())
            }
        })
    }

    /// Hold every call for `delay` so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Runner for RecordingRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<(), RunError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let command = cmd.to_string();
        self.calls.lock().unwrap().push(Call {
            command: command.clone(),
            cwd: cmd.cwd.clone(),
            stdio: cmd.stdio,
        });
        let result = (self.respond)(&command, cmd.cwd.as_deref());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Default harness config with its working-tree root at `<dir>/tmp`.
pub fn harness_in(dir: &Path) -> HarnessConfig {
    HarnessConfig::default().with_workdir(dir.join("tmp"))
}

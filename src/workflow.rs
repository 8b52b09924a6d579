//! The per-project pipeline: fetch, lint, and on failure optionally fix and
//! hard-reset.
//!
//! Every path through [`Workflow::run`] reports exactly one assertion unless
//! it ends in a [`FatalError`]. Lint and fix failures are recorded and
//! absorbed; a failed fetch or reset aborts the whole run.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cli::RunConfig;
use crate::config::HarnessConfig;
use crate::process::{CommandSpec, RunError, Runner, StdioMode};
use crate::project::Project;
use crate::report::SharedReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOp {
    Clone,
    Pull,
    Reset,
}

impl fmt::Display for GitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GitOp::Clone => "clone",
            GitOp::Pull => "pull",
            GitOp::Reset => "reset",
        })
    }
}

/// Errors that end the run instead of a single project.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("failed to create working-tree root {}", .path.display())]
    WorkingTreeRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git {op} failed for {project}")]
    Git {
        op: GitOp,
        project: String,
        #[source]
        source: RunError,
    },
}

/// How a workflow that did not abort ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    /// Offline with no local copy; reported as a passing assertion.
    Skipped,
    /// Lint failed and the fix invocation ran; `passed` is the fix result.
    Fixed { passed: bool },
}

pub struct Workflow<'a> {
    config: RunConfig,
    harness: &'a HarnessConfig,
    runner: &'a dyn Runner,
    root: PathBuf,
}

impl<'a> Workflow<'a> {
    pub fn new(config: RunConfig, harness: &'a HarnessConfig, runner: &'a dyn Runner) -> Self {
        Self {
            config,
            harness,
            runner,
            root: harness.workdir(),
        }
    }

    /// Working-tree root shared by all projects.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checkout_dir(&self, project: &Project) -> PathBuf {
        self.root.join(&project.name)
    }

    pub fn run(
        &self,
        project: &Project,
        reporter: &SharedReporter<'_>,
    ) -> Result<Outcome, FatalError> {
        fs::create_dir_all(&self.root).map_err(|source| FatalError::WorkingTreeRoot {
            path: self.root.clone(),
            source,
        })?;

        let folder = self.checkout_dir(project);
        let label = project.label();
        let has_copy = has_working_copy(&folder);

        if self.config.offline {
            if !has_copy {
                reporter.pass(&format!("SKIPPING (offline): {label}"));
                return Ok(Outcome::Skipped);
            }
            debug!(project = %project.name, "offline, linting existing checkout");
        } else if has_copy {
            self.git(project, GitOp::Pull, &folder)?;
        } else {
            self.git(project, GitOp::Clone, &folder)?;
        }

        self.lint(project, &folder, &label, reporter)
    }

    fn lint(
        &self,
        project: &Project,
        folder: &Path,
        label: &str,
        reporter: &SharedReporter<'_>,
    ) -> Result<Outcome, FatalError> {
        let linter = &self.harness.linter;
        let cmd = CommandSpec::new(&linter.command)
            .arg(&linter.verbose_flag)
            .args(&project.args)
            .current_dir(folder);

        match self.runner.run(&cmd) {
            Ok(()) => {
                reporter.pass(label);
                Ok(Outcome::Passed)
            }
            Err(err) if self.config.fix => {
                debug!(project = %project.name, error = %err, "lint failed, trying fix");
                reporter.comment(&format!("Attempting {} on {label}", linter.fix_flag));
                self.fix(project, folder, label, reporter)
            }
            Err(err) => {
                warn!(project = %project.name, error = %err, "lint failed");
                reporter.fail(label);
                Ok(Outcome::Failed)
            }
        }
    }

    fn fix(
        &self,
        project: &Project,
        folder: &Path,
        label: &str,
        reporter: &SharedReporter<'_>,
    ) -> Result<Outcome, FatalError> {
        let linter = &self.harness.linter;
        let cmd = CommandSpec::new(&linter.command)
            .arg(&linter.fix_flag)
            .arg(&linter.verbose_flag)
            .args(&project.args)
            .current_dir(folder);

        let passed = match self.runner.run(&cmd) {
            Ok(()) => true,
            Err(err) => {
                warn!(project = %project.name, error = %err, "fix failed");
                false
            }
        };
        reporter.assert(passed, &format!("{label} with {}", linter.fix_flag));

        self.git(project, GitOp::Reset, folder)?;
        Ok(Outcome::Fixed { passed })
    }

    fn git(&self, project: &Project, op: GitOp, folder: &Path) -> Result<(), FatalError> {
        let git = CommandSpec::new(&self.harness.git).stdio(StdioMode::Ignore);
        let cmd = match op {
            GitOp::Clone => git
                .args(["clone", "--depth", "1"])
                .arg(&project.repo)
                .arg(folder),
            GitOp::Pull => git.arg("pull").current_dir(folder),
            GitOp::Reset => git.args(["reset", "--hard"]).current_dir(folder),
        };

        info!(project = %project.name, "git {op}");
        self.runner.run(&cmd).map_err(|source| FatalError::Git {
            op,
            project: project.name.clone(),
            source,
        })
    }
}

/// A checkout counts as present when it is a directory this process can
/// read, write and enter.
pub fn has_working_copy(folder: &Path) -> bool {
    fs::metadata(folder).is_ok_and(|meta| meta.is_dir()) && accessible(folder)
}

#[cfg(unix)]
fn accessible(folder: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(folder.as_os_str().as_bytes()) else {
        return false;
    };
    // Safety: c_path is NUL-terminated and outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK | libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn accessible(folder: &Path) -> bool {
    fs::metadata(folder).is_ok_and(|meta| !meta.permissions().readonly())
        && fs::read_dir(folder).is_ok()
}

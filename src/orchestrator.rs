use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cli::RunConfig;
use crate::config::HarnessConfig;
use crate::process::Runner;
use crate::project::Project;
use crate::report::{Reporter, SharedReporter};
use crate::workflow::{FatalError, Workflow};

pub const TEST_NAME: &str = "test repositories that use the linter";

/// Workers for a machine with `detected` hardware threads: one is left for
/// the harness itself, but never fewer than one.
pub fn concurrency_for(detected: usize) -> usize {
    detected.saturating_sub(1).max(1)
}

pub fn default_concurrency() -> usize {
    let detected = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    concurrency_for(detected)
}

/// Runs one workflow per active project on a bounded worker pool and
/// reports into a single test case whose plan is the project count.
pub struct Orchestrator<'a> {
    workflow: Workflow<'a>,
    concurrency: usize,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: RunConfig, harness: &'a HarnessConfig, runner: &'a dyn Runner) -> Self {
        Self {
            workflow: Workflow::new(config, harness, runner),
            concurrency: default_concurrency(),
        }
    }

    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every project. Returns the first fatal error; in-flight
    /// workflows finish first, queued ones never start, and the test case is
    /// left open.
    pub fn run(&self, projects: &[Project], reporter: &mut dyn Reporter) -> Result<()> {
        reporter.begin_test(TEST_NAME);
        reporter.plan(projects.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency())
            .thread_name(|i| format!("corpus-lint-{i}"))
            .build()
            .context("failed to build worker pool")?;

        info!(
            projects = projects.len(),
            workers = self.concurrency(),
            root = %self.workflow.root().display(),
            "running workflows"
        );

        let result = {
            let shared = SharedReporter::new(&mut *reporter);
            pool.install(|| {
                projects.par_iter().try_for_each(|project| {
                    let outcome = self.workflow.run(project, &shared)?;
                    debug!(project = %project.name, ?outcome, "workflow finished");
                    Ok::<(), FatalError>(())
                })
            })
        };
        result?;

        reporter.end_test();
        Ok(())
    }
}

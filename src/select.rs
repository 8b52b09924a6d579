use tracing::info;

use crate::cli::RunConfig;
use crate::project::Project;
use crate::report::Reporter;

/// `--quick` keeps this many candidates before partitioning.
pub const QUICK_LIMIT: usize = 20;

pub const DISABLED_TEST_NAME: &str = "Disabled projects";

/// Candidates split by their disable marker. Both partitions keep the
/// candidate order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub enabled: Vec<Project>,
    pub disabled: Vec<Project>,
    disabled_only: bool,
}

impl Selection {
    /// The projects this run exercises.
    pub fn active(&self) -> &[Project] {
        if self.disabled_only {
            &self.disabled
        } else {
            &self.enabled
        }
    }

    pub fn disabled_only(&self) -> bool {
        self.disabled_only
    }
}

pub fn select(candidates: &[Project], config: RunConfig) -> Selection {
    let candidates = if config.quick {
        &candidates[..candidates.len().min(QUICK_LIMIT)]
    } else {
        candidates
    };

    let (disabled, enabled): (Vec<Project>, Vec<Project>) =
        candidates.iter().cloned().partition(Project::is_disabled);

    Selection {
        enabled,
        disabled,
        disabled_only: config.disabled_only,
    }
}

/// Log each disabled project and record the always-passing test case that
/// lists them. Nothing is emitted when the run targets disabled projects.
pub fn report_disabled(selection: &Selection, reporter: &mut dyn Reporter) {
    if selection.disabled_only {
        return;
    }
    reporter.begin_test(DISABLED_TEST_NAME);
    for project in &selection.disabled {
        info!(
            "DISABLED: {}: {} ({})",
            project.name,
            project.disable_reason().unwrap_or_default(),
            project.repo
        );
    }
    reporter.end_test();
}

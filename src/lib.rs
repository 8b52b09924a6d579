pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod process;
pub mod project;
pub mod report;
pub mod select;
pub mod workflow;

#[cfg(test)]
pub mod testutil;

use anyhow::Result;
use tracing::info;

use cli::{Args, RunConfig};
use config::{HarnessConfig, config_path_from_env, load_config};
use orchestrator::Orchestrator;
use process::{Runner, SystemRunner};
use report::{Reporter, Summary, create_reporter};
use select::{report_disabled, select};

/// Run the harness. Returns the exit code: 0 = every assertion passed,
/// 1 = at least one failed.
pub fn run(args: Args) -> Result<i32> {
    let config = args.run_config();
    let harness = load_config(config_path_from_env().as_deref())?;
    let runner = SystemRunner::new(config.quiet);
    let mut reporter = create_reporter(harness.format, Box::new(std::io::stdout()));

    let summary = run_with(config, &harness, &runner, reporter.as_mut())?;
    Ok(if summary.is_ok() { 0 } else { 1 })
}

/// Load and select projects, record the disabled ones, run the active set
/// and close the report.
pub fn run_with(
    config: RunConfig,
    harness: &HarnessConfig,
    runner: &dyn Runner,
    reporter: &mut dyn Reporter,
) -> Result<Summary> {
    let candidates = harness.load_projects()?;
    let selection = select(&candidates, config);
    info!(
        candidates = candidates.len(),
        active = selection.active().len(),
        disabled = selection.disabled.len(),
        disabled_only = selection.disabled_only(),
        config_dir = ?harness.config_dir(),
        "selected projects"
    );

    report_disabled(&selection, reporter);
    Orchestrator::new(config, harness, runner).run(selection.active(), reporter)?;
    Ok(reporter.finish())
}

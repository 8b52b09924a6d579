use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::project::{Project, load_projects, validate_projects};
use crate::report::ReportFormat;

/// Environment variable naming the harness config file.
pub const CONFIG_ENV: &str = "CORPUS_LINT_CONFIG";

/// Looked up in the current directory when `CORPUS_LINT_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "corpus-lint.yml";

/// How to invoke the linter under test.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinterConfig {
    pub command: String,
    pub verbose_flag: String,
    pub fix_flag: String,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            command: "standard".to_string(),
            verbose_flag: "--verbose".to_string(),
            fix_flag: "--fix".to_string(),
        }
    }
}

/// Harness settings from `corpus-lint.yml`. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Version-control program.
    pub git: String,
    pub linter: LinterConfig,
    /// Working-tree root holding one checkout per project.
    pub workdir: PathBuf,
    pub format: ReportFormat,
    /// External project list (JSON array or YAML sequence).
    pub projects_file: Option<PathBuf>,
    /// Inline projects, listed before those from `projects_file`.
    pub projects: Vec<Project>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    config_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            linter: LinterConfig::default(),
            workdir: PathBuf::from("tmp"),
            format: ReportFormat::default(),
            projects_file: None,
            projects: Vec::new(),
            config_dir: None,
        }
    }
}

impl HarnessConfig {
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    /// Directory the config was loaded from, if any.
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match self.config_dir() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn workdir(&self) -> PathBuf {
        self.resolve(&self.workdir)
    }

    /// Inline projects followed by the project list file, validated.
    pub fn load_projects(&self) -> Result<Vec<Project>> {
        let mut projects = self.projects.clone();
        if let Some(file) = &self.projects_file {
            projects.extend(load_projects(&self.resolve(file))?);
        }
        validate_projects(&projects)?;
        Ok(projects)
    }
}

/// Config path named by `CORPUS_LINT_CONFIG`, if set.
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Load the harness config. An explicit `path` must exist; otherwise
/// `corpus-lint.yml` in the current directory is used when present, and
/// defaults when it is not.
pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(HarnessConfig::default());
            }
            default
        }
    };

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let mut config: HarnessConfig = if contents.trim().is_empty() {
        HarnessConfig::default()
    } else {
        serde_yml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?
    };

    let dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    config.config_dir = Some(dir.to_path_buf());
    Ok(config)
}

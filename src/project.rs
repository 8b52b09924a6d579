//! Candidate project descriptors and the list files they come from.
//!
//! A project list is an external data source: either a JSON array or a YAML
//! sequence of `{name, repo, disable?, args?}` entries. The harness only
//! reads it.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Directory name under the working-tree root.
    pub name: String,
    /// Repository URL passed to `git clone`.
    #[serde(alias = "repoURL", alias = "url")]
    pub repo: String,
    /// Reason this project is skipped by default. Empty means enabled.
    #[serde(default)]
    pub disable: Option<String>,
    /// Extra arguments appended to every linter invocation.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo: repo.into(),
            disable: None,
            args: Vec::new(),
        }
    }

    pub fn disabled(mut self, reason: impl Into<String>) -> Self {
        self.disable = Some(reason.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn disable_reason(&self) -> Option<&str> {
        self.disable.as_deref().filter(|reason| !reason.is_empty())
    }

    pub fn is_disabled(&self) -> bool {
        self.disable_reason().is_some()
    }

    /// `name (repo)`, used in every reported result.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.repo)
    }
}

/// Read a project list file. `.json` files are parsed as JSON, everything
/// else as YAML.
pub fn load_projects(path: &Path) -> Result<Vec<Project>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read project list {}", path.display()))?;
    let projects: Vec<Project> = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse project list {}", path.display()))?
    } else {
        serde_yml::from_str(&contents)
            .with_context(|| format!("failed to parse project list {}", path.display()))?
    };
    Ok(projects)
}

/// Names must be usable as a single directory under the working-tree root
/// and unique across the list.
pub fn validate_projects(projects: &[Project]) -> Result<()> {
    let mut seen = HashSet::new();
    for project in projects {
        let name = project.name.as_str();
        if name.is_empty() || name == "." || name == ".." {
            anyhow::bail!("invalid project name {name:?} (repo {})", project.repo);
        }
        if name.contains('/') || name.contains('\\') {
            anyhow::bail!("project name {name:?} must not contain a path separator");
        }
        if project.repo.is_empty() {
            anyhow::bail!("project {name:?} has no repo URL");
        }
        if !seen.insert(name) {
            anyhow::bail!("duplicate project name {name:?}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn empty_disable_reason_counts_as_enabled() {
        let project = Project::new("a", "u1").disabled("");
        assert!(!project.is_disabled());
        assert_eq!(project.disable_reason(), None);

        let project = Project::new("b", "u2").disabled("flaky");
        assert!(project.is_disabled());
        assert_eq!(project.disable_reason(), Some("flaky"));
    }

    #[test]
    fn label_includes_repo() {
        let project = Project::new("express", "https://github.com/expressjs/express");
        assert_eq!(
            project.label(),
            "express (https://github.com/expressjs/express)"
        );
    }

    #[test]
    fn loads_json_list_with_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.json");
        fs::write(
            &path,
            r#"[
                {"name": "a", "repo": "https://example.com/a"},
                {"name": "b", "repoURL": "https://example.com/b", "disable": "flaky"},
                {"name": "c", "url": "https://example.com/c", "args": ["--env", "mocha"]}
            ]"#,
        )
        .unwrap();

        let projects = load_projects(&path).unwrap();
        assert_eq!(projects.len(), 3);
        assert_eq!(projects[1].repo, "https://example.com/b");
        assert_eq!(projects[1].disable_reason(), Some("flaky"));
        assert_eq!(projects[2].args, vec!["--env", "mocha"]);
    }

    #[test]
    fn loads_yaml_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.yml");
        fs::write(
            &path,
            "- name: a\n  repo: https://example.com/a\n- name: b\n  repo: https://example.com/b\n  disable: broken upstream\n",
        )
        .unwrap();

        let projects = load_projects(&path).unwrap();
        assert_eq!(
            projects,
            vec![
                Project::new("a", "https://example.com/a"),
                Project::new("b", "https://example.com/b").disabled("broken upstream"),
            ]
        );
    }

    #[test]
    fn missing_list_file_errors() {
        let err = load_projects(Path::new("/no/such/projects.json")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read project list"));
    }

    #[test]
    fn validation_rejects_bad_names() {
        for name in ["", ".", "..", "a/b", "a\\b"] {
            let projects = vec![Project::new(name, "u")];
            assert!(validate_projects(&projects).is_err(), "{name:?} accepted");
        }
    }

    #[test]
    fn validation_rejects_duplicates() {
        let projects = vec![Project::new("a", "u1"), Project::new("a", "u2")];
        let err = validate_projects(&projects).unwrap_err();
        assert!(err.to_string().contains("duplicate project name"));
    }

    #[test]
    fn validation_accepts_unique_names() {
        let projects = vec![
            Project::new("a", "u1"),
            Project::new("b", "u2").disabled("flaky"),
        ];
        assert!(validate_projects(&projects).is_ok());
    }
}

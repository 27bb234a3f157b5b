//! The workspace file: a JSON description of the fleet of projects.
//!
//! ```json
//! {
//!   "root": "/home/me/source",
//!   "projectProfiles": { "web": ["storefront", "checkout"] },
//!   "projects": [
//!     {
//!       "type": "node-web",
//!       "gitDir": "storefront",
//!       "projectDir": "storefront/app",
//!       "projectFile": "storefront/app/package.json"
//!     }
//!   ],
//!   "ignoreDirs": ["scratch"]
//! }
//! ```
//!
//! Every project path is relative to `root`. Profiles name subsets of
//! projects by their repository directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Root workspace document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Directory all project paths are relative to.
    pub root: PathBuf,
    /// Named groups of projects, each listing repository directories.
    #[serde(default)]
    pub project_profiles: HashMap<String, Vec<String>>,
    pub projects: Vec<Project>,
    /// Directories under `root` that analysis should skip.
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
}

/// One project in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    /// Repository directory, relative to the workspace root.
    pub git_dir: String,
    /// Directory holding the buildable project, relative to the root.
    pub project_dir: String,
    /// Main project file (package.json, *.sln, ...), relative to the root.
    pub project_file: String,
}

/// Toolchain a project belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    NodeWeb,
    Dotnet,
}

/// Which directory of a project a command should run in, and which
/// projects participate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetKind {
    /// The repository directory of every project.
    Dir,
    /// The repository directory of every project (git commands).
    Git,
    /// The project directory of node-web projects.
    Npm,
    /// The project directory of dotnet projects.
    Dotnet,
}

impl TargetKind {
    fn includes(self, kind: ProjectKind) -> bool {
        match self {
            TargetKind::Dir | TargetKind::Git => true,
            TargetKind::Npm => kind == ProjectKind::NodeWeb,
            TargetKind::Dotnet => kind == ProjectKind::Dotnet,
        }
    }

    fn sub_dir(self, project: &Project) -> &str {
        match self {
            TargetKind::Dir | TargetKind::Git => &project.git_dir,
            TargetKind::Npm | TargetKind::Dotnet => &project.project_dir,
        }
    }
}

/// One unit of work for the multi-target runner: a resolved directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Directory the command runs in.
    pub dir: PathBuf,
}

impl Workspace {
    /// Load and parse a workspace file.
    pub fn load(path: &Path) -> Result<Workspace> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read workspace file {}", path.display()))?;
        let workspace: Workspace = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse workspace file {}", path.display()))?;
        Ok(workspace)
    }

    /// Resolve the targets a command should run in.
    ///
    /// `profile` restricts the run to the projects listed under that
    /// profile; `kind` restricts by toolchain and selects which directory
    /// each project contributes.
    pub fn select_targets(&self, profile: Option<&str>, kind: TargetKind) -> Result<Vec<Target>> {
        let profile_dirs = match profile {
            Some(name) => Some(
                self.project_profiles
                    .get(name)
                    .with_context(|| format!("profile `{name}` is not defined in the workspace"))?,
            ),
            None => None,
        };

        Ok(self
            .projects
            .iter()
            .filter(|project| profile_dirs.is_none_or(|dirs| dirs.contains(&project.git_dir)))
            .filter(|project| kind.includes(project.kind))
            .map(|project| Target {
                dir: self.root.join(kind.sub_dir(project)),
            })
            .collect())
    }
}

/// True when any path field of the project is empty or still a FIXME
/// placeholder left by `fleet init`.
pub fn has_incomplete_config(project: &Project) -> bool {
    [&project.git_dir, &project.project_dir, &project.project_file]
        .iter()
        .any(|value| value.is_empty() || value.eq_ignore_ascii_case("fixme"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workspace {
        serde_json::from_str(
            r#"{
                "root": "/src",
                "projectProfiles": { "web": ["storefront"] },
                "projects": [
                    {
                        "type": "node-web",
                        "gitDir": "storefront",
                        "projectDir": "storefront/app",
                        "projectFile": "storefront/app/package.json"
                    },
                    {
                        "type": "dotnet",
                        "gitDir": "billing",
                        "projectDir": "billing/src",
                        "projectFile": "billing/src/Billing.sln"
                    }
                ],
                "ignoreDirs": ["scratch"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_the_documented_format() {
        let workspace = sample();
        assert_eq!(workspace.root, PathBuf::from("/src"));
        assert_eq!(workspace.projects.len(), 2);
        assert_eq!(workspace.projects[0].kind, ProjectKind::NodeWeb);
        assert_eq!(workspace.ignore_dirs, vec!["scratch"]);
    }

    #[test]
    fn missing_optional_sections_default_to_empty() {
        let workspace: Workspace =
            serde_json::from_str(r#"{ "root": "/src", "projects": [] }"#).unwrap();
        assert!(workspace.project_profiles.is_empty());
        assert!(workspace.ignore_dirs.is_empty());
    }

    #[test]
    fn git_targets_cover_every_project() {
        let targets = sample().select_targets(None, TargetKind::Git).unwrap();
        let dirs: Vec<_> = targets.iter().map(|t| t.dir.clone()).collect();
        assert_eq!(
            dirs,
            vec![PathBuf::from("/src/storefront"), PathBuf::from("/src/billing")]
        );
    }

    #[test]
    fn npm_targets_use_project_dirs_of_node_projects() {
        let targets = sample().select_targets(None, TargetKind::Npm).unwrap();
        let dirs: Vec<_> = targets.iter().map(|t| t.dir.clone()).collect();
        assert_eq!(dirs, vec![PathBuf::from("/src/storefront/app")]);
    }

    #[test]
    fn dotnet_targets_use_project_dirs_of_dotnet_projects() {
        let targets = sample().select_targets(None, TargetKind::Dotnet).unwrap();
        let dirs: Vec<_> = targets.iter().map(|t| t.dir.clone()).collect();
        assert_eq!(dirs, vec![PathBuf::from("/src/billing/src")]);
    }

    #[test]
    fn profiles_restrict_participating_projects() {
        let targets = sample()
            .select_targets(Some("web"), TargetKind::Git)
            .unwrap();
        let dirs: Vec<_> = targets.iter().map(|t| t.dir.clone()).collect();
        assert_eq!(dirs, vec![PathBuf::from("/src/storefront")]);
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let err = sample()
            .select_targets(Some("mobile"), TargetKind::Git)
            .unwrap_err();
        assert!(err.to_string().contains("mobile"));
    }

    #[test]
    fn incomplete_config_detection_flags_placeholders() {
        let mut project = sample().projects[0].clone();
        assert!(!has_incomplete_config(&project));

        project.project_dir = "FIXME".to_string();
        assert!(has_incomplete_config(&project));

        project.project_dir = String::new();
        assert!(has_incomplete_config(&project));
    }
}

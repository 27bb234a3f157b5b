//! `fleet check-health`: validate the environment the other commands
//! depend on: required tools, the workspace file, and ADO credentials.

use std::path::Path;

use anyhow::{Result, bail};
use console::style;
use tracing::warn;

use repofleet::exec::{self, ExecOptions};
use repofleet::workspace::{Workspace, has_incomplete_config};

pub async fn cmd_check_health(config: &Path) -> Result<()> {
    let mut failures = 0;

    for tool in ["git", "npm"] {
        match exec::run_shell(&format!("{tool} --version"), &ExecOptions::default()).await {
            Ok(version) => ok(&format!("{tool}: {}", version.trim())),
            Err(error) => {
                failures += 1;
                fail(&format!("{tool}: {error}"));
            }
        }
    }

    match Workspace::load(config) {
        Err(error) => {
            failures += 1;
            fail(&format!("workspace: {error:#}"));
        }
        Ok(workspace) => {
            ok(&format!("workspace file {} parses", config.display()));
            failures += check_workspace(&workspace);
        }
    }

    if std::env::var("FLEET_ADO_LOGIN").is_err() || std::env::var("FLEET_ADO_TOKEN").is_err() {
        warn!("FLEET_ADO_LOGIN / FLEET_ADO_TOKEN are not set; remote-repos will need --login and --token");
    }

    if failures > 0 {
        bail!("health check found {failures} problem(s)");
    }
    println!("{}", style("All checks passed.").green());
    Ok(())
}

fn check_workspace(workspace: &Workspace) -> usize {
    let mut failures = 0;

    if !workspace.root.is_dir() {
        failures += 1;
        fail(&format!(
            "workspace root {} is not a directory",
            workspace.root.display()
        ));
    }

    for project in &workspace.projects {
        let dir = workspace.root.join(&project.git_dir);
        if !dir.is_dir() {
            failures += 1;
            fail(&format!("project directory {} is missing", dir.display()));
        }
        if has_incomplete_config(project) {
            warn!("project `{}` has FIXME or empty config fields", project.git_dir);
        }
    }

    for (profile, members) in &workspace.project_profiles {
        for member in members {
            if !workspace
                .projects
                .iter()
                .any(|project| &project.git_dir == member)
            {
                failures += 1;
                fail(&format!(
                    "profile `{profile}` references unknown project `{member}`"
                ));
            }
        }
    }

    failures
}

fn ok(message: &str) {
    println!("{} {message}", style("OK").green());
}

fn fail(message: &str) {
    println!("{} {message}", style("FAIL").red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use repofleet::workspace::{Project, ProjectKind};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn project(git_dir: &str) -> Project {
        Project {
            kind: ProjectKind::NodeWeb,
            git_dir: git_dir.to_string(),
            project_dir: git_dir.to_string(),
            project_file: format!("{git_dir}/package.json"),
        }
    }

    #[test]
    fn complete_workspace_passes() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("storefront")).unwrap();

        let workspace = Workspace {
            root: root.path().to_path_buf(),
            project_profiles: HashMap::from([(
                "all".to_string(),
                vec!["storefront".to_string()],
            )]),
            projects: vec![project("storefront")],
            ignore_dirs: Vec::new(),
        };
        assert_eq!(check_workspace(&workspace), 0);
    }

    #[test]
    fn missing_project_directory_counts_as_failure() {
        let root = tempdir().unwrap();
        let workspace = Workspace {
            root: root.path().to_path_buf(),
            project_profiles: HashMap::new(),
            projects: vec![project("gone")],
            ignore_dirs: Vec::new(),
        };
        assert_eq!(check_workspace(&workspace), 1);
    }

    #[test]
    fn profile_with_unknown_member_counts_as_failure() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("storefront")).unwrap();

        let workspace = Workspace {
            root: root.path().to_path_buf(),
            project_profiles: HashMap::from([(
                "web".to_string(),
                vec!["checkout".to_string()],
            )]),
            projects: vec![project("storefront")],
            ignore_dirs: Vec::new(),
        };
        assert_eq!(check_workspace(&workspace), 1);
    }
}

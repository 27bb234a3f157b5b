//! `fleet init`: scan a directory for git repositories and write a
//! starter workspace file.
//!
//! Project and file paths that cannot be guessed are written as `FIXME`
//! placeholders; `fleet analyze` flags them until they are filled in.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use console::style;
use tracing::warn;

use repofleet::workspace::{Project, ProjectKind, Workspace};

pub fn cmd_init(root: &Path, output: Option<&Path>, dry_run: bool) -> Result<()> {
    let mut projects = Vec::new();

    for name in subdirectory_names(root)? {
        let dir = root.join(&name);
        if !dir.join(".git").exists() {
            println!("{} {name} has no .git directory", style("skip").dim());
            continue;
        }

        match detect_kind(&dir)? {
            Some(kind) => {
                println!("{} {name}", style("repo").green());
                projects.push(Project {
                    kind,
                    git_dir: name,
                    project_dir: "FIXME".to_string(),
                    project_file: "FIXME".to_string(),
                });
            }
            None => {
                warn!("{name} is a git repository of no recognizable project type, skipping");
            }
        }
    }

    let workspace = Workspace {
        root: root.to_path_buf(),
        project_profiles: HashMap::from([(
            "all".to_string(),
            projects.iter().map(|project| project.git_dir.clone()).collect(),
        )]),
        projects,
        ignore_dirs: Vec::new(),
    };

    let json = serde_json::to_string_pretty(&workspace)?;
    if dry_run {
        println!("{json}");
        return Ok(());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join("fleet.json"));
    if path.exists() {
        bail!("refusing to overwrite existing {}", path.display());
    }
    fs::write(&path, format!("{json}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{}",
        style(format!(
            "Wrote {} with {} projects",
            path.display(),
            workspace.projects.len()
        ))
        .green()
    );
    Ok(())
}

/// package.json marks a node-web project, a solution file a dotnet one.
fn detect_kind(dir: &Path) -> Result<Option<ProjectKind>> {
    if dir.join("package.json").exists() {
        return Ok(Some(ProjectKind::NodeWeb));
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = PathBuf::from(entry.file_name());
        if entry.file_type()?.is_file()
            && name.extension().is_some_and(|extension| extension == "sln")
        {
            return Ok(Some(ProjectKind::Dotnet));
        }
    }
    Ok(None)
}

fn subdirectory_names(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to read directory {}", root.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn detects_node_projects_by_package_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(detect_kind(dir.path()).unwrap(), Some(ProjectKind::NodeWeb));
    }

    #[test]
    fn detects_dotnet_projects_by_solution_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Billing.sln"), "").unwrap();
        assert_eq!(detect_kind(dir.path()).unwrap(), Some(ProjectKind::Dotnet));
    }

    #[test]
    fn unrecognized_projects_yield_none() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.tf"), "").unwrap();
        assert_eq!(detect_kind(dir.path()).unwrap(), None);
    }
}

//! `fleet analyze`: reconcile the workspace file with what is actually
//! on disk under the workspace root.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use repofleet::sort::{by_key, sort};
use repofleet::table::{self, Column, Width};
use repofleet::workspace::{Workspace, has_incomplete_config};

/// Reconciliation verdict for one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirStatus {
    /// Present on disk and fully declared.
    Ready,
    /// Present on disk and explicitly ignored.
    Ignored,
    /// Declared, present, but with placeholder config fields.
    Misconfigured,
    /// Present on disk but not declared in the workspace.
    Unregistered,
    /// Declared but absent from disk.
    Missing,
}

impl DirStatus {
    fn label(self) -> &'static str {
        match self {
            DirStatus::Ready => "READY",
            DirStatus::Ignored => "IGNORED",
            DirStatus::Misconfigured => "MISCONFIGURED",
            DirStatus::Unregistered => "UNREGISTERED",
            DirStatus::Missing => "MISSING",
        }
    }

    fn styled(self) -> String {
        let label = self.label();
        match self {
            DirStatus::Ready => style(label).green().bright(),
            DirStatus::Ignored => style(label).dim(),
            DirStatus::Misconfigured => style(label).yellow().bright(),
            DirStatus::Unregistered => style(label).red(),
            DirStatus::Missing => style(label).yellow(),
        }
        .to_string()
    }
}

#[derive(Clone)]
struct Row {
    status: DirStatus,
    dir: PathBuf,
}

pub fn cmd_analyze(config: &Path) -> Result<()> {
    let workspace = Workspace::load(config)?;

    let found = subdirectories_of(&workspace.root)?;
    for dir in &found {
        debug!(dir = %dir.display(), "found subdirectory");
    }

    let mut declared = BTreeSet::new();
    let mut incomplete = BTreeSet::new();
    for project in &workspace.projects {
        let dir = workspace.root.join(&project.git_dir);
        if has_incomplete_config(project) {
            incomplete.insert(dir.clone());
        }
        declared.insert(dir);
    }

    let ignored: BTreeSet<PathBuf> = workspace
        .ignore_dirs
        .iter()
        .map(|dir| workspace.root.join(dir))
        .collect();

    let all: BTreeSet<PathBuf> = found.union(&declared).cloned().collect();
    let rows: Vec<Row> = all
        .into_iter()
        .map(|dir| {
            let is_found = found.contains(&dir);
            let is_declared = declared.contains(&dir);
            let status = if is_found && ignored.contains(&dir) {
                DirStatus::Ignored
            } else if is_found && is_declared && incomplete.contains(&dir) {
                DirStatus::Misconfigured
            } else if is_found && is_declared {
                DirStatus::Ready
            } else if is_found {
                DirStatus::Unregistered
            } else {
                DirStatus::Missing
            };
            Row { status, dir }
        })
        .collect();

    let rows = sort(&rows, vec![by_key(|row: &Row| row.dir.clone())]);

    let columns = vec![
        Column::new("status", Width::Max, |row: &Row| row.status.styled()),
        Column::new("directory", Width::Max, |row: &Row| {
            row.dir.display().to_string()
        }),
    ];
    print!("{}", table::render(&columns, &rows));

    let attention = rows
        .iter()
        .filter(|row| {
            !matches!(row.status, DirStatus::Ready | DirStatus::Ignored)
        })
        .count();
    if attention > 0 {
        println!(
            "{}",
            style(format!("{attention} of {} directories need attention", rows.len())).yellow()
        );
    }
    Ok(())
}

fn subdirectories_of(root: &Path) -> Result<BTreeSet<PathBuf>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to read workspace root {}", root.display()))?;

    let mut found = BTreeSet::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            found.insert(root.join(entry.file_name()));
        }
    }
    Ok(found)
}

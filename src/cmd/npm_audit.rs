//! `fleet npm-audit`: vulnerability and outdated-package report.
//!
//! `npm audit` signals findings, not failure, through its exit code, so
//! it runs under the never-fails policy; `npm outdated` exits 1 whenever
//! anything is outdated, so that code is allow-listed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use serde::Deserialize;
use tracing::warn;

use repofleet::exec::{allow_codes, never_fails};
use repofleet::runner::{self, RunManyOptions};
use repofleet::sort::{Comparator, by_key, by_rank, reverse, sort};
use repofleet::table::{self, Column, Width};
use repofleet::workspace::{Target, TargetKind, Workspace};

/// Dependency classes, least to most severe to have vulnerable.
const DEPENDENCY_TYPE_ORDER: [&str; 3] = ["—", "dev", "prod"];

/// npm severity labels, least to most severe.
const SEVERITY_ORDER: [&str; 6] = ["none", "info", "low", "moderate", "high", "critical"];

#[derive(Debug, Deserialize)]
struct AuditReport {
    #[serde(default)]
    vulnerabilities: HashMap<String, Vulnerability>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vulnerability {
    name: String,
    severity: String,
    #[serde(default)]
    is_direct: bool,
    #[serde(default)]
    range: Option<String>,
}

/// One entry of `npm outdated --json`.
#[derive(Debug, Clone, Deserialize)]
struct OutdatedEntry {
    #[serde(default)]
    current: Option<String>,
    #[serde(default)]
    latest: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: HashMap<String, String>,
    #[serde(default)]
    dev_dependencies: HashMap<String, String>,
}

#[derive(Clone)]
struct Row {
    directory: String,
    package: String,
    dependency_type: String,
    severity: String,
    versions: String,
    range: String,
    direct: bool,
}

pub async fn cmd_npm_audit(
    config: Option<&Path>,
    directory: &Path,
    omit: Option<&str>,
    max_parallel: usize,
) -> Result<()> {
    let targets: Vec<Target> = match config {
        Some(path) => Workspace::load(path)?.select_targets(None, TargetKind::Npm)?,
        None => vec![Target {
            dir: directory.to_path_buf(),
        }],
    };

    println!(
        "{}",
        style(format!("Auditing {} project(s)", targets.len())).green()
    );

    let omit_flags = match omit {
        Some(classes) => classes
            .split(',')
            .map(|class| format!(" --omit {}", class.trim()))
            .collect::<String>(),
        None => String::new(),
    };

    let audit_options = RunManyOptions {
        quiet: true,
        max_parallel,
        failure_policy: never_fails(),
        ..RunManyOptions::default()
    };
    let audits = runner::run_many(
        &targets,
        &format!("npm audit --json{omit_flags}"),
        &audit_options,
    )
    .await;

    let outdated_options = RunManyOptions {
        failure_policy: allow_codes(vec![1]),
        ..audit_options.clone()
    };
    let outdated = runner::run_many(&targets, "npm outdated --json", &outdated_options).await;

    let mut rows = Vec::new();
    for target in &targets {
        let Some(outcome) = audits.get(&target.dir) else {
            continue;
        };
        if outcome.had_error {
            warn!(dir = %target.dir.display(), "npm audit failed: {}", outcome.output);
            continue;
        }
        let report: AuditReport = serde_json::from_str(&outcome.output)
            .with_context(|| format!("unexpected npm audit output in {}", target.dir.display()))?;

        let manifest = read_manifest(&target.dir)?;
        let outdated_entries: HashMap<String, OutdatedEntry> = outdated
            .get(&target.dir)
            .filter(|outcome| !outcome.had_error)
            .and_then(|outcome| serde_json::from_str(&outcome.output).ok())
            .unwrap_or_default();

        for vulnerability in report.vulnerabilities.values() {
            rows.push(to_row(
                target,
                &manifest,
                &outdated_entries,
                vulnerability,
            ));
        }
    }

    let rows = sort(
        &rows,
        vec![
            reverse(rank_field(&DEPENDENCY_TYPE_ORDER, |row| {
                row.dependency_type.clone()
            })),
            reverse(rank_field(&SEVERITY_ORDER, |row| row.severity.clone())),
            by_key(|row: &Row| row.package.clone()),
        ],
    );

    let columns = vec![
        Column::new("package", Width::Max, |row: &Row| row.package.clone()),
        Column::new("directory", Width::Max, |row: &Row| row.directory.clone()),
        Column::new("dev/prod", Width::Max, |row: &Row| {
            dependency_type_cell(&row.dependency_type)
        }),
        Column::new("severity", Width::Max, |row: &Row| {
            severity_cell(&row.severity)
        }),
        Column::new("versions", Width::Max, |row: &Row| row.versions.clone()),
        Column::new("vulnerable range", Width::Max, |row: &Row| row.range.clone()),
        Column::new("direct", Width::Max, |row: &Row| {
            if row.direct { "yes" } else { "transitive" }.to_string()
        }),
    ];
    print!("{}", table::render(&columns, &rows));

    if rows.is_empty() {
        println!("{}", style("No vulnerabilities reported.").green());
    } else {
        println!(
            "{}",
            style(format!("{} vulnerable packages", rows.len())).yellow()
        );
    }
    Ok(())
}

fn to_row(
    target: &Target,
    manifest: &PackageManifest,
    outdated: &HashMap<String, OutdatedEntry>,
    vulnerability: &Vulnerability,
) -> Row {
    let dependency_type = if manifest.dev_dependencies.contains_key(&vulnerability.name) {
        "dev"
    } else if manifest.dependencies.contains_key(&vulnerability.name) {
        "prod"
    } else {
        "—"
    };

    let versions = outdated
        .get(&vulnerability.name)
        .and_then(|entry| match (&entry.current, &entry.latest) {
            (Some(current), Some(latest)) => Some(format!("{current} -> {latest}")),
            _ => None,
        })
        .unwrap_or_else(|| "—".to_string());

    Row {
        directory: target.dir.display().to_string(),
        package: vulnerability.name.clone(),
        dependency_type: dependency_type.to_string(),
        severity: vulnerability.severity.clone(),
        versions,
        range: vulnerability
            .range
            .clone()
            .unwrap_or_else(|| "—".to_string()),
        direct: vulnerability.is_direct,
    }
}

fn read_manifest(dir: &Path) -> Result<PackageManifest> {
    let path: PathBuf = dir.join("package.json");
    let text = fs::read_to_string(&path)
        .with_context(|| format!("package.json not found in {}", dir.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Lift the rank-table comparator onto a row field.
fn rank_field<F>(table: &[&str], field: F) -> Comparator<Row>
where
    F: Fn(&Row) -> String + 'static,
{
    let rank = by_rank(table.iter().map(|value| value.to_string()).collect());
    Box::new(move |a, b| rank(&field(a), &field(b)))
}

fn dependency_type_cell(dependency_type: &str) -> String {
    match dependency_type {
        "dev" => style(dependency_type).red(),
        "prod" => style(dependency_type).yellow(),
        _ => style(dependency_type),
    }
    .to_string()
}

fn severity_cell(severity: &str) -> String {
    match severity {
        "critical" => style(severity).magenta(),
        "high" => style(severity).red(),
        "moderate" | "low" => style(severity).yellow(),
        "info" => style(severity).green(),
        _ => style(severity),
    }
    .to_string()
}

//! `fleet git-stats`: aggregate commit authorship across repositories.
//!
//! Raw `git log` text is gathered per repository through the multi-target
//! runner, author lines are extracted and normalized in-process, and the
//! results come out as two tables: one per repository, one per author.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use regex::Regex;
use tracing::warn;

use repofleet::runner::{self, RunManyOptions};
use repofleet::sort::{by_key, reverse, sort};
use repofleet::table::{self, Column, Width};
use repofleet::teams::Teams;
use repofleet::workspace::{TargetKind, Workspace};

#[derive(Clone)]
struct RepoRow {
    dir: String,
    commits: usize,
    last_commit: Option<DateTime<Utc>>,
}

#[derive(Clone)]
struct AuthorRow {
    author: String,
    team: Option<String>,
    commits: usize,
}

pub async fn cmd_git_stats(
    config: &Path,
    profile: Option<&str>,
    teams_path: Option<&Path>,
    max_parallel: usize,
) -> Result<()> {
    let workspace = Workspace::load(config)?;
    let targets = workspace.select_targets(profile, TargetKind::Git)?;
    let teams = match teams_path {
        Some(path) => Teams::load(path)?,
        None => Teams::default(),
    };

    println!(
        "{}",
        style(format!(
            "Collecting git history from {} repositories",
            targets.len()
        ))
        .green()
    );

    let options = RunManyOptions {
        quiet: true,
        max_parallel,
        ..RunManyOptions::default()
    };
    let logs = runner::run_many(&targets, "git log", &options).await;
    let heads = runner::run_many(&targets, "git log -1 --format=%cI", &options).await;

    let author_line = Regex::new(r"(?m)^Author:\s+(.+)$")?;
    let mut author_commits: HashMap<String, usize> = HashMap::new();
    let mut repo_rows = Vec::new();
    let mut unreadable = 0;

    for target in &targets {
        let Some(log) = logs.get(&target.dir) else {
            continue;
        };
        if log.had_error {
            unreadable += 1;
            continue;
        }

        let mut commits = 0;
        for capture in author_line.captures_iter(&log.output) {
            let author = teams.normalize(capture[1].trim());
            *author_commits.entry(author).or_default() += 1;
            commits += 1;
        }

        let last_commit = heads
            .get(&target.dir)
            .filter(|outcome| !outcome.had_error)
            .and_then(|outcome| DateTime::parse_from_rfc3339(outcome.output.trim()).ok())
            .map(|instant| instant.with_timezone(&Utc));

        let dir = target
            .dir
            .strip_prefix(&workspace.root)
            .unwrap_or(&target.dir)
            .display()
            .to_string();
        repo_rows.push(RepoRow {
            dir,
            commits,
            last_commit,
        });
    }

    if unreadable > 0 {
        warn!("{unreadable} repositories had unreadable git history");
    }

    // Most recently touched repositories first; undated ones at the end.
    let repo_rows = sort(
        &repo_rows,
        vec![
            by_key(|row: &RepoRow| row.last_commit.is_none()),
            reverse(by_key(|row: &RepoRow| row.last_commit)),
            by_key(|row: &RepoRow| row.dir.clone()),
        ],
    );
    let repo_columns = vec![
        Column::new("repository", Width::Max, |row: &RepoRow| row.dir.clone()),
        Column::new("commits", Width::Max, |row: &RepoRow| {
            row.commits.to_string()
        }),
        Column::new("last commit", Width::Max, |row: &RepoRow| {
            row.last_commit
                .map(|instant| instant.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "—".to_string())
        }),
    ];
    print!("{}", table::render(&repo_columns, &repo_rows));
    println!();

    let author_rows: Vec<AuthorRow> = author_commits
        .into_iter()
        .map(|(author, commits)| AuthorRow {
            team: teams.team_of(&author).map(str::to_string),
            author,
            commits,
        })
        .collect();
    let author_rows = sort(
        &author_rows,
        vec![
            reverse(by_key(|row: &AuthorRow| row.commits)),
            by_key(|row: &AuthorRow| row.author.clone()),
        ],
    );
    let author_columns = vec![
        Column::new("author", Width::Max, |row: &AuthorRow| row.author.clone()),
        Column::new("team", Width::Max, |row: &AuthorRow| {
            row.team
                .clone()
                .map(|team| style(team).cyan().to_string())
                .unwrap_or_else(|| "—".to_string())
        }),
        Column::new("commits", Width::Max, |row: &AuthorRow| {
            row.commits.to_string()
        }),
    ];
    print!("{}", table::render(&author_columns, &author_rows));

    let total: usize = repo_rows.iter().map(|row| row.commits).sum();
    println!(
        "{}",
        style(format!(
            "{total} commits by {} authors across {} repositories",
            author_rows.len(),
            repo_rows.len()
        ))
        .green()
    );
    Ok(())
}

//! `fleet remote-repos`: list git repositories of an Azure DevOps
//! organization.
//!
//! The flat form prints remote URLs of one project, grep-friendly. The
//! `--hierarchy` form walks every project of the organization, fetching
//! repository listings concurrently; a project that fails to list is
//! reported and skipped without aborting the others.

use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::error;

use repofleet::ado::{AdoClient, AdoRepository};
use repofleet::table::{self, Column, Width};

pub async fn cmd_remote_repos(
    organization: &str,
    project: Option<&str>,
    login: &str,
    token: &str,
    hierarchy: bool,
) -> Result<()> {
    let client = AdoClient::new(
        organization.to_string(),
        login.to_string(),
        token.to_string(),
    );

    if !hierarchy {
        let project = project.context("--project is required unless --hierarchy is set")?;
        for repository in client.repositories(project).await? {
            println!("{}", repository.remote_url);
        }
        return Ok(());
    }

    let projects: Vec<_> = client
        .projects()
        .await?
        .into_iter()
        .filter(|candidate| project.is_none_or(|name| candidate.name == name))
        .collect();

    let client = &client;
    let listings = join_all(projects.iter().map(|project| async move {
        (project, client.repositories(&project.id).await)
    }))
    .await;

    let columns = vec![
        Column::new("repo id", Width::Fixed(38), |repo: &AdoRepository| {
            repo.id.clone()
        }),
        Column::new("repo name", Width::Max, |repo: &AdoRepository| {
            repo.name.clone()
        }),
        Column::new("remote url", Width::Max, |repo: &AdoRepository| {
            repo.remote_url.clone()
        }),
    ];

    for (project, listing) in listings {
        match listing {
            Ok(repositories) => {
                println!(
                    "{} repos in {} ({}):",
                    repositories.len(),
                    project.name,
                    project.id
                );
                if !repositories.is_empty() {
                    print!("{}", table::render(&columns, &repositories));
                }
            }
            Err(problem) => {
                error!(
                    "failed to list repositories of {}: {problem:#}",
                    project.name
                );
            }
        }
    }
    Ok(())
}

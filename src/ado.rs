//! Minimal Azure DevOps REST client for repository listings.
//!
//! Covers the two read-only endpoints the CLI consumes: the projects of an
//! organization and the git repositories of a project. Authentication is
//! basic auth with a personal access token.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Connection settings for one organization.
pub struct AdoClient {
    http: reqwest::Client,
    organization: String,
    login: String,
    token: String,
}

/// A project inside the organization.
#[derive(Debug, Clone, Deserialize)]
pub struct AdoProject {
    pub id: String,
    pub name: String,
}

/// A git repository inside a project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoRepository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    pub remote_url: String,
    #[serde(default)]
    pub ssh_url: Option<String>,
}

/// Envelope every ADO list endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    value: Vec<T>,
}

impl AdoClient {
    pub fn new(organization: String, login: String, token: String) -> AdoClient {
        AdoClient {
            http: reqwest::Client::new(),
            organization,
            login,
            token,
        }
    }

    /// List the projects of the organization.
    pub async fn projects(&self) -> Result<Vec<AdoProject>> {
        let url = format!("https://dev.azure.com/{}/_apis/projects", self.organization);
        self.get_list(&url).await
    }

    /// List the git repositories of one project (by name or id).
    pub async fn repositories(&self, project: &str) -> Result<Vec<AdoRepository>> {
        let url = format!(
            "https://dev.azure.com/{}/{}/_apis/git/repositories",
            self.organization, project
        );
        self.get_list(&url).await
    }

    async fn get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.login, Some(&self.token))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("request to {url} returned {status}");
        }

        let list: ListResponse<T> = response
            .json()
            .await
            .with_context(|| format!("unexpected response body from {url}"))?;
        Ok(list.value)
    }
}

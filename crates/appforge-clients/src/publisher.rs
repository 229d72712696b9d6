//! Hosted repository publication
//!
//! [`GitHubPublisher`] talks to the GitHub REST API: create a public
//! repository, commit each generated file, and serve the branch through
//! Pages. Updates are a per-file upsert; files missing from the new
//! generation are left in place.

use crate::types::{
    ContentsEntry, CreateRepo, EnablePages, GitHubBranch, GitHubRepo, GitHubUser, PagesSource,
    PutContents,
};
use appforge_core::config::PublisherConfig;
use appforge_core::{AppforgeError, GeneratedFiles, PublishedSite, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::{Method, RequestBuilder, StatusCode};
use tokio::sync::OnceCell;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("appforge/", env!("CARGO_PKG_VERSION"));

/// Publishes generated files to a hosted repository
#[async_trait]
pub trait RepositoryPublisher: Send + Sync {
    /// Create repository `name` holding exactly `files` and enable its site
    async fn create_repository(
        &self,
        name: &str,
        files: &GeneratedFiles,
        description: &str,
    ) -> Result<PublishedSite>;

    /// Update existing files and create new ones in repository `name`
    async fn update_repository(&self, name: &str, files: &GeneratedFiles) -> Result<PublishedSite>;

    /// Head commit of the publishing branch
    async fn latest_commit(&self, name: &str) -> Result<String>;
}

/// Public site URL for a repository
pub fn pages_url(owner: &str, name: &str) -> String {
    format!("https://{}.github.io/{}", owner, name)
}

/// GitHub REST API publisher
#[derive(Debug)]
pub struct GitHubPublisher {
    client: reqwest::Client,
    api_url: String,
    token: String,
    branch: String,
    owner: OnceCell<String>,
}

impl GitHubPublisher {
    pub fn new(config: &PublisherConfig, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: token.into(),
            branch: config.branch.clone(),
            owner: OnceCell::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION)
            .header("user-agent", USER_AGENT)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppforgeError::Api(format!("{}: request failed: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown".to_string());
        Err(AppforgeError::Api(format!(
            "{}: GitHub API error {}: {}",
            what, status, error_text
        )))
    }

    /// Login of the token's owner, resolved once
    async fn owner(&self) -> Result<&str> {
        let owner = self
            .owner
            .get_or_try_init(|| async {
                let response = self.send(self.request(Method::GET, "/user"), "get user").await?;
                let user: GitHubUser = response
                    .json()
                    .await
                    .map_err(|e| AppforgeError::Api(format!("Failed to parse user: {}", e)))?;
                tracing::debug!("Publishing as {}", user.login);
                Ok::<_, AppforgeError>(user.login)
            })
            .await?;
        Ok(owner.as_str())
    }

    async fn file_sha(&self, owner: &str, name: &str, path: &str) -> Result<Option<String>> {
        let response = self
            .request(Method::GET, &contents_endpoint(owner, name, path))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| AppforgeError::Api(format!("get {}: request failed: {}", path, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let entry: ContentsEntry = response.json().await.map_err(|e| {
                    AppforgeError::Api(format!("Failed to parse contents of {}: {}", path, e))
                })?;
                Ok(Some(entry.sha))
            }
            status => Err(AppforgeError::Api(format!(
                "get {}: GitHub API error {}",
                path, status
            ))),
        }
    }

    async fn put_file(
        &self,
        owner: &str,
        name: &str,
        path: &str,
        content: &str,
        sha: Option<String>,
    ) -> Result<()> {
        let message = match sha {
            Some(_) => format!("Update {}", path),
            None => format!("Add {}", path),
        };
        let body = PutContents {
            message,
            content: BASE64_STANDARD.encode(content.as_bytes()),
            branch: &self.branch,
            sha,
        };

        self.send(
            self.request(Method::PUT, &contents_endpoint(owner, name, path))
                .json(&body),
            &format!("put {}", path),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RepositoryPublisher for GitHubPublisher {
    async fn create_repository(
        &self,
        name: &str,
        files: &GeneratedFiles,
        description: &str,
    ) -> Result<PublishedSite> {
        let owner = self.owner().await.map_err(publish_error)?;

        let body = CreateRepo {
            name,
            description,
            private: false,
            auto_init: false,
        };
        let response = self
            .send(
                self.request(Method::POST, "/user/repos").json(&body),
                "create repository",
            )
            .await
            .map_err(publish_error)?;
        let repo: GitHubRepo = response
            .json()
            .await
            .map_err(|e| AppforgeError::Publish(format!("Failed to parse repository: {}", e)))?;

        for (path, content) in files {
            self.put_file(owner, name, path, content, None)
                .await
                .map_err(publish_error)?;
        }

        let pages = EnablePages {
            source: PagesSource {
                branch: &self.branch,
                path: "/",
            },
        };
        self.send(
            self.request(Method::POST, &format!("/repos/{}/{}/pages", owner, name))
                .json(&pages),
            "enable pages",
        )
        .await
        .map_err(publish_error)?;

        let site = PublishedSite {
            repo_url: repo.html_url,
            pages_url: pages_url(owner, name),
        };
        tracing::info!("Created repository: {}", site.repo_url);
        tracing::info!("Pages URL: {}", site.pages_url);
        Ok(site)
    }

    async fn update_repository(&self, name: &str, files: &GeneratedFiles) -> Result<PublishedSite> {
        let owner = self.owner().await.map_err(publish_error)?;

        let response = self
            .send(
                self.request(Method::GET, &format!("/repos/{}/{}", owner, name)),
                "get repository",
            )
            .await
            .map_err(publish_error)?;
        let repo: GitHubRepo = response
            .json()
            .await
            .map_err(|e| AppforgeError::Publish(format!("Failed to parse repository: {}", e)))?;

        for (path, content) in files {
            let sha = self.file_sha(owner, name, path).await.map_err(publish_error)?;
            self.put_file(owner, name, path, content, sha)
                .await
                .map_err(publish_error)?;
        }

        let site = PublishedSite {
            repo_url: repo.html_url,
            pages_url: pages_url(owner, name),
        };
        tracing::info!("Updated repository: {}", site.repo_url);
        Ok(site)
    }

    async fn latest_commit(&self, name: &str) -> Result<String> {
        let owner = self.owner().await?;
        let response = self
            .send(
                self.request(
                    Method::GET,
                    &format!("/repos/{}/{}/branches/{}", owner, name, self.branch),
                ),
                "get branch",
            )
            .await?;
        let branch: GitHubBranch = response
            .json()
            .await
            .map_err(|e| AppforgeError::Api(format!("Failed to parse branch: {}", e)))?;
        Ok(branch.commit.sha)
    }
}

fn publish_error(e: AppforgeError) -> AppforgeError {
    match e {
        AppforgeError::Publish(_) => e,
        other => AppforgeError::Publish(other.to_string()),
    }
}

/// Contents API path for `path`, each segment percent-encoded
fn contents_endpoint(owner: &str, name: &str, path: &str) -> String {
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    format!("/repos/{}/{}/contents/{}", owner, name, encoded.join("/"))
}

//! GitHub implementation of [`HostedRepos`] over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};
use url::Url;

use super::traits::{CreateRepoRequest, HostedError, HostedRepos, RepoLookup, Repository};
use crate::classify::classify_status;
use crate::error::ErrorKind;
use crate::git::DEFAULT_BRANCH;

/// Public GitHub API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT_VALUE: &str = "hubsync";
const API_VERSION: &str = "2022-11-28";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";
const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 50;

pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    api_base: String,
    login: OnceCell<String>,
}

// Keep the token out of logs.
impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("has_token", &self.token.is_some())
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubTopics {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<GitHubErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl GitHubClient {
    /// Client for `api_base` with a per-request `timeout`.
    pub fn new(
        token: Option<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HostedError> {
        let api_base = api_base.into();
        let parsed = Url::parse(&api_base)
            .map_err(|e| HostedError::Network(format!("invalid API base '{api_base}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HostedError::Network(format!(
                "unsupported API base scheme: {}",
                parsed.scheme()
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HostedError::Network(e.to_string()))?;
        Ok(Self {
            client,
            token: token.filter(|t| !t.trim().is_empty()),
            api_base: api_base.trim_end_matches('/').to_string(),
            login: OnceCell::new(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn headers(&self, accept: &'static str) -> Result<HeaderMap, HostedError> {
        let token = self.token.as_deref().ok_or(HostedError::AuthRequired)?;
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| HostedError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, HostedError> {
        self.send_accepting(request, ACCEPT_JSON).await
    }

    async fn send_accepting(
        &self,
        request: RequestBuilder,
        accept: &'static str,
    ) -> Result<Response, HostedError> {
        let request = request.headers(self.headers(accept)?);
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                HostedError::Timeout(e.to_string())
            } else {
                HostedError::Network(e.to_string())
            }
        })
    }

    async fn json<T: for<'de> Deserialize<'de>>(&self, response: Response) -> Result<T, HostedError> {
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }
        response.json().await.map_err(|e| HostedError::Api {
            status: status.as_u16(),
            message: format!("failed to parse response: {e}"),
        })
    }

    /// `owner/name` for bare names, resolving the owner once per client.
    async fn full_name(&self, name: &str) -> Result<String, HostedError> {
        if name.contains('/') {
            return Ok(name.to_string());
        }
        let login = self.authenticated_user().await?;
        Ok(format!("{login}/{name}"))
    }

    async fn fetch_user(&self) -> Result<String, HostedError> {
        let response = self.send(self.client.get(self.url("user"))).await?;
        let user: GitHubUser = self.json(response).await?;
        Ok(user.login)
    }
}

async fn error_from_response(response: Response) -> HostedError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GitHubErrorBody>(&body) {
        Ok(parsed) => {
            let details: Vec<String> = parsed.errors.into_iter().filter_map(|e| e.message).collect();
            if details.is_empty() {
                parsed.message
            } else {
                format!("{}: {}", parsed.message, details.join("; "))
            }
        }
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    };

    debug!(status = status.as_u16(), %message, "GitHub API error");
    match classify_status(status.as_u16(), &message) {
        ErrorKind::AuthFailure => HostedError::AuthFailed(message),
        ErrorKind::NotFound => HostedError::NotFound(message),
        ErrorKind::AlreadyExists => HostedError::AlreadyExists(message),
        ErrorKind::Timeout => HostedError::Timeout(message),
        _ => HostedError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl HostedRepos for GitHubClient {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn authenticated_user(&self) -> Result<String, HostedError> {
        self.login
            .get_or_try_init(|| self.fetch_user())
            .await
            .cloned()
    }

    #[instrument(level = "debug", skip(self, request), fields(name = %request.name))]
    async fn create(&self, request: CreateRepoRequest) -> Result<Repository, HostedError> {
        super::validate_repo_name(&request.name)?;
        let response = self
            .send(self.client.post(self.url("user/repos")).json(&request))
            .await?;
        self.json(response).await
    }

    async fn get(&self, name: &str) -> RepoLookup {
        let full = match self.full_name(name).await {
            Ok(full) => full,
            Err(err) => return RepoLookup::Error(err),
        };
        let response = match self.send(self.client.get(self.url(&format!("repos/{full}")))).await {
            Ok(response) => response,
            Err(err) => return RepoLookup::Error(err),
        };
        match self.json::<Repository>(response).await {
            Ok(repo) => RepoLookup::Found(repo),
            Err(HostedError::NotFound(_)) => RepoLookup::NotFound,
            Err(err) => RepoLookup::Error(err),
        }
    }

    async fn list(&self) -> Result<Vec<Repository>, HostedError> {
        let mut repos = Vec::new();
        for page in 1..=MAX_PAGES {
            let url = self.url(&format!(
                "user/repos?per_page={PAGE_SIZE}&page={page}&sort=updated&affiliation=owner"
            ));
            let response = self.send(self.client.get(url)).await?;
            let batch: Vec<Repository> = self.json(response).await?;
            let done = batch.len() < PAGE_SIZE;
            repos.extend(batch);
            if done {
                break;
            }
        }
        Ok(repos)
    }

    async fn delete(&self, name: &str) -> Result<(), HostedError> {
        let full = self.full_name(name).await?;
        let response = self
            .send(self.client.delete(self.url(&format!("repos/{full}"))))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn default_branch(&self, name: &str) -> Result<String, HostedError> {
        let repo = self.get(name).await.into_result(name)?;
        Ok(repo
            .default_branch
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()))
    }

    async fn topics(&self, name: &str) -> Result<Vec<String>, HostedError> {
        let full = self.full_name(name).await?;
        let response = self
            .send(self.client.get(self.url(&format!("repos/{full}/topics"))))
            .await?;
        let topics: GitHubTopics = self.json(response).await?;
        Ok(topics.names)
    }

    async fn readme(&self, name: &str) -> Result<Option<Vec<u8>>, HostedError> {
        let full = self.full_name(name).await?;
        let request = self.client.get(self.url(&format!("repos/{full}/readme")));
        let response = self.send_accepting(request, ACCEPT_RAW).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| HostedError::Network(e.to_string()))?;
                Ok(Some(bytes.to_vec()))
            }
            _ => Err(error_from_response(response).await),
        }
    }
}

//! [`GithubClient`]: the reqwest-backed [`WorkflowClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;
use watcher::{
    ClientError, DispatchRequest, Owner, RepositoryName, RunId, TriggerEvent, WorkflowClient,
    WorkflowRun,
};

use crate::responses::{classify, decode, DispatchBody, WorkflowRunsPage};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GithubClient`].
#[derive(Clone)]
pub struct GithubConfig {
    /// REST base URL; point at `https://HOST/api/v3` for GitHub Enterprise Server.
    pub api_url: String,
    /// Bearer token (PAT, installation token, or `GITHUB_TOKEN`).
    pub token: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl GithubConfig {
    /// Settings for api.github.com with a 30 second request timeout.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

// The token must never reach logs.
impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// GitHub Actions client. Cheap to clone; holds no per-invocation state.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    api_url: String,
    token: String,
}

impl GithubClient {
    /// Builds the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: GithubConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(concat!("runwatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn workflow_url(&self, request: &DispatchRequest, leaf: &str) -> String {
        format!(
            "{}/repos/{}/{}/actions/workflows/{}/{leaf}",
            self.api_url, request.owner, request.repository, request.workflow
        )
    }

    fn run_url(&self, owner: &Owner, repository: &RepositoryName, run_id: RunId) -> String {
        format!(
            "{}/repos/{owner}/{repository}/actions/runs/{run_id}",
            self.api_url
        )
    }

    fn dispatch_request(&self, request: &DispatchRequest) -> RequestBuilder {
        let body = DispatchBody {
            git_ref: request.git_ref.as_str(),
            inputs: &request.inputs,
        };
        self.http
            .post(self.workflow_url(request, "dispatches"))
            .json(&body)
    }

    fn list_runs_request(&self, request: &DispatchRequest, event: TriggerEvent) -> RequestBuilder {
        self.http.get(self.workflow_url(request, "runs")).query(&[
            ("branch", request.git_ref.branch_filter()),
            ("event", event.as_str()),
        ])
    }

    /// Sends `builder` with credentials and returns the body of a success
    /// response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, ClientError> {
        let response = builder
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| ClientError::Transport {
            message: format!("failed to read response body: {e}"),
        })?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify(status.as_u16(), &headers, &body))
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.send(builder).await?;
        decode(&body)
    }
}

#[async_trait]
impl WorkflowClient for GithubClient {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<(), ClientError> {
        debug!(target_workflow = %request, "POST workflow dispatch");
        self.send(self.dispatch_request(request)).await?;
        Ok(())
    }

    async fn list_runs(
        &self,
        request: &DispatchRequest,
        event: TriggerEvent,
    ) -> Result<Vec<WorkflowRun>, ClientError> {
        debug!(
            target_workflow = %request,
            branch = request.git_ref.branch_filter(),
            event = event.as_str(),
            "GET workflow runs"
        );

        let page: WorkflowRunsPage = self.get_json(self.list_runs_request(request, event)).await?;
        debug!(
            total = page.total_count,
            returned = page.workflow_runs.len(),
            "Listed workflow runs"
        );
        Ok(page.workflow_runs)
    }

    async fn get_run(
        &self,
        owner: &Owner,
        repository: &RepositoryName,
        run_id: RunId,
    ) -> Result<WorkflowRun, ClientError> {
        let url = self.run_url(owner, repository, run_id);
        debug!(%url, "GET workflow run");
        self.get_json(self.http.get(&url)).await
    }
}

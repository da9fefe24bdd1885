//! GitHub API client for fetching release information.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

use super::types::GitHubRelease;
use crate::config::UpdaterConfig;
use crate::context::UpdateContext;
use crate::error::{Result, UpdateError};
use crate::release::ReleaseMetadata;

/// Media type requesting the v3 JSON representation.
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Client for the registry's latest-release endpoint.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    latest_url: String,
}

impl GitHubClient {
    /// Creates a client from the updater configuration.
    ///
    /// The configured check timeout is applied to every request.
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| UpdateError::Network(format!("invalid user agent: {e}")))?,
        );
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|e| UpdateError::Network(format!("invalid registry token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.check_timeout)
            .build()
            .map_err(|e| UpdateError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            latest_url: config.latest_release_url(),
        })
    }

    /// Fetches the latest release.
    ///
    /// One GET, no retries. Both the client timeout and the context are
    /// honoured.
    pub async fn fetch_latest(&self, ctx: &UpdateContext) -> Result<ReleaseMetadata> {
        ctx.ensure_active()?;
        tracing::debug!("Fetching latest release from {}", self.latest_url);

        let release = ctx
            .run(async {
                let response = self.client.get(&self.latest_url).send().await?;
                self.handle_response(response).await
            })
            .await?;

        tracing::debug!(
            "Latest release is {} with {} assets",
            release.tag_name,
            release.assets.len()
        );
        Ok(release.into())
    }

    /// Checks the status and parses the body.
    async fn handle_response(&self, response: reqwest::Response) -> Result<GitHubRelease> {
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .is_some_and(|remaining| remaining.to_str().unwrap_or("1") == "0")
        {
            let retry_after = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
                .map(|reset| (reset - chrono::Utc::now().timestamp()).max(0).unsigned_abs())
                .unwrap_or(60);

            return Err(UpdateError::RateLimited { retry_after });
        }

        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                status: status.as_u16(),
                url: self.latest_url.clone(),
            });
        }

        let body = response.bytes().await?;
        let release: GitHubRelease = serde_json::from_slice(&body)?;

        Ok(release)
    }
}

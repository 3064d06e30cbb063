//! HTTP implementation of [`MatchSource`].

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use url::Url;

use crate::auth::ApiKey;
use crate::error::UpstreamError;
use crate::types::{Account, MatchRecord};
use crate::upstream::endpoints::{self, API_KEY_HEADER, DEFAULT_BASE_URL};
use crate::upstream::{AccountDto, MatchDto, MatchIdsRequest, MatchSource};

/// Client for the upstream account and match REST endpoints.
///
/// This client performs no throttling of its own; wrap it in a
/// [`ThrottledClient`](super::ThrottledClient) before pointing it at the real
/// API.
///
/// # Example
///
/// ```rust,no_run
/// use match_ladder::auth::ApiKey;
/// use match_ladder::upstream::RiotClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RiotClient::builder()
///         .api_key(ApiKey::new("RGAPI-..."))
///         .build();
///
///     let account = client.resolve_account("Faker", "KR1").await?;
///     println!("{} -> {}", account, account.external_id);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RiotClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<ApiKey>,
}

impl RiotClient {
    /// Create a new client with default settings and no API key.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> RiotClientBuilder {
        RiotClientBuilder::new()
    }

    /// Resolve `displayName#tagLine` to an account.
    pub async fn resolve_account(
        &self,
        display_name: &str,
        tag_line: &str,
    ) -> Result<Account, UpstreamError> {
        let url = self.url(endpoints::account::BY_RIOT_ID, &[display_name, tag_line])?;
        let riot_id = format!("{display_name}#{tag_line}");
        let dto: AccountDto = self.get_json(url, "account", &riot_id).await?;

        if dto.puuid.is_empty() {
            return Err(UpstreamError::InvalidResponse(format!(
                "account lookup for {riot_id} returned an empty puuid"
            )));
        }

        Ok(Account {
            display_name: dto.game_name.unwrap_or_else(|| display_name.to_string()),
            tag_line: dto.tag_line.unwrap_or_else(|| tag_line.to_string()),
            external_id: dto.puuid,
        })
    }

    /// List match ids for an account, most recent first.
    pub async fn list_match_ids(
        &self,
        external_id: &str,
        request: &MatchIdsRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        let mut url = self.url(endpoints::matches::BY_PUUID, &[external_id, endpoints::matches::IDS])?;
        let query_string = serde_urlencoded::to_string(request.query())
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
        if !query_string.is_empty() {
            url.set_query(Some(&query_string));
        }
        self.get_json(url, "account", external_id).await
    }

    /// Fetch one match with every participant.
    pub async fn fetch_match(&self, match_id: &str) -> Result<MatchRecord, UpstreamError> {
        let url = self.url(endpoints::matches::BY_ID, &[match_id])?;
        let dto: MatchDto = self.get_json(url, "match", match_id).await?;
        Ok(dto.into())
    }

    /// Build `base_url/fixed.../dynamic...`, percent-encoding each segment.
    fn url(&self, fixed: &[&str], dynamic: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidResponse(format!("cannot-be-a-base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(fixed)
            .extend(dynamic);
        Ok(url)
    }

    /// Make an authenticated GET request and decode the JSON body.
    async fn get_json<T>(&self, url: Url, resource: &'static str, id: &str) -> Result<T, UpstreamError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut request = self.http_client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.expose_secret());
        }
        let response = request.send().await?;
        self.parse_response(response, resource, id).await
    }

    /// Map the HTTP status and body to a typed result.
    async fn parse_response<T>(
        &self,
        response: reqwest::Response,
        resource: &'static str,
        id: &str,
    ) -> Result<T, UpstreamError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound {
                resource,
                id: id.to_string(),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            return Err(UpstreamError::RateLimited { retry_after_ms });
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            UpstreamError::InvalidResponse(format!("Failed to parse response: {}. Body: {}", e, body))
        })
    }
}

impl Default for RiotClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiotClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Builder for [`RiotClient`].
pub struct RiotClientBuilder {
    base_url: String,
    api_key: Option<ApiKey>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl RiotClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API key sent with every request.
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> RiotClient {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("match-ladder/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("match-ladder"));
        headers.insert(USER_AGENT, header_value);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let reqwest_client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        // Retries live in ThrottledClient so every attempt is throttled.
        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        RiotClient {
            http_client: client,
            base_url: self.base_url,
            api_key: self.api_key,
        }
    }
}

impl Default for RiotClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchSource for RiotClient {
    async fn resolve_account(
        &self,
        display_name: &str,
        tag_line: &str,
    ) -> Result<Account, UpstreamError> {
        RiotClient::resolve_account(self, display_name, tag_line).await
    }

    async fn list_match_ids(
        &self,
        external_id: &str,
        request: &MatchIdsRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        RiotClient::list_match_ids(self, external_id, request).await
    }

    async fn fetch_match(&self, match_id: &str) -> Result<MatchRecord, UpstreamError> {
        RiotClient::fetch_match(self, match_id).await
    }
}

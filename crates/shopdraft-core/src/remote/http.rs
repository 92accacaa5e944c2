//! HTTP clients for the remote draft and publish resources.

use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::config::{ConfigError, SyncConfig};
use crate::error::{PublishError, PublishResult, RemoteError, RemoteResult};
use crate::models::{DraftId, ProductDraft};
use crate::util::compact_text;

use super::{PublishApi, RemoteDraftRecord, RemoteDraftStore};

/// Client for the remote draft resource.
///
/// `POST {base}/drafts`, then `PUT`/`GET`/`DELETE {base}/drafts/{id}`. The
/// server only serves records still flagged as drafts, so a published id
/// comes back as 404.
#[derive(Clone)]
pub struct HttpDraftStore {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpDraftStore {
    /// Build a client from the given configuration.
    pub fn new(config: &SyncConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.api_base_url().to_string(),
            auth_token: config.auth_token().map(str::to_string),
            client: build_client()?,
        })
    }

    fn draft_url(&self, id: &DraftId) -> String {
        format!("{}/drafts/{}", self.base_url, urlencoding::encode(id.as_str()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl RemoteDraftStore for HttpDraftStore {
    async fn create(&self, draft: &ProductDraft) -> RemoteResult<RemoteDraftRecord> {
        let request = self
            .client
            .post(format!("{}/drafts", self.base_url))
            .json(draft);
        let response = self.authorize(request).send().await?;

        if !response.status().is_success() {
            return Err(unavailable_from_response(response).await);
        }
        read_record(response).await
    }

    async fn update(&self, id: &DraftId, draft: &ProductDraft) -> RemoteResult<RemoteDraftRecord> {
        let request = self.client.put(self.draft_url(id)).json(draft);
        let response = self.authorize(request).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
            status if status.is_success() => read_record(response).await,
            _ => Err(unavailable_from_response(response).await),
        }
    }

    async fn fetch_by_id(&self, id: &DraftId) -> RemoteResult<Option<RemoteDraftRecord>> {
        let request = self.client.get(self.draft_url(id));
        let response = self.authorize(request).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => read_record(response).await.map(Some),
            _ => Err(unavailable_from_response(response).await),
        }
    }

    async fn delete(&self, id: &DraftId) -> RemoteResult<()> {
        let request = self.client.delete(self.draft_url(id));
        let response = self.authorize(request).send().await?;

        match response.status() {
            // Deleting an already-gone record is not an error.
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(unavailable_from_response(response).await),
        }
    }
}

/// Client for the publish resource.
///
/// `POST {base}/drafts/{id}/publish` with the final fields; the response
/// carries the permanent product id.
#[derive(Clone)]
pub struct HttpPublishClient {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpPublishClient {
    /// Build a client from the given configuration.
    pub fn new(config: &SyncConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.api_base_url().to_string(),
            auth_token: config.auth_token().map(str::to_string),
            client: build_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    product_id: String,
}

impl PublishApi for HttpPublishClient {
    async fn publish(&self, id: &DraftId, draft: &ProductDraft) -> PublishResult<String> {
        let url = format!(
            "{}/drafts/{}/publish",
            self.base_url,
            urlencoding::encode(id.as_str())
        );
        let mut request = self.client.post(url).json(draft);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|error| PublishError::Unavailable(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let payload = response
                .json::<PublishResponse>()
                .await
                .map_err(|error| PublishError::Unavailable(error.to_string()))?;
            return Ok(payload.product_id);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(PublishError::DraftMissing),
            status if status.is_client_error() => {
                Err(PublishError::Rejected(parse_api_error(status, &body)))
            }
            status => Err(PublishError::Unavailable(parse_api_error(status, &body))),
        }
    }
}

fn build_client() -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .build()
        .map_err(|error| ConfigError(format!("failed to build HTTP client: {error}")))
}

async fn read_record(response: reqwest::Response) -> RemoteResult<RemoteDraftRecord> {
    response
        .json::<RemoteDraftRecord>()
        .await
        .map_err(|error| RemoteError::Unavailable(format!("invalid draft payload: {error}")))
}

async fn unavailable_from_response(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    RemoteError::Unavailable(parse_api_error(status, &body))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        Self::Unavailable(error.to_string())
    }
}

// src/core/api_client.rs
//! HTTP client for the career backend. Every request goes through one
//! builder that attaches the injected bearer token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::applications::pages::PageSource;
use crate::config::ApiConfig;
use crate::core::error::ApiError;
use crate::guard::TokenValidator;
use crate::resume::{ResumePayload, ResumeSource, PDF_CONTENT_TYPE};
use crate::session::{Credentials, SessionToken};
use crate::types::{ApplicationRecord, Page, PageEnvelope};

pub const VALIDATE_TOKEN_ENDPOINT: &str = "/admin/auth/validate-token";
pub const APPLICATIONS_ENDPOINT: &str = "/career/applications";

/// Path of the resume of one application
pub fn resume_endpoint(application_id: impl Display) -> String {
    format!("{}/{}/resume", APPLICATIONS_ENDPOINT, application_id)
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    /// Create a client for `config.base_url` acting with `credentials`
    pub fn new(config: &ApiConfig, credentials: Credentials) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Request builder with the session bearer attached when there is one.
    /// Without a token the request goes out unauthenticated.
    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(endpoint));
        match self.credentials.token() {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    /// Generic GET request decoding a JSON body
    pub async fn get_json<R>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        trace!("GET {}", self.url(endpoint));

        let response = self
            .request(Method::GET, endpoint)
            .query(query)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Check a token against the backend. Any 2xx means valid.
    pub async fn validate_token(&self, token: &SessionToken) -> Result<(), ApiError> {
        let url = self.url(VALIDATE_TOKEN_ENDPOINT);
        debug!("Validating session token: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        ensure_success(response).await.map(|_| ())
    }

    /// One page of the application listing
    pub async fn fetch_applications_page(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Page<ApplicationRecord>, ApiError> {
        let envelope: PageEnvelope<ApplicationRecord> = self
            .get_json(
                APPLICATIONS_ENDPOINT,
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await?;

        let page = envelope.into_page(page);
        debug!(
            "Fetched applications page {} ({} records, {} pages reported)",
            page.index,
            page.content.len(),
            page.total_pages
        );
        Ok(page)
    }

    /// Binary resume download. The status is reported, not judged.
    pub async fn fetch_resume(&self, path: &str) -> Result<ResumePayload, ApiError> {
        info!("Fetching resume: {}", self.url(path));

        let response = self
            .request(Method::GET, path)
            .header(ACCEPT, PDF_CONTENT_TYPE)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        trace!("Resume response status {} ({} bytes)", status, bytes.len());

        Ok(ResumePayload {
            status,
            content_type,
            bytes,
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TokenValidator for ApiClient {
    async fn validate(&self, token: &SessionToken) -> Result<(), ApiError> {
        self.validate_token(token).await
    }
}

#[async_trait]
impl PageSource for ApiClient {
    async fn fetch_page(&self, page: u32, size: u32) -> Result<Page<ApplicationRecord>, ApiError> {
        self.fetch_applications_page(page, size).await
    }
}

#[async_trait]
impl ResumeSource for ApiClient {
    async fn fetch_resume(&self, path: &str) -> Result<ResumePayload, ApiError> {
        ApiClient::fetch_resume(self, path).await
    }
}

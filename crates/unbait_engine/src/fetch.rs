//! HTTP transport behind background tabs.
//!
//! A tab finishes loading whenever the server sends a document back, error
//! statuses included; only transport problems and non-document responses fail.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use unbait_logging::{unbait_debug, unbait_info};

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Stops runaway transfers; the orchestrator applies its own load ceiling.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Document types a tab will render, compared without parameters.
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        let documents = ["text/html", "application/xhtml+xml", "text/plain"];
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 10,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: documents.iter().map(|ct| ct.to_string()).collect(),
            user_agent: concat!("unbait/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchSettings {
    fn renders(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }
}

/// Raw document a background tab received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub requested_url: String,
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .redirect(Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    /// A missing `Content-Type` is accepted; a tab would sniff it.
    fn document_type(&self, headers: &HeaderMap) -> Result<Option<String>, FetchError> {
        let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
            return Ok(None);
        };
        if !self.settings.renders(value) {
            return Err(FetchError::new(
                FailureKind::UnsupportedContentType {
                    content_type: value.to_string(),
                },
                "response is not a document",
            ));
        }
        Ok(Some(value.to_string()))
    }

    async fn read_body(&self, response: Response) -> Result<Vec<u8>, FetchError> {
        let limit = self.settings.max_bytes;
        let oversize = |actual: u64| {
            FetchError::new(
                FailureKind::TooLarge {
                    max_bytes: limit,
                    actual: Some(actual),
                },
                "page exceeds size limit",
            )
        };
        if let Some(declared) = response.content_length().filter(|len| *len > limit) {
            return Err(oversize(declared));
        }

        let mut body = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(classify)?;
            let total = (body.len() + chunk.len()) as u64;
            if total > limit {
                return Err(oversize(total));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let target = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self.client.get(target).send().await.map_err(classify)?;

        let status = response.status();
        let final_url = response.url().to_string();
        let content_type = self.document_type(response.headers())?;
        let body = self.read_body(response).await?;

        if status.is_client_error() || status.is_server_error() {
            unbait_info!("{} answered {}; keeping its error page", final_url, status);
        }
        unbait_debug!("Loaded {} bytes from {}", body.len(), final_url);

        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}

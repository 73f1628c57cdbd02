//! Plain HTTP document fetcher.

use std::time::Duration;

use async_trait::async_trait;
use extractbench_core::{CollaboratorError, CollaboratorResult, Document, Fetcher};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{ProviderError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request.
pub fn user_agent() -> String {
    format!("extractbench/{}", extractbench_core::VERSION)
}

/// GETs a page and wraps the body in a [`Document`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<Document> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        debug!(url = %url, bytes = body.len(), "fetched");

        let document = Document::new(url, body);
        Ok(match content_type {
            Some(ct) => document.with_content_type(ct),
            None => document,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> CollaboratorResult<Document> {
        self.get(url).await.map_err(|e: ProviderError| CollaboratorError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

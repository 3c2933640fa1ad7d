//! HTTP transport used by the remote loaders.

use async_trait::async_trait;
use url::Url;

use super::api_types::HttpResponse;
use crate::error::SourceError;

/// Minimal HTTP capability the remote loaders depend on.
#[async_trait]
pub trait HttpClient: Send + Sync {
  async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError>;
}

/// `HttpClient` backed by reqwest.
#[derive(Clone, Default)]
pub struct ReqwestClient {
  client: reqwest::Client,
}

impl ReqwestClient {
  pub fn new() -> Result<Self, SourceError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("feedcache/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| SourceError::Connectivity(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl HttpClient for ReqwestClient {
  async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError> {
    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| SourceError::Connectivity(format!("GET {} failed: {}", url, e)))?;

    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| SourceError::Connectivity(format!("Failed to read body of {}: {}", url, e)))?;

    Ok(HttpResponse::new(status, body.to_vec()))
  }
}

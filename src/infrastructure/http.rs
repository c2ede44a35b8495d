use crate::domain::ports::{GatewayTransport, HttpResponse};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Posts gateway calls over HTTPS with `reqwest`.
///
/// No timeout or retry is applied here; whatever the `reqwest::Client`
/// was built with is what callers get.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GatewayTransport for ReqwestTransport {
    async fn post(&self, url: &str, body: String) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

use reqwest::{Client, StatusCode};
use weather_core::{Cep, TracePropagation, WeatherResponse};

use crate::handler::GatewayError;

/// HTTP client for `weather-resolver`'s `GET /{cep}`.
#[derive(Debug, Clone)]
pub struct ResolverClient {
    base_url: String,
    http: Client,
    propagation: TracePropagation,
}

impl ResolverClient {
    pub fn new(http: Client, base_url: impl Into<String>, propagation: TracePropagation) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, http, propagation }
    }

    /// Forward `cep` to the resolver. The current span's trace context travels
    /// in the request headers.
    pub async fn fetch(&self, cep: &Cep) -> Result<WeatherResponse, GatewayError> {
        let url = format!("{}/{}", self.base_url, cep);

        let res = self
            .http
            .get(&url)
            .headers(self.propagation.outbound_headers())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }

        let body = res.text().await.map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Upstream { status, body });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

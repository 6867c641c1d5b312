use crate::{
    cep::Cep,
    model::{LocalityLookup, WeatherReading},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use thiserror::Error;

pub mod viacep;
pub mod weatherapi;

pub use viacep::ViaCepProvider;
pub use weatherapi::WeatherApiProvider;

/// Failure talking to a partner API.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to send request to {provider}: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status { provider: &'static str, status: StatusCode, body: String },

    #[error("Failed to parse {provider} response: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Resolves a postal code to a locality record.
#[async_trait]
pub trait LocalityProvider: Send + Sync + Debug {
    async fn lookup(&self, cep: &Cep) -> Result<LocalityLookup, ProviderError>;
}

/// Fetches current conditions for a named city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<WeatherReading, ProviderError>;
}

/// Shared response handling: non-2xx becomes [`ProviderError::Status`], the
/// body is decoded as `T` otherwise.
pub(crate) async fn decode_response<T>(
    provider: &'static str,
    res: reqwest::Response,
) -> Result<T, ProviderError>
where
    T: serde::de::DeserializeOwned,
{
    let status = res.status();
    let body = res.text().await.map_err(|source| ProviderError::Transport { provider, source })?;

    if !status.is_success() {
        return Err(ProviderError::Status { provider, status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|source| ProviderError::Decode { provider, source })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

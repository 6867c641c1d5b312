use async_trait::async_trait;
use reqwest::Client;

use crate::{
    model::WeatherReading,
    propagation::TracePropagation,
    provider::{ProviderError, decode_response},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

const NAME: &str = "WeatherAPI";

#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
    propagation: TracePropagation,
}

impl WeatherApiProvider {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: String,
        propagation: TracePropagation,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { api_key, base_url, http, propagation }
    }
}

// Keep the API key out of logs.
impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current(&self, city: &str) -> Result<WeatherReading, ProviderError> {
        let url = format!("{}/v1/current.json", self.base_url);
        tracing::debug!(%url, city, "fetching current weather");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("aqi", "no")])
            .headers(self.propagation.outbound_headers())
            .send()
            .await
            .map_err(|source| ProviderError::Transport { provider: NAME, source })?;

        decode_response(NAME, res).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn provider(server: &MockServer) -> WeatherApiProvider {
        WeatherApiProvider::new(
            Client::new(),
            server.base_url(),
            "TEST_KEY".into(),
            TracePropagation::new(),
        )
    }

    #[tokio::test]
    async fn current_weather_is_decoded() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/current.json")
                .query_param("key", "TEST_KEY")
                .query_param("aqi", "no")
                .query_param_exists("q");
            then.status(200).body(
                r#"{"location":{"name":"Sao Paulo"},"current":{"temp_c":20.0,"temp_f":68.0}}"#,
            );
        });

        let reading = provider(&server).current("São Paulo").await.expect("weather");
        assert_eq!(reading.current.temp_c, 20.0);
        assert_eq!(reading.current.temp_f, 68.0);
        assert_eq!(reading.location.map(|l| l.name).as_deref(), Some("Sao Paulo"));
        mock.assert();
    }

    #[tokio::test]
    async fn partner_status_is_preserved() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/current.json");
            then.status(401).body(r#"{"error":{"code":2006,"message":"API key is invalid."}}"#);
        });

        let err = provider(&server).current("Recife").await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn decode_error_names_the_provider() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/current.json");
            then.status(200).body(r#"{"location":{}}"#);
        });

        let err = provider(&server).current("Recife").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode { provider: "WeatherAPI", .. }));
        assert!(err.to_string().starts_with("Failed to parse WeatherAPI response: "));
    }

    #[test]
    fn debug_output_redacts_key() {
        let p = WeatherApiProvider::new(
            Client::new(),
            DEFAULT_BASE_URL,
            "SECRET".into(),
            TracePropagation::new(),
        );
        let out = format!("{p:?}");
        assert!(!out.contains("SECRET"));
        assert!(out.contains("redacted"));
    }
}

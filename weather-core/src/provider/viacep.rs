use async_trait::async_trait;
use reqwest::Client;

use crate::{
    cep::Cep,
    model::LocalityLookup,
    propagation::TracePropagation,
    provider::{ProviderError, decode_response},
};

use super::LocalityProvider;

pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br";

const NAME: &str = "ViaCEP";

#[derive(Debug, Clone)]
pub struct ViaCepProvider {
    base_url: String,
    http: Client,
    propagation: TracePropagation,
}

impl ViaCepProvider {
    pub fn new(http: Client, base_url: impl Into<String>, propagation: TracePropagation) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, http, propagation }
    }

    fn lookup_url(&self, cep: &Cep) -> String {
        format!("{}/ws/{}/json", self.base_url, cep)
    }
}

#[async_trait]
impl LocalityProvider for ViaCepProvider {
    async fn lookup(&self, cep: &Cep) -> Result<LocalityLookup, ProviderError> {
        let url = self.lookup_url(cep);
        tracing::debug!(%url, "looking up locality");

        let res = self
            .http
            .get(&url)
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

    fn provider(server: &MockServer) -> ViaCepProvider {
        ViaCepProvider::new(Client::new(), server.base_url(), TracePropagation::new())
    }

    #[test]
    fn url_has_no_double_slash() {
        let p = ViaCepProvider::new(Client::new(), "http://x/", TracePropagation::new());
        let cep = Cep::parse("01001000").unwrap();
        assert_eq!(p.lookup_url(&cep), "http://x/ws/01001000/json");
    }

    #[tokio::test]
    async fn found_locality() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/ws/01001000/json");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"cep":"01001-000","localidade":"São Paulo"}"#);
        });

        let cep = Cep::parse("01001000").unwrap();
        let found = provider(&server).lookup(&cep).await.expect("lookup should succeed");

        assert_eq!(found.city(), Some("São Paulo"));
        mock.assert();
    }

    #[tokio::test]
    async fn partner_error_flag_is_decoded() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ws/00000000/json");
            then.status(200).body(r#"{"erro":"true"}"#);
        });

        let cep = Cep::parse("00000000").unwrap();
        let found = provider(&server).lookup(&cep).await.expect("decodes");
        assert!(found.not_found);
    }

    #[tokio::test]
    async fn bad_request_maps_to_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ws/99999999/json");
            then.status(400).body("Bad Request");
        });

        let cep = Cep::parse("99999999").unwrap();
        let err = provider(&server).lookup(&cep).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::BAD_REQUEST));
        assert!(err.to_string().contains("ViaCEP"));
    }

    #[tokio::test]
    async fn html_body_maps_to_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ws/12345678/json");
            then.status(200).body("<html>maintenance</html>");
        });

        let cep = Cep::parse("12345678").unwrap();
        let err = provider(&server).lookup(&cep).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
        assert!(err.to_string().starts_with("Failed to parse ViaCEP response: "));
    }
}

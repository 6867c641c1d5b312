use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use thiserror::Error;
use tracing::{Instrument, info_span};
use weather_core::{Cep, CepError, CepRequest, TracePropagation, WeatherResponse};

use crate::client::ResolverClient;

#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: ResolverClient,
    pub propagation: TracePropagation,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/", post(forward)).with_state(state)
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid zipcode")]
    InvalidCep(#[from] CepError),

    #[error("{0}")]
    Transport(String),

    #[error("can not find zipcode")]
    NotFound,

    #[error("{body}")]
    Upstream { status: StatusCode, body: String },

    #[error("{0}")]
    Decode(String),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) | GatewayError::InvalidCep(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Transport(_) | GatewayError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

async fn forward(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CepRequest>, JsonRejection>,
) -> Result<Json<WeatherResponse>, GatewayError> {
    let Json(input) = body.map_err(|rejection| GatewayError::BadRequest(rejection.body_text()))?;
    let cep = Cep::parse(&input.cep)?;

    let span = info_span!("get-service-b-info", %cep);
    state.propagation.set_parent_from_headers(&span, &headers);

    async {
        state.resolver.fetch(&cep).await.map(Json).inspect_err(|e| {
            tracing::warn!(error = %e, status = %e.status(), "weather-resolver call failed")
        })
    }
    .instrument(span)
    .await
}

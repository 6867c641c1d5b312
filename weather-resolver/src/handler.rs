use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, info_span};
use weather_core::{
    Cep, CepError, LocalityProvider, ProviderError, TracePropagation, WeatherProvider,
    WeatherResponse,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub locality: Arc<dyn LocalityProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub propagation: TracePropagation,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/{cep}", get(get_weather)).with_state(state)
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid zipcode")]
    InvalidCep(#[from] CepError),

    #[error("can not find zipcode")]
    NotFound,

    #[error("error decoding location: {0}")]
    LocationDecode(String),

    #[error("can not get weather")]
    WeatherUnavailable(StatusCode),

    #[error("error decoding weather: {0}")]
    WeatherDecode(String),
}

impl ResolveError {
    fn from_locality(err: ProviderError) -> Self {
        match err {
            ProviderError::Decode { source, .. } => Self::LocationDecode(source.to_string()),
            ProviderError::Transport { .. } | ProviderError::Status { .. } => Self::NotFound,
        }
    }

    fn from_weather(err: ProviderError) -> Self {
        match err {
            ProviderError::Decode { source, .. } => Self::WeatherDecode(source.to_string()),
            ProviderError::Status { status, .. } => Self::WeatherUnavailable(status),
            ProviderError::Transport { .. } => {
                Self::WeatherUnavailable(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ResolveError::InvalidCep(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ResolveError::NotFound => StatusCode::NOT_FOUND,
            ResolveError::WeatherUnavailable(status) => *status,
            ResolveError::LocationDecode(_) | ResolveError::WeatherDecode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

async fn get_weather(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WeatherResponse>, ResolveError> {
    let span = info_span!("resolve-weather", cep = %raw);
    state.propagation.set_parent_from_headers(&span, &headers);

    resolve(&state, &raw).instrument(span).await.map(Json)
}

async fn resolve(state: &AppState, raw: &str) -> Result<WeatherResponse, ResolveError> {
    let cep = Cep::parse_lenient(raw).inspect_err(|_| tracing::info!("rejected zipcode"))?;

    let locality = state
        .locality
        .lookup(&cep)
        .instrument(info_span!("get-location", %cep))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "locality lookup failed");
            ResolveError::from_locality(e)
        })?;

    let Some(city) = locality.city() else {
        tracing::info!(%cep, "zipcode unknown to locality partner");
        return Err(ResolveError::NotFound);
    };

    let reading = state
        .weather
        .current(city)
        .instrument(info_span!("get-weather", city))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "weather lookup failed");
            ResolveError::from_weather(e)
        })?;

    Ok(WeatherResponse::new(city, &reading))
}

//! Core library for the zipcode weather services.
//!
//! This crate defines:
//! - The postal code (CEP) value object and the temperature converter
//! - Configuration & credentials handling
//! - Abstractions over the locality and weather partner APIs
//! - Shared wire models (partner payloads, service requests and responses)
//! - Telemetry setup and trace-context propagation over HTTP headers
//! - HTTP middleware and lifecycle helpers shared by both services
//!
//! It is used by `weather-gateway` and `weather-resolver`.

pub mod cep;
pub mod config;
pub mod convert;
pub mod model;
pub mod propagation;
pub mod provider;
pub mod server;
pub mod telemetry;

pub use cep::{Cep, CepError};
pub use config::{Config, ConfigError};
pub use convert::celsius_to_kelvin;
pub use model::{CepRequest, LocalityLookup, WeatherReading, WeatherResponse};
pub use propagation::TracePropagation;
pub use provider::{LocalityProvider, ProviderError, WeatherProvider};
pub use telemetry::{Telemetry, TelemetryConfig, TelemetryError};

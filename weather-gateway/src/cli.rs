use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use weather_core::{
    Telemetry, TelemetryConfig, server,
    telemetry::{DEFAULT_COLLECTOR_ENDPOINT, SHUTDOWN_TIMEOUT},
};

use crate::{
    client::ResolverClient,
    handler::{self, AppState},
};

pub const SERVICE_NAME: &str = "weather-gateway";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-gateway",
    version,
    about = "Validates a postal code and forwards it to weather-resolver"
)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "GATEWAY_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Base URL of the weather-resolver service.
    #[arg(long, env = "RESOLVER_URL", default_value = "http://goapp-service-b:8081")]
    pub resolver_url: String,

    /// OTLP/gRPC collector endpoint.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value = DEFAULT_COLLECTOR_ENDPOINT)]
    pub otlp_endpoint: String,

    /// Disable span export. Trace context is still propagated.
    #[arg(long)]
    pub no_otlp: bool,

    /// Log filter directives, e.g. "weather_gateway=debug,tower_http=info".
    #[arg(long, env = "RUST_LOG")]
    pub log: Option<String>,
}

impl Cli {
    fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: SERVICE_NAME.to_owned(),
            collector_endpoint: (!self.no_otlp).then(|| self.otlp_endpoint.clone()),
            log_filter: self.log.clone(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let telemetry = Telemetry::init(self.telemetry_config())?;
        let propagation = telemetry.propagation();

        let http = reqwest::Client::builder()
            .user_agent(concat!("weather-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        tracing::info!(resolver = %self.resolver_url, "forwarding to weather-resolver");

        let state = AppState {
            resolver: ResolverClient::new(http, self.resolver_url, propagation.clone()),
            propagation,
        };

        let result =
            server::serve(server::with_middleware(handler::router(state)), self.listen).await;

        telemetry.shutdown(SHUTDOWN_TIMEOUT);
        result.context("weather-gateway server failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_deployment() {
        let cli = Cli::try_parse_from(["weather-gateway"]).unwrap();
        assert_eq!(cli.listen.port(), 8080);
        assert_eq!(cli.resolver_url, "http://goapp-service-b:8081");
        assert!(!cli.no_otlp);
    }

    #[test]
    fn resolver_url_can_be_overridden() {
        let cli = Cli::try_parse_from([
            "weather-gateway",
            "--resolver-url",
            "http://localhost:9000",
            "--no-otlp",
        ])
        .unwrap();
        assert_eq!(cli.resolver_url, "http://localhost:9000");
        assert!(cli.telemetry_config().collector_endpoint.is_none());
    }
}

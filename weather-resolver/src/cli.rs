use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use weather_core::{
    Config, ConfigError, Telemetry, TelemetryConfig,
    provider::{ViaCepProvider, WeatherApiProvider, viacep, weatherapi},
    server,
    telemetry::{DEFAULT_COLLECTOR_ENDPOINT, SHUTDOWN_TIMEOUT},
};

use crate::handler::{self, AppState};

pub const SERVICE_NAME: &str = "weather-resolver";

/// Top-level CLI struct. Without a subcommand the service is started.
#[derive(Debug, Parser)]
#[command(
    name = "weather-resolver",
    version,
    about = "Resolves a postal code to the current weather of its city",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI key in the config file.
    Configure {
        /// Config file to write instead of the platform default.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "RESOLVER_LISTEN", default_value = "0.0.0.0:8081")]
    pub listen: SocketAddr,

    /// Config file holding `weather_api_key`; overrides WEATHER_API_KEY.
    #[arg(long, env = "WEATHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the ViaCEP locality API.
    #[arg(long, env = "VIACEP_URL", default_value = viacep::DEFAULT_BASE_URL)]
    pub viacep_url: String,

    /// Base URL of the WeatherAPI.com API.
    #[arg(long, env = "WEATHERAPI_URL", default_value = weatherapi::DEFAULT_BASE_URL)]
    pub weatherapi_url: String,

    /// OTLP/gRPC collector endpoint.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value = DEFAULT_COLLECTOR_ENDPOINT)]
    pub otlp_endpoint: String,

    /// Disable span export. Trace context is still propagated.
    #[arg(long)]
    pub no_otlp: bool,

    /// Log filter directives, e.g. "weather_resolver=debug,tower_http=info".
    #[arg(long, env = "RUST_LOG")]
    pub log: Option<String>,
}

impl ServeArgs {
    fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: SERVICE_NAME.to_owned(),
            collector_endpoint: (!self.no_otlp).then(|| self.otlp_endpoint.clone()),
            log_filter: self.log.clone(),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure { config }) => configure(config),
            None => serve(self.serve).await,
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let api_key = Config::load(args.config.as_deref())?.resolve_api_key()?;

    let telemetry = Telemetry::init(args.telemetry_config())?;
    let propagation = telemetry.propagation();

    let http = reqwest::Client::builder()
        .user_agent(concat!("weather-resolver/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState {
        locality: Arc::new(ViaCepProvider::new(
            http.clone(),
            args.viacep_url,
            propagation.clone(),
        )),
        weather: Arc::new(WeatherApiProvider::new(
            http,
            args.weatherapi_url,
            api_key,
            propagation.clone(),
        )),
        propagation,
    };

    let result = server::serve(server::with_middleware(handler::router(state)), args.listen).await;

    telemetry.shutdown(SHUTDOWN_TIMEOUT);
    result.context("weather-resolver server failed")
}

fn configure(path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut cfg = match Config::load(path.as_deref()) {
        Ok(cfg) => cfg,
        Err(ConfigError::NotFound(_)) => Config::default(),
        Err(e) => return Err(e.into()),
    };

    let api_key = Password::new("WeatherAPI key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key cannot be empty");
    }

    cfg.set_weather_api_key(api_key.to_owned());
    let written = cfg.save(path.as_deref())?;

    println!("Saved WeatherAPI key to {}", written.display());
    Ok(())
}

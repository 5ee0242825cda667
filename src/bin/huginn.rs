//! huginn: current weather from the command line.
//!
//! Looks up each city through a registry-managed client, so repeated
//! lookups (`--repeat`) are answered from the cache.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::info;

use huginn::config::{API_KEY_ENV, Config};
use huginn::{Mode, WeatherData};

/// Current weather by city
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Cached OpenWeatherMap client")]
struct Args {
    /// OpenWeatherMap API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: String,

    /// Path to configuration file (default: ~/.huginn/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refresh mode: on-demand or polling (overrides the config file)
    #[arg(short, long)]
    mode: Option<String>,

    /// Print raw JSON instead of a summary line
    #[arg(long)]
    json: bool,

    /// Look every city up this many times
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// City names
    #[arg(required = true)]
    cities: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let mode = match args.mode.as_deref() {
        Some(raw) => raw.parse::<Mode>()?,
        None => config.client.mode,
    };

    let registry = config.registry_builder().build()?;
    let client = registry.get_instance(&args.api_key, mode)?;
    info!(%mode, cities = args.cities.len(), "looking up weather");

    let mut failures = 0;
    for round in 0..args.repeat {
        for city in &args.cities {
            let started = Instant::now();
            match client.get_current_weather(city).await {
                Ok(weather) if args.json => println!("{}", serde_json::to_string_pretty(&*weather)?),
                Ok(weather) => println!("{}", summary(&weather)),
                Err(e) => {
                    failures += 1;
                    eprintln!("{city}: {e}");
                }
            }
            info!(round, city = %city, elapsed_ms = started.elapsed().as_millis() as u64, "lookup done");
        }
    }

    registry.release_instance(&args.api_key).await;

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// One line per city: name, condition, temperature, wind.
fn summary(weather: &WeatherData) -> String {
    let mut line = weather.name.clone();
    if let Some(condition) = weather.condition() {
        line.push_str(&format!(": {}", condition.description));
    }
    if let Some(temperature) = weather.temperature {
        line.push_str(&format!(
            ", {:.1} K (feels like {:.1} K)",
            temperature.temp, temperature.feels_like
        ));
    }
    if let Some(wind) = weather.wind {
        line.push_str(&format!(", wind {:.1} m/s", wind.speed));
    }
    line
}

//! CLI binary for geotagger.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use geotagger::background::create_host;
use geotagger::config::GeotagConfig;
use geotagger::foreground;
use geotagger::location::StaticLocationSource;
use geotagger::logging::init_tracing;
use geotagger::remote_config::{ConfigSource, HttpConfigSource};
use geotagger::{LocationCallback, ScheduleSpec, SessionHandle, TrackingRequest, TrackingSession};
use geotagger_geocode::{Coordinates, ReverseGeocoder, geocoder_from_config};
use tracing::info;

/// Background geotagging for address verification.
#[derive(Parser)]
#[command(name = "geotagger", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a tracking session from a fixed position until it ends or Ctrl+C.
    Track(TrackArgs),

    /// Fetch and print the organization's normalized schedule.
    RemoteConfig {
        /// Organization API key.
        #[arg(long, env = "GEOTAGGER_API_KEY")]
        api_key: String,
    },

    /// Reverse geocode one position with the configured provider.
    Geocode {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Write a default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct TrackArgs {
    /// Organization API key.
    #[arg(long, env = "GEOTAGGER_API_KEY")]
    api_key: String,
    /// Customer session token.
    #[arg(long, env = "GEOTAGGER_TOKEN")]
    token: String,
    /// Customer identity to report.
    #[arg(long)]
    customer: String,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
    /// Polling interval in hours. With --duration-days, skips the remote fetch.
    #[arg(long)]
    interval_hours: Option<f64>,
    /// Session length in days. With --interval-hours, skips the remote fetch.
    #[arg(long)]
    duration_days: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(GeotagConfig::default_config_path);

    if let Command::InitConfig { force } = cli.command {
        return init_config(&config_path, force);
    }

    let config = if cli.config.is_some() {
        GeotagConfig::from_file(&config_path)
    } else {
        GeotagConfig::load_or_default(&config_path)
    }
    .with_context(|| format!("loading {}", config_path.display()))?;
    config.validate()?;

    let _logging = init_tracing(&config.logging)?;

    match cli.command {
        Command::Track(args) => run_track(config, args).await,
        Command::RemoteConfig { api_key } => remote_config(&config, &api_key).await,
        Command::Geocode { lat, lng } => geocode(&config, lat, lng).await,
        Command::InitConfig { .. } => Ok(()),
    }
}

fn init_config(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    GeotagConfig::default().save_to_file(path)?;
    println!("wrote {}", path.display());
    Ok(())
}

async fn run_track(config: GeotagConfig, args: TrackArgs) -> anyhow::Result<()> {
    let (dispatcher, mut queue) = foreground::channel();
    let location = Arc::new(StaticLocationSource::new(args.lat, args.lng));
    let session = TrackingSession::from_config(&config, location, create_host(), Some(dispatcher))?;
    let on_post: LocationCallback =
        Arc::new(|lat: f64, lng: f64| println!("geotag posted: {lat}, {lng}"));

    let request = TrackingRequest::new(&args.api_key, &args.token, &args.customer);
    let started = match (args.interval_hours, args.duration_days) {
        (None, None) => {
            session.start_tracking(args.api_key, args.token, args.customer, Some(on_post))
        }
        (interval, duration) => {
            let request = with_overrides(&config, request, interval, duration).await?;
            session.start_tracking_with(request, Some(on_post))
        }
    };
    let handle: SessionHandle = started
        .await?
        .context("tracking did not start; see the log for the config fetch error")?;
    println!("session {} started: {}", handle.id(), handle.schedule());

    let summary = loop {
        tokio::select! {
            summary = handle.wait() => break summary,
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, stopping");
                session.stop_tracking().await;
                break handle.wait().await;
            }
            open = queue.run_one() => {
                if !open {
                    break handle.wait().await;
                }
            }
        }
    };
    queue.drain();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if let Some(stats) = session.report_stats() {
        println!("{}", serde_json::to_string_pretty(&stats.snapshot())?);
    }
    Ok(())
}

/// Fill whichever of interval/duration was not given from the remote config.
async fn with_overrides(
    config: &GeotagConfig,
    request: TrackingRequest,
    interval: Option<f64>,
    duration: Option<f64>,
) -> anyhow::Result<TrackingRequest> {
    let (interval_hours, duration_days) = match (interval, duration) {
        (Some(i), Some(d)) => (i, d),
        (i, d) => {
            let remote = HttpConfigSource::new(&config.api, config.schedule)?
                .fetch_schedule(&request.api_key)
                .await?;
            (
                i.unwrap_or(remote.interval_hours),
                d.unwrap_or(remote.duration_days),
            )
        }
    };
    Ok(request.with_schedule(interval_hours, duration_days))
}

async fn remote_config(config: &GeotagConfig, api_key: &str) -> anyhow::Result<()> {
    let schedule = HttpConfigSource::new(&config.api, config.schedule)?
        .fetch_schedule(api_key)
        .await?;
    let spec = ScheduleSpec::with_fallbacks(
        schedule.interval_hours,
        schedule.duration_days,
        &config.schedule,
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "interval_hours": schedule.interval_hours,
            "duration_days": schedule.duration_days,
            "interval_ms": spec.interval_millis(),
            "repeat_count": spec.repeat_count(),
        }))?
    );
    Ok(())
}

async fn geocode(config: &GeotagConfig, lat: f64, lng: f64) -> anyhow::Result<()> {
    if !config.geocoder.enabled {
        anyhow::bail!("reverse geocoding is disabled in [geocoder]");
    }
    let geocoder = geocoder_from_config(&config.geocoder.provider)?;
    let address = geocoder.reverse(Coordinates::new(lat, lng)).await?;
    println!("{}", serde_json::to_string_pretty(&address)?);
    println!("report address: {:?}", address.street_line());
    Ok(())
}

//! GeoTrail CLI - headless tracking dashboard
//!
//! Runs the polling engine against a tracking server and renders every view
//! update as a structured log event. Useful for soak-testing a receiver
//! installation without a browser.

use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use geotrail::backend::HttpBackendClient;
use geotrail::config::DashboardConfig;
use geotrail::logging;
use geotrail::poller::TelemetryPoller;
use geotrail::source::{DataSource, FilePreferenceStore};
use geotrail::view::TracingViewSink;

#[derive(Debug, Clone, ValueEnum)]
enum SourceArg {
    /// The backend's built-in telemetry simulation
    Simulated,
    /// The real LoRa hardware feed
    Hardware,
}

impl From<SourceArg> for DataSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Simulated => DataSource::Simulated,
            SourceArg::Hardware => DataSource::Hardware,
        }
    }
}

#[derive(Parser)]
#[command(name = "geotrail")]
#[command(version = geotrail::VERSION)]
#[command(about = "Live GPS tracking dashboard engine", long_about = None)]
struct Args {
    /// Tracking server base URL
    #[arg(long, default_value = "http://localhost:5000")]
    base_url: String,

    /// Data source to select at startup (overrides the saved preference)
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Telemetry poll interval in milliseconds
    #[arg(long, default_value = "2000")]
    interval_ms: u64,

    /// Keep the camera centered on the tracker every tick
    #[arg(long)]
    auto_track: bool,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: String,

    /// Path of the data-source preference file
    #[arg(long, default_value = "geotrail-preference.json")]
    preference_file: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match logging::init_logging(&args.log_dir, logging::default_log_file()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            process::exit(1);
        }
    };

    let mut config = DashboardConfig::for_base_url(args.base_url.trim_end_matches('/'));
    config.poll_interval = Duration::from_millis(args.interval_ms);

    let client = HttpBackendClient::new(config.base_url.clone());
    let prefs = FilePreferenceStore::new(&args.preference_file);
    let mut poller = TelemetryPoller::new(client, TracingViewSink, prefs, config);
    poller.set_auto_tracking(args.auto_track);

    if let Some(source) = args.source {
        poller.select_source(source.into()).await;
    }

    tokio::select! {
        _ = poller.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                eprintln!("Error waiting for shutdown signal: {}", e);
                process::exit(1);
            }
            tracing::info!("shutdown requested");
        }
    }

    poller.logout().await;
}

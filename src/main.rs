//! CLI entry point for the transit intensity estimator.
//!
//! Provides subcommands for querying by area code, coordinates or postal code,
//! and for listing the years the configured dataset covers.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_intensity::{
    TransitIntensities,
    fetch::BasicClient,
    intensity::Estimate,
    modes::{BUS_MODES, TRAIN_MODES},
    output::{append_record, print_json, print_pretty},
    spatial::{AreaPolygons, DecadePolygons, PostalBoundaryMap},
    store::{CachedStore, DatasetStore, FileStore, RemoteStore},
};

#[derive(Parser)]
#[command(name = "transit_intensity")]
#[command(about = "Estimate public transit energy intensity by fuel type", long_about = None)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Directory of ntd{year}_intensities.json(.gz) documents
    #[arg(long, env = "TRANSIT_DATA_DIR", global = true)]
    data_dir: Option<String>,

    /// Base URL serving ntd{year}_intensities.json documents
    #[arg(long, env = "TRANSIT_DATA_URL", global = true, conflicts_with = "data_dir")]
    data_url: Option<String>,

    /// Years available at --data-url (comma separated)
    #[arg(long, env = "TRANSIT_DATA_YEARS", value_delimiter = ',', global = true)]
    data_years: Vec<i32>,

    /// JSON map of decade -> area code -> postal codes
    #[arg(long, env = "TRANSIT_POSTAL_MAP", global = true)]
    postal_map: Option<String>,

    /// GeoJSON feature collection of urban area outlines
    #[arg(long, env = "TRANSIT_AREA_BOUNDARIES", global = true)]
    area_boundaries: Option<String>,

    /// Feature property holding the area code
    #[arg(long, env = "TRANSIT_AREA_PROPERTY", default_value = "UACE", global = true)]
    area_property: String,

    /// Decade the area outlines were drawn for
    #[arg(long, env = "TRANSIT_BOUNDARY_DECADE", default_value_t = 2020, global = true)]
    boundary_decade: i32,
}

#[derive(Args)]
struct QueryArgs {
    /// Year of travel
    #[arg(short, long, value_parser = clap::value_parser!(i32).range(1..=9999))]
    year: i32,

    /// NTD mode codes to include (comma separated), e.g. MB,RB
    #[arg(short, long, value_delimiter = ',', conflicts_with = "mode_family")]
    modes: Vec<String>,

    /// Preset mode family instead of explicit codes
    #[arg(long, value_enum)]
    mode_family: Option<ModeFamily>,

    /// Log the estimate as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// CSV file to append results to
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeFamily {
    Bus,
    Train,
}

impl QueryArgs {
    fn modes(&self) -> Option<Vec<String>> {
        match self.mode_family {
            Some(ModeFamily::Bus) => Some(transit_intensity::modes::owned_modes(BUS_MODES)),
            Some(ModeFamily::Train) => Some(transit_intensity::modes::owned_modes(TRAIN_MODES)),
            None if self.modes.is_empty() => None,
            None => Some(self.modes.clone()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate intensities for an urban area code (or nationwide)
    Query {
        /// Fixed-boundary urban area code; omit for nationwide
        #[arg(short, long)]
        area_code: Option<String>,

        #[command(flatten)]
        query: QueryArgs,
    },
    /// Estimate intensities for the urban area enclosing a coordinate
    Coords {
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[command(flatten)]
        query: QueryArgs,
    },
    /// Estimate intensities for the urban area containing a postal code
    Postal {
        #[arg(short, long)]
        postal_code: String,

        #[command(flatten)]
        query: QueryArgs,
    },
    /// List the years the dataset covers
    Years,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_intensity.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_intensity.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut estimator = TransitIntensities::new(CachedStore::new(open_store(&cli.data)?));
    if let Some(path) = &cli.data.postal_map {
        estimator = estimator.with_postal_map(Arc::new(PostalBoundaryMap::load(path)?));
    }

    let (estimate, query) = match cli.command {
        Commands::Query { area_code, query } => (
            estimator
                .get_intensities(query.year, area_code, query.modes())
                .await?,
            query,
        ),
        Commands::Coords { lon, lat, query } => (
            estimator
                .get_intensities_by_coordinates(query.year, lon, lat, query.modes())
                .await?,
            query,
        ),
        Commands::Postal { postal_code, query } => (
            estimator
                .get_intensities_by_postal_code(query.year, &postal_code, query.modes())
                .await?,
            query,
        ),
        Commands::Years => {
            let years = estimator.store().available_years().await?;
            info!(?years, "Available dataset years");
            return Ok(());
        }
    };

    report(&estimate, &query)
}

/// Builds the dataset store from the data directory or remote URL.
fn open_store(args: &DataArgs) -> Result<Arc<dyn DatasetStore>> {
    let boundaries = match &args.area_boundaries {
        Some(path) => DecadePolygons::default().with_decade(
            args.boundary_decade,
            AreaPolygons::load(path, &args.area_property)?,
        ),
        None => DecadePolygons::default(),
    };

    if let Some(dir) = &args.data_dir {
        info!(dir = %dir, "Reading datasets from directory");
        return Ok(Arc::new(FileStore::new(dir).with_boundaries(boundaries)));
    }
    if let Some(url) = &args.data_url {
        if args.data_years.is_empty() {
            warn!(url = %url, "No dataset years configured for remote store");
        }
        info!(url = %url, years = ?args.data_years, "Fetching datasets over HTTP");
        return Ok(Arc::new(
            RemoteStore::new(BasicClient::new(), url, args.data_years.clone())
                .with_boundaries(boundaries),
        ));
    }
    bail!("either --data-dir (TRANSIT_DATA_DIR) or --data-url (TRANSIT_DATA_URL) must be set")
}

fn report(estimate: &Estimate, query: &QueryArgs) -> Result<()> {
    print_pretty(estimate);
    if query.json {
        print_json(estimate)?;
    }

    match &estimate.intensities {
        Some(table) => {
            for (fuel_type, aggregate) in table.entries() {
                info!(
                    fuel_type,
                    wh_per_km = aggregate.wh_per_km,
                    weight = aggregate.weight,
                    "Intensity"
                );
            }
        }
        None => warn!("No intensity data available"),
    }
    info!(
        year = estimate.metadata.year,
        is_provisional = estimate.metadata.is_provisional,
        area_code = ?estimate.metadata.area_code,
        agencies = estimate.metadata.contributing_agency_ids.len(),
        "Query metadata"
    );

    if let Some(path) = &query.output {
        append_record(path, estimate)?;
    }
    Ok(())
}

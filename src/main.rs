//! CLI entry point for the EV registration analyzer.
//!
//! Provides subcommands for generating the full dashboard report over a
//! (optionally filtered) working set, comparing manufacturers side by side,
//! and producing a deep single-manufacturer profile.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use ev_registry_analyzer::{
    analyzers::{
        aggregate::Aggregator, comparison::comparison_report, profile::manufacturer_profile,
        types::DataFilters,
    },
    ingest::load_records,
    output::write_report,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ev_registry_analyzer")]
#[command(about = "A tool to analyze EV registration data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Working-set predicates shared by filtering subcommands. Every flag is
/// optional; supplied flags are ANDed.
#[derive(Args)]
struct FilterArgs {
    /// Only include this manufacturer
    #[arg(long)]
    make: Option<String>,

    /// Only include this county
    #[arg(long)]
    county: Option<String>,

    /// Only include this powertrain type (exact dataset label)
    #[arg(long)]
    ev_type: Option<String>,

    /// Earliest model year to include (inclusive)
    #[arg(long)]
    year_min: Option<u16>,

    /// Latest model year to include (inclusive)
    #[arg(long)]
    year_max: Option<u16>,
}

impl FilterArgs {
    fn to_filters(&self) -> DataFilters {
        let year_range = match (self.year_min, self.year_max) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(0), max.unwrap_or(u16::MAX))),
        };

        DataFilters {
            make: self.make.clone(),
            makes: None,
            ev_type: self.ev_type.clone(),
            county: self.county.clone(),
            year_range,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the full dashboard report over a filtered working set
    Report {
        /// CSV file of registration records
        #[arg(short, long, default_value = "ev_data.csv")]
        input: String,

        /// JSON file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Number of manufacturers in the ranking
        #[arg(long, default_value_t = 10)]
        top_makes: usize,

        /// Number of counties in the ranking
        #[arg(long, default_value_t = 15)]
        top_counties: usize,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Compare two or more manufacturers side by side
    Compare {
        /// CSV file of registration records
        #[arg(short, long, default_value = "ev_data.csv")]
        input: String,

        /// JSON file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Manufacturer to compare (repeat for each, at least two)
        #[arg(long = "make", value_name = "MAKE")]
        makes: Vec<String>,
    },
    /// Deep analysis of a single manufacturer
    Profile {
        /// Manufacturer name as it appears in the dataset
        #[arg(value_name = "MAKE")]
        make: String,

        /// CSV file of registration records
        #[arg(short, long, default_value = "ev_data.csv")]
        input: String,

        /// JSON file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/ev_registry_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ev_registry_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            output,
            top_makes,
            top_counties,
            filters,
        } => {
            let records = load_records(&input)?;
            let aggregator = Aggregator::new(&records);

            let working_set = aggregator.filter(&filters.to_filters());
            info!(
                total = records.len(),
                filtered = working_set.len(),
                "Working set derived"
            );

            let report = Aggregator::new(&working_set).dashboard_report(top_makes, top_counties);
            write_report(output.as_deref(), &report)?;
        }
        Commands::Compare {
            input,
            output,
            makes,
        } => {
            if makes.len() < 2 {
                bail!("comparison needs at least two --make arguments");
            }

            let records = load_records(&input)?;
            let report = comparison_report(&records, &makes);

            let missing: Vec<&str> = report
                .manufacturers
                .iter()
                .zip(&report.models_comparison)
                .filter(|(_, m)| m.unique_models == 0)
                .map(|(name, _)| name.as_str())
                .collect();
            if !missing.is_empty() {
                info!(?missing, "Manufacturers with no matching records");
            }

            write_report(output.as_deref(), &report)?;
        }
        Commands::Profile {
            make,
            input,
            output,
        } => {
            let records = load_records(&input)?;
            let profile = manufacturer_profile(&records, &make);

            if profile.total_vehicles == 0 {
                info!(make, "No records for manufacturer");
            }

            write_report(output.as_deref(), &profile)?;
        }
    }

    Ok(())
}

//! EVA Analyzer CLI Application
//!
//! Command-line front end for the eva-analyzer library. It loads a signal
//! catalog, analyses one or more vehicle recordings and writes a coverage
//! report (TXT or JSON) per recording.

use anyhow::{bail, Context, Result};
use clap::Parser;
use eva_analyzer::{AnalysisSession, Catalog, FileLoader};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};

/// EVA Analyzer - Signal and scenario coverage of vehicle recordings
#[derive(Parser, Debug)]
#[command(name = "eva-cli")]
#[command(about = "Check which signals and use cases a vehicle recording covers", long_about = None)]
#[command(version)]
struct Args {
    /// Recording to analyse (JSON dump or BLF trace, can be repeated)
    #[arg(short, long, value_name = "FILE")]
    recording: Vec<PathBuf>,

    /// Path to DBC file(s) for BLF traces (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Signal catalog (TOML or JSON); the built-in catalog by default
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Path to configuration file (eva.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for report files (default: stdout)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    log::info!("EVA Analyzer CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using analyzer library v{}", eva_analyzer::VERSION);

    let config = merge_args(&args)?;

    if config.input.files.is_empty() {
        println!("EVA Analyzer - No recording specified");
        println!("\nQuick Start:");
        println!("  eva-cli --recording M123_Reveil.json");
        println!("  eva-cli --recording trace.blf --dbc powertrain.dbc --format json -o reports");
        println!("\nWith a configuration file:");
        println!("  eva-cli --config eva.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    run(&config)
}

/// Command-line flags take precedence over the configuration file
fn merge_args(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };

    config.input.files.extend(args.recording.iter().cloned());
    config.input.dbc_files.extend(args.dbc.iter().cloned());
    if let Some(catalog) = &args.catalog {
        config.catalog = Some(catalog.clone());
    }
    if let Some(output) = &args.output {
        config.output.output_dir = Some(output.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }

    Ok(config)
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let catalog = match path {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("Failed to load catalog: {:?}", path))?,
        None => Catalog::builtin(),
    };
    log::info!(
        "Catalog: {} signals, {} scenarios, {} requirements",
        catalog.signals.len(),
        catalog.scenarios.len(),
        catalog.requirements.entries.len()
    );
    Ok(catalog)
}

fn run(config: &AppConfig) -> Result<()> {
    let catalog = load_catalog(config.catalog.as_deref())?;
    let loader = FileLoader::new().with_dbc_files(config.input.dbc_files.iter().cloned());

    let mut failed = 0;
    for path in &config.input.files {
        if let Err(e) = analyse_file(&catalog, &loader, path, config) {
            log::error!("{:?}: {:#}", path, e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} recordings could not be analysed", failed, config.input.files.len());
    }
    Ok(())
}

fn analyse_file(catalog: &Catalog, loader: &FileLoader, path: &Path, config: &AppConfig) -> Result<()> {
    let mut session = AnalysisSession::open(catalog, loader, path)
        .with_context(|| format!("Failed to open recording: {:?}", path))?;
    let analysis = session.run();

    match &config.output.output_dir {
        Some(dir) => {
            report::write_report(&analysis, path, config.output.format, dir)?;
        }
        None => println!("{}", report::render(&analysis, config.output.format)?),
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

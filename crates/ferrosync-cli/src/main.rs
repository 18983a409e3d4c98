//! ferrosync - one-way directory mirroring tool
//!
//! Makes a destination directory an exact mirror of a source directory:
//! new and changed files are copied, files gone from the source are removed.

mod display;
mod progress;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ferrosync_config::{Config, ConfigBuilder, ConfigLoader};
use ferrosync_sync::SyncEngine;
use ferrosync_types::ThreadCount;
use progress::ProgressObserver;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

/// ferrosync - one-way directory mirroring tool
#[derive(Parser, Debug)]
#[command(
    name = "ferrosync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Mirror a source directory into a destination directory",
    long_about = "ferrosync makes DESTINATION an exact mirror of SOURCE.\n\
                  Files are compared by modification time, or by BLAKE3 content hash\n\
                  with --verify. Files missing from SOURCE are deleted from DESTINATION."
)]
struct Cli {
    /// Source directory
    source: Option<PathBuf>,

    /// Destination directory
    destination: Option<PathBuf>,

    /// Number of concurrent copy and delete workers
    #[arg(short, long, value_parser = parse_thread_count)]
    workers: Option<ThreadCount>,

    /// Number of hashing threads (defaults to the processor count)
    #[arg(long, value_parser = parse_thread_count)]
    hash_workers: Option<ThreadCount>,

    /// Confirm changes by content hash instead of modification time
    #[arg(long)]
    verify: bool,

    /// Also treat a size mismatch as a change in fast mode
    #[arg(long)]
    compare_size: bool,

    /// Write destination files in place instead of staging and renaming
    #[arg(long)]
    no_atomic: bool,

    /// Follow symbolic links while scanning
    #[arg(long)]
    follow_symlinks: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Layer command-line options on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        let sync = &mut config.sync;

        if let Some(source) = &self.source {
            sync.source = Some(source.clone());
        }
        if let Some(destination) = &self.destination {
            sync.destination = Some(destination.clone());
        }
        if let Some(workers) = self.workers {
            sync.workers = workers;
        }
        if let Some(hash_workers) = self.hash_workers {
            sync.hash_workers = Some(hash_workers);
        }

        sync.verify |= self.verify;
        sync.compare_size |= self.compare_size;
        sync.follow_symlinks |= self.follow_symlinks;
        if self.no_atomic {
            sync.atomic_copy = false;
        }
    }
}

fn parse_thread_count(value: &str) -> std::result::Result<ThreadCount, String> {
    let count: usize = value
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", value, e))?;
    ThreadCount::new(count)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            display::display_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;

    // Initialize logging
    init_logging(&cli, &config.logging.level)?;

    info!("ferrosync v{} starting", env!("CARGO_PKG_VERSION"));

    if cli.print_config {
        print!("{}", ConfigLoader::render(&config, Path::new("ferrosync.yaml"))?);
        return Ok(ExitCode::SUCCESS);
    }

    let sync_config = config
        .into_sync_config()
        .context("Both a source and a destination directory are required")?;

    if !cli.quiet {
        display::print_banner(&sync_config);
    }

    let observer = Arc::new(ProgressObserver::new(cli.quiet));
    let engine = SyncEngine::new(sync_config).with_observer(observer.clone());
    let result = engine.run().await;
    observer.finish();

    let stats = result.context("Sync aborted")?;

    if cli.quiet {
        display::print_errors(&stats);
    } else {
        display::print_sync_stats(&stats);
    }

    Ok(if stats.has_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Resolve the effective configuration
///
/// Precedence, lowest first: defaults, configuration file, environment,
/// command line.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path).with_context(|| {
            format!("Failed to load configuration from {}", path.display())
        })?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };

    cli.apply(&mut config);
    ConfigBuilder::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

fn init_logging(cli: &Cli, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        configured
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

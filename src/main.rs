//! Product Harvester main entry point
//!
//! This is the command-line interface for the Product Harvester scraper.

use clap::Parser;
use product_harvester::config::{load_config_with_hash, SiteProfile};
use product_harvester::crawler::run_harvest;
use product_harvester::output::print_report;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Product Harvester: a selector-driven product catalog scraper
///
/// Walks the listing pages of one configured site, scrapes every product
/// page they link to, and writes the results as a JSON catalog.
#[derive(Parser, Debug)]
#[command(name = "product-harvester")]
#[command(version)]
#[command(about = "A selector-driven product catalog scraper", long_about = None)]
struct Cli {
    /// Path to the site configuration file (TOML, or JSON with a .json extension)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Site to harvest (optional when the file defines a single site)
    #[arg(short, long)]
    site: Option<String>,

    /// Write the catalog here instead of the site's configured filename
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Cancel the harvest after this many seconds
    #[arg(long, value_name = "SECS")]
    max_duration: Option<u64>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let (name, site) = config.site(cli.site.as_deref())?;
    let mut profile = SiteProfile::compile(name, site)?;
    if let Some(output) = cli.output {
        profile.output_path = output;
    }

    if cli.dry_run {
        handle_dry_run(&profile);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    spawn_cancellation(cancel.clone(), cli.max_duration);

    match run_harvest(profile, &config.fetch, &cancel).await {
        Ok(report) => {
            if !cli.quiet {
                print_report(&report);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("product_harvester=info,warn"),
            1 => EnvFilter::new("product_harvester=debug,info"),
            2 => EnvFilter::new("product_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the token on Ctrl-C or once the optional deadline passes
fn spawn_cancellation(cancel: CancellationToken, max_duration: Option<u64>) {
    tokio::spawn(async move {
        let deadline = async {
            match max_duration {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("Could not listen for Ctrl-C: {}", e);
                    return;
                }
                tracing::warn!("Interrupted, cancelling harvest");
            }
            _ = deadline => {
                tracing::warn!("Maximum duration reached, cancelling harvest");
            }
            _ = cancel.cancelled() => return,
        }

        cancel.cancel();
    });
}

/// Handles the --dry-run mode: shows the compiled site without fetching
fn handle_dry_run(profile: &SiteProfile) {
    println!("=== Product Harvester Dry Run ===\n");

    println!("Site: {}", profile.name);

    println!("\nSeed URLs ({}):", profile.seeds.len());
    for seed in &profile.seeds {
        println!("  * {}", seed);
    }

    println!("\nFields ({}):", profile.fields.len());
    for name in profile.field_names() {
        println!("  - {}", name);
    }

    println!("\nImages: {}", if profile.image.is_some() { "yes" } else { "no" });
    println!("Thumbnails: {}", if profile.thumbnail.is_some() { "yes" } else { "no" });
    println!(
        "Pagination: {}",
        if profile.pagination.is_some() {
            "follow next page"
        } else {
            "single page per seed"
        }
    );
    println!("Output: {}", profile.output_path.display());

    println!("\n✓ Configuration is valid");
}

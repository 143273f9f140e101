use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lockaudit::{
    config::{Config, IgnoreConfig},
    database::{DatabaseFetcher, FilesystemSource},
    model::AuditReport,
    output::{format_report_to_string, print_report, OutputFormat},
    Auditor,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const VULNERABLE: u8 = 2;
}

#[derive(Parser)]
#[command(name = "lockaudit")]
#[command(
    author,
    version,
    about = "Check composer.lock dependencies against known security advisories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a lock file against the advisory database
    Check {
        /// Path to the composer.lock file
        #[arg(default_value = "composer.lock")]
        lockfile: PathBuf,

        /// Skip packages-dev entries
        #[arg(long)]
        no_dev: bool,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Audit against a local advisory directory instead of the
        /// cached download
        #[arg(long)]
        database_dir: Option<PathBuf>,

        /// Force a database refresh before checking
        #[arg(long)]
        update: bool,
    },

    /// Refresh the cached advisory database
    Update,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Remove the cached advisory database
    ClearCache,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Check {
            lockfile,
            no_dev,
            format,
            output,
            database_dir,
            update,
        } => {
            let format_str = format.unwrap_or_else(|| config.default_format.clone());
            let include_dev = !no_dev && config.include_dev;
            run_check(
                &config,
                lockfile,
                include_dev,
                format_str,
                output,
                database_dir,
                update,
            )
            .await
        }
        Commands::Update => {
            let fetcher = fetcher_from(&config);
            let dir = fetcher.fetch().await?;
            println!("Advisory database updated: {}", dir.display());
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let fetcher = fetcher_from(&config);
            let dir = fetcher.database_dir();
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn fetcher_from(config: &Config) -> DatabaseFetcher {
    DatabaseFetcher::new()
        .with_url(config.database_url.clone())
        .with_ttl_hours(config.cache_ttl_hours)
}

async fn run_check(
    config: &Config,
    lockfile: PathBuf,
    include_dev: bool,
    format: String,
    output_file: Option<String>,
    database_dir: Option<PathBuf>,
    force_update: bool,
) -> Result<u8> {
    let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let advisory_dir = match database_dir {
        Some(dir) => dir,
        None => {
            let fetcher = fetcher_from(config);
            let progress = if is_interactive {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {msg}")
                        .unwrap(),
                );
                pb.enable_steady_tick(Duration::from_millis(100));
                pb.set_message("Syncing advisory database...");
                Some(pb)
            } else {
                None
            };

            let dir = if force_update {
                fetcher.fetch().await?
            } else {
                fetcher.ensure_fresh().await?
            };

            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            dir
        }
    };

    let source = FilesystemSource::new(advisory_dir);
    let auditor = Auditor::from_source(&source).await?;

    let mut report = auditor.check_path(&lockfile, include_dev)?;
    apply_ignores(&mut report, &config.ignore);

    if let Some(path) = output_file {
        let rendered = format_report_to_string(&report, format)?;
        std::fs::write(&path, rendered)?;
        println!("Report written to: {}", path);
    } else {
        print_report(&report, format)?;
    }

    Ok(if report.is_empty() {
        exit_codes::SUCCESS
    } else {
        exit_codes::VULNERABLE
    })
}

/// Drop ignored packages and advisories from the report, removing
/// packages left with no advisories.
fn apply_ignores(report: &mut AuditReport, ignore: &IgnoreConfig) {
    report.vulnerabilities.retain(|name, entry| {
        if ignore.should_ignore_package(name) {
            return false;
        }
        entry
            .advisories
            .retain(|advisory| !ignore.should_ignore_advisory(advisory.cve.as_deref()));
        !entry.advisories.is_empty()
    });
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'lockaudit config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

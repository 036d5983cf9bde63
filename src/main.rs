use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use config::Config;
use error::StatsError;
use pipeline::RunLayout;
use playtime::{CommandOcr, GameTrackerFetcher};

mod aggregate;
mod config;
mod debug_log;
mod error;
mod extractor;
mod history;
mod pipeline;
mod playtime;
mod report;
mod roster;
mod tally;
mod types;
mod utils;

#[derive(Parser)]
#[command(name = "adminwatch")]
#[command(version)]
#[command(about = "Weekly admin activity reports from server logs and GameTracker playtime")]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count admin actions (slap, kick, ban, rename, admin chat) in the server logs
    Actions,
    /// Collect weekly playtime from GameTracker graphs and update the history
    Playtime,
    /// Combine the latest playtime and action reports
    Combine(CombineArgs),
    /// Run actions, playtime and combine in order
    Run(CombineArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args, Clone, Copy)]
struct CombineArgs {
    /// Don't print the leaderboard summary
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    subcommand: ConfigSubcommands,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Create default configuration file
    Init {
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (log-dir, roster, archive-dir, frontend-dir, images-dir,
        /// keep-images, url, host, start, user-agent, timeout-seconds, ocr-command,
        /// crop-box, scale-factor, number-comma, locale)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() {
    debug_log::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(config_args) => handle_config_subcommand(config_args),
        command => run_command(command).await,
    }
}

async fn run_command(command: Commands) {
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Config error: {e:#}");
            std::process::exit(1);
        }
    };
    let layout = RunLayout::new(config.paths.clone(), utils::today_utc());

    match command {
        Commands::Actions => finish_stage("actions", run_actions(&layout)),
        Commands::Playtime => finish_stage("playtime", run_playtime(&config, &layout).await),
        Commands::Combine(args) => {
            finish_stage("combine", run_combine(&config, &layout, args));
        }
        Commands::Run(args) => {
            finish_stage("actions", run_actions(&layout));
            finish_stage("playtime", run_playtime(&config, &layout).await);
            finish_stage("combine", run_combine(&config, &layout, args));
        }
        Commands::Config(_) => unreachable!("config commands run without loading config"),
    }
}

/// Missing inputs skip the stage with a warning; anything else ends the process.
fn finish_stage(stage: &str, result: Result<()>) {
    let Err(e) = result else {
        return;
    };

    if let Some(stats_error) = e.downcast_ref::<StatsError>() {
        eprintln!("⚠️  Skipping {stage}: {stats_error}");
        if matches!(stats_error, StatsError::EmptyRoster { .. }) {
            eprintln!("   Add one admin name per line to the roster file.");
        }
        return;
    }

    eprintln!("Error in {stage} stage: {e:#}");
    std::process::exit(1);
}

fn print_written(written: &[PathBuf]) {
    for path in written {
        println!("   → {}", path.display());
    }
}

fn run_actions(layout: &RunLayout) -> Result<()> {
    let outcome = pipeline::run_actions(layout)?;

    let total: u64 = outcome.tally.values().map(|counts| counts.total()).sum();
    println!(
        "✅ {} admin action(s) parsed from {} log file(s) for {} admin(s)",
        total,
        outcome.log_files,
        outcome.tally.len()
    );
    print_written(&outcome.written);
    Ok(())
}

async fn run_playtime(config: &Config, layout: &RunLayout) -> Result<()> {
    let fetcher = GameTrackerFetcher::new(config.gametracker.clone())?;
    let reader = CommandOcr::from_config(&config.ocr, config.paths.images_dir.clone());

    let outcome = pipeline::run_playtime(layout, &fetcher, &reader).await?;

    for entry in &outcome.collection.results {
        println!("{}: {} minutes", entry.name, entry.minutes);
    }
    for failure in &outcome.collection.failures {
        eprintln!("❌ Error processing {}: {:#}", failure.name, failure.error);
    }

    println!(
        "✅ Playtime collected for {} admin(s), {} failed",
        outcome.collection.results.len(),
        outcome.collection.failures.len()
    );
    print_written(&outcome.written);
    Ok(())
}

fn run_combine(config: &Config, layout: &RunLayout, args: CombineArgs) -> Result<()> {
    let outcome = pipeline::run_combine(layout)?;

    if !args.quiet {
        let options = utils::NumberFormatOptions::from(&config.formatting);
        for line in utils::summary_lines(&outcome.combined, &options) {
            println!("{line}");
        }
    }

    println!("✅ Combined stats saved for {} admin(s)", outcome.combined.len());
    print_written(&outcome.written);
    Ok(())
}

fn handle_config_subcommand(config_args: ConfigArgs) {
    match config_args.subcommand {
        ConfigSubcommands::Init { overwrite } => {
            if let Err(e) = config::create_default_config(overwrite) {
                eprintln!("Error creating config: {e}");
                std::process::exit(1);
            }
        }
        ConfigSubcommands::Show => {
            if let Err(e) = config::show_config() {
                eprintln!("Error showing config: {e}");
                std::process::exit(1);
            }
        }
        ConfigSubcommands::Set { key, value } => {
            if let Err(e) = config::set_config_value(&key, &value) {
                eprintln!("Error setting config: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

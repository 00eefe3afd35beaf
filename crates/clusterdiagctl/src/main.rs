//! Clusterdiag Control - CLI client for the guided cluster diagnosis.
//!
//! Drives the turn controller as an interactive console loop: print the
//! assistant's message, read the operator's answer, feed it back as the
//! next turn until the conversation reaches a terminal outcome.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use clusterdiag::config::CONFIG_PATH;
use clusterdiag::{DiagConfig, InboundTurn, TurnController, TurnOutcome};

#[derive(Parser)]
#[command(name = "clusterdiagctl")]
#[command(about = "Guided troubleshooting for distributed search clusters", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive diagnosis of a registered cluster
    Diagnose {
        /// Cluster name as registered in the config
        cluster: String,
    },

    /// List the registered clusters
    Clusters,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DiagConfig::load_from(path)?,
        None => DiagConfig::load_or_default(),
    };

    match cli.command {
        Commands::Clusters => list_clusters(&config),
        Commands::Diagnose { cluster } => diagnose(config, &cluster),
    }
}

fn list_clusters(config: &DiagConfig) -> Result<()> {
    if config.clusters.is_empty() {
        println!("No clusters registered. Add them under [clusters] in {CONFIG_PATH}");
        return Ok(());
    }
    println!("{}", "Registered clusters:".bold());
    for (name, url) in &config.clusters {
        println!("  {}  {}", name.cyan(), url.dimmed());
    }
    Ok(())
}

fn diagnose(config: DiagConfig, cluster: &str) -> Result<()> {
    let controller = TurnController::new(config)?;
    let stdin = io::stdin();

    let mut inbound = InboundTurn {
        cluster_name: Some(cluster.to_string()),
        ..Default::default()
    };

    loop {
        let outbound = controller.handle_turn(&inbound);

        match outbound.outcome {
            TurnOutcome::Fulfilled => {
                println!("\n{}", outbound.message.green());
                return Ok(());
            }
            TurnOutcome::Failed => {
                println!("\n{}", outbound.message.red());
                std::process::exit(1);
            }
            TurnOutcome::InProgress => {
                println!("\n{}", outbound.message);
                print!("{} ", ">".bold());
                io::stdout().flush()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    // EOF counts as walking away from the conversation.
                    println!();
                    return Ok(());
                }

                inbound = InboundTurn {
                    transcript: line.trim().to_string(),
                    session_attributes: outbound.session_attributes.unwrap_or_default(),
                    ..Default::default()
                };
            }
        }
    }
}

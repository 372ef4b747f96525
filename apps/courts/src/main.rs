use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{open_store, CourtScreen, RemoteSyncAdapter};
use shared::{
    domain::{CourtId, CourtStatus, ScopeId},
    protocol::ScreenSnapshot,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(about = "Report and view basketball court occupancy")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Collection the courts live under; overrides the config file.
    #[arg(long)]
    scope: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch current statuses and print every court with its colors.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Report a status for one court, the same way the side panel does.
    Report { court: String, status: CourtStatus },
    /// Print the selectable statuses and their colors.
    Statuses,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(scope) = cli.scope {
        settings.scope = scope;
    }

    match cli.command {
        Command::List { json } => list(&settings, json).await,
        Command::Report { court, status } => report(&settings, CourtId::new(court), status).await,
        Command::Statuses => {
            for status in CourtStatus::ALL {
                let colors = status.colors();
                println!(
                    "{:<10} top={:<8} bottom={}",
                    status,
                    colors.top.css(),
                    colors.bottom.css()
                );
            }
            Ok(())
        }
    }
}

async fn open_screen(settings: &Settings) -> Result<CourtScreen> {
    let store = open_store(&settings.store).await?;
    Ok(CourtScreen::create(
        ScopeId::new(settings.scope.clone()),
        settings.layout.clone(),
        RemoteSyncAdapter::new(store),
        settings.reconcile,
    ))
}

async fn list(settings: &Settings, json: bool) -> Result<()> {
    let screen = open_screen(settings).await?;
    screen
        .hydrate()
        .await
        .with_context(|| format!("could not load statuses for '{}'", settings.scope))?;

    let snapshot = screen.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    screen.dispose();
    Ok(())
}

async fn report(settings: &Settings, court: CourtId, status: CourtStatus) -> Result<()> {
    let mut screen = open_screen(settings).await?;
    if let Err(err) = screen.hydrate().await {
        warn!(error = %err, "continuing with local defaults");
    }

    if !screen.tap_court(&court) {
        bail!("'{court}' is not a court on the {} screen", settings.scope);
    }
    screen.panel_transition_finished();
    screen.select_status(status);
    info!(heading = %screen.panel().heading(), "confirming selection");

    let Some(pending) = screen.confirm_selection() else {
        bail!("no status selected for '{court}'");
    };
    let outcome = pending.outcome().await;

    let colors = screen.court_colors(&court);
    println!(
        "{court}: {} (top={}, bottom={})",
        screen.registry().get(&court),
        colors.top.css(),
        colors.bottom.css()
    );
    screen.dispose();

    outcome.with_context(|| format!("status for '{court}' was not saved remotely"))
}

fn print_snapshot(snapshot: &ScreenSnapshot) {
    println!("{}", snapshot.scope);
    for floor in &snapshot.floors {
        println!("  {}", floor.name);
        for court in &floor.courts {
            println!(
                "    {:<10} {:<10} top={:<8} bottom={}",
                court.court_id.as_str(),
                court.status.as_str(),
                court.colors.top.css(),
                court.colors.bottom.css()
            );
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shared::{
    domain::{CourtLayout, CourtStatus},
    protocol::STATUS_FIELD,
};
use storage::{DocumentStore, Fields, SqliteDocumentStore};
use tracing::info;

/// Creates court documents out-of-band; the court app only ever updates them.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/courts.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateCourt {
        scope: String,
        court: String,
        #[arg(long, default_value = "empty")]
        status: CourtStatus,
    },
    /// Create the five courts of the default layout in `scope`.
    SeedLayout { scope: String },
    ListCollections,
    Dump { scope: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();
    let store = SqliteDocumentStore::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateCourt {
            scope,
            court,
            status,
        } => {
            store
                .create_document(&scope, &court, &status_fields(status))
                .await?;
            println!("created {scope}/{court} status={status}");
        }
        Command::SeedLayout { scope } => {
            let layout = CourtLayout::default();
            for court in layout.court_ids() {
                store
                    .create_document(&scope, court.as_str(), &status_fields(CourtStatus::Empty))
                    .await?;
            }
            info!(%scope, courts = layout.court_ids().count(), "seeded default layout");
        }
        Command::ListCollections => {
            for collection in store.list_collections().await? {
                println!("{collection}");
            }
        }
        Command::Dump { scope } => {
            for document in store.list_documents(&scope).await? {
                let document = document.context("unreadable document")?;
                println!("{}", serde_json::to_string(&document)?);
            }
        }
    }

    Ok(())
}

fn status_fields(status: CourtStatus) -> Fields {
    let mut fields = Fields::new();
    fields.insert(STATUS_FIELD.to_string(), json!(status.as_str()));
    fields
}

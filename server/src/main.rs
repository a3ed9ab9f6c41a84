//! MDX25 database sync server.
//!
//! Serves the sync HTTP API, or runs a single sync or status check from the
//! command line.
//!
//! Usage:
//!   mdx-server serve --port 3000
//!   mdx-server sync bidirectional
//!   mdx-server sync to-supabase --table cursos
//!   mdx-server status

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mdx_db::Database;
use mdx_server::{build_router, AppState};
use mdx_sync::{
    ConflictPolicy, LocalStore, SupabaseConfig, SupabaseStore, SyncConfig, SyncDirection,
    SyncOrchestrator,
};
use mdx_types::SyncTable;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "mdx-server")]
#[command(about = "Bidirectional sync between the MDX25 local database and Supabase")]
struct Args {
    /// Path to the local SQLite database
    #[arg(long, env = "DATABASE_PATH", default_value = "mdx25.db")]
    database: PathBuf,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: String,

    /// Supabase service-role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    supabase_key: String,

    /// Rows per page when reading from Supabase
    #[arg(long, env = "SUPABASE_PAGE_SIZE", default_value_t = 1000)]
    page_size: usize,

    /// Supabase request timeout in seconds
    #[arg(long, env = "SUPABASE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// How bidirectional conflicts are resolved (latest-update or pass-order)
    #[arg(long, env = "SYNC_CONFLICT_POLICY", default_value = "latest-update")]
    conflict_policy: ConflictPolicy,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Bearer secret for the daily cron endpoint
        #[arg(long, env = "CRON_SECRET", hide_env_values = true)]
        cron_secret: Option<String>,
    },
    /// Run one sync and print the result as JSON
    Sync {
        /// to-supabase, from-supabase or bidirectional
        direction: SyncDirection,

        /// Sync only this table
        #[arg(long)]
        table: Option<SyncTable>,
    },
    /// Compare row counts and print the report as JSON
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let orchestrator = build_orchestrator(&args)?;

    match args.command {
        Command::Serve { port, cron_secret } => {
            if cron_secret.is_none() {
                warn!("CRON_SECRET is not set; the daily cron endpoint will reject every call");
            }
            let app = build_router(Arc::new(AppState::new(orchestrator, cron_secret)));
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
                .await
                .with_context(|| format!("failed to bind port {port}"))?;
            info!("HTTP API listening on port {port}");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server failed")?;
            info!("Server stopped");
        }
        Command::Sync { direction, table } => {
            if let Some(table) = table {
                let result = orchestrator.sync_table(table, direction).await;
                println!("{}", serde_json::to_string_pretty(&result)?);
                if !result.success {
                    bail!("sync of {table} failed");
                }
            } else {
                let run = orchestrator.run(direction).await;
                println!("{}", serde_json::to_string_pretty(&run)?);
                if run.summary.failed_tables > 0 {
                    bail!("{} table(s) failed", run.summary.failed_tables);
                }
            }
        }
        Command::Status => {
            let report = orchestrator.check_status().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Opens both stores and wires the orchestrator. Runs once at startup.
fn build_orchestrator(args: &Args) -> Result<SyncOrchestrator> {
    let db = Database::open(&args.database)
        .with_context(|| format!("failed to open {}", args.database.display()))?;
    let schemas: Vec<_> = SyncTable::ALL.iter().map(|t| t.schema()).collect();
    db.ensure_schema(&schemas)
        .context("failed to create local tables")?;

    let supabase = SupabaseStore::new(SupabaseConfig {
        url: args.supabase_url.clone(),
        service_key: args.supabase_key.clone(),
        page_size: args.page_size,
        timeout_secs: args.timeout_secs,
    })
    .context("failed to build Supabase client")?;

    let config = SyncConfig {
        conflict_policy: args.conflict_policy,
        ..Default::default()
    };
    info!(
        "Syncing {} tables with conflict policy {}",
        config.tables.len(),
        config.conflict_policy
    );

    SyncOrchestrator::new(
        Arc::new(LocalStore::new(db)),
        Arc::new(supabase),
        config,
    )
    .context("invalid sync configuration")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

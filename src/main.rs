//! Strategy tracker (headless driver)
//!
//! Drives the hash router against an in-memory document, the way a
//! browser tab would, and reports what each navigation mounted.
//!
//! # Architecture Overview
//!
//! ```text
//!     fragment ──▶ MemoryDocument ──hashchange──▶ Router
//!                        ▲                          │
//!                        │           resolve → match → render shell
//!                        │           → title → header → page init → footer
//!                        │                          │
//!                        └──── redirects ◀── page init ──▶ BackendHandle
//!                                                           │
//!                                              RestBackend / MemoryBackend
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

use strategy_tracker::backend::BackendHandle;
use strategy_tracker::config::{load_or_default, BackendMode, TrackerConfig};
use strategy_tracker::dom::{Document, HashChange, MemoryDocument};
use strategy_tracker::routing::RouteTable;
use strategy_tracker::observability::logging::init_logging;
use strategy_tracker::{build_route_table, Router, Shutdown};

#[derive(Parser)]
#[command(name = "strategy-tracker")]
#[command(about = "Headless driver for the strategy tracker's router", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the in-memory backend with demo data.
    #[arg(long)]
    offline: bool,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,

    /// Sign in before navigating.
    #[arg(long)]
    email: Option<String>,

    #[arg(long, default_value = "password123")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate to each fragment in turn and print a JSON summary
    Navigate {
        /// Fragments such as "#/dashboard"
        #[arg(required = true)]
        fragments: Vec<String>,
    },
    /// Read fragments from stdin, one per line, until EOF or Ctrl-C
    Watch,
    /// Print the route table
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if cli.offline {
        config.backend.mode = BackendMode::Memory;
    }
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    init_logging(&level);

    tracing::info!(
        backend = ?config.backend.mode,
        mount_id = %config.router.mount_id,
        max_redirects = config.router.max_redirects,
        "Configuration loaded"
    );

    let table = Arc::new(build_route_table()?);

    match cli.command {
        Commands::Routes => print_routes(&table),
        Commands::Navigate { fragments } => {
            let (router, _document, mut changes) =
                start_router(&config, cli.email.as_deref(), &cli.password, table).await?;
            for fragment in fragments {
                let settled = router
                    .navigate(&mut changes, &fragment, config.router.max_redirects)
                    .await;
                println!("{}", serde_json::to_string(&settled)?);
            }
        }
        Commands::Watch => {
            let (router, document, changes) =
                start_router(&config, cli.email.as_deref(), &cli.password, table).await?;
            let shutdown = Arc::new(Shutdown::new());
            let stop = shutdown.subscribe();

            // A plain thread: a blocked stdin read must not hold up exit.
            {
                let shutdown = shutdown.clone();
                std::thread::spawn(move || {
                    let stdin = std::io::stdin();
                    for line in stdin.lock().lines().map_while(Result::ok) {
                        let fragment = line.trim();
                        if !fragment.is_empty() {
                            document.set_location_hash(fragment);
                        }
                    }
                    shutdown.trigger();
                });
            }

            let ctrl_c = {
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        shutdown.trigger();
                    }
                })
            };

            let cycles = router.run(changes, stop).await;
            ctrl_c.abort();
            tracing::info!(cycles, "Watch finished");
        }
    }

    Ok(())
}

fn print_routes(table: &RouteTable) {
    for (route, title) in table.entries() {
        println!("{:<28} {}", route, title);
    }
    println!("{:<28} {}", "*", table.fallback().title());
    for shadowed in table.shadowed() {
        eprintln!("warning: {:?}", shadowed);
    }
}

/// Connect the backend, sign in when asked, and mount a fresh document.
async fn start_router(
    config: &TrackerConfig,
    email: Option<&str>,
    password: &str,
    table: Arc<RouteTable>,
) -> Result<(Router, Arc<MemoryDocument>, UnboundedReceiver<HashChange>), Box<dyn std::error::Error>>
{
    let backend = BackendHandle::from_config(config.backend.clone());
    if let Some(email) = email {
        backend.sign_in(email, password).await?;
    }

    let (document, changes) = MemoryDocument::new(&config.router.mount_id);
    let document = Arc::new(document);
    let router = Router::new(table, document.clone(), backend, config.router.mount_id.clone());
    Ok((router, document, changes))
}

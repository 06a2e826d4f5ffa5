use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use investigation_graph::{
    api,
    config::Config,
    graph::GraphService,
    kb::KbClient,
    search::SearchEngine,
    storage::SqliteStorage,
};

/// Investigation knowledge graph REST service
#[derive(Debug, Parser)]
#[command(name = "investigation-graph", version, about)]
struct Cli {
    /// Address to bind (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<std::net::IpAddr>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Database file path (overrides DATABASE_PATH)
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Investigation graph service starting..."
    );

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize the knowledge-base collaborator when configured
    let kb = match &config.knowledge_base {
        Some(kb_config) => match KbClient::new(kb_config) {
            Ok(client) => {
                info!(base_url = %client.base_url(), "Knowledge-base client initialized");
                Some(client)
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize knowledge-base client");
                return Err(e.into());
            }
        },
        None => {
            info!("No knowledge base configured; evidence back-references stored unvalidated");
            None
        }
    };

    let graph = GraphService::new(storage.clone(), kb);
    let search = SearchEngine::new(storage);

    let addr = SocketAddr::new(config.server.bind, config.server.port);
    let state = Arc::new(api::AppState::new(config, graph, search));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server ready, listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        investigation_graph::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        investigation_graph::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mission_control::{api, config::Config, db::Database, gateway::GatewayClient, sweeper};

#[derive(Parser)]
#[command(name = "mission-control")]
#[command(about = "Task and agent coordination dashboard with live updates")]
struct Cli {
    /// Database file (defaults to MISSION_CONTROL_DB, then the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server and dashboard
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Interface to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Run the delivery sweeper every N seconds
        #[arg(long)]
        sweep_interval: Option<u64>,
    },
    /// Upsert the default agent roster
    Seed,
    /// Forward pending notifications to the agent runtime once
    Sweep,
    /// Check agent runtime reachability and list its sessions
    Status,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "mission_control=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let db = match &config.db_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: Config, host: String, port: u16, sweep_interval: Option<u64>) -> anyhow::Result<()> {
    let db = open_database(&config)?;
    if db.is_empty()? {
        tracing::info!("Empty database, seeding default agents");
        db.seed_agents()?;
    }

    let state = api::AppState::new(db, config);
    if let Some(secs) = sweep_interval.filter(|s| *s > 0) {
        tracing::info!("Delivery sweeper runs every {}s", secs);
        sweeper::spawn_periodic(
            state.db.clone(),
            state.gateway.clone(),
            state.config.sweep_batch_size,
            Duration::from_secs(secs),
        );
    }

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Mission Control listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env();
    if cli.db.is_some() {
        config.db_path = cli.db;
    }

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            sweep_interval,
        }) => serve(config, host, port, sweep_interval).await?,
        Some(Commands::Seed) => {
            let db = open_database(&config)?;
            let summary = db.seed_agents()?;
            println!("Seeded {} agents", summary.agents);
            if let Some(id) = summary.welcome_task {
                println!("Created welcome task {}", id);
            }
        }
        Some(Commands::Sweep) => {
            let db = open_database(&config)?;
            let gateway = GatewayClient::new(&config.gateway);
            let report = sweeper::process_pending(&db, &gateway, config.sweep_batch_size).await?;
            println!(
                "{} pending, {} processed, {} failed, {} skipped",
                report.total, report.processed, report.failed, report.skipped
            );
        }
        Some(Commands::Status) => {
            let gateway = GatewayClient::new(&config.gateway);
            println!("Agent runtime: {}", gateway.base_url());
            match gateway.status().await {
                Ok(status) => {
                    println!(
                        "  running: {}{}",
                        status.running,
                        status
                            .version
                            .map(|v| format!(" (version {})", v))
                            .unwrap_or_default()
                    );
                    match gateway.list_sessions().await {
                        Ok(sessions) => {
                            println!("  sessions: {}", sessions.len());
                            for session in sessions {
                                println!(
                                    "    {} [{}] {}",
                                    session.session_key,
                                    session.kind,
                                    session.label.unwrap_or_default()
                                );
                            }
                        }
                        Err(e) => println!("  sessions unavailable: {}", e),
                    }
                }
                Err(e) => println!("  unreachable: {}", e),
            }
        }
        None => serve(config, "127.0.0.1".to_string(), 3000, None).await?,
    }

    Ok(())
}

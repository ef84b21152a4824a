//! citybikes gateway entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use citybikes_gateway::api::{create_router, AppState};
use citybikes_gateway::config::{Config, LogFormat};
use citybikes_gateway::metrics;
use citybikes_gateway::store::{with_deadline, DynamoStore, RecordStore, StoreOperation};
use citybikes_gateway::telemetry::{AccessLogger, LogSink, LogglySink};
use citybikes_gateway::utils::shutdown_signal;

/// How long to wait for queued access events after the listener stops.
const ACCESS_LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only HTTP gateway for the citybikes dataset.
#[derive(Parser, Debug)]
#[command(name = "citybikes-gateway")]
#[command(about = "Serves the citybikes station dataset from DynamoDB over HTTP")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listener port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve {
        /// HTTP listener port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Describe the configured table and exit.
    DescribeTable,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration decides the log format, so load it before logging starts
    let config = Config::load();

    let filter = if args.verbose {
        EnvFilter::new("citybikes_gateway=debug,access=info,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                config
                    .as_ref()
                    .map(|c| c.rust_log.as_str())
                    .unwrap_or("info"),
            )
        })
    };

    let json = matches!(&config, Ok(c) if c.log_format == LogFormat::Json);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::DescribeTable) => cmd_describe_table(config).await,
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        None => cmd_serve(config, args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CITYBIKES GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Table: {}", config.table_name);
    println!("  Region: {}", config.aws_region);
    if let Some(endpoint) = &config.dynamodb_endpoint {
        println!("  Endpoint: {}", endpoint);
    }
    println!("  Routes: /{}/{{server,status,all,search}}", config.route_prefix);
    println!("  Port: {}", config.port);
    println!("  Store Timeout: {}ms", config.store_timeout_ms);
    println!("  Log Tag: {}", config.log_tag);
    println!(
        "  Remote Logging: {}",
        if config.remote_logging_enabled() { "Loggly" } else { "Disabled" }
    );
    println!("  Metrics: {}", if config.metrics_enabled { "Enabled" } else { "Disabled" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Describe the configured table.
async fn cmd_describe_table(config: Config) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let store = DynamoStore::from_config(&config).await;
    let summary = with_deadline(
        StoreOperation::DescribeTable,
        &config.table_name,
        config.store_timeout(),
        store.describe_table(&config.table_name),
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Run the HTTP gateway until a shutdown signal arrives.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    if config.metrics_enabled {
        metrics::init_metrics().map_err(|e| anyhow::anyhow!(e))?;
    }

    info!("Configuration loaded successfully");
    info!("Table: {} ({})", config.table_name, config.aws_region);
    info!("Store timeout: {}ms", config.store_timeout_ms);

    // One shared store client for every request
    let store: Arc<dyn RecordStore> = Arc::new(DynamoStore::from_config(&config).await);

    let sink: Option<Arc<dyn LogSink>> = match config.loggly_token.as_deref() {
        Some(token) if config.remote_logging_enabled() => {
            let sink = LogglySink::new(&config.loggly_url, token, &config.log_tag)?;
            info!("Forwarding access events to {}", config.loggly_url);
            Some(Arc::new(sink))
        }
        _ => None,
    };

    let (access_log, log_worker) =
        AccessLogger::spawn(config.log_tag.as_str(), config.log_queue_capacity, sink);

    let state = AppState::new(store, access_log, &config);
    let router = create_router(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("HTTP server stopped, draining access log");

    // The router owned the last logger handles, so the worker exits once drained
    if tokio::time::timeout(ACCESS_LOG_DRAIN_TIMEOUT, log_worker)
        .await
        .is_err()
    {
        warn!("Access log drain timed out");
    }

    Ok(())
}

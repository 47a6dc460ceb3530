//! zcache node
//!
//! Runs one cache node serving a demo "scores" group backed by a slow
//! in-memory database.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           zcache node                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │  API server  │───▶│    Group     │───▶│   HttpPool   │──▶ peers
//! │  │ (/api, etc.) │    │   (scores)   │    │  (hash ring) │       │
//! │  └──────────────┘    └──────┬───────┘    └──────────────┘       │
//! │                             ▼                                    │
//! │  peers ──▶ peer server ─────┘            SlowDb (getter)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zcache::adapters::{HttpPool, HttpPoolOptions, DEFAULT_BASE_PATH};
use zcache::cache::DEFAULT_CACHE_BYTES;
use zcache::consistent_hash::DEFAULT_REPLICAS;
use zcache::domain::{Getter, GetterFn};
use zcache::error::{Error, Result};
use zcache::group::GroupRegistry;
use zcache::server::{serve_api, serve_peers};

// =============================================================================
// CLI Arguments
// =============================================================================

/// zcache - distributed read-through cache node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the peer server
    #[arg(long, env = "ZCACHE_PORT", default_value = "8001")]
    port: u16,

    /// Host name this node is reachable at
    #[arg(long, env = "ZCACHE_HOST", default_value = "localhost")]
    host: String,

    /// Also start the frontend API server
    #[arg(long, env = "ZCACHE_API")]
    api: bool,

    /// API server bind address
    #[arg(long, env = "ZCACHE_API_ADDR", default_value = "localhost:9999")]
    api_addr: String,

    /// Every node in the cluster, including this one
    #[arg(
        long,
        env = "ZCACHE_PEERS",
        value_delimiter = ',',
        default_value = "http://localhost:8001,http://localhost:8002,http://localhost:8003"
    )]
    peers: Vec<String>,

    /// Name of the demo group
    #[arg(long, env = "ZCACHE_GROUP", default_value = "scores")]
    group: String,

    /// Local store budget in bytes (0 = unbounded)
    #[arg(long, env = "ZCACHE_CACHE_BYTES", default_value_t = DEFAULT_CACHE_BYTES)]
    cache_bytes: i64,

    /// URL prefix for peer requests
    #[arg(long, env = "ZCACHE_BASE_PATH", default_value = DEFAULT_BASE_PATH)]
    base_path: String,

    /// Virtual nodes per peer on the hash ring
    #[arg(long, env = "ZCACHE_REPLICAS", default_value_t = DEFAULT_REPLICAS)]
    replicas: usize,

    /// Peer fetch timeout in seconds
    #[arg(long, env = "ZCACHE_FETCH_TIMEOUT_SECONDS", default_value = "30")]
    fetch_timeout_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let self_addr = format!("http://{}:{}", args.host, args.port);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        node = %self_addr,
        "Starting zcache node"
    );

    let registry = GroupRegistry::global();
    let group = registry.new_group(args.group.clone(), args.cache_bytes, slow_db());

    let options = HttpPoolOptions {
        base_path: args.base_path.clone(),
        replicas: args.replicas,
        fetch_timeout: Duration::from_secs(args.fetch_timeout_seconds),
        ..Default::default()
    };
    let pool = Arc::new(HttpPool::with_options(
        self_addr.clone(),
        Arc::clone(&registry),
        options,
    )?);
    pool.set(&args.peers);
    group.register_peers(pool.clone())?;

    if args.api {
        let listener = bind(&args.api_addr).await?;
        let registry = Arc::clone(&registry);
        let group = Arc::clone(&group);
        tokio::spawn(async move {
            if let Err(e) = serve_api(registry, group, listener).await {
                error!("API server error: {}", e);
            }
        });
    }

    let listener = bind(&format!("{}:{}", args.host, args.port)).await?;
    serve_peers(pool, listener).await
}

async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("failed to bind {}: {}", addr, e)))
}

// =============================================================================
// Demo Data Source
// =============================================================================

/// Scores table standing in for a slow backing database
fn slow_db() -> Arc<dyn Getter> {
    let db: HashMap<&'static str, &'static str> =
        HashMap::from([("zurich", "100"), ("alfred", "92"), ("tomcat", "79")]);

    Arc::new(GetterFn::new(move |key: &str| {
        info!("[SlowDB] search key {}", key);
        db.get(key)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }))
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let directive = |d: &str| -> Result<Directive> {
        d.parse()
            .map_err(|e| Error::Config(format!("bad log directive {}: {}", d, e)))
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive(directive("hyper=warn")?)
        .add_directive(directive("reqwest=info")?);

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
    Ok(())
}

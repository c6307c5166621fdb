// src/main.rs
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crab_set::{
    config::{self, Backend, Config},
    engine::Engine,
    lock::KeyLocks,
    monitor::{self, Metrics},
    server,
    store::{KvStore, MemoryStore, SledStore},
};

/// Redis-compatible set server on an ordered key-value store
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the JSON config file, created with defaults if missing
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Override the listen address from the config file
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)),
        )
        .init();
    info!(config = ?args.config, backend = ?cfg.backend, "starting crab-set");

    match cfg.backend {
        Backend::Sled => {
            let store = SledStore::open(&cfg.data_dir)
                .with_context(|| format!("Failed to open sled database at {:?}", cfg.data_dir))?;
            run(store, &cfg).await
        }
        Backend::Memory => run(MemoryStore::new(), &cfg).await,
    }
}

async fn run<S: KvStore + 'static>(store: S, cfg: &Config) -> Result<()> {
    let metrics = Arc::new(Metrics::new());
    let engine = Arc::new(Engine::with_parts(
        store,
        KeyLocks::new(cfg.lock_shards),
        metrics.clone(),
    ));

    if cfg.metrics_enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], cfg.metrics_port));
        tokio::spawn(monitor::serve_metrics(metrics, addr));
    }

    server::start(&cfg.bind, engine).await
}

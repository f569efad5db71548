//! Role cache probe
//!
//! Operator tool that wires a resolver to a static directory file,
//! resolves the given principals and prints one health report.
//!
//! ```text
//! rolecache-probe --directory directory.toml user:alice user:bob
//! rolecache-probe --directory directory.toml --simulate-outage user:alice
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use cretoai_rolecache::{
    CachedRoleResolver, Clock, RoleCacheConfig, RoleCacheStore, StaticRoleDirectory,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Wall clock that can be pushed forward to age cache entries
#[derive(Default)]
struct SkewedClock {
    skew: Mutex<Duration>,
}

impl SkewedClock {
    fn skip(&self, duration: Duration) {
        *self.skew.lock() += duration;
    }
}

impl Clock for SkewedClock {
    fn now(&self) -> Instant {
        Instant::now() + *self.skew.lock()
    }
}

/// Role cache probe CLI
#[derive(Parser)]
#[command(name = "rolecache-probe")]
#[command(about = "Resolve principals through the two-tier role cache")]
#[command(version)]
struct Cli {
    /// Path to cache configuration file (defaults apply when omitted)
    #[arg(short, long, env = "ROLECACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Path to static directory file with a [principals] table
    #[arg(short, long, env = "ROLECACHE_DIRECTORY")]
    directory: PathBuf,

    /// Take the directory offline after a first pass and resolve again
    #[arg(long)]
    simulate_outage: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Principals to resolve
    #[arg(required = true)]
    principals: Vec<String>,
}

/// Log filter used when `RUST_LOG` is unset
fn default_filter(verbose: bool) -> String {
    let log_level = if verbose { "debug" } else { "info" };
    format!("{},cretoai_rolecache={}", log_level, log_level)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with_target(true)
        .init();

    let config = match &cli.config {
        Some(path) => RoleCacheConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RoleCacheConfig::default(),
    };

    let directory = Arc::new(
        StaticRoleDirectory::from_file(&cli.directory)
            .with_context(|| format!("loading directory from {}", cli.directory.display()))?,
    );

    let mut store = RoleCacheStore::new(&config).context("building role cache")?;
    // Outage simulation pushes this clock past the primary TTL
    let skewed = cli.simulate_outage.then(|| Arc::new(SkewedClock::default()));
    if let Some(clock) = &skewed {
        store = store.with_clock(clock.clone());
    }
    let resolver = CachedRoleResolver::with_store(Arc::new(store), directory.clone())
        .context("building role resolver")?;

    let monitor = resolver.health_monitor(&config);
    monitor.start();

    info!("Resolving {} principals", cli.principals.len());
    resolve_all(&resolver, &cli.principals).await;

    if let Some(clock) = &skewed {
        info!("Simulating directory outage");
        directory.set_available(false);
        clock.skip(config.primary_ttl() + Duration::from_secs(1));
        resolve_all(&resolver, &cli.principals).await;
    }

    monitor.stop();
    if let Some(status) = monitor.last_status() {
        info!(healthy = status.healthy, "Last monitored directory health: {}", status.details);
    }

    let health = resolver.health_reporter().check_health().await;
    println!("health: {}", health);

    let metrics = resolver.metrics_snapshot();
    println!(
        "requests={} cache_hits={} directory_calls={} fallback_hits={} unavailable={}",
        metrics.requests,
        metrics.cache_hits,
        metrics.directory_calls,
        metrics.fallback_hits,
        metrics.unavailable
    );

    Ok(())
}

async fn resolve_all(resolver: &CachedRoleResolver, principals: &[String]) {
    for principal in principals {
        match resolver.resolve_detailed(principal).await {
            Ok(resolution) => {
                let roles: Vec<&str> = resolution.roles.iter().collect();
                println!("{} [{}]: {}", principal, resolution.source, roles.join(", "));
            }
            Err(e) => {
                error!("Resolution failed for {}: {}", principal, e);
                println!("{}: indeterminate ({})", principal, e);
            }
        }
    }
}

//! `reefctl`: inspect key placement for a Reef cluster.
//!
//! Builds the cluster described by a config file (plus any `--node` flags)
//! and answers placement questions against it.
//!
//! # Usage
//!
//! ```text
//! reefctl -c reef.toml owners user:42           # replicas for a key
//! reefctl --node a --node b:4 distribution       # primary share per node
//! reefctl -c reef.toml plan-add node-d 1.0       # keys moved by a join
//! reefctl -c reef.toml plan-remove node-b        # keys moved by a failure
//! ```

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reef_cluster::ClusterManager;
use reef_placement::{Ring, RingHasher};
use reef_types::NodeId;
use tracing::{debug, info};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "reefctl", version, about = "Reef consistent-hash placement tool")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "REEF_CONFIG")]
    config: Option<PathBuf>,

    /// Extra node to deploy, as `<id>` or `<id>:<weight>`.
    ///
    /// Can be specified multiple times; added after the config's nodes.
    #[arg(long = "node", global = true)]
    nodes: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the replica owners of a key, primary first.
    Owners {
        /// The key to place.
        key: String,

        /// Replication factor (defaults to the configured one).
        #[arg(short = 'n', long)]
        replicas: Option<usize>,
    },

    /// Show each node's share of primary ownership over sampled keys.
    Distribution {
        /// Number of sample keys.
        #[arg(short, long, default_value = "10000")]
        samples: usize,
    },

    /// Show how many sampled keys would move if a node joined.
    PlanAdd {
        /// ID of the joining node.
        id: String,

        /// Weight of the joining node.
        #[arg(default_value = "1.0")]
        weight: f64,

        /// Number of sample keys.
        #[arg(short, long, default_value = "10000")]
        samples: usize,
    },

    /// Show how many sampled keys would move if a node failed.
    PlanRemove {
        /// ID of the departing node.
        id: String,

        /// Number of sample keys.
        #[arg(short, long, default_value = "10000")]
        samples: usize,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    let mut cluster =
        ClusterManager::from_config(&config.cluster).context("failed to build cluster")?;
    for spec in &cli.nodes {
        let (id, weight) = parse_node_spec(spec)?;
        cluster
            .deploy(id, weight)
            .with_context(|| format!("failed to deploy --node {spec}"))?;
    }
    info!(
        nodes = cluster.node_count(),
        vnodes = cluster.ring().vnode_count(),
        replication = cluster.replication_factor(),
        "cluster ready"
    );

    match cli.command {
        Commands::Owners { key, replicas } => cmd_owners(&cluster, &key, replicas),
        Commands::Distribution { samples } => cmd_distribution(cluster.ring(), samples),
        Commands::PlanAdd {
            id,
            weight,
            samples,
        } => {
            let mut after = cluster.ring().clone();
            after.add_node(id, weight)?;
            cmd_plan(cluster.ring(), &after, samples, cluster.replication_factor())
        }
        Commands::PlanRemove { id, samples } => {
            let mut after = cluster.ring().clone();
            after.remove_node(&id)?;
            cmd_plan(cluster.ring(), &after, samples, cluster.replication_factor())
        }
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse `<id>` or `<id>:<weight>`.
fn parse_node_spec(spec: &str) -> Result<(NodeId, f64)> {
    match spec.rsplit_once(':') {
        Some((id, weight)) if !id.is_empty() => {
            let weight: f64 = weight
                .parse()
                .with_context(|| format!("invalid weight in --node {spec}"))?;
            Ok((NodeId::from(id), weight))
        }
        Some(_) => bail!("missing node id in --node {spec}"),
        None => Ok((NodeId::from(spec), 1.0)),
    }
}

fn sample_keys(samples: usize) -> Vec<String> {
    (0..samples).map(|i| format!("sample_key_{i}")).collect()
}

// -----------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------

fn cmd_owners<H: RingHasher>(
    cluster: &ClusterManager<H>,
    key: &str,
    replicas: Option<usize>,
) -> Result<()> {
    let n = replicas.unwrap_or(cluster.replication_factor());
    let owners = cluster.ring().replicas(key, n);
    if owners.is_empty() {
        bail!("no nodes deployed");
    }

    println!("key {key} (position {:#018x})", cluster.ring().key_position(key));
    for (i, owner) in owners.iter().enumerate() {
        let role = if i == 0 { "primary" } else { "replica" };
        println!("  {role:<8} {owner}");
    }
    Ok(())
}

fn cmd_distribution<H: RingHasher>(ring: &Ring<H>, samples: usize) -> Result<()> {
    if ring.is_empty() {
        bail!("no nodes deployed");
    }

    let counts = ring.distribution(sample_keys(samples));
    println!("{:<24} {:>8} {:>8} {:>10} {:>8}", "NODE", "WEIGHT", "VNODES", "KEYS", "SHARE");
    for id in ring.node_ids() {
        let keys = counts.get(&id).copied().unwrap_or(0);
        let (weight, vnodes) = ring
            .node_info(id.as_str())
            .map_or((0.0, 0), |info| (info.weight, info.vnode_count()));
        let share = 100.0 * keys as f64 / samples.max(1) as f64;
        println!("{id:<24} {weight:>8.2} {vnodes:>8} {keys:>10} {share:>7.2}%");
    }
    Ok(())
}

fn cmd_plan<H: RingHasher>(
    before: &Ring<H>,
    after: &Ring<H>,
    samples: usize,
    replication_factor: usize,
) -> Result<()> {
    let keys = sample_keys(samples);
    let primary_moves = keys
        .iter()
        .filter(|k| before.node_for(k) != after.node_for(k))
        .count();
    let migrations = Ring::diff(before, after, &keys, replication_factor);
    debug!(migrations = migrations.len(), "computed replica migrations");

    let pct = |n: usize| 100.0 * n as f64 / samples.max(1) as f64;
    println!(
        "nodes: {} -> {}, vnodes: {} -> {}",
        before.node_count(),
        after.node_count(),
        before.vnode_count(),
        after.vnode_count()
    );
    println!(
        "primary owner changes: {primary_moves}/{samples} ({:.2}%)",
        pct(primary_moves)
    );
    println!(
        "replica migrations (n={replication_factor}): {} ({:.2}% of keys)",
        migrations.len(),
        pct(migrations.len())
    );
    Ok(())
}

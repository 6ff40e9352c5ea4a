use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use common::config::Config;
use orders_gen::catalog::loader;
use orders_gen::catalog::CatalogStore;
use orders_gen::customers::CustomerPool;
use orders_gen::generator;
use orders_gen::generator::OrderGenerator;
use orders_gen::orders::OrderIdGenerator;
use orders_gen::orders::OrderStore;
use orders_gen::RetailSchema;
use orders_gen::RunReport;
use rand::rngs::StdRng;
use rand::SeedableRng;
use storage::cluster::ClusterSession;
use storage::memory::MemorySession;
use storage::Session;
use tokio::sync::watch;
use tracing::debug;
use tracing::info;

use crate::config;
use crate::error::Error;
use crate::error::Result;
use crate::init_metrics;

#[derive(Parser, Clone, Debug, Default)]
pub struct Run {
    /// Optional TOML config, layered over the built-in defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Contact point, `host[:port]`
    #[arg(long)]
    pub host: Option<String>,
    /// Pause between orders, e.g. `10ms` or `1s`
    #[arg(long)]
    pub delay: Option<String>,
    /// Product catalog JSON
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    #[arg(long)]
    pub orders: Option<usize>,
    #[arg(long)]
    pub customer_low: Option<u32>,
    #[arg(long)]
    pub customer_high: Option<u32>,
    #[arg(long)]
    pub replication_factor: Option<u32>,
    #[arg(long)]
    pub keyspace: Option<String>,
    /// Serve prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
    /// Use an in-process store instead of connecting to a cluster
    #[arg(long)]
    pub dry_run: bool,
}

impl Run {
    /// Layered config with command line flags applied on top.
    pub fn load_config(&self) -> Result<config::Config> {
        let mut cfg = config::load(self.config.as_deref())?;
        if let Some(v) = &self.host {
            cfg.cluster.host = v.clone();
        }
        if let Some(v) = &self.keyspace {
            cfg.cluster.keyspace = v.clone();
        }
        if let Some(v) = self.replication_factor {
            cfg.cluster.replication_factor = v;
        }
        if let Some(v) = &self.catalog {
            cfg.catalog.path = Some(v.clone());
        }
        if let Some(v) = &self.delay {
            cfg.generator.delay = v.clone();
        }
        if let Some(v) = self.orders {
            cfg.generator.orders = v;
        }
        if let Some(v) = self.customer_low {
            cfg.generator.customer_low = v;
        }
        if let Some(v) = self.customer_high {
            cfg.generator.customer_high = v;
        }
        if let Some(v) = self.metrics_addr {
            cfg.metrics.addr = Some(v);
        }

        Ok(cfg)
    }
}

pub async fn start(
    args: &Run,
    cfg: &Config,
    shutdown: watch::Receiver<bool>,
) -> Result<RunReport> {
    let catalog_path = cfg
        .catalog
        .path
        .clone()
        .ok_or_else(|| Error::BadRequest("catalog path is not set".to_string()))?;
    if !catalog_path.try_exists()? {
        return Err(Error::FileNotFound(format!(
            "catalog {catalog_path:?} doesn't exist"
        )));
    }

    if let Some(addr) = cfg.metrics.addr {
        info!("metrics initialization...");
        init_metrics(addr)?;
    }

    let session: Arc<dyn Session> = if args.dry_run {
        info!("dry run, using in-process store");
        Arc::new(MemorySession::new())
    } else {
        info!("connecting to {}...", cfg.cluster.host);
        Arc::new(ClusterSession::connect(&cfg.cluster.host).await?)
    };

    let res = generate(session.clone(), cfg, catalog_path, shutdown).await;
    session.close().await?;

    res
}

async fn generate(
    session: Arc<dyn Session>,
    cfg: &Config,
    catalog_path: PathBuf,
    shutdown: watch::Receiver<bool>,
) -> Result<RunReport> {
    info!("provisioning keyspace {}...", cfg.cluster.keyspace);
    RetailSchema::new(&cfg.cluster.keyspace, cfg.cluster.replication_factor)
        .provision(&*session)
        .await?;

    info!("loading catalog from {catalog_path:?}...");
    let records = loader::from_path(&catalog_path)?;
    let catalog = CatalogStore::new(session.clone(), &cfg.cluster.keyspace);
    catalog.load(&records).await?;
    let products = catalog.materialize().await?;
    debug!("{} products materialized", products.len());

    let mut rng = StdRng::from_entropy();
    let ids = OrderIdGenerator::new_random(&mut rng);
    info!(
        "generating {} orders, one every {}",
        cfg.generator.orders,
        humantime::format_duration(cfg.generator.delay)
    );
    let mut gen = OrderGenerator::new(generator::Config {
        rng,
        ids,
        orders: OrderStore::try_new(session, &cfg.cluster.keyspace).await?,
        customers: CustomerPool::try_new(
            cfg.generator.customer_low,
            cfg.generator.customer_high,
        )?,
        order_count: cfg.generator.orders,
        delay: cfg.generator.delay,
    });

    Ok(gen.run(&products, shutdown).await?)
}

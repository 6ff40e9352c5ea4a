use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use crate::error::CommonError;
use crate::error::Result;
use crate::DEFAULT_CUSTOMER_HIGH;
use crate::DEFAULT_CUSTOMER_LOW;
use crate::DEFAULT_DELAY_MS;
use crate::DEFAULT_HOST;
use crate::DEFAULT_KEYSPACE;
use crate::DEFAULT_ORDERS;
use crate::DEFAULT_REPLICATION_FACTOR;

#[derive(Debug, Clone)]
pub struct Cluster {
    pub host: String,
    pub keyspace: String,
    pub replication_factor: u32,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Generator {
    pub orders: usize,
    pub delay: Duration,
    pub customer_low: u32,
    pub customer_high: u32,
}

#[derive(Debug, Clone)]
pub struct Metrics {
    pub addr: Option<SocketAddr>,
}

#[derive(Debug, Clone)]
pub struct Log {
    pub level: LevelFilter,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cluster: Cluster,
    pub catalog: Catalog,
    pub generator: Generator,
    pub metrics: Metrics,
    pub log: Log,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.cluster.host.is_empty() {
            return Err(CommonError::InvalidConfig("cluster host is empty".to_string()));
        }
        if self.cluster.keyspace.is_empty()
            || !self
                .cluster
                .keyspace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CommonError::InvalidConfig(format!(
                "keyspace name {:?} must be non-empty and contain only [a-zA-Z0-9_]",
                self.cluster.keyspace
            )));
        }
        if self.cluster.replication_factor == 0 {
            return Err(CommonError::InvalidConfig(
                "replication factor must be positive".to_string(),
            ));
        }
        if self.generator.customer_low > self.generator.customer_high {
            return Err(CommonError::InvalidConfig(format!(
                "customer pool [{}, {}] is empty",
                self.generator.customer_low, self.generator.customer_high
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cluster: Cluster {
                host: DEFAULT_HOST.to_string(),
                keyspace: DEFAULT_KEYSPACE.to_string(),
                replication_factor: DEFAULT_REPLICATION_FACTOR,
            },
            catalog: Catalog { path: None },
            generator: Generator {
                orders: DEFAULT_ORDERS,
                delay: Duration::from_millis(DEFAULT_DELAY_MS),
                customer_low: DEFAULT_CUSTOMER_LOW,
                customer_high: DEFAULT_CUSTOMER_HIGH,
            },
            metrics: Metrics { addr: None },
            log: Log {
                level: LevelFilter::INFO,
            },
        }
    }
}

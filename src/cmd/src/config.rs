use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use clap::ValueEnum;
use common::DEFAULT_CUSTOMER_HIGH;
use common::DEFAULT_CUSTOMER_LOW;
use common::DEFAULT_DELAY_MS;
use common::DEFAULT_HOST;
use common::DEFAULT_KEYSPACE;
use common::DEFAULT_ORDERS;
use common::DEFAULT_REPLICATION_FACTOR;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing::Level;

use crate::error::Result;

pub const ENV_PREFIX: &str = "RETAIL";

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Cluster {
    pub host: String,
    pub keyspace: String,
    pub replication_factor: u32,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Generator {
    pub orders: usize,
    pub delay: String,
    pub customer_low: u32,
    pub customer_high: u32,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Metrics {
    #[serde(default)]
    pub addr: Option<SocketAddr>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Log {
    pub level: LogLevel,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub cluster: Cluster,
    #[serde(default)]
    pub catalog: Catalog,
    pub generator: Generator,
    #[serde(default)]
    pub metrics: Metrics,
    pub log: Log,
}

/// Built-in defaults, then the optional file, then `RETAIL_*` environment
/// variables (`RETAIL_CLUSTER__HOST` sets `cluster.host`).
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut builder = config::Config::builder()
        .set_default("cluster.host", DEFAULT_HOST)?
        .set_default("cluster.keyspace", DEFAULT_KEYSPACE)?
        .set_default("cluster.replication_factor", DEFAULT_REPLICATION_FACTOR as i64)?
        .set_default("generator.orders", DEFAULT_ORDERS as i64)?
        .set_default("generator.delay", format!("{DEFAULT_DELAY_MS}ms"))?
        .set_default("generator.customer_low", DEFAULT_CUSTOMER_LOW as i64)?
        .set_default("generator.customer_high", DEFAULT_CUSTOMER_HIGH as i64)?
        .set_default("log.level", "info")?;
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path.to_path_buf()));
    }
    let config = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

fn parse_duration(s: &str) -> Result<std::time::Duration> {
    Ok(parse_duration::parse(s)?)
}

impl TryInto<common::config::Config> for Config {
    type Error = crate::error::Error;

    fn try_into(self) -> std::result::Result<common::config::Config, Self::Error> {
        let cfg = common::config::Config {
            cluster: common::config::Cluster {
                host: self.cluster.host,
                keyspace: self.cluster.keyspace,
                replication_factor: self.cluster.replication_factor,
            },
            catalog: common::config::Catalog {
                path: self.catalog.path,
            },
            generator: common::config::Generator {
                orders: self.generator.orders,
                delay: parse_duration(self.generator.delay.as_str())?,
                customer_low: self.generator.customer_low,
                customer_high: self.generator.customer_high,
            },
            metrics: common::config::Metrics {
                addr: self.metrics.addr,
            },
            log: common::config::Log {
                level: self.log.level.into(),
            },
        };
        cfg.validate()?;

        Ok(cfg)
    }
}

#[derive(Deserialize, Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use std::env::temp_dir;
    use std::fs;
    use std::time::Duration;

    use tracing::level_filters::LevelFilter;
    use uuid::Uuid;

    use crate::config::load;
    use crate::config::LogLevel;

    #[test]
    fn test_defaults() {
        let raw = load(None).unwrap();
        assert_eq!(raw.cluster.keyspace, "retail_ks");
        assert_eq!(raw.log.level, LogLevel::Info);
        assert!(raw.catalog.path.is_none());

        let cfg: common::config::Config = raw.try_into().unwrap();
        assert_eq!(cfg.generator.delay, Duration::from_millis(10));
        assert_eq!(cfg.generator.orders, 100001);
        assert_eq!(cfg.generator.customer_low, 700);
        assert_eq!(cfg.generator.customer_high, 800);
        assert_eq!(cfg.log.level, LevelFilter::INFO);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = temp_dir().join(format!("{}.toml", Uuid::new_v4()));
        fs::write(
            &path,
            r#"
[cluster]
host = "10.0.0.5"
replication_factor = 3

[generator]
delay = "250ms"
orders = 10

[catalog]
path = "/data/products.json"

[metrics]
addr = "127.0.0.1:9102"

[log]
level = "debug"
"#,
        )
        .unwrap();

        let raw = load(Some(&path)).unwrap();
        fs::remove_file(&path).unwrap();

        let cfg: common::config::Config = raw.try_into().unwrap();
        assert_eq!(cfg.cluster.host, "10.0.0.5");
        assert_eq!(cfg.cluster.keyspace, "retail_ks");
        assert_eq!(cfg.cluster.replication_factor, 3);
        assert_eq!(cfg.generator.delay, Duration::from_millis(250));
        assert_eq!(cfg.generator.orders, 10);
        assert_eq!(cfg.generator.customer_high, 800);
        assert_eq!(
            cfg.catalog.path.unwrap().to_str(),
            Some("/data/products.json")
        );
        assert_eq!(cfg.metrics.addr.unwrap().port(), 9102);
        assert_eq!(cfg.log.level, LevelFilter::DEBUG);
    }

    #[test]
    fn test_invalid_values() {
        let mut raw = load(None).unwrap();
        raw.generator.delay = "soon".to_string();
        let res: crate::error::Result<common::config::Config> = raw.try_into();
        assert!(res.is_err());

        let mut raw = load(None).unwrap();
        raw.generator.customer_low = 900;
        let res: crate::error::Result<common::config::Config> = raw.try_into();
        assert!(res.is_err());
    }
}

use std::io;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use common::config::Config;
use orders_gen::RetailSchema;

use crate::config;
use crate::error::Result;

#[derive(Parser, Clone, Debug, Default)]
pub struct Schema {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub keyspace: Option<String>,
    #[arg(long)]
    pub replication_factor: Option<u32>,
}

impl Schema {
    pub fn load_config(&self) -> Result<config::Config> {
        let mut cfg = config::load(self.config.as_deref())?;
        if let Some(v) = &self.keyspace {
            cfg.cluster.keyspace = v.clone();
        }
        if let Some(v) = self.replication_factor {
            cfg.cluster.replication_factor = v;
        }

        Ok(cfg)
    }
}

/// Writes the provisioning statements, one per line, without executing them.
pub fn print<W: Write>(cfg: &Config, out: &mut W) -> Result<()> {
    let schema = RetailSchema::new(&cfg.cluster.keyspace, cfg.cluster.replication_factor);
    for cql in schema.to_cql() {
        writeln!(out, "{cql};")?;
    }

    Ok(())
}

pub fn start(cfg: &Config) -> Result<()> {
    print(cfg, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use crate::command::schema::print;
    use crate::command::schema::Schema;

    #[test]
    fn test_print() {
        let args = Schema {
            keyspace: Some("shop".to_string()),
            replication_factor: Some(2),
            ..Default::default()
        };
        let cfg: common::config::Config = args.load_config().unwrap().try_into().unwrap();

        let mut out = vec![];
        print(&cfg, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "DROP KEYSPACE IF EXISTS shop;");
        assert!(lines[1].contains("'replication_factor': '2'"));
        assert!(lines.iter().all(|l| l.ends_with(';')));
    }
}

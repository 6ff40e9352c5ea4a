use std::result;

use common::error::CommonError;
use metrics_exporter_prometheus::BuildError;
use orders_gen::error::OrdersGenError;
use storage::error::StoreError;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("internal {0:?}")]
    Internal(String),
    #[error("bad request {0:?}")]
    BadRequest(String),
    #[error("file not found {0:?}")]
    FileNotFound(String),
    #[error("{0} orders failed")]
    OrdersFailed(usize),
    #[error("config: {0:?}")]
    Config(#[from] config::ConfigError),
    #[error("common: {0:?}")]
    Common(#[from] CommonError),
    #[error("store: {0:?}")]
    Store(#[from] StoreError),
    #[error("orders gen: {0:?}")]
    OrdersGen(#[from] OrdersGenError),
    #[error("ParseDuration: {0:?}")]
    ParseDuration(#[from] parse_duration::parse::Error),
    #[error("StdIO: {0:?}")]
    StdIO(#[from] std::io::Error),
    #[error("SetGlobalDefaultError: {0:?}")]
    SetGlobalDefaultError(#[from] SetGlobalDefaultError),
    #[error("metrics: {0:?}")]
    Metrics(#[from] BuildError),
    #[error("other: {0:?}")]
    Other(#[from] anyhow::Error),
}

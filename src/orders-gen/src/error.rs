use std::result;

use storage::error::StoreError;
use thiserror::Error;

pub type Result<T> = result::Result<T, OrdersGenError>;

#[derive(Error, Debug)]
pub enum OrdersGenError {
    #[error("internal {0:?}")]
    Internal(String),
    #[error("store: {0:?}")]
    Store(#[from] StoreError),
    #[error("invalid product record #{0}: {1}")]
    InvalidRecord(usize, String),
    #[error("duplicate sku {sku} in product record #{index}")]
    DuplicateSku { index: usize, sku: String },
    #[error("invalid customer id {0:?}")]
    InvalidCustomerId(String),
    #[error("customer number {0} is outside of [0, {1}]")]
    CustomerIdOutOfRange(u32, u32),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unexpected row: {0}")]
    UnexpectedRow(String),
    #[error("file not found: {0:?}")]
    FileNotFound(String),
    #[error("json: {0:?}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("other: {0:?}")]
    Other(#[from] anyhow::Error),
}

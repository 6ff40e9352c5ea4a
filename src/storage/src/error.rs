use std::result;

use scylla::transport::errors::NewSessionError;
use scylla::transport::errors::QueryError;
use thiserror::Error;

pub type Result<T> = result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("internal {0:?}")]
    Internal(String),
    #[error("not found {0:?}")]
    NotFound(String),
    #[error("invalid parameter {0:?}")]
    InvalidParameter(String),
    #[error("not yet supported {0:?}")]
    NotYetSupported(String),
    #[error("write rejected {0:?}")]
    WriteRejected(String),
    #[error("connection {0:?}")]
    Connection(#[from] NewSessionError),
    #[error("query {0:?}")]
    Query(#[from] QueryError),
}

impl StoreError {
    pub fn nyi<T>(msg: impl Into<String>) -> Result<T> {
        Err(StoreError::NotYetSupported(msg.into()))
    }
}

use async_trait::async_trait;

use crate::error::Result;
use crate::error::StoreError;
use crate::statement::Insert;
use crate::statement::Select;
use crate::statement::Statement;
use crate::Value;

/// Handle to a prepared insert. Only valid for the session that created it.
#[derive(Clone, Debug)]
pub struct Prepared {
    pub(crate) id: u64,
    pub(crate) insert: Insert,
}

impl Prepared {
    pub(crate) fn check_arity(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.insert.columns.len() {
            return Err(StoreError::InvalidParameter(format!(
                "{} expects {} bound values, got {}",
                self.insert.table,
                self.insert.columns.len(),
                values.len()
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A connected session. Calls are issued by one caller at a time; every
/// statement either completes or returns an error, there is no retry.
#[async_trait]
pub trait Session: Send + Sync {
    /// Executes a schema statement.
    async fn execute(&self, stmt: &Statement) -> Result<()>;

    async fn prepare(&self, insert: Insert) -> Result<Prepared>;

    async fn execute_prepared(&self, prepared: &Prepared, values: Vec<Value>) -> Result<()>;

    async fn query(&self, select: &Select, values: Vec<Value>) -> Result<Rows>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

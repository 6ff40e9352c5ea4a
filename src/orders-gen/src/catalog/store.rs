use std::sync::Arc;

use metrics::counter;
use storage::statement::Insert;
use storage::statement::Select;
use storage::Session;
use storage::Value;
use tracing::debug;
use tracing::info;

use crate::catalog::loader::RawProduct;
use crate::catalog::products::convert_all;
use crate::catalog::products::CatalogEntry;
use crate::catalog::products::Product;
use crate::error::OrdersGenError;
use crate::error::Result;
use crate::schema::TABLE_PRODUCT_CATALOG;

/// Product rows expire 48 hours after they were written.
pub const PRODUCT_TTL_SECS: u32 = 172800;

pub struct CatalogStore {
    session: Arc<dyn Session>,
    keyspace: String,
}

impl CatalogStore {
    pub fn new(session: Arc<dyn Session>, keyspace: impl Into<String>) -> Self {
        Self {
            session,
            keyspace: keyspace.into(),
        }
    }

    /// Converts every record, then writes them in input order. Nothing is
    /// written if any record is rejected. Returns the number of rows written.
    pub async fn load(&self, records: &[RawProduct]) -> Result<usize> {
        let products = convert_all(records)?;
        debug!("{} products converted", products.len());

        let insert = Insert::new(&self.keyspace, TABLE_PRODUCT_CATALOG, Product::COLUMNS)
            .with_ttl(PRODUCT_TTL_SECS);
        let prepared = self.session.prepare(insert).await?;

        let mut written = 0;
        for product in products.iter() {
            self.session
                .execute_prepared(&prepared, product.values())
                .await?;
            written += 1;
            counter!("catalog.products_loaded_total").increment(1);
        }
        info!("loaded {written} products");

        Ok(written)
    }

    /// Products currently visible in the store, in store order.
    pub async fn materialize(&self) -> Result<Vec<CatalogEntry>> {
        let select = Select::new(&self.keyspace, TABLE_PRODUCT_CATALOG, [
            "sku",
            "name",
            "regular_price",
        ]);
        let rows = self.session.query(&select, vec![]).await?;

        rows.rows
            .iter()
            .map(|row| match row.values.as_slice() {
                [Value::Text(sku), Value::Text(name), Value::Double(price)] => Ok(CatalogEntry {
                    sku: sku.clone(),
                    name: name.clone(),
                    regular_price: *price,
                }),
                other => Err(OrdersGenError::UnexpectedRow(format!(
                    "{TABLE_PRODUCT_CATALOG}: {other:?}"
                ))),
            })
            .collect()
    }
}

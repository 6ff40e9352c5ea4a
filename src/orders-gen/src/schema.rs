//! Retail keyspace layout.

use storage::schema::ClusteringOrder;
use storage::schema::CqlType;
use storage::schema::KeyspaceDef;
use storage::schema::TableDef;
use storage::schema::TypeDef;
use storage::statement::Statement;
use storage::Session;
use tracing::info;

use crate::error::Result;

pub const TABLE_PRODUCT_CATALOG: &str = "product_catalog";
pub const TABLE_ORDERS: &str = "orders";
pub const TABLE_TOP50_SELLING_PRODUCTS: &str = "top50_selling_products";
pub const TABLE_TOP_SELLING_PRODUCTS_BY_CUSTOMER: &str = "top_selling_products_by_customer";
pub const TYPE_ORDER_LINE: &str = "order_line";

#[derive(Debug, Clone)]
pub struct RetailSchema {
    keyspace: KeyspaceDef,
}

impl RetailSchema {
    pub fn new(keyspace: impl Into<String>, replication_factor: u32) -> Self {
        Self {
            keyspace: KeyspaceDef::new(keyspace, replication_factor),
        }
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace.name
    }

    pub fn product_catalog(&self) -> TableDef {
        let mut tbl = TableDef::new(self.keyspace(), TABLE_PRODUCT_CATALOG);
        for col in [
            "sku",
            "color",
            "description",
            "image",
            "manufacturer",
            "model_number",
            "name",
            "short_description",
            "thumbnail_image",
            "upc",
        ] {
            tbl = tbl.column(col, CqlType::Ascii);
        }

        tbl.column("in_store_availability", CqlType::Boolean)
            .column("regular_price", CqlType::Double)
            .partition_key(["sku"])
    }

    pub fn order_line(&self) -> TypeDef {
        TypeDef::new(self.keyspace(), TYPE_ORDER_LINE)
            .field("sku", CqlType::Ascii)
            .field("product_name", CqlType::Ascii)
            .field("quantity", CqlType::Int)
            .field("unit_price", CqlType::Double)
            .field("total_price", CqlType::Double)
    }

    pub fn orders(&self) -> TableDef {
        TableDef::new(self.keyspace(), TABLE_ORDERS)
            .column("customer_id", CqlType::Uuid)
            .column("order_id", CqlType::Timeuuid)
            .column("date", CqlType::Timestamp)
            .column(
                "order_lines",
                CqlType::list(CqlType::frozen(CqlType::Udt(TYPE_ORDER_LINE.to_string()))),
            )
            .partition_key(["customer_id"])
            .clustering("order_id", ClusteringOrder::Desc)
    }

    pub fn top50_selling_products(&self) -> TableDef {
        TableDef::new(self.keyspace(), TABLE_TOP50_SELLING_PRODUCTS)
            .column("sku", CqlType::Ascii)
            .column("sale_count", CqlType::Int)
            .partition_key(["sku", "sale_count"])
    }

    pub fn top_selling_products_by_customer(&self) -> TableDef {
        TableDef::new(self.keyspace(), TABLE_TOP_SELLING_PRODUCTS_BY_CUSTOMER)
            .column("customer_id", CqlType::Uuid)
            .column("sku", CqlType::Ascii)
            .column("sale_count", CqlType::Int)
            .partition_key(["customer_id"])
            .clustering("sale_count", ClusteringOrder::Desc)
    }

    /// Statements in execution order. The keyspace is dropped first.
    pub fn statements(&self) -> Vec<Statement> {
        vec![
            Statement::DropKeyspace(self.keyspace.name.clone()),
            Statement::CreateKeyspace(self.keyspace.clone()),
            Statement::CreateTable(self.product_catalog()),
            Statement::CreateType(self.order_line()),
            Statement::CreateTable(self.orders()),
            Statement::CreateTable(self.top50_selling_products()),
            Statement::CreateTable(self.top_selling_products_by_customer()),
        ]
    }

    pub fn to_cql(&self) -> Vec<String> {
        self.statements().iter().map(|s| s.to_cql()).collect()
    }

    /// Recreates the keyspace from scratch. Stops at the first failed
    /// statement; whatever was created before it stays.
    pub async fn provision(&self, session: &dyn Session) -> Result<()> {
        for stmt in self.statements() {
            session.execute(&stmt).await?;
            match &stmt {
                Statement::DropKeyspace(_) => info!("dropped {}", stmt.target()),
                _ => info!("created {}", stmt.target()),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::RetailSchema;

    #[test]
    fn test_cql() {
        let cql = RetailSchema::new("retail_ks", 1).to_cql();

        assert_eq!(cql, vec![
            "DROP KEYSPACE IF EXISTS retail_ks",
            "CREATE KEYSPACE IF NOT EXISTS retail_ks WITH replication = {'class': 'SimpleStrategy', 'replication_factor': '1'}",
            "CREATE TABLE IF NOT EXISTS retail_ks.product_catalog (sku ascii, color ascii, description ascii, image ascii, manufacturer ascii, model_number ascii, name ascii, short_description ascii, thumbnail_image ascii, upc ascii, in_store_availability boolean, regular_price double, PRIMARY KEY (sku))",
            "CREATE TYPE IF NOT EXISTS retail_ks.order_line (sku ascii, product_name ascii, quantity int, unit_price double, total_price double)",
            "CREATE TABLE IF NOT EXISTS retail_ks.orders (customer_id uuid, order_id timeuuid, date timestamp, order_lines list<frozen<order_line>>, PRIMARY KEY (customer_id, order_id)) WITH CLUSTERING ORDER BY (order_id DESC)",
            "CREATE TABLE IF NOT EXISTS retail_ks.top50_selling_products (sku ascii, sale_count int, PRIMARY KEY ((sku, sale_count)))",
            "CREATE TABLE IF NOT EXISTS retail_ks.top_selling_products_by_customer (customer_id uuid, sku ascii, sale_count int, PRIMARY KEY (customer_id, sale_count)) WITH CLUSTERING ORDER BY (sale_count DESC)",
        ]);
    }

    #[test]
    fn test_definitions_are_valid() {
        let schema = RetailSchema::new("ks", 3);
        for tbl in [
            schema.product_catalog(),
            schema.orders(),
            schema.top50_selling_products(),
            schema.top_selling_products_by_customer(),
        ] {
            tbl.validate().unwrap();
        }
    }
}

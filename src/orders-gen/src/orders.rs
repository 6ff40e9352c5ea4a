use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use rand::Rng;
use storage::statement::Insert;
use storage::statement::Select;
use storage::Prepared;
use storage::Row;
use storage::Session;
use storage::UdtValue;
use storage::Value;
use uuid::Uuid;

use crate::error::OrdersGenError;
use crate::error::Result;
use crate::schema::TABLE_ORDERS;
use crate::schema::TYPE_ORDER_LINE;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub sku: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
}

impl OrderLine {
    pub fn new(
        sku: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i32,
        unit_price: f64,
    ) -> Self {
        Self {
            sku: sku.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            total_price: quantity as f64 * unit_price,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Udt(
            UdtValue::new(TYPE_ORDER_LINE)
                .field("sku", Value::from(self.sku.as_str()))
                .field("product_name", Value::from(self.product_name.as_str()))
                .field("quantity", Value::Int(self.quantity))
                .field("unit_price", Value::Double(self.unit_price))
                .field("total_price", Value::Double(self.total_price)),
        )
    }

    pub fn try_from_value(value: &Value) -> Result<Self> {
        let udt = value
            .as_udt()
            .ok_or_else(|| OrdersGenError::UnexpectedRow(format!("order line {value:?}")))?;
        let text = |name: &str| {
            udt.get(name)
                .and_then(Value::as_text)
                .map(str::to_string)
                .ok_or_else(|| OrdersGenError::UnexpectedRow(format!("order line {name}")))
        };
        let double = |name: &str| {
            udt.get(name)
                .and_then(Value::as_double)
                .ok_or_else(|| OrdersGenError::UnexpectedRow(format!("order line {name}")))
        };

        Ok(Self {
            sku: text("sku")?,
            product_name: text("product_name")?,
            quantity: udt
                .get("quantity")
                .and_then(Value::as_int)
                .ok_or_else(|| {
                    OrdersGenError::UnexpectedRow("order line quantity".to_string())
                })?,
            unit_price: double("unit_price")?,
            total_price: double("total_price")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub customer_id: Uuid,
    pub order_id: Uuid,
    pub date: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    pub const COLUMNS: [&'static str; 4] = ["customer_id", "order_id", "date", "order_lines"];

    pub fn values(&self) -> Vec<Value> {
        vec![
            Value::Uuid(self.customer_id),
            Value::Timeuuid(self.order_id),
            Value::Timestamp(self.date),
            Value::List(self.lines.iter().map(OrderLine::to_value).collect()),
        ]
    }

    fn try_from_row(row: &Row) -> Result<Self> {
        match row.values.as_slice() {
            [Value::Uuid(customer_id), Value::Timeuuid(order_id), Value::Timestamp(date), lines] => {
                let lines = match lines {
                    Value::Null => vec![],
                    Value::List(items) => items
                        .iter()
                        .map(OrderLine::try_from_value)
                        .collect::<Result<Vec<_>>>()?,
                    other => {
                        return Err(OrdersGenError::UnexpectedRow(format!(
                            "order lines {other:?}"
                        )));
                    }
                };

                Ok(Self {
                    customer_id: *customer_id,
                    order_id: *order_id,
                    date: *date,
                    lines,
                })
            }
            other => Err(OrdersGenError::UnexpectedRow(format!(
                "{TABLE_ORDERS}: {other:?}"
            ))),
        }
    }
}

/// Version 1 uuids for order ids. The node id is fixed per generator, the
/// clock sequence comes from the uuid crate's shared context.
#[derive(Debug, Clone)]
pub struct OrderIdGenerator {
    node: [u8; 6],
}

impl OrderIdGenerator {
    pub fn new(node: [u8; 6]) -> Self {
        Self { node }
    }

    pub fn new_random<R: Rng>(rng: &mut R) -> Self {
        let mut node: [u8; 6] = rng.gen();
        // multicast bit marks a random node id
        node[0] |= 0x01;

        Self { node }
    }

    pub fn node(&self) -> [u8; 6] {
        self.node
    }

    pub fn next_id(&self) -> Uuid {
        Uuid::now_v1(&self.node)
    }
}

pub struct OrderStore {
    session: Arc<dyn Session>,
    keyspace: String,
    insert: Prepared,
}

impl OrderStore {
    pub async fn try_new(session: Arc<dyn Session>, keyspace: impl Into<String>) -> Result<Self> {
        let keyspace = keyspace.into();
        let insert = session
            .prepare(Insert::new(&keyspace, TABLE_ORDERS, Order::COLUMNS))
            .await?;

        Ok(Self {
            session,
            keyspace,
            insert,
        })
    }

    pub async fn insert(&self, order: &Order) -> Result<()> {
        self.session
            .execute_prepared(&self.insert, order.values())
            .await?;

        Ok(())
    }

    /// Orders of one customer, newest first.
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        let mut select =
            Select::new(&self.keyspace, TABLE_ORDERS, Order::COLUMNS).filter_eq("customer_id");
        if let Some(limit) = limit {
            select = select.limit(limit);
        }
        let rows = self
            .session
            .query(&select, vec![Value::Uuid(customer_id)])
            .await?;

        rows.rows.iter().map(Order::try_from_row).collect()
    }

    pub async fn list_all(&self) -> Result<Vec<Order>> {
        let select = Select::new(&self.keyspace, TABLE_ORDERS, Order::COLUMNS);
        let rows = self.session.query(&select, vec![]).await?;

        rows.rows.iter().map(Order::try_from_row).collect()
    }
}

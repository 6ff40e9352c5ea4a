//! Session backed by a Cassandra/Scylla cluster over the CQL native protocol.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::TimeZone;
use chrono::Utc;
use parking_lot::Mutex;
use scylla::frame::response::result::CqlValue;
use scylla::frame::value::CqlTimestamp;
use scylla::frame::value::CqlTimeuuid;
use scylla::prepared_statement::PreparedStatement;
use scylla::SessionBuilder;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::error::StoreError;
use crate::session::Prepared;
use crate::session::Row;
use crate::session::Rows;
use crate::session::Session;
use crate::statement::Insert;
use crate::statement::Select;
use crate::statement::Statement;
use crate::UdtValue;
use crate::Value;

pub const DEFAULT_PORT: u16 = 9042;

fn with_default_port(host: &str) -> String {
    if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:{DEFAULT_PORT}")
    }
}

fn to_cql_value(keyspace: &str, value: Value) -> Result<CqlValue> {
    Ok(match value {
        Value::Null => {
            return Err(StoreError::InvalidParameter(
                "null values are not bound".to_string(),
            ));
        }
        Value::Text(v) => CqlValue::Text(v),
        Value::Boolean(v) => CqlValue::Boolean(v),
        Value::Int(v) => CqlValue::Int(v),
        Value::Double(v) => CqlValue::Double(v),
        Value::Uuid(v) => CqlValue::Uuid(v),
        Value::Timeuuid(v) => CqlValue::Timeuuid(CqlTimeuuid::from(v)),
        Value::Timestamp(v) => CqlValue::Timestamp(CqlTimestamp(v.timestamp_millis())),
        Value::List(items) => CqlValue::List(
            items
                .into_iter()
                .map(|v| to_cql_value(keyspace, v))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Udt(udt) => CqlValue::UserDefinedType {
            keyspace: keyspace.to_string(),
            type_name: udt.type_name,
            fields: udt
                .fields
                .into_iter()
                .map(|(name, v)| Ok((name, Some(to_cql_value(keyspace, v)?))))
                .collect::<Result<Vec<_>>>()?,
        },
    })
}

fn from_cql_value(value: Option<CqlValue>) -> Result<Value> {
    let value = match value {
        None => return Ok(Value::Null),
        Some(v) => v,
    };

    Ok(match value {
        CqlValue::Ascii(v) | CqlValue::Text(v) => Value::Text(v),
        CqlValue::Boolean(v) => Value::Boolean(v),
        CqlValue::Int(v) => Value::Int(v),
        CqlValue::Double(v) => Value::Double(v),
        CqlValue::Uuid(v) => Value::Uuid(v),
        CqlValue::Timeuuid(v) => Value::Timeuuid(Uuid::from(v)),
        CqlValue::Timestamp(v) => Value::Timestamp(
            Utc.timestamp_millis_opt(v.0).single().ok_or_else(|| {
                StoreError::Internal(format!("timestamp {} is out of range", v.0))
            })?,
        ),
        CqlValue::List(items) => Value::List(
            items
                .into_iter()
                .map(|v| from_cql_value(Some(v)))
                .collect::<Result<Vec<_>>>()?,
        ),
        CqlValue::UserDefinedType {
            type_name, fields, ..
        } => Value::Udt(UdtValue {
            type_name,
            fields: fields
                .into_iter()
                .map(|(name, v)| Ok((name, from_cql_value(v)?)))
                .collect::<Result<Vec<_>>>()?,
        }),
        other => {
            return StoreError::nyi(format!("reading {other:?}"));
        }
    })
}

pub struct ClusterSession {
    session: scylla::Session,
    prepared: Mutex<HashMap<u64, PreparedStatement>>,
    next_prepared_id: AtomicU64,
}

impl ClusterSession {
    /// Connects to the cluster through a single contact point and logs the
    /// nodes it discovered.
    pub async fn connect(host: &str) -> Result<Self> {
        let node = with_default_port(host);
        debug!("connecting to {node}");
        let session = SessionBuilder::new().known_node(&node).build().await?;

        let cluster = session.get_cluster_data();
        info!("connected to cluster via {node}");
        for n in cluster.get_nodes_info() {
            info!(
                "datacenter: {}; host: {:?}; rack: {}",
                n.datacenter.as_deref().unwrap_or("-"),
                n.address,
                n.rack.as_deref().unwrap_or("-")
            );
        }

        Ok(Self {
            session,
            prepared: Mutex::new(HashMap::new()),
            next_prepared_id: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl Session for ClusterSession {
    async fn execute(&self, stmt: &Statement) -> Result<()> {
        let cql = stmt.to_cql();
        debug!(%cql, "executing");
        self.session.query_unpaged(cql, ()).await?;

        Ok(())
    }

    async fn prepare(&self, insert: Insert) -> Result<Prepared> {
        let statement = self.session.prepare(insert.to_cql()).await?;
        let id = self.next_prepared_id.fetch_add(1, Ordering::SeqCst);
        self.prepared.lock().insert(id, statement);

        Ok(Prepared { id, insert })
    }

    async fn execute_prepared(&self, prepared: &Prepared, values: Vec<Value>) -> Result<()> {
        prepared.check_arity(&values)?;
        let statement = self
            .prepared
            .lock()
            .get(&prepared.id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("prepared statement {}", prepared.id))
            })?;
        let keyspace = prepared.insert.keyspace.as_str();
        let values = values
            .into_iter()
            .map(|v| to_cql_value(keyspace, v))
            .collect::<Result<Vec<_>>>()?;

        self.session.execute_unpaged(&statement, values).await?;

        Ok(())
    }

    async fn query(&self, select: &Select, values: Vec<Value>) -> Result<Rows> {
        let values = values
            .into_iter()
            .map(|v| to_cql_value(&select.keyspace, v))
            .collect::<Result<Vec<_>>>()?;
        let res = self.session.query_unpaged(select.to_cql(), values).await?;

        let rows = res
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                Ok(Row {
                    values: row
                        .columns
                        .into_iter()
                        .map(from_cql_value)
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Rows {
            columns: select.columns.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use scylla::frame::response::result::CqlValue;
    use uuid::Uuid;

    use crate::cluster::from_cql_value;
    use crate::cluster::to_cql_value;
    use crate::cluster::with_default_port;
    use crate::UdtValue;
    use crate::Value;

    #[test]
    fn test_default_port() {
        assert_eq!(with_default_port("127.0.0.1"), "127.0.0.1:9042");
        assert_eq!(with_default_port("10.0.0.1:19042"), "10.0.0.1:19042");
    }

    #[test]
    fn test_udt_list_is_bound_with_keyspace() {
        let line = UdtValue::new("line")
            .field("sku", Value::from("1"))
            .field("quantity", Value::Int(3));
        let bound = to_cql_value("ks", Value::List(vec![Value::Udt(line)])).unwrap();

        match bound {
            CqlValue::List(items) => match &items[0] {
                CqlValue::UserDefinedType {
                    keyspace,
                    type_name,
                    fields,
                } => {
                    assert_eq!(keyspace, "ks");
                    assert_eq!(type_name, "line");
                    assert_eq!(fields.len(), 2);
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_read_back_values() {
        let id = Uuid::new_v4();
        assert_eq!(
            from_cql_value(Some(CqlValue::Ascii("a".to_string()))).unwrap(),
            Value::from("a")
        );
        assert_eq!(
            from_cql_value(Some(CqlValue::Uuid(id))).unwrap(),
            Value::Uuid(id)
        );
        assert_eq!(from_cql_value(None).unwrap(), Value::Null);
        assert!(to_cql_value("ks", Value::Null).is_err());
    }
}

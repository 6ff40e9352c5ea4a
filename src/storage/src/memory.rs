//! In-process session used by tests and dry runs.
//!
//! Rows are grouped by partition key and kept sorted by clustering key with the
//! table's clustering order applied. TTLs are honoured against a clock that
//! can be moved forward with [`MemorySession::advance_clock`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::error::StoreError;
use crate::key_values;
use crate::schema::ClusteringOrder;
use crate::schema::CqlType;
use crate::schema::KeyspaceDef;
use crate::schema::TableDef;
use crate::schema::TypeDef;
use crate::session::Prepared;
use crate::session::Row;
use crate::session::Rows;
use crate::session::Session;
use crate::statement::Insert;
use crate::statement::Select;
use crate::statement::Statement;
use crate::KeyValue;
use crate::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
struct ClusteringKey(Vec<(KeyValue, ClusteringOrder)>);

impl Ord for ClusteringKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((a, order), (b, _)) in self.0.iter().zip(other.0.iter()) {
            let ord = match order {
                ClusteringOrder::Asc => a.cmp(b),
                ClusteringOrder::Desc => b.cmp(a),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }

        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for ClusteringKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug)]
struct StoredRow {
    values: HashMap<String, Value>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredRow {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(at) => at > now,
        }
    }
}

type Partition = BTreeMap<ClusteringKey, StoredRow>;

struct TableState {
    def: TableDef,
    partitions: BTreeMap<Vec<KeyValue>, Partition>,
}

struct KeyspaceState {
    def: KeyspaceDef,
    types: BTreeMap<String, TypeDef>,
    tables: BTreeMap<String, TableState>,
}

#[derive(Default)]
struct State {
    keyspaces: HashMap<String, KeyspaceState>,
    prepared: HashMap<u64, Insert>,
    next_prepared_id: u64,
    clock_offset_ms: i64,
    write_faults: HashMap<String, usize>,
}

impl State {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + Duration::milliseconds(self.clock_offset_ms)
    }

    fn keyspace(&self, name: &str) -> Result<&KeyspaceState> {
        self.keyspaces
            .get(name)
            .ok_or_else(|| StoreError::NotFound(format!("keyspace {name}")))
    }

    fn keyspace_mut(&mut self, name: &str) -> Result<&mut KeyspaceState> {
        self.keyspaces
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(format!("keyspace {name}")))
    }
}

/// Schema of one keyspace as currently known to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyspaceSnapshot {
    pub keyspace: KeyspaceDef,
    pub types: Vec<TypeDef>,
    pub tables: Vec<TableDef>,
}

#[derive(Default)]
pub struct MemorySession {
    state: Mutex<State>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyspace(&self, name: &str) -> Option<KeyspaceSnapshot> {
        let state = self.state.lock();
        let ks = state.keyspaces.get(name)?;

        Some(KeyspaceSnapshot {
            keyspace: ks.def.clone(),
            types: ks.types.values().cloned().collect(),
            tables: ks.tables.values().map(|t| t.def.clone()).collect(),
        })
    }

    /// Moves the session clock forward, expiring rows whose TTL has passed.
    pub fn advance_clock(&self, by: Duration) {
        let mut state = self.state.lock();
        state.clock_offset_ms += by.num_milliseconds();
    }

    /// Makes the next `count` writes into `table` fail.
    pub fn fail_writes(&self, table: &str, count: usize) {
        self.state
            .lock()
            .write_faults
            .insert(table.to_string(), count);
    }

    /// Number of live rows in a table.
    pub fn row_count(&self, keyspace: &str, table: &str) -> usize {
        let state = self.state.lock();
        let now = state.now();
        state
            .keyspaces
            .get(keyspace)
            .and_then(|ks| ks.tables.get(table))
            .map(|t| {
                t.partitions
                    .values()
                    .flat_map(|p| p.values())
                    .filter(|r| r.is_live(now))
                    .count()
            })
            .unwrap_or(0)
    }
}

fn check_collections(typ: &CqlType) -> Result<()> {
    match typ {
        CqlType::List(inner) => {
            if let CqlType::Udt(name) = inner.as_ref() {
                return Err(StoreError::InvalidParameter(format!(
                    "non-frozen user type {name} is not allowed inside a collection"
                )));
            }
            check_collections(inner)
        }
        CqlType::Frozen(inner) => check_collections(inner),
        _ => Ok(()),
    }
}

fn check_udts_exist(types: &BTreeMap<String, TypeDef>, typ: &CqlType) -> Result<()> {
    for name in typ.udt_names() {
        if !types.contains_key(name) {
            return Err(StoreError::NotFound(format!("type {name}")));
        }
    }

    Ok(())
}

fn check_value(types: &BTreeMap<String, TypeDef>, typ: &CqlType, value: &Value) -> bool {
    match (typ, value) {
        (_, Value::Null) => true,
        (CqlType::Frozen(inner), v) => check_value(types, inner, v),
        (CqlType::List(inner), Value::List(items)) => {
            items.iter().all(|v| check_value(types, inner, v))
        }
        (CqlType::Udt(name), Value::Udt(udt)) => match types.get(name) {
            None => false,
            Some(def) => {
                udt.type_name == *name
                    && udt.fields.len() <= def.fields.len()
                    && udt
                        .fields
                        .iter()
                        .zip(def.fields.iter())
                        .all(|((n, v), f)| *n == f.name && check_value(types, &f.typ, v))
            }
        },
        (t, v) => t.accepts(v),
    }
}

fn column_def<'a>(tbl: &'a TableDef, column: &str) -> Result<&'a CqlType> {
    tbl.column_def(column)
        .map(|c| &c.typ)
        .ok_or_else(|| {
            StoreError::InvalidParameter(format!(
                "undefined column {column} in {}",
                tbl.qualified_name()
            ))
        })
}

#[async_trait]
impl Session for MemorySession {
    async fn execute(&self, stmt: &Statement) -> Result<()> {
        let mut state = self.state.lock();
        debug!(cql = %stmt.to_cql(), "executing");

        match stmt {
            Statement::DropKeyspace(name) => {
                state.keyspaces.remove(name);
            }
            Statement::CreateKeyspace(def) => {
                if def.replication_factor == 0 {
                    return Err(StoreError::InvalidParameter(
                        "replication factor must be positive".to_string(),
                    ));
                }
                state
                    .keyspaces
                    .entry(def.name.clone())
                    .or_insert_with(|| KeyspaceState {
                        def: def.clone(),
                        types: BTreeMap::new(),
                        tables: BTreeMap::new(),
                    });
            }
            Statement::CreateType(def) => {
                let ks = state.keyspace_mut(&def.keyspace)?;
                if ks.types.contains_key(&def.name) {
                    return Ok(());
                }
                for field in def.fields.iter() {
                    check_collections(&field.typ)?;
                    check_udts_exist(&ks.types, &field.typ)?;
                }
                ks.types.insert(def.name.clone(), def.clone());
            }
            Statement::CreateTable(def) => {
                def.validate()?;
                let ks = state.keyspace_mut(&def.keyspace)?;
                if ks.tables.contains_key(&def.name) {
                    return Ok(());
                }
                for col in def.columns.iter() {
                    check_collections(&col.typ)?;
                    check_udts_exist(&ks.types, &col.typ)?;
                }
                ks.tables.insert(def.name.clone(), TableState {
                    def: def.clone(),
                    partitions: BTreeMap::new(),
                });
            }
        }

        Ok(())
    }

    async fn prepare(&self, insert: Insert) -> Result<Prepared> {
        let mut state = self.state.lock();
        {
            let ks = state.keyspace(&insert.keyspace)?;
            let tbl = ks.tables.get(&insert.table).ok_or_else(|| {
                StoreError::NotFound(format!("table {}.{}", insert.keyspace, insert.table))
            })?;
            for col in insert.columns.iter() {
                column_def(&tbl.def, col)?;
            }
            let key_columns = tbl
                .def
                .partition_key
                .iter()
                .chain(tbl.def.clustering.iter().map(|(c, _)| c));
            for col in key_columns {
                if !insert.columns.contains(col) {
                    return Err(StoreError::InvalidParameter(format!(
                        "missing primary key column {col}"
                    )));
                }
            }
        }

        let id = state.next_prepared_id;
        state.next_prepared_id += 1;
        state.prepared.insert(id, insert.clone());

        Ok(Prepared { id, insert })
    }

    async fn execute_prepared(&self, prepared: &Prepared, values: Vec<Value>) -> Result<()> {
        prepared.check_arity(&values)?;
        let mut state = self.state.lock();
        if state.prepared.get(&prepared.id) != Some(&prepared.insert) {
            return Err(StoreError::NotFound(format!(
                "prepared statement {}",
                prepared.id
            )));
        }

        let insert = &prepared.insert;
        if let Some(left) = state.write_faults.get_mut(&insert.table) {
            if *left > 0 {
                *left -= 1;
                return Err(StoreError::WriteRejected(format!(
                    "{}.{}",
                    insert.keyspace, insert.table
                )));
            }
        }

        let now = state.now();
        let ks = state.keyspace_mut(&insert.keyspace)?;
        let tbl = ks.tables.get_mut(&insert.table).ok_or_else(|| {
            StoreError::NotFound(format!("table {}.{}", insert.keyspace, insert.table))
        })?;

        for (col, value) in insert.columns.iter().zip(values.iter()) {
            let typ = column_def(&tbl.def, col)?;
            if !check_value(&ks.types, typ, value) {
                return Err(StoreError::InvalidParameter(format!(
                    "value {value:?} doesn't match column {col} of type {typ}"
                )));
            }
        }

        let bound: HashMap<String, Value> = insert.columns.iter().cloned().zip(values).collect();
        let partition_values = tbl
            .def
            .partition_key
            .iter()
            .map(|c| &bound[c])
            .collect::<Vec<_>>();
        let partition = key_values(&partition_values)?;
        let clustering = tbl
            .def
            .clustering
            .iter()
            .map(|(c, order)| Ok((KeyValue::try_from(&bound[c])?, *order)))
            .collect::<Result<Vec<_>>>()?;

        let expires_at = insert.ttl.map(|ttl| now + Duration::seconds(ttl as i64));
        let row = tbl
            .partitions
            .entry(partition)
            .or_default()
            .entry(ClusteringKey(clustering))
            .or_insert_with(|| StoredRow {
                values: HashMap::new(),
                expires_at,
            });
        if !row.is_live(now) {
            row.values.clear();
        }
        row.values.extend(bound);
        row.expires_at = expires_at;

        Ok(())
    }

    async fn query(&self, select: &Select, values: Vec<Value>) -> Result<Rows> {
        let state = self.state.lock();
        let now = state.now();
        let ks = state.keyspace(&select.keyspace)?;
        let tbl = ks.tables.get(&select.table).ok_or_else(|| {
            StoreError::NotFound(format!("table {}.{}", select.keyspace, select.table))
        })?;

        for col in select.columns.iter() {
            column_def(&tbl.def, col)?;
        }
        if values.len() != select.restrictions.len() {
            return Err(StoreError::InvalidParameter(format!(
                "select expects {} bound values, got {}",
                select.restrictions.len(),
                values.len()
            )));
        }

        let partition = if select.restrictions.is_empty() {
            None
        } else {
            let mut restricted = select.restrictions.clone();
            restricted.sort();
            let mut expected = tbl.def.partition_key.clone();
            expected.sort();
            if restricted != expected {
                return StoreError::nyi("only full partition key restrictions are supported");
            }

            let by_column: HashMap<&String, &Value> =
                select.restrictions.iter().zip(values.iter()).collect();
            let ordered = tbl
                .def
                .partition_key
                .iter()
                .map(|c| by_column[c])
                .collect::<Vec<_>>();
            Some(key_values(&ordered)?)
        };

        let partitions: Vec<&Partition> = match &partition {
            None => tbl.partitions.values().collect(),
            Some(key) => tbl.partitions.get(key).into_iter().collect(),
        };

        let limit = select.limit.map(|v| v as usize).unwrap_or(usize::MAX);
        let rows = partitions
            .into_iter()
            .flat_map(|p| p.values())
            .filter(|r| r.is_live(now))
            .take(limit)
            .map(|r| Row {
                values: select
                    .columns
                    .iter()
                    .map(|c| r.values.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();

        Ok(Rows {
            columns: select.columns.clone(),
            rows,
        })
    }
}

//! Keyspace, table and user-defined type definitions.
//!
//! Definitions are plain data: the same value is rendered to CQL for a real
//! cluster and interpreted directly by the in-memory session.

use std::fmt;

use crate::error::Result;
use crate::error::StoreError;
use crate::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CqlType {
    Ascii,
    Text,
    Boolean,
    Int,
    Double,
    Uuid,
    Timeuuid,
    Timestamp,
    List(Box<CqlType>),
    Frozen(Box<CqlType>),
    Udt(String),
}

impl CqlType {
    pub fn list(inner: CqlType) -> Self {
        CqlType::List(Box::new(inner))
    }

    pub fn frozen(inner: CqlType) -> Self {
        CqlType::Frozen(Box::new(inner))
    }

    /// Names of the user-defined types this type refers to.
    pub fn udt_names(&self) -> Vec<&str> {
        match self {
            CqlType::Udt(name) => vec![name.as_str()],
            CqlType::List(inner) | CqlType::Frozen(inner) => inner.udt_names(),
            _ => vec![],
        }
    }

    /// Checks that a bound value is representable by this column type.
    /// User-defined type fields are checked by the caller, which owns the type registry.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (CqlType::Ascii, Value::Text(v)) => v.is_ascii(),
            (CqlType::Text, Value::Text(_)) => true,
            (CqlType::Boolean, Value::Boolean(_)) => true,
            (CqlType::Int, Value::Int(_)) => true,
            (CqlType::Double, Value::Double(_)) => true,
            (CqlType::Uuid, Value::Uuid(_)) => true,
            (CqlType::Uuid, Value::Timeuuid(_)) => true,
            (CqlType::Timeuuid, Value::Timeuuid(v)) => v.get_version_num() == 1,
            (CqlType::Timestamp, Value::Timestamp(_)) => true,
            (CqlType::List(inner), Value::List(items)) => items.iter().all(|v| inner.accepts(v)),
            (CqlType::Frozen(inner), v) => inner.accepts(v),
            (CqlType::Udt(name), Value::Udt(udt)) => &udt.type_name == name,
            _ => false,
        }
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlType::Ascii => write!(f, "ascii"),
            CqlType::Text => write!(f, "text"),
            CqlType::Boolean => write!(f, "boolean"),
            CqlType::Int => write!(f, "int"),
            CqlType::Double => write!(f, "double"),
            CqlType::Uuid => write!(f, "uuid"),
            CqlType::Timeuuid => write!(f, "timeuuid"),
            CqlType::Timestamp => write!(f, "timestamp"),
            CqlType::List(inner) => write!(f, "list<{inner}>"),
            CqlType::Frozen(inner) => write!(f, "frozen<{inner}>"),
            CqlType::Udt(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub typ: CqlType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, typ: CqlType) -> Self {
        Self {
            name: name.into(),
            typ,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusteringOrder {
    Asc,
    Desc,
}

impl fmt::Display for ClusteringOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusteringOrder::Asc => write!(f, "ASC"),
            ClusteringOrder::Desc => write!(f, "DESC"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyspaceDef {
    pub name: String,
    pub replication_factor: u32,
}

impl KeyspaceDef {
    pub fn new(name: impl Into<String>, replication_factor: u32) -> Self {
        Self {
            name: name.into(),
            replication_factor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    pub keyspace: String,
    pub name: String,
    pub fields: Vec<ColumnDef>,
}

impl TypeDef {
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            fields: vec![],
        }
    }

    pub fn field(mut self, name: impl Into<String>, typ: CqlType) -> Self {
        self.fields.push(ColumnDef::new(name, typ));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDef {
    pub keyspace: String,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub partition_key: Vec<String>,
    pub clustering: Vec<(String, ClusteringOrder)>,
}

impl TableDef {
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            columns: vec![],
            partition_key: vec![],
            clustering: vec![],
        }
    }

    pub fn column(mut self, name: impl Into<String>, typ: CqlType) -> Self {
        self.columns.push(ColumnDef::new(name, typ));
        self
    }

    pub fn partition_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn clustering(mut self, column: impl Into<String>, order: ClusteringOrder) -> Self {
        self.clustering.push((column.into(), order));
        self
    }

    pub fn column_def(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.partition_key.is_empty() {
            return Err(StoreError::InvalidParameter(format!(
                "table {} has no partition key",
                self.qualified_name()
            )));
        }

        let key_columns = self
            .partition_key
            .iter()
            .chain(self.clustering.iter().map(|(c, _)| c));
        for col in key_columns {
            if self.column_def(col).is_none() {
                return Err(StoreError::InvalidParameter(format!(
                    "key column {col} is not defined in table {}",
                    self.qualified_name()
                )));
            }
        }

        for (idx, col) in self.columns.iter().enumerate() {
            if self.columns[..idx].iter().any(|c| c.name == col.name) {
                return Err(StoreError::InvalidParameter(format!(
                    "column {} is defined twice in table {}",
                    col.name,
                    self.qualified_name()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use uuid::Uuid;

    use crate::schema::CqlType;
    use crate::schema::TableDef;
    use crate::Value;

    #[test]
    fn test_type_rendering() {
        let typ = CqlType::list(CqlType::frozen(CqlType::Udt("order_line".to_string())));

        assert_eq!(typ.to_string(), "list<frozen<order_line>>");
        assert_eq!(typ.udt_names(), vec!["order_line"]);
    }

    #[rstest]
    #[case(CqlType::Ascii, Value::from("plain"), true)]
    #[case(CqlType::Ascii, Value::from("café"), false)]
    #[case(CqlType::Text, Value::from("café"), true)]
    #[case(CqlType::Double, Value::Double(1.5), true)]
    #[case(CqlType::Double, Value::from("1.5"), false)]
    #[case(CqlType::Int, Value::Null, true)]
    #[case(CqlType::Uuid, Value::Uuid(Uuid::new_v4()), true)]
    #[case(CqlType::Timeuuid, Value::Timeuuid(Uuid::new_v4()), false)]
    #[case(CqlType::Timeuuid, Value::Timeuuid(Uuid::now_v1(&[0; 6])), true)]
    #[case(CqlType::list(CqlType::Int), Value::List(vec![Value::Int(1), Value::Double(1.)]), false)]
    fn test_accepts(#[case] typ: CqlType, #[case] value: Value, #[case] expected: bool) {
        assert_eq!(typ.accepts(&value), expected);
    }

    #[test]
    fn test_validate_rejects_unknown_key() {
        let tbl = TableDef::new("ks", "t")
            .column("a", CqlType::Int)
            .partition_key(["b"]);

        assert!(tbl.validate().is_err());
        assert!(TableDef::new("ks", "t").column("a", CqlType::Int).validate().is_err());
    }
}

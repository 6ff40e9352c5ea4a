use crate::schema::KeyspaceDef;
use crate::schema::TableDef;
use crate::schema::TypeDef;

#[derive(Clone, Debug, PartialEq)]
pub struct Insert {
    pub keyspace: String,
    pub table: String,
    pub columns: Vec<String>,
    pub ttl: Option<u32>,
}

impl Insert {
    pub fn new<I, S>(keyspace: impl Into<String>, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, seconds: u32) -> Self {
        self.ttl = Some(seconds);
        self
    }

    pub fn to_cql(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let mut cql = format!(
            "INSERT INTO {}.{} ({}) VALUES ({})",
            self.keyspace,
            self.table,
            self.columns.join(", "),
            placeholders
        );
        if let Some(ttl) = self.ttl {
            cql.push_str(&format!(" USING TTL {ttl}"));
        }

        cql
    }
}

/// Select with optional equality restrictions on the partition key.
/// Restricted columns are bound in the order they are listed.
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    pub keyspace: String,
    pub table: String,
    pub columns: Vec<String>,
    pub restrictions: Vec<String>,
    pub limit: Option<u32>,
}

impl Select {
    pub fn new<I, S>(keyspace: impl Into<String>, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            restrictions: vec![],
            limit: None,
        }
    }

    pub fn filter_eq(mut self, column: impl Into<String>) -> Self {
        self.restrictions.push(column.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_cql(&self) -> String {
        let mut cql = format!(
            "SELECT {} FROM {}.{}",
            self.columns.join(", "),
            self.keyspace,
            self.table
        );
        if !self.restrictions.is_empty() {
            let conds = self
                .restrictions
                .iter()
                .map(|c| format!("{c} = ?"))
                .collect::<Vec<_>>()
                .join(" AND ");
            cql.push_str(&format!(" WHERE {conds}"));
        }
        if let Some(limit) = self.limit {
            cql.push_str(&format!(" LIMIT {limit}"));
        }

        cql
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    DropKeyspace(String),
    CreateKeyspace(KeyspaceDef),
    CreateType(TypeDef),
    CreateTable(TableDef),
}

impl Statement {
    pub fn to_cql(&self) -> String {
        match self {
            Statement::DropKeyspace(name) => format!("DROP KEYSPACE IF EXISTS {name}"),
            Statement::CreateKeyspace(ks) => format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': '{}'}}",
                ks.name, ks.replication_factor
            ),
            Statement::CreateType(typ) => {
                let fields = typ
                    .fields
                    .iter()
                    .map(|f| format!("{} {}", f.name, f.typ))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "CREATE TYPE IF NOT EXISTS {}.{} ({fields})",
                    typ.keyspace, typ.name
                )
            }
            Statement::CreateTable(tbl) => {
                let mut parts = tbl
                    .columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.typ))
                    .collect::<Vec<_>>();

                let partition = if tbl.partition_key.len() == 1 {
                    tbl.partition_key[0].clone()
                } else {
                    format!("({})", tbl.partition_key.join(", "))
                };
                let mut key = vec![partition];
                key.extend(tbl.clustering.iter().map(|(c, _)| c.clone()));
                parts.push(format!("PRIMARY KEY ({})", key.join(", ")));

                let mut cql = format!(
                    "CREATE TABLE IF NOT EXISTS {} ({})",
                    tbl.qualified_name(),
                    parts.join(", ")
                );
                if !tbl.clustering.is_empty() {
                    let order = tbl
                        .clustering
                        .iter()
                        .map(|(c, o)| format!("{c} {o}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    cql.push_str(&format!(" WITH CLUSTERING ORDER BY ({order})"));
                }

                cql
            }
        }
    }

    /// Short description for logs, e.g. `table retail_ks.orders`.
    pub fn target(&self) -> String {
        match self {
            Statement::DropKeyspace(name) => format!("keyspace {name}"),
            Statement::CreateKeyspace(ks) => format!("keyspace {}", ks.name),
            Statement::CreateType(typ) => format!("type {}.{}", typ.keyspace, typ.name),
            Statement::CreateTable(tbl) => format!("table {}", tbl.qualified_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::ClusteringOrder;
    use crate::schema::CqlType;
    use crate::schema::KeyspaceDef;
    use crate::schema::TableDef;
    use crate::statement::Insert;
    use crate::statement::Select;
    use crate::statement::Statement;

    #[test]
    fn test_insert_cql() {
        let insert = Insert::new("ks", "t", ["a", "b"]).with_ttl(60);
        assert_eq!(
            insert.to_cql(),
            "INSERT INTO ks.t (a, b) VALUES (?, ?) USING TTL 60"
        );
    }

    #[test]
    fn test_select_cql() {
        let select = Select::new("ks", "t", ["a", "b"]).filter_eq("a").limit(10);
        assert_eq!(select.to_cql(), "SELECT a, b FROM ks.t WHERE a = ? LIMIT 10");
    }

    #[test]
    fn test_create_table_cql() {
        let tbl = TableDef::new("ks", "events")
            .column("id", CqlType::Uuid)
            .column("at", CqlType::Timeuuid)
            .partition_key(["id"])
            .clustering("at", ClusteringOrder::Desc);

        assert_eq!(
            Statement::CreateTable(tbl).to_cql(),
            "CREATE TABLE IF NOT EXISTS ks.events (id uuid, at timeuuid, PRIMARY KEY (id, at)) WITH CLUSTERING ORDER BY (at DESC)"
        );
    }

    #[test]
    fn test_composite_partition_key_cql() {
        let tbl = TableDef::new("ks", "pairs")
            .column("a", CqlType::Ascii)
            .column("b", CqlType::Int)
            .partition_key(["a", "b"]);

        assert_eq!(
            Statement::CreateTable(tbl).to_cql(),
            "CREATE TABLE IF NOT EXISTS ks.pairs (a ascii, b int, PRIMARY KEY ((a, b)))"
        );
    }

    #[test]
    fn test_keyspace_cql() {
        assert_eq!(
            Statement::CreateKeyspace(KeyspaceDef::new("ks", 3)).to_cql(),
            "CREATE KEYSPACE IF NOT EXISTS ks WITH replication = {'class': 'SimpleStrategy', 'replication_factor': '3'}"
        );
        assert_eq!(
            Statement::DropKeyspace("ks".to_string()).to_cql(),
            "DROP KEYSPACE IF EXISTS ks"
        );
    }
}

use std::thread;
use std::time::Duration as StdDuration;

use chrono::Duration;
use storage::error::StoreError;
use storage::memory::MemorySession;
use storage::schema::ClusteringOrder;
use storage::schema::CqlType;
use storage::schema::KeyspaceDef;
use storage::schema::TableDef;
use storage::schema::TypeDef;
use storage::statement::Insert;
use storage::statement::Select;
use storage::statement::Statement;
use storage::Session;
use storage::UdtValue;
use storage::Value;
use uuid::Uuid;

const KS: &str = "test_ks";

fn line_type() -> TypeDef {
    TypeDef::new(KS, "line")
        .field("sku", CqlType::Ascii)
        .field("quantity", CqlType::Int)
}

fn events_table() -> TableDef {
    TableDef::new(KS, "events")
        .column("owner", CqlType::Uuid)
        .column("id", CqlType::Timeuuid)
        .column("lines", CqlType::list(CqlType::frozen(CqlType::Udt("line".to_string()))))
        .partition_key(["owner"])
        .clustering("id", ClusteringOrder::Desc)
}

fn items_table() -> TableDef {
    TableDef::new(KS, "items")
        .column("sku", CqlType::Ascii)
        .column("price", CqlType::Double)
        .partition_key(["sku"])
}

async fn provision(session: &MemorySession) {
    let stmts = vec![
        Statement::DropKeyspace(KS.to_string()),
        Statement::CreateKeyspace(KeyspaceDef::new(KS, 1)),
        Statement::CreateType(line_type()),
        Statement::CreateTable(events_table()),
        Statement::CreateTable(items_table()),
    ];
    for stmt in stmts.iter() {
        session.execute(stmt).await.unwrap();
    }
}

#[tokio::test]
async fn test_clustering_desc_returns_newest_first() {
    let session = MemorySession::new();
    provision(&session).await;

    let insert = session
        .prepare(Insert::new(KS, "events", ["owner", "id", "lines"]))
        .await
        .unwrap();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    let node = [9, 9, 9, 9, 9, 9];
    let mut ids = vec![];
    for i in 0..3 {
        let id = Uuid::now_v1(&node);
        ids.push(id);
        let line = UdtValue::new("line")
            .field("sku", Value::from(format!("sku-{i}")))
            .field("quantity", Value::Int(i + 1));
        session
            .execute_prepared(&insert, vec![
                Value::Uuid(owner),
                Value::Timeuuid(id),
                Value::List(vec![Value::Udt(line)]),
            ])
            .await
            .unwrap();
        thread::sleep(StdDuration::from_millis(2));
    }
    session
        .execute_prepared(&insert, vec![
            Value::Uuid(other),
            Value::Timeuuid(Uuid::now_v1(&node)),
            Value::List(vec![]),
        ])
        .await
        .unwrap();

    let select = Select::new(KS, "events", ["id", "lines"]).filter_eq("owner");
    let rows = session.query(&select, vec![Value::Uuid(owner)]).await.unwrap();

    let got = rows
        .rows
        .iter()
        .map(|r| r.get(0).and_then(|v| v.as_uuid()).unwrap())
        .collect::<Vec<_>>();
    ids.reverse();
    assert_eq!(got, ids);

    let newest = rows.rows[0].get(1).and_then(|v| v.as_list()).unwrap();
    let line = newest[0].as_udt().unwrap();
    assert_eq!(line.get("sku"), Some(&Value::from("sku-2")));
    assert_eq!(line.get("quantity"), Some(&Value::Int(3)));

    let limited = session
        .query(&select.clone().limit(1), vec![Value::Uuid(owner)])
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_ttl_expires_rows() {
    let session = MemorySession::new();
    provision(&session).await;

    let ttl = session
        .prepare(Insert::new(KS, "items", ["sku", "price"]).with_ttl(172800))
        .await
        .unwrap();
    let forever = session
        .prepare(Insert::new(KS, "items", ["sku", "price"]))
        .await
        .unwrap();
    session
        .execute_prepared(&ttl, vec![Value::from("1"), Value::Double(9.99)])
        .await
        .unwrap();
    session
        .execute_prepared(&forever, vec![Value::from("2"), Value::Double(1.0)])
        .await
        .unwrap();
    assert_eq!(session.row_count(KS, "items"), 2);

    session.advance_clock(Duration::hours(47));
    assert_eq!(session.row_count(KS, "items"), 2);

    session.advance_clock(Duration::hours(2));
    assert_eq!(session.row_count(KS, "items"), 1);

    let rows = session
        .query(&Select::new(KS, "items", ["sku"]), vec![])
        .await
        .unwrap();
    assert_eq!(rows.rows[0].get(0), Some(&Value::from("2")));
}

#[tokio::test]
async fn test_provisioning_is_idempotent() {
    let session = MemorySession::new();
    provision(&session).await;
    let first = session.keyspace(KS).unwrap();

    let insert = session
        .prepare(Insert::new(KS, "items", ["sku", "price"]))
        .await
        .unwrap();
    session
        .execute_prepared(&insert, vec![Value::from("1"), Value::Double(2.0)])
        .await
        .unwrap();

    provision(&session).await;
    assert_eq!(session.keyspace(KS).unwrap(), first);
    // drop wipes the data
    assert_eq!(session.row_count(KS, "items"), 0);

    // create without drop keeps the existing table
    session
        .execute(&Statement::CreateTable(items_table()))
        .await
        .unwrap();
    assert_eq!(session.keyspace(KS).unwrap(), first);
}

#[tokio::test]
async fn test_schema_errors() {
    let session = MemorySession::new();

    let res = session.execute(&Statement::CreateTable(items_table())).await;
    assert!(matches!(res, Err(StoreError::NotFound(_))));

    session
        .execute(&Statement::CreateKeyspace(KeyspaceDef::new(KS, 1)))
        .await
        .unwrap();
    let res = session.execute(&Statement::CreateTable(events_table())).await;
    assert!(matches!(res, Err(StoreError::NotFound(_))));

    session
        .execute(&Statement::CreateType(line_type()))
        .await
        .unwrap();
    let unfrozen = TableDef::new(KS, "bad")
        .column("id", CqlType::Int)
        .column("lines", CqlType::list(CqlType::Udt("line".to_string())))
        .partition_key(["id"]);
    let res = session.execute(&Statement::CreateTable(unfrozen)).await;
    assert!(matches!(res, Err(StoreError::InvalidParameter(_))));

    let res = session
        .execute(&Statement::CreateKeyspace(KeyspaceDef::new("zero", 0)))
        .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn test_write_validation() {
    let session = MemorySession::new();
    provision(&session).await;

    let res = session.prepare(Insert::new(KS, "items", ["price"])).await;
    assert!(matches!(res, Err(StoreError::InvalidParameter(_))));
    let res = session.prepare(Insert::new(KS, "nope", ["sku"])).await;
    assert!(matches!(res, Err(StoreError::NotFound(_))));

    let insert = session
        .prepare(Insert::new(KS, "items", ["sku", "price"]))
        .await
        .unwrap();
    let cases = vec![
        vec![Value::from("1")],
        vec![Value::from("1"), Value::from("cheap")],
        vec![Value::from("ürün"), Value::Double(1.0)],
        vec![Value::Null, Value::Double(1.0)],
    ];
    for values in cases {
        assert!(session.execute_prepared(&insert, values).await.is_err());
    }

    let events = session
        .prepare(Insert::new(KS, "events", ["owner", "id", "lines"]))
        .await
        .unwrap();
    let wrong_field = UdtValue::new("line").field("quantity", Value::Int(1));
    let res = session
        .execute_prepared(&events, vec![
            Value::Uuid(Uuid::new_v4()),
            Value::Timeuuid(Uuid::now_v1(&[1; 6])),
            Value::List(vec![Value::Udt(wrong_field)]),
        ])
        .await;
    assert!(res.is_err());
    assert_eq!(session.row_count(KS, "items"), 0);
    assert_eq!(session.row_count(KS, "events"), 0);
}

#[tokio::test]
async fn test_injected_write_faults() {
    let session = MemorySession::new();
    provision(&session).await;
    session.fail_writes("items", 1);

    let insert = session
        .prepare(Insert::new(KS, "items", ["sku", "price"]))
        .await
        .unwrap();
    let res = session
        .execute_prepared(&insert, vec![Value::from("1"), Value::Double(1.0)])
        .await;
    assert!(matches!(res, Err(StoreError::WriteRejected(_))));

    session
        .execute_prepared(&insert, vec![Value::from("1"), Value::Double(1.0)])
        .await
        .unwrap();
    assert_eq!(session.row_count(KS, "items"), 1);
}

#[tokio::test]
async fn test_upsert_overwrites_row() {
    let session = MemorySession::new();
    provision(&session).await;

    let insert = session
        .prepare(Insert::new(KS, "items", ["sku", "price"]))
        .await
        .unwrap();
    for price in [1.0, 2.5] {
        session
            .execute_prepared(&insert, vec![Value::from("1"), Value::Double(price)])
            .await
            .unwrap();
    }

    let rows = session
        .query(
            &Select::new(KS, "items", ["price"]).filter_eq("sku"),
            vec![Value::from("1")],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.rows[0].get(0), Some(&Value::Double(2.5)));

    let res = session
        .query(
            &Select::new(KS, "items", ["sku"]).filter_eq("price"),
            vec![Value::Double(2.5)],
        )
        .await;
    assert!(matches!(res, Err(StoreError::NotYetSupported(_))));
}

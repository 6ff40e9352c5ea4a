pub mod cluster;
pub mod error;
pub mod memory;
pub mod schema;
pub mod session;
pub mod statement;

use std::cmp::Ordering;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::error::StoreError;
pub use crate::session::Prepared;
pub use crate::session::Row;
pub use crate::session::Rows;
pub use crate::session::Session;

/// Value of a user-defined type. Fields are kept in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct UdtValue {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl UdtValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: vec![],
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Boolean(bool),
    Int(i32),
    Double(f64),
    Uuid(Uuid),
    Timeuuid(Uuid),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Udt(UdtValue),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(v) | Value::Timeuuid(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_udt(&self) -> Option<&UdtValue> {
        match self {
            Value::Udt(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

/// Primary key component. Timeuuids order by their embedded timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Text(String),
    Boolean(bool),
    Int(i32),
    Uuid(Uuid),
    Timeuuid(Uuid),
    Timestamp(i64),
}

impl KeyValue {
    fn rank(&self) -> u8 {
        match self {
            KeyValue::Text(_) => 0,
            KeyValue::Boolean(_) => 1,
            KeyValue::Int(_) => 2,
            KeyValue::Uuid(_) => 3,
            KeyValue::Timeuuid(_) => 4,
            KeyValue::Timestamp(_) => 5,
        }
    }
}

/// 60-bit count of 100ns intervals embedded in a version 1 uuid.
pub fn timeuuid_ticks(id: &Uuid) -> u64 {
    let b = id.as_bytes();
    let time_low = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64;
    let time_mid = u16::from_be_bytes([b[4], b[5]]) as u64;
    let time_hi = (u16::from_be_bytes([b[6], b[7]]) & 0x0fff) as u64;

    (time_hi << 48) | (time_mid << 32) | time_low
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Text(a), KeyValue::Text(b)) => a.cmp(b),
            (KeyValue::Boolean(a), KeyValue::Boolean(b)) => a.cmp(b),
            (KeyValue::Int(a), KeyValue::Int(b)) => a.cmp(b),
            (KeyValue::Uuid(a), KeyValue::Uuid(b)) => a.cmp(b),
            (KeyValue::Timeuuid(a), KeyValue::Timeuuid(b)) => timeuuid_ticks(a)
                .cmp(&timeuuid_ticks(b))
                .then_with(|| a.as_bytes().cmp(b.as_bytes())),
            (KeyValue::Timestamp(a), KeyValue::Timestamp(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<&Value> for KeyValue {
    type Error = StoreError;

    fn try_from(value: &Value) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            Value::Text(v) => KeyValue::Text(v.to_owned()),
            Value::Boolean(v) => KeyValue::Boolean(*v),
            Value::Int(v) => KeyValue::Int(*v),
            Value::Uuid(v) => KeyValue::Uuid(*v),
            Value::Timeuuid(v) => KeyValue::Timeuuid(*v),
            Value::Timestamp(v) => KeyValue::Timestamp(v.timestamp_millis()),
            Value::Null => {
                return Err(StoreError::InvalidParameter(
                    "primary key column can't be null".to_string(),
                ));
            }
            other => {
                return Err(StoreError::InvalidParameter(format!(
                    "{other:?} can't be used as a key"
                )));
            }
        })
    }
}

pub(crate) fn key_values(values: &[&Value]) -> Result<Vec<KeyValue>> {
    values.iter().map(|v| KeyValue::try_from(*v)).collect()
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use uuid::Uuid;

    use crate::timeuuid_ticks;
    use crate::KeyValue;
    use crate::Value;

    #[test]
    fn test_timeuuid_order_follows_time() {
        let node = [1, 2, 3, 4, 5, 6];
        let first = Uuid::now_v1(&node);
        thread::sleep(Duration::from_millis(2));
        let second = Uuid::now_v1(&node);

        assert!(timeuuid_ticks(&first) < timeuuid_ticks(&second));
        assert!(KeyValue::Timeuuid(first) < KeyValue::Timeuuid(second));
    }

    #[test]
    fn test_null_is_not_a_key() {
        assert!(KeyValue::try_from(&Value::Null).is_err());
        assert!(KeyValue::try_from(&Value::Double(1.0)).is_err());
        assert_eq!(
            KeyValue::try_from(&Value::from("sku")).unwrap(),
            KeyValue::Text("sku".to_string())
        );
    }
}

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::OrdersGenError;
use crate::error::Result;

/// One product exactly as it appears in the input document. Field types are
/// checked later, during conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProduct {
    fields: Map<String, JsonValue>,
}

impl RawProduct {
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }
}

impl From<JsonValue> for RawProduct {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Wrapped { products: Vec<JsonValue> },
    Bare(Vec<JsonValue>),
}

/// Reads `{"products": [..]}` or a bare array of products.
pub fn from_reader<R: io::Read>(rdr: R) -> Result<Vec<RawProduct>> {
    let doc: Document = serde_json::from_reader(rdr)?;
    let products = match doc {
        Document::Wrapped { products } => products,
        Document::Bare(products) => products,
    };

    Ok(products.into_iter().map(RawProduct::from).collect())
}

pub fn from_str(s: &str) -> Result<Vec<RawProduct>> {
    from_reader(s.as_bytes())
}

pub fn from_path(path: &Path) -> Result<Vec<RawProduct>> {
    if !path.try_exists()? {
        return Err(OrdersGenError::FileNotFound(format!(
            "catalog {path:?} doesn't exist"
        )));
    }
    debug!("reading catalog from {path:?}");

    from_reader(BufReader::new(File::open(path)?))
}

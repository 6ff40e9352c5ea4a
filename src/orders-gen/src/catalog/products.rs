use std::collections::HashSet;

use serde_json::Value as JsonValue;
use storage::Value;

use crate::catalog::loader::RawProduct;
use crate::error::OrdersGenError;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub color: String,
    pub manufacturer: String,
    pub model_number: String,
    pub image: String,
    pub thumbnail_image: String,
    pub upc: String,
    pub in_store_availability: bool,
    pub regular_price: f64,
}

/// Product fields needed to place an order.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub sku: String,
    pub name: String,
    pub regular_price: f64,
}

// ascii columns can't hold anything else
fn ascii_text(raw: &RawProduct, key: &str) -> String {
    match raw.get(key) {
        Some(JsonValue::String(s)) => s.chars().filter(char::is_ascii).collect(),
        _ => String::new(),
    }
}

impl Product {
    pub const COLUMNS: [&'static str; 12] = [
        "sku",
        "color",
        "description",
        "image",
        "in_store_availability",
        "manufacturer",
        "model_number",
        "name",
        "regular_price",
        "short_description",
        "thumbnail_image",
        "upc",
    ];

    /// Converts one input record. `index` is the record position in the
    /// input and only used for error messages.
    pub fn try_from_raw(index: usize, raw: &RawProduct) -> Result<Self> {
        let sku = match raw.get("sku") {
            None => {
                return Err(OrdersGenError::InvalidRecord(
                    index,
                    "sku is missing".to_string(),
                ));
            }
            Some(v) => v.as_u64().ok_or_else(|| {
                OrdersGenError::InvalidRecord(
                    index,
                    format!("sku {v} is not a non-negative integer"),
                )
            })?,
        };

        let regular_price = match raw.get("regularPrice") {
            None => {
                return Err(OrdersGenError::InvalidRecord(
                    index,
                    "regularPrice is missing".to_string(),
                ));
            }
            Some(v) => match v.as_f64() {
                Some(p) if p.is_finite() && p >= 0. => p,
                _ => {
                    return Err(OrdersGenError::InvalidRecord(
                        index,
                        format!("regularPrice {v} is not a non-negative number"),
                    ));
                }
            },
        };

        Ok(Self {
            sku: sku.to_string(),
            name: ascii_text(raw, "name"),
            description: ascii_text(raw, "description"),
            short_description: ascii_text(raw, "shortDescription"),
            color: ascii_text(raw, "color"),
            manufacturer: ascii_text(raw, "manufacturer"),
            model_number: ascii_text(raw, "modelNumber"),
            image: ascii_text(raw, "image"),
            thumbnail_image: ascii_text(raw, "thumbnailImage"),
            upc: ascii_text(raw, "upc"),
            in_store_availability: raw
                .get("inStoreAvailability")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            regular_price,
        })
    }

    /// Values in [`Product::COLUMNS`] order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.sku.as_str()),
            Value::from(self.color.as_str()),
            Value::from(self.description.as_str()),
            Value::from(self.image.as_str()),
            Value::from(self.in_store_availability),
            Value::from(self.manufacturer.as_str()),
            Value::from(self.model_number.as_str()),
            Value::from(self.name.as_str()),
            Value::from(self.regular_price),
            Value::from(self.short_description.as_str()),
            Value::from(self.thumbnail_image.as_str()),
            Value::from(self.upc.as_str()),
        ]
    }
}

/// Converts the whole input, failing on the first bad record or repeated sku.
pub fn convert_all(records: &[RawProduct]) -> Result<Vec<Product>> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut products = Vec::with_capacity(records.len());
    for (index, raw) in records.iter().enumerate() {
        let product = Product::try_from_raw(index, raw)?;
        if !seen.insert(product.sku.clone()) {
            return Err(OrdersGenError::DuplicateSku {
                index,
                sku: product.sku,
            });
        }
        products.push(product);
    }

    Ok(products)
}

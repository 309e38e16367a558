use serde::{Deserialize, Serialize};

use crate::domain::money::to_cents;

pub type ProductId = u32;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub ean: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// One entry of the product file as the shop maintains it.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: ProductId,
    name: String,
    #[serde(default, alias = "category")]
    kategorie: String,
    #[serde(default, alias = "price")]
    preis: f64,
    #[serde(default)]
    ean: Option<String>,
    #[serde(default, alias = "description")]
    beschreibung: Option<String>,
    #[serde(default, alias = "image")]
    bild: Option<String>,
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            category: r.kategorie,
            price_cents: to_cents(r.preis),
            ean: r.ean.filter(|e| !e.trim().is_empty()),
            description: r.beschreibung,
            image: r.bild,
        }
    }
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        ProductRecord::deserialize(deserializer).map(Product::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_shop_field_names() {
        let p: Product = serde_json::from_str(
            r#"{"id": 7, "name": "Jacominus", "kategorie": "Klassiker", "preis": 14.95, "ean": "9783000000007"}"#,
        )
        .unwrap();
        assert_eq!(p.id, 7);
        assert_eq!(p.category, "Klassiker");
        assert_eq!(p.price_cents, 1495);
        assert_eq!(p.ean.as_deref(), Some("9783000000007"));
    }

    #[test]
    fn blank_ean_and_missing_price() {
        let p: Product = serde_json::from_str(r#"{"id": 1, "name": "Poster", "ean": ""}"#).unwrap();
        assert_eq!(p.price_cents, 0);
        assert_eq!(p.ean, None);
        assert_eq!(p.category, "");
    }
}

use anyhow::Context;
use serde::Serialize;
use std::path::Path;

use crate::domain::product::{Product, ProductId};

/// The product list, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct CategorySection<'a> {
    pub name: &'a str,
    pub products: Vec<&'a Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let products: Vec<Product> = serde_json::from_str(raw)?;
        Ok(Self::new(products))
    }

    /// Reads the product file. A missing file yields an empty catalog; an
    /// unreadable or malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw)
                .with_context(|| format!("malformed catalog {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("cannot read catalog {}", path.display())),
        }
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| p.category == category)
    }

    /// Categories in the order they first appear in the product file.
    pub fn sections(&self) -> Vec<CategorySection<'_>> {
        let mut sections: Vec<CategorySection<'_>> = Vec::new();
        for p in &self.products {
            match sections.iter_mut().find(|s| s.name == p.category) {
                Some(section) => section.products.push(p),
                None => sections.push(CategorySection {
                    name: &p.category,
                    products: vec![p],
                }),
            }
        }
        sections
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

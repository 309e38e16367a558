use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub id: ProductId,
    pub title: String,
    /// Price at the moment the product was first added.
    pub price_cents: i64,
    pub quantity: u32,
}

/// A visitor's pending purchase lines. Each product appears at most once.
///
/// Mutations consume the cart and hand back the new value; persisting it is
/// the caller's business.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, product: &Product) -> Self {
        match self.lines.iter_mut().find(|l| l.id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                id: product.id,
                title: product.name.clone(),
                price_cents: product.price_cents,
                quantity: 1,
            }),
        }
        self
    }

    pub fn remove(mut self, id: ProductId) -> Self {
        self.lines.retain(|l| l.id != id);
        self
    }

    /// Takes away what an order already covered. Quantities added since the
    /// order snapshot stay in the cart.
    pub fn settle(mut self, ordered: &[CartLine]) -> Self {
        for o in ordered {
            if let Some(line) = self.lines.iter_mut().find(|l| l.id == o.id) {
                line.quantity = line.quantity.saturating_sub(o.quantity);
            }
        }
        self.lines.retain(|l| l.quantity > 0);
        self
    }

    pub fn total_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| l.price_cents * l.quantity as i64)
            .sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId, price_cents: i64) -> Product {
        Product {
            id,
            name: format!("Buch {id}"),
            category: "Klassiker".into(),
            price_cents,
            ean: None,
            description: None,
            image: None,
        }
    }

    #[test]
    fn adding_twice_increments_quantity() {
        let p = product(1, 1000);
        let cart = Cart::new().add(&p).add(&p);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.total_cents(), 2000);
    }

    #[test]
    fn total_over_mixed_lines() {
        let cart = Cart::new()
            .add(&product(1, 1000))
            .add(&product(1, 1000))
            .add(&product(2, 550));
        assert_eq!(cart.total_cents(), 2550);
    }

    #[test]
    fn price_is_snapshotted_at_first_add() {
        let mut p = product(1, 1000);
        let cart = Cart::new().add(&p);
        p.price_cents = 1200;
        let cart = cart.add(&p);
        assert_eq!(cart.lines()[0].price_cents, 1000);
        assert_eq!(cart.total_cents(), 2000);
    }

    #[test]
    fn removing_absent_product_is_noop() {
        let cart = Cart::new().add(&product(1, 1000));
        let after = cart.clone().remove(42);
        assert_eq!(after, cart);

        let emptied = after.remove(1);
        assert!(emptied.is_empty());
        assert_eq!(emptied.total_cents(), 0);
    }

    #[test]
    fn settle_keeps_what_was_not_ordered() {
        let ordered = Cart::new().add(&product(1, 1000));
        let current = ordered
            .clone()
            .add(&product(1, 1000))
            .add(&product(2, 550));

        let left = current.settle(ordered.lines());
        assert_eq!(left.lines().len(), 2);
        assert_eq!(left.lines()[0].quantity, 1);
        assert_eq!(left.lines()[1].id, 2);

        let gone = ordered.clone().settle(ordered.lines());
        assert!(gone.is_empty());
    }
}

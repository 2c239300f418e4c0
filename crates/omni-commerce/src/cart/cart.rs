//! Cart lines and the pure cart state machine.

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A product snapshot plus quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    /// Product as it was when first added.
    pub product: Product,
    pub quantity: i64,
}

impl CartLine {
    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Unit price times quantity.
    pub fn line_total(&self) -> Result<Money, CommerceError> {
        self.product.price.try_multiply(self.quantity)
    }
}

/// Line items for one session, at most one per product.
///
/// Mutations take the latest stock as an argument and never persist; the
/// [`CartEngine`](crate::cart::CartEngine) wraps this with the catalog and
/// storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id() == product_id)
    }

    pub fn quantity_of(&self, product_id: &ProductId) -> i64 {
        self.line(product_id).map(|l| l.quantity).unwrap_or(0)
    }

    /// Add one unit of `product`, whose stock must be current.
    ///
    /// Returns `Ok(false)` when the line is already at the stock ceiling.
    pub fn add(&mut self, product: &Product) -> Result<bool, CommerceError> {
        if product.stock <= 0 {
            return Err(CommerceError::OutOfStock(product.id.to_string()));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            if line.quantity >= product.stock {
                return Ok(false);
            }
            line.quantity += 1;
            return Ok(true);
        }

        self.lines.push(CartLine {
            product: product.clone(),
            quantity: 1,
        });
        Ok(true)
    }

    /// Set a line's quantity, clamped to `stock`.
    ///
    /// `quantity <= 0` (or no stock left) removes the line. Setting a product
    /// that is not in the cart does nothing. Returns whether anything changed.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64, stock: i64) -> bool {
        let clamped = quantity.min(stock);
        if clamped <= 0 {
            return self.remove(product_id);
        }

        match self.lines.iter_mut().find(|l| &l.product.id == product_id) {
            Some(line) if line.quantity != clamped => {
                line.quantity = clamped;
                true
            }
            _ => false,
        }
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product.id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line totals.
    pub fn total(&self) -> Result<Money, CommerceError> {
        let totals = self
            .lines
            .iter()
            .map(CartLine::line_total)
            .collect::<Result<Vec<_>, _>>()?;
        Money::try_sum(totals)
    }

    /// Sum of quantities.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product::new(id, format!("Product {id}"), price, "misc", stock, 100)
    }

    #[test]
    fn test_add_increments_existing_line() {
        let mut cart = Cart::new();
        let p1 = product("p1", 20, 85);

        assert!(cart.add(&p1).unwrap());
        assert!(cart.add(&p1).unwrap());

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(&p1.id), 2);
        assert_eq!(cart.total().unwrap(), Money::new(40));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_stops_at_stock() {
        let mut cart = Cart::new();
        let p = product("p24", 55, 2);

        cart.add(&p).unwrap();
        cart.add(&p).unwrap();
        assert!(!cart.add(&p).unwrap());
        assert_eq!(cart.quantity_of(&p.id), 2);
    }

    #[test]
    fn test_add_out_of_stock() {
        let mut cart = Cart::new();
        let err = cart.add(&product("p0", 10, 0)).unwrap_err();
        assert!(matches!(err, CommerceError::OutOfStock(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_clamps_to_stock() {
        let mut cart = Cart::new();
        let p3 = product("p3", 15, 12);
        cart.add(&p3).unwrap();

        assert!(cart.set_quantity(&p3.id, 50, p3.stock));
        assert_eq!(cart.quantity_of(&p3.id), 12);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        let p = product("p1", 20, 5);
        cart.add(&p).unwrap();

        assert!(cart.set_quantity(&p.id, 0, p.stock));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity(&p.id, 3, p.stock));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_with_no_stock_left_removes() {
        let mut cart = Cart::new();
        let p = product("p1", 20, 5);
        cart.add(&p).unwrap();

        assert!(cart.set_quantity(&p.id, 2, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.remove(&"p1".into()));
    }

    #[test]
    fn test_cart_serializes_as_line_list() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 20, 5)).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["quantity"], 1);
    }
}

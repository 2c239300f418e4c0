//! Order types.

use crate::cart::CartLine;
use crate::error::CommerceError;
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order status.
///
/// Orders are recorded once payment is handed off, and there is no
/// cancellation path, so every order is `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "completed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "Completed",
        }
    }
}

/// A line in an order, frozen at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    /// Product name at time of order.
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of order.
    pub unit_price: Money,
    /// `unit_price * quantity`.
    pub line_total: Money,
}

impl OrderLine {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<Self, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        Ok(Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            line_total: unit_price.try_multiply(quantity)?,
        })
    }

    pub fn from_cart_line(line: &CartLine) -> Result<Self, CommerceError> {
        Self::new(
            line.product.id.clone(),
            line.product.name.clone(),
            line.quantity,
            line.product.price,
        )
    }
}

/// An immutable, committed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub ordered_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    /// Sum of line totals.
    pub total: Money,
    pub status: OrderStatus,
}

impl Order {
    /// Build an order whose total is the sum of `lines`.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        ordered_at: DateTime<Utc>,
        lines: Vec<OrderLine>,
    ) -> Result<Self, CommerceError> {
        let total = Money::try_sum(lines.iter().map(|l| l.line_total))?;
        Ok(Self {
            id,
            user_id,
            ordered_at,
            lines,
            total,
            status: OrderStatus::Completed,
        })
    }

    /// Get total item count.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Date shown in order history, e.g. "16/10/2026".
    pub fn display_date(&self) -> String {
        self.ordered_at.format("%d/%m/%Y").to_string()
    }

    /// Every line total matches its unit price and quantity, and the order
    /// total matches the lines.
    pub fn is_consistent(&self) -> bool {
        let lines_ok = self.lines.iter().all(|l| {
            l.unit_price
                .try_multiply(l.quantity)
                .map(|t| t == l.line_total)
                .unwrap_or(false)
        });
        let total_ok = Money::try_sum(self.lines.iter().map(|l| l.line_total))
            .map(|t| t == self.total)
            .unwrap_or(false);
        lines_ok && total_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_order_total_matches_lines() {
        let lines = vec![
            OrderLine::new("p1".into(), "Lays Classic Salted", 2, Money::new(20)).unwrap(),
            OrderLine::new("p3".into(), "Uncle Chips Plain", 3, Money::new(15)).unwrap(),
        ];
        let order = Order::new("ORD-1".into(), "user-1".into(), at(), lines).unwrap();

        assert_eq!(order.lines[0].line_total, Money::new(40));
        assert_eq!(order.total, Money::new(85));
        assert_eq!(order.item_count(), 5);
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.is_consistent());
    }

    #[test]
    fn test_tampered_order_is_inconsistent() {
        let lines =
            vec![OrderLine::new("p1".into(), "Lays Classic Salted", 2, Money::new(20)).unwrap()];
        let mut order = Order::new("ORD-1".into(), "user-1".into(), at(), lines).unwrap();
        order.total = Money::new(39);
        assert!(!order.is_consistent());
    }

    #[test]
    fn test_order_line_rejects_zero_quantity() {
        let err = OrderLine::new("p1".into(), "x", 0, Money::new(20)).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidQuantity(0)));
    }

    #[test]
    fn test_display_date() {
        let order = Order::new("ORD-1".into(), "user-1".into(), at(), vec![]).unwrap();
        assert_eq!(order.display_date(), "16/10/2026");
    }
}

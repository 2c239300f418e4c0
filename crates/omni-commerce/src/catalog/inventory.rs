//! Stock level classification for display.

use serde::{Deserialize, Serialize};

/// Fill percentage at or below which stock is reported as low.
pub const LOW_STOCK_PERCENT: f64 = 15.0;

/// Fill percentage above which the stock bar is healthy.
pub const HEALTHY_STOCK_PERCENT: f64 = 25.0;

/// Availability label shown next to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    InStock,
}

impl StockLevel {
    pub fn classify(stock: i64, fill_percent: f64) -> Self {
        if stock <= 0 {
            StockLevel::OutOfStock
        } else if fill_percent <= LOW_STOCK_PERCENT {
            StockLevel::Low
        } else {
            StockLevel::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::OutOfStock => "out_of_stock",
            StockLevel::Low => "low",
            StockLevel::InStock => "in_stock",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StockLevel::OutOfStock => "Out of stock",
            StockLevel::Low => "Low stock",
            StockLevel::InStock => "In stock",
        }
    }
}

/// Colour band of the stock bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBand {
    Healthy,
    Warning,
    Critical,
}

impl StockBand {
    pub fn from_percent(fill_percent: f64) -> Self {
        if fill_percent > HEALTHY_STOCK_PERCENT {
            StockBand::Healthy
        } else if fill_percent > LOW_STOCK_PERCENT {
            StockBand::Warning
        } else {
            StockBand::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockBand::Healthy => "healthy",
            StockBand::Warning => "warning",
            StockBand::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_level_thresholds() {
        assert_eq!(StockLevel::classify(0, 0.0), StockLevel::OutOfStock);
        assert_eq!(StockLevel::classify(15, 15.0), StockLevel::Low);
        assert_eq!(StockLevel::classify(16, 16.0), StockLevel::InStock);
    }

    #[test]
    fn test_stock_band_thresholds() {
        assert_eq!(StockBand::from_percent(85.0), StockBand::Healthy);
        assert_eq!(StockBand::from_percent(25.0), StockBand::Warning);
        assert_eq!(StockBand::from_percent(16.0), StockBand::Warning);
        assert_eq!(StockBand::from_percent(15.0), StockBand::Critical);
        assert_eq!(StockBand::from_percent(0.0), StockBand::Critical);
    }
}

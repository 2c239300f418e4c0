//! Product type.

use crate::catalog::{StockBand, StockLevel};
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Money,
    /// Category tag (e.g. "chips", "dairy").
    pub category: String,
    /// Short description for listings.
    #[serde(default)]
    pub description: String,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Sellable units currently available.
    pub stock: i64,
    /// Capacity used for the stock bar ratio.
    pub max_stock: i64,
}

impl Product {
    /// Create a product with no description or image.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: i64,
        category: impl Into<String>,
        stock: i64,
        max_stock: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: Money::new(price),
            category: category.into(),
            description: String::new(),
            image: String::new(),
            stock,
            max_stock,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Check the record before it is written to the catalog.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.id.as_str().trim().is_empty() {
            return Err(CommerceError::Validation("product id is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(CommerceError::Validation(format!(
                "{}: name is required",
                self.id
            )));
        }
        if self.price.is_negative() {
            return Err(CommerceError::Validation(format!(
                "{}: price must not be negative",
                self.id
            )));
        }
        if self.stock < 0 {
            return Err(CommerceError::Validation(format!(
                "{}: stock must not be negative",
                self.id
            )));
        }
        if self.max_stock < self.stock {
            return Err(CommerceError::Validation(format!(
                "{}: max stock {} is below stock {}",
                self.id, self.max_stock, self.stock
            )));
        }
        Ok(())
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Stock as a percentage of max stock, 0 when max stock is 0.
    pub fn fill_percent(&self) -> f64 {
        if self.max_stock <= 0 {
            return 0.0;
        }
        self.stock as f64 / self.max_stock as f64 * 100.0
    }

    pub fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.stock, self.fill_percent())
    }

    pub fn stock_band(&self) -> StockBand {
        StockBand::from_percent(self.fill_percent())
    }

    /// True when `query` appears in the name, category or description,
    /// ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.name, &self.category, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

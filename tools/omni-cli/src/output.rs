//! Output formatting for the CLI.

use console::style;
use omni_core::omni_commerce::{Product, StockLevel};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Coloured stock label for a product.
pub fn stock_badge(product: &Product) -> String {
    let label = match product.stock_level() {
        StockLevel::OutOfStock => "out of stock".to_string(),
        StockLevel::Low => format!("only {} left", product.stock),
        StockLevel::InStock => format!("{} in stock", product.stock),
    };
    match product.stock_level() {
        StockLevel::OutOfStock => style(label).red().to_string(),
        StockLevel::Low => style(label).yellow().to_string(),
        StockLevel::InStock => style(label).green().to_string(),
    }
}

/// A text bar showing stock against its maximum.
pub fn stock_bar(product: &Product, width: usize) -> String {
    let filled = ((product.fill_percent() / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_bar() {
        let product = Product::new("p1", "Lays", 20, "chips", 50, 100);
        assert_eq!(stock_bar(&product, 10), "[#####-----]");

        let empty = Product::new("p2", "Kurkure", 20, "chips", 0, 100);
        assert_eq!(stock_bar(&empty, 4), "[----]");
    }

    #[test]
    fn test_stock_badge_mentions_count() {
        let low = Product::new("p24", "Chilli", 55, "spices", 3, 100);
        assert!(stock_badge(&low).contains("only 3 left"));
    }
}

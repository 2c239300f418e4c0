//! Catalog browsing commands.

use anyhow::Result;
use console::style;
use omni_core::omni_commerce::{Product, ProductId, StockBand};

use super::{CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::output::{stock_badge, stock_bar};

const BAR_WIDTH: usize = 20;

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    match args.command {
        CatalogCommand::List { category } => list(category.as_deref(), ctx).await,
        CatalogCommand::Show { product } => show(&product, ctx).await,
        CatalogCommand::Search { query } => search(&query, ctx).await,
    }
}

async fn list(category: Option<&str>, ctx: &Context) -> Result<()> {
    let products = match category {
        Some(category) => ctx.store.catalog().by_category(category).await?,
        None => ctx.store.catalog().list().await?,
    };

    match category {
        Some(category) => ctx.output.header(&format!("Products in {category}")),
        None => ctx.output.header("Products"),
    }
    print_products(&products, ctx);
    Ok(())
}

async fn search(query: &str, ctx: &Context) -> Result<()> {
    let products = ctx.store.catalog().search(query).await?;
    ctx.output.header(&format!("Results for \"{query}\""));
    if products.is_empty() && !ctx.output.is_json() {
        ctx.output.info("No products match.");
    }
    print_products(&products, ctx);
    Ok(())
}

async fn show(product: &str, ctx: &Context) -> Result<()> {
    let product = ctx.store.catalog().get_by_id(&ProductId::new(product)).await?;

    if ctx.output.is_json() {
        ctx.output.json(&product);
        return Ok(());
    }

    ctx.output.header(&product.name);
    ctx.output.kv("id", product.id.as_str());
    ctx.output.kv("price", &product.price.display());
    ctx.output.kv("category", &product.category);
    if !product.description.is_empty() {
        ctx.output.kv("description", &product.description);
    }
    ctx.output.kv("stock", &stock_badge(&product));
    ctx.output.kv("level", &colored_bar(&product));
    Ok(())
}

fn print_products(products: &[Product], ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&products);
        return;
    }

    for product in products {
        ctx.output.table_row(
            &[
                product.id.as_str(),
                &product.name,
                &product.price.display(),
                &product.category,
                &stock_badge(product),
            ],
            &[4, 24, 6, 10, 0],
        );
    }
}

fn colored_bar(product: &Product) -> String {
    let bar = stock_bar(product, BAR_WIDTH);
    match product.stock_band() {
        StockBand::Healthy => style(bar).green().to_string(),
        StockBand::Warning => style(bar).yellow().to_string(),
        StockBand::Critical => style(bar).red().to_string(),
    }
}

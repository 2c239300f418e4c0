//! Cart commands.

use anyhow::{Context as _, Result};
use omni_core::omni_commerce::ProductId;
use omni_core::ShopperSession;

use super::{CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command. With no subcommand the cart is shown.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let mut shopper = ctx.shopper().await?;

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => {}
        CartCommand::Add { product } => {
            let id = ProductId::new(product);
            if shopper.add_to_cart(&id).await? {
                ctx.output.success(&format!("Added {id} to the cart"));
            } else {
                ctx.output
                    .warn(&format!("No more {id} in stock, quantity unchanged"));
            }
        }
        CartCommand::Set { product, quantity } => {
            let id = ProductId::new(product);
            let applied = shopper.set_quantity(&id, quantity).await?;
            if applied == 0 && quantity > 0 {
                ctx.output
                    .warn(&format!("{id} is not in the cart or is out of stock"));
            } else if applied == 0 {
                ctx.output.success(&format!("Removed {id}"));
            } else if applied != quantity {
                ctx.output
                    .warn(&format!("{id} limited to {applied} by available stock"));
            } else {
                ctx.output.success(&format!("{id} set to {applied}"));
            }
        }
        CartCommand::Remove { product } => {
            let id = ProductId::new(product);
            shopper.remove_from_cart(&id).await?;
            ctx.output.success(&format!("Removed {id}"));
        }
        CartCommand::Clear => {
            shopper.clear_cart().await?;
            ctx.output.success("Cart cleared");
        }
    }

    show(&shopper, ctx)
}

fn show(shopper: &ShopperSession, ctx: &Context) -> Result<()> {
    let cart = shopper.cart();

    if ctx.output.is_json() {
        ctx.output.json(cart.cart());
        return Ok(());
    }

    ctx.output.header("Cart");
    if cart.is_empty() {
        ctx.output.info("Your cart is empty.");
        return Ok(());
    }

    for line in cart.lines() {
        let line_total = line.line_total().context("Line total overflowed")?;
        ctx.output.table_row(
            &[
                line.product_id().as_str(),
                &line.product.name,
                &format!("x{}", line.quantity),
                &line_total.display(),
            ],
            &[4, 24, 5, 0],
        );
    }
    let total = cart.total().context("Cart total overflowed")?;
    ctx.output.kv("items", &cart.item_count().to_string());
    ctx.output.kv("total", &total.display());
    Ok(())
}

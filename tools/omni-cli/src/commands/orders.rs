//! Checkout and order history commands.

use anyhow::Result;
use omni_core::omni_commerce::{Order, PaymentApp, ProductId};
use omni_core::ShopperSession;

use super::{BuyArgs, CheckoutArgs};
use crate::context::Context;

/// Turn the cart into an order.
pub async fn checkout(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let mut shopper = ctx.shopper().await?;
    let order = shopper.checkout().await?;
    ctx.output.success(&format!("Order {} placed", order.id));
    print_order(&order, &shopper, args.pay, ctx)
}

/// Buy one product directly.
pub async fn buy(args: BuyArgs, ctx: &Context) -> Result<()> {
    let shopper = ctx.shopper().await?;
    let order = shopper
        .buy_now(&ProductId::new(args.product), args.quantity)
        .await?;
    ctx.output.success(&format!("Order {} placed", order.id));
    print_order(&order, &shopper, args.pay, ctx)
}

/// Show the logged-in user's orders.
pub async fn list(ctx: &Context) -> Result<()> {
    let shopper = ctx.shopper().await?;
    let orders = shopper.orders().await?;

    if ctx.output.is_json() {
        ctx.output.json(&orders);
        return Ok(());
    }

    ctx.output.header("Order history");
    if orders.is_empty() {
        ctx.output.info("No orders yet.");
        return Ok(());
    }
    for order in &orders {
        ctx.output.table_row(
            &[
                order.id.as_str(),
                &order.display_date(),
                &format!("{} items", order.item_count()),
                &order.total.display(),
                order.status.display_name(),
            ],
            &[16, 10, 9, 7, 0],
        );
    }
    Ok(())
}

fn print_order(
    order: &Order,
    shopper: &ShopperSession,
    pay: Option<PaymentApp>,
    ctx: &Context,
) -> Result<()> {
    let link = pay
        .map(|app| shopper.payment_link(order, app))
        .transpose()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "order": order,
            "payment_link": link,
        }));
        return Ok(());
    }

    for line in &order.lines {
        ctx.output.list_item(&format!(
            "{} x{} @ {} = {}",
            line.product_name,
            line.quantity,
            line.unit_price.display(),
            line.line_total.display()
        ));
    }
    ctx.output.kv("total", &order.total.display());
    if let (Some(app), Some(link)) = (pay, link) {
        ctx.output.kv(&format!("pay with {}", app.display_name()), &link);
    }
    Ok(())
}

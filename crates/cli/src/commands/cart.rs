//! Local cart commands.

use std::io::Write;

use storefront_cart::AppError;
use storefront_cart_core::{Cart, LineItemId, VariantId};

use super::{CommandError, Context};

/// Print cart lines and totals.
pub fn show(ctx: &Context) -> Result<(), CommandError> {
    render(&mut std::io::stdout().lock(), &ctx.store.snapshot())?;
    Ok(())
}

/// Add a product by handle.
pub async fn add(
    ctx: &Context,
    handle: &str,
    quantity: u32,
    variant: Option<String>,
) -> Result<(), CommandError> {
    let product = ctx
        .remote()?
        .client
        .get_product_by_handle(handle)
        .await
        .map_err(AppError::from)?;
    let variant = variant.map(VariantId::new);

    let id = ctx
        .store
        .add_item(&product, quantity, variant.as_ref())
        .map_err(AppError::from)?;

    tracing::info!(item_id = %id, product = %product.title, quantity, "Added to cart");
    show(ctx)
}

/// Set a line's quantity.
pub fn set(ctx: &Context, item_id: &str, quantity: i64) -> Result<(), CommandError> {
    let id = LineItemId::new(item_id);
    if ctx.store.snapshot().item(&id).is_none() {
        return Err(CommandError::UnknownLine(item_id.to_owned()));
    }

    if ctx.store.set_quantity(&id, quantity) {
        tracing::info!(item_id, quantity, "Quantity updated");
    }
    show(ctx)
}

/// Remove a line.
pub fn remove(ctx: &Context, item_id: &str) -> Result<(), CommandError> {
    if !ctx.store.remove_item(&LineItemId::new(item_id)) {
        return Err(CommandError::UnknownLine(item_id.to_owned()));
    }

    tracing::info!(item_id, "Removed from cart");
    show(ctx)
}

/// Empty the cart.
pub fn clear(ctx: &Context) -> Result<(), CommandError> {
    if ctx.store.clear() {
        tracing::info!("Cart cleared");
    } else {
        tracing::info!("Cart already empty");
    }
    Ok(())
}

/// Write a human-readable cart summary.
pub fn render(out: &mut impl Write, cart: &Cart) -> std::io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty");
    }

    for item in &cart.items {
        writeln!(
            out,
            "{:<40} {:>3} x {:>8.2} = {:>9.2}  [{}]",
            item.title,
            item.quantity,
            item.unit_price,
            item.line_total(),
            item.id
        )?;
    }

    let totals = &cart.totals;
    writeln!(out)?;
    writeln!(out, "Items:    {:>9}", totals.item_count)?;
    writeln!(out, "Subtotal: {:>9.2}", totals.subtotal)?;
    writeln!(out, "  of which VAT {:.2}", totals.tax)?;
    writeln!(out, "Shipping: {:>9.2}", totals.shipping)?;
    writeln!(out, "Total:    {:>9.2}", totals.total)
}

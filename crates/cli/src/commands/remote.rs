//! Commands that talk to Shopify.

use std::io::Write;

use storefront_cart::{AppError, SyncOutcome};

use super::{CommandError, Context};

/// Push the cart to Shopify.
///
/// A failed sync is reported but does not fail the command; the local
/// cart stays usable.
pub async fn sync(ctx: &Context) -> Result<(), CommandError> {
    match ctx.remote()?.sync.sync_with_remote().await {
        SyncOutcome::SkippedEmpty => tracing::info!("Cart is empty, nothing to sync"),
        SyncOutcome::Created(id) => tracing::info!(remote_id = %id, "Remote cart created"),
        SyncOutcome::Updated(id) => tracing::info!(remote_id = %id, "Remote cart updated"),
        SyncOutcome::Failed(reason) => {
            tracing::warn!(%reason, "Sync failed; cart saved locally");
        }
    }
    Ok(())
}

/// Push the cart after a local edit.
///
/// Without Shopify credentials the edit stays local and only a warning is
/// logged.
pub async fn sync_after_edit(ctx: &Context) -> Result<(), CommandError> {
    match ctx.remote() {
        Ok(_) => sync(ctx).await,
        Err(e) => {
            tracing::warn!("Skipping sync: {e}");
            Ok(())
        }
    }
}

/// Sync and print the checkout URL.
pub async fn checkout(ctx: &Context) -> Result<(), CommandError> {
    let url = ctx.remote()?.sync.checkout().await.map_err(AppError::from)?;
    writeln!(std::io::stdout().lock(), "{url}")?;
    Ok(())
}

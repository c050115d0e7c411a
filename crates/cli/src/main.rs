//! Storefront cart CLI - inspect and drive the local cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart and its totals
//! cart-cli show
//!
//! # Add two of a product's default variant
//! cart-cli add pineapple-socks -q 2
//!
//! # Change a line's quantity (0 removes it)
//! cart-cli set <item-id> 3
//!
//! # Push the cart to Shopify and print the checkout URL
//! cart-cli checkout
//! ```
//!
//! Mutating commands sync the cart to Shopify afterwards unless
//! `--offline` is given. `show`, `set`, `remove` and `clear` work without
//! Shopify credentials.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use storefront_cart::config::CartConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CommandError, Context};

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Storefront cart CLI")]
struct Cli {
    /// Skip syncing to Shopify after local changes
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cart lines and totals
    Show,
    /// Add a product by handle
    Add {
        /// Product handle
        handle: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Variant ID (defaults to the first available variant)
        #[arg(long)]
        variant: Option<String>,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Line item ID
        item_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Line item ID
        item_id: String,
    },
    /// Empty the cart
    Clear,
    /// Push the cart to Shopify
    Sync,
    /// Sync and print the checkout URL
    Checkout,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration is needed before tracing so Sentry can be wired in
    let config = CartConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_cart=info,storefront_cart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(CommandError::from(storefront_cart::AppError::from(e))),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), CommandError> {
    let ctx = Context::open(config)?;
    let sync_after = !cli.offline;

    match cli.command {
        Commands::Show => commands::cart::show(&ctx)?,
        Commands::Add {
            handle,
            quantity,
            variant,
        } => {
            commands::cart::add(&ctx, &handle, quantity, variant).await?;
            if sync_after {
                commands::remote::sync(&ctx).await?;
            }
        }
        Commands::Set { item_id, quantity } => {
            commands::cart::set(&ctx, &item_id, quantity)?;
            if sync_after {
                commands::remote::sync_after_edit(&ctx).await?;
            }
        }
        Commands::Remove { item_id } => {
            commands::cart::remove(&ctx, &item_id)?;
            if sync_after {
                commands::remote::sync_after_edit(&ctx).await?;
            }
        }
        Commands::Clear => commands::cart::clear(&ctx)?,
        Commands::Sync => commands::remote::sync(&ctx).await?,
        Commands::Checkout => commands::remote::checkout(&ctx).await?,
    }
    Ok(())
}

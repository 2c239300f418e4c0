//! OmniStore CLI - drive the storefront from a terminal.
//!
//! Commands:
//! - `omni catalog` - Browse products
//! - `omni otp` - Phone verification
//! - `omni account` - Register, log in and out
//! - `omni cart` - Manage the cart
//! - `omni checkout` - Turn the cart into an order
//! - `omni buy` - Order one product directly
//! - `omni orders` - Order history
//! - `omni config` - Inspect or create configuration
//!
//! State lives in a JSON file (`--data`, default `omnistore.json`). The
//! current session id is kept beside it so consecutive invocations act as
//! one visitor.

mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{AccountArgs, BuyArgs, CartArgs, CatalogArgs, CheckoutArgs, ConfigArgs, OtpArgs};

/// OmniStore CLI - browse, verify, shop and check out
#[derive(Parser)]
#[command(name = "omni")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Store file path
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Act as this session instead of the saved one
    #[arg(short, long, global = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Catalog(CatalogArgs),

    /// Verify a phone number with a one-time code
    Otp(OtpArgs),

    /// Manage the logged-in account
    Account(AccountArgs),

    /// Manage the cart
    Cart(CartArgs),

    /// Place an order for everything in the cart
    Checkout(CheckoutArgs),

    /// Order a single product without touching the cart
    Buy(BuyArgs),

    /// List past orders
    Orders,

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    let settings = context::Settings {
        config_path: cli.config,
        data: cli.data,
        session: cli.session,
        verbose: cli.verbose,
    };

    // Config commands never open the store.
    let command = match cli.command {
        Commands::Config(args) => {
            if let Err(e) = commands::config::run(args, &settings, &output) {
                output.error(&format!("{:#}", e));
                std::process::exit(1);
            }
            return Ok(());
        }
        command => command,
    };

    let ctx = match context::Context::load(&settings, output.clone()).await {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match command {
        Commands::Catalog(args) => commands::catalog::run(args, &ctx).await,
        Commands::Otp(args) => commands::otp::run(args, &ctx).await,
        Commands::Account(args) => commands::account::run(args, &ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Checkout(args) => commands::orders::checkout(args, &ctx).await,
        Commands::Buy(args) => commands::orders::buy(args, &ctx).await,
        Commands::Orders => commands::orders::list(&ctx).await,
        Commands::Config(_) => Ok(()),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

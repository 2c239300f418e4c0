//! CLI command implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod orders;
pub mod otp;

use std::path::PathBuf;

use clap::{Args, Subcommand};
use omni_core::omni_commerce::PaymentApp;

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List products.
    List {
        /// Only this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one product.
    Show {
        /// Product id, e.g. p1.
        product: String,
    },
    /// Search names, categories and descriptions.
    Search {
        /// Text to look for.
        query: String,
    },
}

/// Arguments for the otp command.
#[derive(Args)]
pub struct OtpArgs {
    #[command(subcommand)]
    pub command: OtpCommand,
}

#[derive(Subcommand)]
pub enum OtpCommand {
    /// Send a code to a phone.
    Send {
        /// 10-digit mobile number.
        phone: String,
    },
    /// Replace the code with a new one.
    Resend {
        /// 10-digit mobile number.
        phone: String,
    },
    /// Verify a received code.
    Verify {
        /// 10-digit mobile number.
        phone: String,
        /// The 6-digit code.
        code: String,
    },
}

/// Arguments for the account command.
#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Create an account and log in.
    Register {
        /// Display name.
        #[arg(short, long)]
        name: String,
        /// Email address.
        #[arg(short, long)]
        email: String,
        /// Password (at least 6 characters).
        #[arg(short, long)]
        password: String,
    },
    /// Log in.
    Login {
        /// Email address.
        #[arg(short, long)]
        email: String,
        /// Password.
        #[arg(short, long)]
        password: String,
    },
    /// Log out.
    Logout,
    /// Show the session state.
    Whoami,
    /// List registered customers (admin only).
    Customers,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart.
    Show,
    /// Add one unit of a product.
    Add {
        /// Product id.
        product: String,
    },
    /// Set a line's quantity; 0 removes it.
    Set {
        /// Product id.
        product: String,
        /// New quantity.
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line.
    Remove {
        /// Product id.
        product: String,
    },
    /// Empty the cart.
    Clear,
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Print a payment link for this app (phonepe, googlepay, paytm).
    #[arg(long, value_parser = parse_payment_app)]
    pub pay: Option<PaymentApp>,
}

/// Arguments for the buy command.
#[derive(Args)]
pub struct BuyArgs {
    /// Product id.
    pub product: String,

    /// Units to buy.
    #[arg(short, long, default_value = "1")]
    pub quantity: i64,

    /// Print a payment link for this app (phonepe, googlepay, paytm).
    #[arg(long, value_parser = parse_payment_app)]
    pub pay: Option<PaymentApp>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Write a default config file.
    Init {
        /// Where to write it.
        #[arg(default_value = "omnistore.toml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn parse_payment_app(s: &str) -> Result<PaymentApp, String> {
    s.parse::<PaymentApp>().map_err(|e| e.to_string())
}

//! Makrama CLI - upstream diagnostics for the storefront.
//!
//! The storefront owns no database, so the operational surface is the three
//! upstream APIs. This tool probes them with the same configuration and
//! clients the storefront itself uses.
//!
//! # Usage
//!
//! ```bash
//! # Probe all upstreams (Store API, v3 auth, Planet Pay, BLPaczka)
//! mk-cli check
//!
//! # Print an order
//! mk-cli order 1042
//!
//! # Print a payment's status
//! mk-cli payment PP-2024-000042
//!
//! # Refund 25.00 PLN of a payment (amount in grosze)
//! mk-cli refund PP-2024-000042 2500
//!
//! # Cancel an in-flight payment
//! mk-cli cancel PP-2024-000042
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mk-cli")]
#[command(author, version, about = "Makrama operational CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe all upstream APIs and report per-service status
    Check,
    /// Fetch and print a WooCommerce order
    Order {
        /// Order id
        id: i64,
    },
    /// Fetch and print a Planet Pay payment
    Payment {
        /// Payment id as issued by the gateway
        id: String,
    },
    /// Refund a payment, fully or partially
    Refund {
        /// Payment id as issued by the gateway
        id: String,
        /// Refund amount in minor units (grosze)
        amount: i64,
    },
    /// Cancel a payment that has not completed
    Cancel {
        /// Payment id as issued by the gateway
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check => commands::check::run().await?,
        Commands::Order { id } => commands::order::run(id).await?,
        Commands::Payment { id } => commands::payment::run(&id).await?,
        Commands::Refund { id, amount } => commands::refund::run(&id, amount).await?,
        Commands::Cancel { id } => commands::cancel::run(&id).await?,
    }
    Ok(())
}

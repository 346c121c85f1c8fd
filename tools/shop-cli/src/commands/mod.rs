//! CLI command implementations.

pub mod cart;
pub mod config;

use clap::{Args, Subcommand};
use shop_commerce::ProductId;

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Print only the number of units in the cart.
    #[arg(long)]
    pub count: bool,
}

/// Arguments for the add command.
#[derive(Args)]
pub struct AddArgs {
    /// Product to add.
    pub product_id: ProductId,
}

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Product to remove.
    pub product_id: ProductId,
}

/// Arguments for the update command.
#[derive(Args)]
pub struct UpdateArgs {
    /// Product to update.
    pub product_id: ProductId,

    /// New amount. Must be at least 1.
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new shop.toml in the current directory.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::db::PointOfSaleId;
use crate::import::InputFormat;

/// Import daily point of sale transaction exports into an encrypted sales database.
#[derive(Parser, Debug)]
pub struct Args {
    /// Location of the database file
    #[arg(long, env = "POS_SALES_DB", default_value = "pos_daily_sales.db", global = true)]
    pub db_path: PathBuf,

    /// Base64 encoded database key, see the generate-key command
    #[arg(long, env = "POS_SALES_DB_KEY", hide_env_values = true, global = true)]
    pub db_key: Option<String>,

    /// Seconds to wait for other writers before giving up on an import
    #[arg(long, env = "POS_SALES_COMMIT_MAX_WAIT", default_value_t = 30, global = true)]
    pub commit_max_wait_secs: u64,

    /// Seconds an import may spend writing the database before it's abandoned
    #[arg(long, env = "POS_SALES_COMMIT_TIMEOUT", default_value_t = 60, global = true)]
    pub commit_timeout_secs: u64,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a new random database key
    GenerateKey,

    /// Create a new, empty database file
    Init,

    /// Register a point of sale so its sales can be imported
    AddPointOfSale {
        id: PointOfSaleId,

        /// Display name, asked for interactively when missing
        #[arg(long)]
        name: Option<String>,
    },

    /// List all registered points of sale
    ListPointsOfSale,

    /// Import a transaction export. Nothing is imported if any check fails.
    Import {
        file: PathBuf,

        /// Input format, guessed from the file extension when missing
        #[arg(long, value_enum)]
        format: Option<InputFormat>,
    },

    /// Print the imported daily sales
    ListSales {
        #[arg(long)]
        point_of_sale: Option<PointOfSaleId>,
    },
}

pub fn parse() -> Args {
    Args::parse()
}

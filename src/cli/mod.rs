pub mod accounts;
pub mod auth;
pub mod balance;
pub mod categories;
pub mod import;
pub mod init;
pub mod institutions;
pub mod list;
pub mod seed;
pub mod status;
pub mod sync;
pub mod tx;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::core_sync::ensure_core_cloned;
use crate::db::{get_connection, open_with_schema};
use crate::error::Result;
use crate::models::CategoryType;
use crate::scope::{general_path, Scope};
use crate::settings::Settings;

/// Parses an optional scope argument, falling back to `default`.
pub(crate) fn parse_scope(raw: Option<&str>, default: Scope) -> Result<Scope> {
    match raw {
        Some(s) => s.parse(),
        None => Ok(default),
    }
}

/// Opens the database for `scope`, creating its schema and filling its core
/// tables from the general database the first time a period is touched.
pub(crate) fn open_scope(settings: &Settings, scope: Scope) -> Result<Connection> {
    let data_dir = settings.data_dir();
    let path = scope.path_in(&data_dir);
    if scope.is_general() {
        return open_with_schema(&path);
    }
    let general = general_path(&data_dir);
    if general.exists() {
        ensure_core_cloned(&general, &path)?;
    } else {
        tracing::warn!(%scope, "no general database yet; period opened without core rows");
    }
    open_with_schema(&path)
}

/// Opens the general database, creating its schema when missing.
pub(crate) fn open_general(settings: &Settings) -> Result<Connection> {
    open_with_schema(&general_path(&settings.data_dir()))
}

/// Opens an existing period database without creating it.
pub(crate) fn open_existing(settings: &Settings, scope: Scope) -> Result<Option<Connection>> {
    let path = scope.path_in(&settings.data_dir());
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(get_connection(&path)?))
}

#[derive(Parser)]
#[command(
    name = "finanza",
    version,
    about = "Personal-finance ledger over per-period SQLite databases."
)]
pub struct Cli {
    /// Data directory holding general.db and the period databases
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and the general database, and remember it.
    Init,
    /// Manage institutions (general database).
    Institutions {
        #[command(subcommand)]
        command: InstitutionsCommands,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Show the accounts and categories of a scope.
    List {
        /// general, YYYY or YYYY-MM (default: general)
        scope: Option<String>,
    },
    /// Copy institutions, accounts and categories from general.db into period databases.
    Sync {
        /// YYYY or YYYY-MM (default: every period database)
        scope: Option<String>,
        /// Copy even when the target already has accounts (only missing ids are added)
        #[arg(long)]
        force: bool,
    },
    /// Load default rows.
    Seed {
        #[command(subcommand)]
        command: SeedCommands,
    },
    /// Record, list and delete transactions.
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },
    /// Balance per account for a scope.
    Balance {
        /// general, YYYY or YYYY-MM (default: current month)
        scope: Option<String>,
    },
    /// Import transactions from a CSV/XLSX file.
    Import {
        /// Path to CSV or XLSX file
        file: String,
        /// Target scope: YYYY or YYYY-MM
        #[arg(long)]
        scope: String,
        /// Institution (name or id) for accounts created by the import
        #[arg(long)]
        institution: String,
        /// Sheet name (XLSX only; default: first sheet)
        #[arg(long)]
        sheet: Option<String>,
        /// Zero-based row holding the column headers
        #[arg(long = "header-row", default_value = "0")]
        header_row: usize,
        /// Override a guessed column: role=column (date, account, description, amount, currency)
        #[arg(long = "map")]
        map: Vec<String>,
        /// Account for rows without an account column
        #[arg(long)]
        account: Option<String>,
        /// Currency for rows without a currency column
        #[arg(long)]
        currency: Option<String>,
    },
    /// Register, confirm and log in users.
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show the data directory, databases and row counts.
    Status,
}

#[derive(Subcommand)]
pub enum InstitutionsCommands {
    /// Add an institution.
    Add {
        name: String,
        /// Short alias, e.g. BNA
        #[arg(long)]
        alias: Option<String>,
    },
    /// List institutions.
    List,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add an account to the general database.
    Add {
        /// Account name, e.g. 'Caja'
        name: String,
        /// Institution name or id
        #[arg(long)]
        institution: String,
        /// Currency code (default: settings default_currency)
        #[arg(long)]
        currency: Option<String>,
        /// Account type, e.g. wallet, checking, savings
        #[arg(long = "type", default_value = "wallet")]
        account_type: String,
        /// Display position stored in the account metadata
        #[arg(long)]
        position: Option<i64>,
    },
    /// Rename every account called OLD in the general database.
    Rename { old: String, new: String },
    /// Delete every account called NAME from the general database.
    Delete { name: String },
    /// List accounts of a scope.
    List {
        /// general, YYYY or YYYY-MM (default: general)
        scope: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category to the general database.
    Add {
        name: String,
        /// IN or OUT
        #[arg(long = "type")]
        category_type: Option<CategoryType>,
    },
    /// Rename every category called OLD.
    Rename { old: String, new: String },
    /// Delete every category called NAME.
    Delete { name: String },
    /// List categories of a scope.
    List {
        /// general, YYYY or YYYY-MM (default: general)
        scope: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SeedCommands {
    /// Default institution, account and categories in the general database.
    General,
    /// Create a year and month database and fill their core tables.
    Scope {
        /// Year (default: current)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (default: current)
        #[arg(long)]
        month: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Record a transaction.
    Add {
        /// Account name
        #[arg(long)]
        account: String,
        /// Amount; negative for outflows. Accepts 1.234,56 and 1,234.56
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Currency (default: the account's currency)
        #[arg(long)]
        currency: Option<String>,
        /// YYYY or YYYY-MM (default: current month)
        #[arg(long)]
        scope: Option<String>,
    },
    /// List the latest transactions of a scope.
    List {
        /// general, YYYY or YYYY-MM (default: current month)
        scope: Option<String>,
    },
    /// Delete a transaction (it stays in the file, hidden from lists and balances).
    Delete {
        id: i64,
        /// YYYY or YYYY-MM (default: current month)
        #[arg(long)]
        scope: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Register a user; prints the confirmation token.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Read the password from the first line of stdin instead of prompting
        #[arg(long = "password-stdin")]
        password_stdin: bool,
    },
    /// Activate the account a confirmation token belongs to.
    Confirm { token: String },
    /// Check credentials.
    Login {
        #[arg(long)]
        email: String,
        /// Read the password from the first line of stdin instead of prompting
        #[arg(long = "password-stdin")]
        password_stdin: bool,
    },
}

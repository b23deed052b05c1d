mod auth;
mod cli;
mod core_sync;
mod db;
mod error;
mod fmt;
mod importer;
mod ledger;
mod models;
mod scope;
mod seed;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{
    AccountsCommands, AuthCommands, CategoriesCommands, Cli, Commands, InstitutionsCommands,
    SeedCommands, TxCommands,
};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = settings::resolve(cli.data_dir.as_deref());
    tracing::debug!(data_dir = %settings.data_dir, "settings resolved");

    let result = match cli.command {
        Commands::Init => cli::init::run(&settings),
        Commands::Institutions { command } => match command {
            InstitutionsCommands::Add { name, alias } => {
                cli::institutions::add(&settings, &name, alias.as_deref())
            }
            InstitutionsCommands::List => cli::institutions::list(&settings),
        },
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                institution,
                currency,
                account_type,
                position,
            } => cli::accounts::add(
                &settings,
                &name,
                &institution,
                &account_type,
                currency.as_deref(),
                position,
            ),
            AccountsCommands::Rename { old, new } => cli::accounts::rename(&settings, &old, &new),
            AccountsCommands::Delete { name } => cli::accounts::delete(&settings, &name),
            AccountsCommands::List { scope } => cli::accounts::list(&settings, scope.as_deref()),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add {
                name,
                category_type,
            } => cli::categories::add(&settings, &name, category_type),
            CategoriesCommands::Rename { old, new } => {
                cli::categories::rename(&settings, &old, &new)
            }
            CategoriesCommands::Delete { name } => cli::categories::delete(&settings, &name),
            CategoriesCommands::List { scope } => {
                cli::categories::list(&settings, scope.as_deref())
            }
        },
        Commands::List { scope } => cli::list::run(&settings, scope.as_deref()),
        Commands::Sync { scope, force } => cli::sync::run(&settings, scope.as_deref(), force),
        Commands::Seed { command } => match command {
            SeedCommands::General => cli::seed::general(&settings),
            SeedCommands::Scope { year, month } => cli::seed::scope(&settings, year, month),
        },
        Commands::Tx { command } => match command {
            TxCommands::Add {
                account,
                amount,
                date,
                description,
                category,
                currency,
                scope,
            } => cli::tx::add(
                &settings,
                scope.as_deref(),
                cli::tx::NewTransaction {
                    account: &account,
                    amount: &amount,
                    date: date.as_deref(),
                    description: &description,
                    category: category.as_deref(),
                    currency: currency.as_deref(),
                },
            ),
            TxCommands::List { scope } => cli::tx::list(&settings, scope.as_deref()),
            TxCommands::Delete { id, scope } => cli::tx::delete(&settings, id, scope.as_deref()),
        },
        Commands::Balance { scope } => cli::balance::run(&settings, scope.as_deref()),
        Commands::Import {
            file,
            scope,
            institution,
            sheet,
            header_row,
            map,
            account,
            currency,
        } => cli::import::run(
            &settings,
            cli::import::ImportArgs {
                file: &file,
                scope: &scope,
                institution: &institution,
                sheet: sheet.as_deref(),
                header_row,
                map: &map,
                account: account.as_deref(),
                currency: currency.as_deref(),
            },
        ),
        Commands::Auth { command } => match command {
            AuthCommands::Register {
                name,
                email,
                password_stdin,
            } => cli::auth::register(&settings, &name, &email, password_stdin),
            AuthCommands::Confirm { token } => cli::auth::confirm(&settings, &token),
            AuthCommands::Login {
                email,
                password_stdin,
            } => cli::auth::login(&settings, &email, password_stdin),
        },
        Commands::Status => cli::status::run(&settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

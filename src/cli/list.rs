use crate::cli::accounts::print_accounts;
use crate::cli::categories::print_categories;
use crate::cli::{open_existing, parse_scope};
use crate::error::Result;
use crate::scope::Scope;
use crate::settings::Settings;

pub fn run(settings: &Settings, scope: Option<&str>) -> Result<()> {
    let scope = parse_scope(scope, Scope::General)?;
    let Some(conn) = open_existing(settings, scope)? else {
        println!("No database for {scope} yet.");
        return Ok(());
    };
    print_accounts(&conn, scope)?;
    println!();
    print_categories(&conn, scope)
}

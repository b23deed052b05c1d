use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_existing, parse_scope};
use crate::error::Result;
use crate::fmt::money;
use crate::ledger::{balances_by_account, total_balance};
use crate::scope::Scope;
use crate::settings::Settings;

pub fn run(settings: &Settings, scope: Option<&str>) -> Result<()> {
    let scope = parse_scope(scope, Scope::current_month())?;
    let Some(conn) = open_existing(settings, scope)? else {
        println!("No database for {scope} yet.");
        return Ok(());
    };

    let balances = balances_by_account(&conn)?;
    let mut table = Table::new();
    table.set_header(vec!["Account", "Balance"]);
    for b in &balances {
        table.add_row(vec![
            Cell::new(&b.name),
            Cell::new(money(b.balance, &b.currency)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Balance ({scope})\n{table}");

    // Mixed currencies are summed as-is.
    let total = total_balance(&conn)?;
    println!("Total: {}", money(total, &settings.default_currency));
    Ok(())
}

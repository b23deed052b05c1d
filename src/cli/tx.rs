use comfy_table::{Cell, CellAlignment, Color, Table};

use crate::cli::{open_existing, open_scope, parse_scope};
use crate::error::{FinanzaError, Result};
use crate::fmt::money;
use crate::importer::{parse_amount, parse_date};
use crate::ledger::{
    account_id_by_name, add_transaction, category_id_by_name, list_recent, soft_delete, RECENT_LIMIT,
};
use crate::models::Transaction;
use crate::scope::Scope;
use crate::settings::Settings;

pub struct NewTransaction<'a> {
    pub account: &'a str,
    pub amount: &'a str,
    pub date: Option<&'a str>,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub currency: Option<&'a str>,
}

pub fn add(settings: &Settings, scope: Option<&str>, new: NewTransaction<'_>) -> Result<()> {
    let scope = parse_scope(scope, Scope::current_month())?;
    if scope.is_general() {
        return Err(FinanzaError::Other(
            "transactions are recorded in YYYY or YYYY-MM databases".into(),
        ));
    }

    let amount = parse_amount(new.amount)?;
    let posted_at = match new.date {
        Some(raw) => parse_date(raw).ok_or_else(|| FinanzaError::Other(format!("Invalid date: {raw}")))?,
        None => chrono::Local::now().format("%Y-%m-%d").to_string(),
    };

    let conn = open_scope(settings, scope)?;
    let account_id = account_id_by_name(&conn, new.account)?;
    let category_id = new
        .category
        .map(|name| category_id_by_name(&conn, name))
        .transpose()?;
    let currency = match new.currency {
        Some(c) => c.to_string(),
        None => conn.query_row("SELECT currency FROM account WHERE id = ?1", [account_id], |row| {
            row.get(0)
        })?,
    };

    let txn = Transaction {
        id: None,
        account_id,
        category_id,
        posted_at,
        description: new.description.to_string(),
        amount,
        currency,
        deleted_at: None,
    };
    let id = add_transaction(&conn, &txn)?;
    println!(
        "✔ Recorded #{id} in {scope}: {} {} on {}",
        new.account,
        money(txn.amount, &txn.currency),
        txn.posted_at
    );
    Ok(())
}

pub fn list(settings: &Settings, scope: Option<&str>) -> Result<()> {
    let scope = parse_scope(scope, Scope::current_month())?;
    let Some(conn) = open_existing(settings, scope)? else {
        println!("No database for {scope} yet.");
        return Ok(());
    };
    let rows = list_recent(&conn)?;
    if rows.is_empty() {
        println!("No transactions in {scope}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Account", "Description", "Category", "Amount"]);
    for row in &rows {
        let color = if row.amount < 0.0 { Color::Red } else { Color::Green };
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(&row.posted_at),
            Cell::new(&row.account_name),
            Cell::new(&row.description),
            Cell::new(row.category_name.as_deref().unwrap_or("")),
            Cell::new(money(row.amount, &row.currency))
                .fg(color)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Transactions ({scope})\n{table}");
    if rows.len() as i64 == RECENT_LIMIT {
        println!("Showing the latest {RECENT_LIMIT}.");
    }
    Ok(())
}

pub fn delete(settings: &Settings, id: i64, scope: Option<&str>) -> Result<()> {
    let scope = parse_scope(scope, Scope::current_month())?;
    let Some(conn) = open_existing(settings, scope)? else {
        return Err(FinanzaError::Other(format!("No database for {scope}")));
    };
    if soft_delete(&conn, id)? {
        println!("✔ Deleted transaction #{id} from {scope}");
    } else {
        println!("No transaction #{id} in {scope}.");
    }
    Ok(())
}

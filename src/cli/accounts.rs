use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::cli::institutions::resolve_institution;
use crate::cli::{open_existing, open_general, parse_scope};
use crate::error::{FinanzaError, Result};
use crate::models::Account;
use crate::scope::Scope;
use crate::settings::Settings;

/// Accounts with their institution name, ordered by metadata position then
/// name.
pub fn list_accounts(conn: &Connection) -> Result<Vec<(Account, Option<String>)>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.institution_id, a.name, a.type, a.currency, a.metadata, i.name \
         FROM account a LEFT JOIN institution i ON i.id = a.institution_id \
         ORDER BY COALESCE(json_extract(a.metadata, '$.position'), 999999999), a.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                Account {
                    id: row.get(0)?,
                    institution_id: row.get(1)?,
                    name: row.get(2)?,
                    account_type: row.get(3)?,
                    currency: row.get(4)?,
                    metadata: row.get(5)?,
                },
                row.get(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn add_account(
    conn: &Connection,
    institution_id: i64,
    name: &str,
    account_type: &str,
    currency: &str,
    position: Option<i64>,
) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(FinanzaError::Other("Name is required".into()));
    }
    let metadata = position.map(|p| serde_json::json!({ "position": p }).to_string());
    conn.execute(
        "INSERT INTO account (institution_id, name, type, currency, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![institution_id, name.trim(), account_type, currency, metadata],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Renames every account called `old`. Returns the number of rows changed.
pub fn rename_account(conn: &Connection, old: &str, new: &str) -> Result<usize> {
    if new.trim().is_empty() {
        return Err(FinanzaError::Other("Name is required".into()));
    }
    Ok(conn.execute("UPDATE account SET name = ?1 WHERE name = ?2", [new.trim(), old])?)
}

/// Deletes every account called `name`. Returns the number of rows removed.
pub fn delete_account(conn: &Connection, name: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM account WHERE name = ?1", [name])?)
}

pub fn add(
    settings: &Settings,
    name: &str,
    institution: &str,
    account_type: &str,
    currency: Option<&str>,
    position: Option<i64>,
) -> Result<()> {
    let conn = open_general(settings)?;
    let institution_id = resolve_institution(&conn, institution)?;
    let currency = currency.unwrap_or(&settings.default_currency);
    let id = add_account(&conn, institution_id, name, account_type, currency, position)?;
    println!("✔ Added account: {name} ({account_type}, {currency}) id {id}");
    Ok(())
}

pub fn rename(settings: &Settings, old: &str, new: &str) -> Result<()> {
    let conn = open_general(settings)?;
    match rename_account(&conn, old, new)? {
        0 => println!("No account named '{old}'."),
        n => println!("✔ Renamed {n} account(s): {old} → {new}"),
    }
    Ok(())
}

pub fn delete(settings: &Settings, name: &str) -> Result<()> {
    let conn = open_general(settings)?;
    match delete_account(&conn, name)? {
        0 => println!("No account named '{name}'."),
        n => println!("✔ Deleted {n} account(s) named '{name}'"),
    }
    Ok(())
}

pub fn list(settings: &Settings, scope: Option<&str>) -> Result<()> {
    let scope = parse_scope(scope, Scope::General)?;
    let Some(conn) = open_existing(settings, scope)? else {
        println!("No database for {scope} yet.");
        return Ok(());
    };
    print_accounts(&conn, scope)
}

pub(crate) fn print_accounts(conn: &Connection, scope: Scope) -> Result<()> {
    let rows = list_accounts(conn)?;
    if rows.is_empty() {
        println!("No accounts in {scope}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Currency", "Institution"]);
    for (acct, inst) in rows {
        table.add_row(vec![
            Cell::new(acct.id),
            Cell::new(acct.name),
            Cell::new(acct.account_type),
            Cell::new(acct.currency),
            Cell::new(inst.unwrap_or_default()),
        ]);
    }
    println!("Accounts ({scope})\n{table}");
    Ok(())
}

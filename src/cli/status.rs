use std::path::Path;

use comfy_table::{Cell, Table};

use crate::auth::{JsonFileRepository, UserStore};
use crate::db::{count_rows, get_connection, has_core_tables};
use crate::error::Result;
use crate::scope::{general_path, period_files};
use crate::settings::Settings;

fn counts(path: &Path) -> Result<Option<(i64, i64, i64)>> {
    if !has_core_tables(path)? {
        return Ok(None);
    }
    let conn = get_connection(path)?;
    let accounts = count_rows(&conn, "account")?;
    let categories = count_rows(&conn, "category")?;
    let transactions: i64 = conn.query_row(
        "SELECT count(*) FROM transactions WHERE deleted_at IS NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(Some((accounts, categories, transactions)))
}

pub fn run(settings: &Settings) -> Result<()> {
    let data_dir = settings.data_dir();
    let general = general_path(&data_dir);

    println!("Data dir:   {}", data_dir.display());
    println!("Currency:   {}", settings.default_currency);
    println!("Users file: {}", settings.users_path().display());

    if !general.exists() {
        println!();
        println!("General database not found. Run `finanza init` to set up.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Database", "Accounts", "Categories", "Transactions"]);
    let mut files = vec![general];
    files.extend(period_files(&data_dir)?);
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match counts(&path)? {
            Some((accounts, categories, transactions)) => table.add_row(vec![
                Cell::new(name),
                Cell::new(accounts),
                Cell::new(categories),
                Cell::new(transactions),
            ]),
            None => table.add_row(vec![
                Cell::new(name),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
            ]),
        };
    }
    println!();
    println!("{table}");

    let store = UserStore::open(JsonFileRepository::new(&settings.users_path()))?;
    println!("Users:      {}", store.user_count());
    Ok(())
}

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS institution (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    alias TEXT
);

CREATE TABLE IF NOT EXISTS account (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    institution_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    currency TEXT NOT NULL DEFAULT 'ARS',
    metadata TEXT,
    FOREIGN KEY (institution_id) REFERENCES institution(id)
);

CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('IN', 'OUT')),
    UNIQUE (name, type)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL,
    category_id INTEGER,
    posted_at TEXT NOT NULL,
    description TEXT DEFAULT '',
    amount REAL NOT NULL,
    currency TEXT NOT NULL DEFAULT 'ARS',
    deleted_at TEXT DEFAULT NULL,
    FOREIGN KEY (account_id) REFERENCES account(id),
    FOREIGN KEY (category_id) REFERENCES category(id)
);

CREATE VIEW IF NOT EXISTS v_balance_por_cuenta AS
SELECT a.id AS account_id, a.name AS account_name, a.currency,
       IFNULL(SUM(CASE WHEN t.deleted_at IS NULL THEN t.amount ELSE 0 END), 0) AS balance
FROM account a
LEFT JOIN transactions t ON t.account_id = a.id
GROUP BY a.id, a.name, a.currency;
";

pub const CORE_TABLES: [&str; 3] = ["institution", "account", "category"];

/// Opens `db_path` with the busy timeout and WAL journaling every caller shares.
/// Foreign keys stay unenforced: replicated rows may reference ids the period
/// database does not hold.
pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=OFF;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Creates the tables and the balance view in `path`, and any missing parent
/// directories. Existing tables are left untouched even if their shape differs.
pub fn ensure_schema(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = get_connection(path)?;
    init_db(&conn)
}

/// Opens `path` after making sure its schema exists.
pub fn open_with_schema(path: &Path) -> Result<Connection> {
    ensure_schema(path)?;
    get_connection(path)
}

pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

/// True when institution, account and category all exist in `path`.
pub fn has_core_tables(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let conn = get_connection(path)?;
    let tables = table_names(&conn)?;
    Ok(CORE_TABLES.iter().all(|t| tables.iter().any(|n| n == t)))
}

pub fn has_view(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'view' AND name = ?1")?;
    Ok(stmt.exists([name])?)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    debug_assert!(table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    let count = conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count)
}

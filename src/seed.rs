use std::path::Path;

use crate::core_sync::{ensure_core_cloned, SyncOutcome};
use crate::db::{ensure_schema, get_connection, has_core_tables};
use crate::error::Result;
use crate::scope::{general_path, Scope};

pub const DEFAULT_INSTITUTION: (&str, &str) = ("Genérica", "GEN");
pub const DEFAULT_ACCOUNT: &str = "General";
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[("Sueldo", "IN"), ("Comida", "OUT")];

/// Default institution, wallet account and two categories in the general
/// database. Safe to run repeatedly.
pub fn seed_general(data_dir: &Path) -> Result<i64> {
    let path = general_path(data_dir);
    ensure_schema(&path)?;
    let conn = get_connection(&path)?;

    let (name, alias) = DEFAULT_INSTITUTION;
    conn.execute(
        "INSERT OR IGNORE INTO institution (name, alias) VALUES (?1, ?2)",
        [name, alias],
    )?;
    let institution_id: i64 =
        conn.query_row("SELECT id FROM institution WHERE name = ?1", [name], |row| row.get(0))?;

    let has_account: bool = conn
        .prepare("SELECT 1 FROM account WHERE name = ?1")?
        .exists([DEFAULT_ACCOUNT])?;
    if !has_account {
        conn.execute(
            "INSERT INTO account (institution_id, name, type, currency, metadata) VALUES (?1, ?2, 'wallet', 'ARS', ?3)",
            rusqlite::params![institution_id, DEFAULT_ACCOUNT, r#"{"position": 1}"#],
        )?;
    }

    for (cat, kind) in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO category (name, type) VALUES (?1, ?2)",
            [cat, kind],
        )?;
    }

    tracing::info!(db = %path.display(), institution_id, "general database seeded");
    Ok(institution_id)
}

/// Creates the year and month databases for `year`/`month` and fills their
/// core tables from the general database when they have none yet.
pub fn seed_scope(data_dir: &Path, year: i32, month: u32) -> Result<Vec<(Scope, SyncOutcome)>> {
    let general = general_path(data_dir);
    ensure_schema(&general)?;

    let mut done = Vec::new();
    for scope in [Scope::Year(year), Scope::Month(year, month)] {
        let path = scope.path_in(data_dir);
        let had_core = has_core_tables(&path)?;
        ensure_schema(&path)?;
        let outcome = ensure_core_cloned(&general, &path)?;
        tracing::debug!(%scope, had_core, ?outcome, "period database ready");
        done.push((scope, outcome));
    }
    Ok(done)
}

//! Replication of the core tables (institution, account, category) from the
//! general database into period-scoped databases.
//!
//! Rows are copied with their general-database ids through `INSERT OR IGNORE`,
//! so a row whose id already exists in the target is skipped, never updated.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::db::{count_rows, ensure_schema, get_connection};
use crate::error::{FinanzaError, Result};
use crate::scope::{general_path, period_files};

const GENERAL_ALIAS: &str = "gen";

const COPY_INSTITUTIONS: &str = "INSERT OR IGNORE INTO institution (id, name, alias) \
     SELECT id, name, alias FROM gen.institution";

const COPY_ACCOUNTS: &str =
    "INSERT OR IGNORE INTO account (id, institution_id, name, type, currency, metadata) \
     SELECT id, institution_id, name, type, currency, metadata FROM gen.account";

const COPY_CATEGORIES: &str = "INSERT OR IGNORE INTO category (id, name, type) \
     SELECT id, name, type FROM gen.category";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The target already had accounts; nothing was copied.
    AlreadyPopulated,
    /// Rows actually inserted into the target, per table.
    Copied {
        institutions: usize,
        accounts: usize,
        categories: usize,
    },
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub path: PathBuf,
    pub outcome: SyncOutcome,
}

/// Copies the core tables into `target` unless it already holds at least one
/// account.
///
/// A non-empty `account` table is the only "already synced" signal: a target
/// that has accounts will not receive categories or accounts added to the
/// general database afterwards. Use [`sync_core_from_general`] to push those.
pub fn ensure_core_cloned(general: &Path, target: &Path) -> Result<SyncOutcome> {
    replicate(general, target, true)
}

/// Copies the core tables into `target` regardless of what it already holds.
pub fn sync_core_from_general(general: &Path, target: &Path) -> Result<SyncOutcome> {
    replicate(general, target, false)
}

/// Replicates into every period database under `data_dir`, skipping the
/// general database itself. Stops at the first failing file.
pub fn sync_all(data_dir: &Path, force: bool) -> Result<Vec<SyncReport>> {
    let general = general_path(data_dir);
    ensure_schema(&general)?;

    let mut reports = Vec::new();
    for path in period_files(data_dir)? {
        let outcome = if force {
            sync_core_from_general(&general, &path)?
        } else {
            ensure_core_cloned(&general, &path)?
        };
        reports.push(SyncReport { path, outcome });
    }
    tracing::info!(files = reports.len(), force, "core sync finished");
    Ok(reports)
}

fn replicate(general: &Path, target: &Path, skip_if_populated: bool) -> Result<SyncOutcome> {
    if same_file(general, target) {
        return Err(FinanzaError::Other(format!(
            "Refusing to sync the general database into itself: {}",
            target.display()
        )));
    }
    if !general.exists() {
        return Err(FinanzaError::Other(format!(
            "General database not found at {}",
            general.display()
        )));
    }

    ensure_schema(target)?;
    let mut conn = get_connection(target)?;

    if skip_if_populated {
        let accounts = count_rows(&conn, "account")?;
        if accounts > 0 {
            tracing::info!(
                db = %target.display(),
                accounts,
                "target already has accounts; core rows added to general later are not copied"
            );
            return Ok(SyncOutcome::AlreadyPopulated);
        }
    }

    let copied = attach_and_copy(&mut conn, general);
    let detached = detach_general(&conn);
    let outcome = copied?;
    detached?;

    tracing::info!(db = %target.display(), ?outcome, "core tables replicated");
    Ok(outcome)
}

fn attach_and_copy(conn: &mut Connection, general: &Path) -> Result<SyncOutcome> {
    conn.execute(
        &format!("ATTACH DATABASE ?1 AS {GENERAL_ALIAS}"),
        [general.to_string_lossy().to_string()],
    )?;

    let tx = conn.transaction()?;
    let institutions = tx.execute(COPY_INSTITUTIONS, [])?;
    let accounts = tx.execute(COPY_ACCOUNTS, [])?;
    let categories = tx.execute(COPY_CATEGORIES, [])?;
    tx.commit()?;

    Ok(SyncOutcome::Copied {
        institutions,
        accounts,
        categories,
    })
}

/// Detaches the general alias. A missing alias (attach never happened or
/// already detached) is not an error; anything else is.
fn detach_general(conn: &Connection) -> Result<()> {
    match conn.execute(&format!("DETACH DATABASE {GENERAL_ALIAS}"), []) {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(_, Some(msg))) if msg.contains("no such database") => {
            tracing::debug!("{GENERAL_ALIAS} was not attached; nothing to detach");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

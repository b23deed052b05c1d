use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::cli::open_general;
use crate::error::{FinanzaError, Result};
use crate::models::Institution;
use crate::settings::Settings;

pub fn list_institutions(conn: &Connection) -> Result<Vec<Institution>> {
    let mut stmt = conn.prepare("SELECT id, name, alias FROM institution ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Institution {
                id: row.get(0)?,
                name: row.get(1)?,
                alias: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn add_institution(conn: &Connection, name: &str, alias: Option<&str>) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(FinanzaError::Other("Name is required".into()));
    }
    conn.execute(
        "INSERT INTO institution (name, alias) VALUES (?1, ?2)",
        rusqlite::params![name.trim(), alias],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            FinanzaError::Other(format!("Institution already exists: {name}"))
        }
        other => other.into(),
    })?;
    Ok(conn.last_insert_rowid())
}

/// Looks an institution up by id when `key` is numeric, otherwise by name or
/// alias (case-insensitive).
pub fn resolve_institution(conn: &Connection, key: &str) -> Result<i64> {
    let by_id = match key.trim().parse::<i64>() {
        Ok(id) => conn
            .prepare("SELECT id FROM institution WHERE id = ?1")?
            .query_row([id], |row| row.get::<_, i64>(0))
            .ok(),
        Err(_) => None,
    };
    if let Some(id) = by_id {
        return Ok(id);
    }
    conn.query_row(
        "SELECT id FROM institution WHERE lower(name) = lower(?1) OR lower(alias) = lower(?1) \
         ORDER BY id LIMIT 1",
        [key.trim()],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => FinanzaError::UnknownInstitution(key.to_string()),
        other => other.into(),
    })
}

pub fn add(settings: &Settings, name: &str, alias: Option<&str>) -> Result<()> {
    let conn = open_general(settings)?;
    let id = add_institution(&conn, name, alias)?;
    println!("✔ Added institution: {name} (id {id})");
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let conn = open_general(settings)?;
    let rows = list_institutions(&conn)?;
    if rows.is_empty() {
        println!("No institutions yet. Add one with `finanza institutions add NAME`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Alias"]);
    for inst in rows {
        table.add_row(vec![
            Cell::new(inst.id),
            Cell::new(inst.name),
            Cell::new(inst.alias.unwrap_or_default()),
        ]);
    }
    println!("Institutions\n{table}");
    Ok(())
}

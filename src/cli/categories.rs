use comfy_table::{Cell, Color, Table};
use rusqlite::Connection;

use crate::cli::{open_existing, open_general, parse_scope};
use crate::error::{FinanzaError, Result};
use crate::models::{Category, CategoryType};
use crate::scope::Scope;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created(i64),
    /// An identical (name, type) already exists.
    Exists,
    /// Insert without a type; `type` is NOT NULL so SQLite drops the row.
    NotCreated,
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type FROM category \
         ORDER BY CASE type WHEN 'IN' THEN 0 ELSE 1 END, name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                category_type: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Adds a category. Without a type the row is offered to SQLite as-is and
/// silently ignored; no type is guessed.
pub fn add_category(conn: &Connection, name: &str, category_type: Option<CategoryType>) -> Result<AddOutcome> {
    if name.trim().is_empty() {
        return Err(FinanzaError::Other("Name is required".into()));
    }
    let name = name.trim();
    let changed = match category_type {
        Some(t) => conn.execute(
            "INSERT OR IGNORE INTO category (name, type) VALUES (?1, ?2)",
            [name, t.as_str()],
        )?,
        None => conn.execute("INSERT OR IGNORE INTO category (name) VALUES (?1)", [name])?,
    };
    Ok(match (changed, category_type) {
        (0, None) => AddOutcome::NotCreated,
        (0, Some(_)) => AddOutcome::Exists,
        _ => AddOutcome::Created(conn.last_insert_rowid()),
    })
}

pub fn rename_category(conn: &Connection, old: &str, new: &str) -> Result<usize> {
    if new.trim().is_empty() {
        return Err(FinanzaError::Other("Name is required".into()));
    }
    Ok(conn.execute(
        "UPDATE OR IGNORE category SET name = ?1 WHERE name = ?2",
        [new.trim(), old],
    )?)
}

pub fn delete_category(conn: &Connection, name: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM category WHERE name = ?1", [name])?)
}

pub fn add(settings: &Settings, name: &str, category_type: Option<CategoryType>) -> Result<()> {
    let conn = open_general(settings)?;
    match add_category(&conn, name, category_type)? {
        AddOutcome::Created(id) => println!("✔ Added category: {name} (id {id})"),
        AddOutcome::Exists => println!("Category already exists: {name}"),
        AddOutcome::NotCreated => {
            tracing::warn!(category = name, "category without type was not stored");
            return Err(FinanzaError::Other(format!(
                "Category '{name}' was not created: pass --type IN or --type OUT"
            )));
        }
    }
    Ok(())
}

pub fn rename(settings: &Settings, old: &str, new: &str) -> Result<()> {
    let conn = open_general(settings)?;
    match rename_category(&conn, old, new)? {
        0 => println!("No category renamed ('{old}' missing or '{new}' already taken)."),
        n => println!("✔ Renamed {n} category(ies): {old} → {new}"),
    }
    Ok(())
}

pub fn delete(settings: &Settings, name: &str) -> Result<()> {
    let conn = open_general(settings)?;
    match delete_category(&conn, name)? {
        0 => println!("No category named '{name}'."),
        n => println!("✔ Deleted {n} category(ies) named '{name}'"),
    }
    Ok(())
}

pub fn list(settings: &Settings, scope: Option<&str>) -> Result<()> {
    let scope = parse_scope(scope, Scope::General)?;
    let Some(conn) = open_existing(settings, scope)? else {
        println!("No database for {scope} yet.");
        return Ok(());
    };
    print_categories(&conn, scope)
}

pub(crate) fn print_categories(conn: &Connection, scope: Scope) -> Result<()> {
    let rows = list_categories(conn)?;
    if rows.is_empty() {
        println!("No categories in {scope}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type"]);
    for cat in rows {
        let color = if cat.category_type == "IN" { Color::Green } else { Color::Red };
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(&cat.category_type).fg(color),
        ]);
    }
    println!("Categories ({scope})\n{table}");
    Ok(())
}

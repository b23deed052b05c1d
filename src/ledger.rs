use rusqlite::Connection;

use crate::db::has_view;
use crate::error::{FinanzaError, Result};
use crate::models::Transaction;

pub const RECENT_LIMIT: i64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: i64,
    pub posted_at: String,
    pub description: String,
    pub amount: f64,
    pub currency: String,
    pub account_name: String,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub balance: f64,
    pub metadata: Option<String>,
}

pub fn account_id_by_name(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM account WHERE name = ?1 ORDER BY id LIMIT 1",
        [name],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => FinanzaError::UnknownAccount(name.to_string()),
        other => other.into(),
    })
}

pub fn category_id_by_name(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM category WHERE name = ?1 ORDER BY id LIMIT 1",
        [name],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            FinanzaError::Other(format!("Unknown category: {name}"))
        }
        other => other.into(),
    })
}

pub fn add_transaction(conn: &Connection, txn: &Transaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (account_id, category_id, posted_at, description, amount, currency) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            txn.account_id,
            txn.category_id,
            txn.posted_at,
            txn.description,
            txn.amount,
            txn.currency,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Marks a transaction deleted. Returns false when it does not exist or is
/// already deleted.
pub fn soft_delete(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE transactions SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        [id],
    )?;
    Ok(changed > 0)
}

/// The latest transactions (newest first) with their account name.
pub fn list_recent(conn: &Connection) -> Result<Vec<TransactionRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.posted_at, t.description, t.amount, t.currency, a.name, c.name \
         FROM transactions t \
         JOIN account a ON a.id = t.account_id \
         LEFT JOIN category c ON c.id = t.category_id \
         WHERE t.deleted_at IS NULL \
         ORDER BY t.posted_at DESC, t.id DESC \
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([RECENT_LIMIT], |row| {
            Ok(TransactionRow {
                id: row.get(0)?,
                posted_at: row.get(1)?,
                description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                amount: row.get(3)?,
                currency: row.get(4)?,
                account_name: row.get(5)?,
                category_name: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Balance per account, from the balance view when present, otherwise summed
/// directly. Soft-deleted transactions never count.
pub fn balances_by_account(conn: &Connection) -> Result<Vec<AccountBalance>> {
    let sql = if has_view(conn, "v_balance_por_cuenta")? {
        "SELECT a.id, a.name, a.currency, COALESCE(v.balance, 0), a.metadata \
         FROM account a \
         LEFT JOIN v_balance_por_cuenta v ON v.account_id = a.id \
         ORDER BY a.name"
    } else {
        "SELECT a.id, a.name, a.currency, \
                COALESCE(SUM(CASE WHEN t.deleted_at IS NULL THEN t.amount ELSE 0 END), 0), \
                a.metadata \
         FROM account a \
         LEFT JOIN transactions t ON t.account_id = a.id \
         GROUP BY a.id, a.name, a.currency, a.metadata \
         ORDER BY a.name"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AccountBalance {
                id: row.get(0)?,
                name: row.get(1)?,
                currency: row.get(2)?,
                balance: row.get(3)?,
                metadata: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn total_balance(conn: &Connection) -> Result<f64> {
    let total: Option<f64> = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE deleted_at IS NULL",
        [],
        |row| row.get(0),
    )?;
    Ok(total.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("2025-01.db")).unwrap();
        init_db(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO institution (id, name) VALUES (1, 'Genérica');
             INSERT INTO account (id, institution_id, name, type) VALUES (1, 1, 'Caja', 'wallet');
             INSERT INTO account (id, institution_id, name, type, currency) VALUES (2, 1, 'Banco', 'checking', 'USD');
             INSERT INTO category (id, name, type) VALUES (1, 'Comida', 'OUT');",
        )
        .unwrap();
        (dir, conn)
    }

    fn txn(account_id: i64, date: &str, amount: f64) -> Transaction {
        Transaction {
            id: None,
            account_id,
            category_id: None,
            posted_at: date.to_string(),
            description: format!("mov {date}"),
            amount,
            currency: "ARS".to_string(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_list_recent_newest_first() {
        let (_dir, conn) = test_db();
        add_transaction(&conn, &txn(1, "2025-01-05", -10.0)).unwrap();
        add_transaction(&conn, &txn(1, "2025-01-20", 200.0)).unwrap();
        let id = add_transaction(
            &conn,
            &Transaction {
                category_id: Some(1),
                ..txn(2, "2025-01-10", -5.0)
            },
        )
        .unwrap();

        let rows = list_recent(&conn).unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.posted_at.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-20", "2025-01-10", "2025-01-05"]);
        let banco = rows.iter().find(|r| r.id == id).unwrap();
        assert_eq!(banco.account_name, "Banco");
        assert_eq!(banco.category_name.as_deref(), Some("Comida"));
    }

    #[test]
    fn test_soft_delete_hides_and_excludes() {
        let (_dir, conn) = test_db();
        add_transaction(&conn, &txn(1, "2025-01-05", 100.0)).unwrap();
        let gone = add_transaction(&conn, &txn(1, "2025-01-06", 40.0)).unwrap();

        assert!(soft_delete(&conn, gone).unwrap());
        assert!(!soft_delete(&conn, gone).unwrap());
        assert!(!soft_delete(&conn, 999).unwrap());

        assert_eq!(list_recent(&conn).unwrap().len(), 1);
        assert_eq!(total_balance(&conn).unwrap(), 100.0);
    }

    #[test]
    fn test_balances_by_account() {
        let (_dir, conn) = test_db();
        add_transaction(&conn, &txn(1, "2025-01-05", 100.0)).unwrap();
        add_transaction(&conn, &txn(1, "2025-01-06", -30.5)).unwrap();

        let balances = balances_by_account(&conn).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].name, "Banco");
        assert_eq!(balances[0].balance, 0.0);
        assert_eq!(balances[1].name, "Caja");
        assert_eq!(balances[1].balance, 69.5);
    }

    #[test]
    fn test_balances_without_view() {
        let (_dir, conn) = test_db();
        conn.execute_batch("DROP VIEW v_balance_por_cuenta;").unwrap();
        add_transaction(&conn, &txn(2, "2025-01-05", 12.0)).unwrap();

        let balances = balances_by_account(&conn).unwrap();
        assert_eq!(balances[0].name, "Banco");
        assert_eq!(balances[0].balance, 12.0);
        assert_eq!(balances[0].currency, "USD");
    }

    #[test]
    fn test_total_of_empty_ledger_is_zero() {
        let (_dir, conn) = test_db();
        assert_eq!(total_balance(&conn).unwrap(), 0.0);
    }

    #[test]
    fn test_lookup_by_name() {
        let (_dir, conn) = test_db();
        assert_eq!(account_id_by_name(&conn, "Banco").unwrap(), 2);
        assert!(matches!(
            account_id_by_name(&conn, "Nada"),
            Err(FinanzaError::UnknownAccount(_))
        ));
        assert_eq!(category_id_by_name(&conn, "Comida").unwrap(), 1);
    }
}

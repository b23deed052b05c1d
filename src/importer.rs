use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rusqlite::Connection;

use crate::error::{FinanzaError, Result};
use crate::models::ParsedRow;

const NEW_ACCOUNT_TYPE: &str = "wallet";
const NEW_ACCOUNT_CURRENCY: &str = "ARS";
const NEW_ACCOUNT_METADATA: &str = r#"{"position": 999999999}"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Matches a trailing `,dd`: the comma is the decimal separator.
fn decimal_comma() -> Option<&'static Regex> {
    static DECIMAL_COMMA: OnceLock<Option<Regex>> = OnceLock::new();
    DECIMAL_COMMA.get_or_init(|| Regex::new(r",\d{2}$").ok()).as_ref()
}

/// Parses amounts written either way: `5.000,00`, `1234,56`, `1,234.56`,
/// `$ 1.234,56`, `-1.200,50`, `5000`.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let mut s = raw.trim().to_string();
    if s.is_empty() {
        return Err(FinanzaError::InvalidAmount("empty amount".into()));
    }
    for token in ["$", "ARS", "USD"] {
        s = s.replace(token, "");
    }
    let s: String = s.split_whitespace().collect();

    let comma_decimals = decimal_comma().is_some_and(|re| re.is_match(&s));
    let normalized = if comma_decimals && s.contains('.') {
        s.replace('.', "").replace(',', ".")
    } else if s.matches(',').count() == 1 && !s.contains('.') {
        s.replace(',', ".")
    } else {
        s.replace(',', "")
    };

    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FinanzaError::InvalidAmount(raw.trim().to_string())),
    }
}

/// Normalizes a date cell to `YYYY-MM-DD`. Slash dates are read month first,
/// falling back to day first when that is the only valid reading.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.format("%Y-%m-%d").to_string());
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date().format("%Y-%m-%d").to_string());
        }
    }
    None
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let Some(base) = chrono::NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return String::new();
    };
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnRole {
    Date,
    Account,
    Description,
    Amount,
    Currency,
}

impl FromStr for ColumnRole {
    type Err = FinanzaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "account" => Ok(Self::Account),
            "description" => Ok(Self::Description),
            "amount" => Ok(Self::Amount),
            "currency" => Ok(Self::Currency),
            other => Err(FinanzaError::Import(format!(
                "unknown column role: {other} (date, account, description, amount, currency)"
            ))),
        }
    }
}

/// Guesses what a column holds from its header (Spanish or English).
pub fn guess_role(column: &str) -> Option<ColumnRole> {
    let c = column.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| c.contains(k));
    if has(&["fecha", "date", "posted"]) {
        Some(ColumnRole::Date)
    } else if has(&["cuenta", "account"]) {
        Some(ColumnRole::Account)
    } else if has(&["desc", "concept", "detalle", "memo"]) {
        Some(ColumnRole::Description)
    } else if has(&["monto", "amount", "importe"]) {
        Some(ColumnRole::Amount)
    } else if has(&["moneda", "currency"]) {
        Some(ColumnRole::Currency)
    } else {
        None
    }
}

/// Role -> header name. The first header guessed for a role wins.
pub type ColumnMapping = BTreeMap<ColumnRole, String>;

pub fn guess_mapping(headers: &[String]) -> ColumnMapping {
    let mut mapping = ColumnMapping::new();
    for header in headers {
        if let Some(role) = guess_role(header) {
            mapping.entry(role).or_insert_with(|| header.clone());
        }
    }
    mapping
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    fn from_records(records: Vec<Vec<String>>, header_row: usize) -> Result<Self> {
        let mut iter = records.into_iter().skip(header_row);
        let headers = iter
            .next()
            .ok_or_else(|| FinanzaError::Import(format!("no header at row {header_row}")))?
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self {
            headers,
            rows: iter.collect(),
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FinanzaError::Import(format!("column not found: {name}")))
    }
}

pub fn read_table(path: &Path, sheet: Option<&str>, header_row: usize) -> Result<RawTable> {
    let is_excel = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"));
    if is_excel {
        read_excel(path, sheet, header_row)
    } else {
        read_csv(path, header_row)
    }
}

fn read_csv(path: &Path, header_row: usize) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }
    RawTable::from_records(records, header_row)
}

#[cfg(feature = "xlsx")]
fn read_excel(path: &Path, sheet: Option<&str>, header_row: usize) -> Result<RawTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| FinanzaError::Import(format!("Failed to open workbook: {e}")))?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| FinanzaError::Import("workbook has no sheets".into()))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| FinanzaError::Import(format!("Failed to read sheet {sheet_name}: {e}")))?;

    let records = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    Data::Float(f) => f.to_string(),
                    Data::Int(i) => i.to_string(),
                    Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();
    RawTable::from_records(records, header_row)
}

#[cfg(not(feature = "xlsx"))]
fn read_excel(path: &Path, _sheet: Option<&str>, _header_row: usize) -> Result<RawTable> {
    Err(FinanzaError::Import(format!(
        "{} is a spreadsheet; rebuild with the `xlsx` feature to import it",
        path.display()
    )))
}

// ---------------------------------------------------------------------------
// Normalizing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Defaults {
    pub account: String,
    pub currency: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            account: "General".to_string(),
            currency: "ARS".to_string(),
        }
    }
}

/// Maps raw rows to [`ParsedRow`]s. Rows whose date cannot be read are
/// dropped; an unreadable amount on a dated row is an error.
pub fn normalize(table: &RawTable, mapping: &ColumnMapping, defaults: &Defaults) -> Result<Vec<ParsedRow>> {
    let index = |role: ColumnRole| -> Result<Option<usize>> {
        mapping.get(&role).map(|name| table.column(name)).transpose()
    };
    let date_col = index(ColumnRole::Date)?
        .ok_or_else(|| FinanzaError::Import("no date column found; map one with --map date=<column>".into()))?;
    let account_col = index(ColumnRole::Account)?;
    let desc_col = index(ColumnRole::Description)?;
    let amount_col = index(ColumnRole::Amount)?;
    let currency_col = index(ColumnRole::Currency)?;

    let cell = |row: &[String], col: usize| row.get(col).map(|s| s.trim().to_string()).unwrap_or_default();

    let mut parsed = Vec::new();
    let mut dropped = 0usize;
    for (n, row) in table.rows.iter().enumerate() {
        let row = row.as_slice();
        let Some(posted_at) = parse_date(&cell(row, date_col)) else {
            dropped += 1;
            continue;
        };
        let amount = match amount_col {
            Some(col) => parse_amount(&cell(row, col)).map_err(|e| {
                FinanzaError::Import(format!("data row {}: {e}", n + 1))
            })?,
            None => 0.0,
        };
        let account = account_col
            .map(|c| cell(row, c))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.account.clone());
        let currency = currency_col
            .map(|c| cell(row, c))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.currency.clone());
        parsed.push(ParsedRow {
            posted_at,
            account,
            description: desc_col.map(|c| cell(row, c)).unwrap_or_default(),
            amount,
            currency,
        });
    }
    if dropped > 0 {
        tracing::debug!(dropped, "rows without a readable date were skipped");
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// import_rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    /// Distinct account names the rows referred to.
    pub accounts: usize,
    pub created_accounts: usize,
    pub inserted: usize,
}

/// Inserts `rows`, creating accounts that do not exist yet under
/// `institution_id`. All or nothing.
pub fn import_rows(conn: &Connection, rows: &[ParsedRow], institution_id: i64) -> Result<ImportResult> {
    let known: bool = conn
        .prepare("SELECT 1 FROM institution WHERE id = ?1")?
        .exists([institution_id])?;
    if !known {
        return Err(FinanzaError::UnknownInstitution(institution_id.to_string()));
    }

    let tx = conn.unchecked_transaction()?;
    let mut account_ids: HashMap<&str, i64> = HashMap::new();
    let mut created_accounts = 0usize;
    for row in rows {
        if account_ids.contains_key(row.account.as_str()) {
            continue;
        }
        let existing: Option<i64> = tx
            .prepare_cached("SELECT id FROM account WHERE name = ?1 ORDER BY id LIMIT 1")?
            .query_row([&row.account], |r| r.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        let id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO account (institution_id, name, type, currency, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        institution_id,
                        row.account,
                        NEW_ACCOUNT_TYPE,
                        NEW_ACCOUNT_CURRENCY,
                        NEW_ACCOUNT_METADATA
                    ],
                )?;
                created_accounts += 1;
                tracing::info!(account = %row.account, institution_id, "created account during import");
                tx.last_insert_rowid()
            }
        };
        account_ids.insert(row.account.as_str(), id);
    }

    let mut inserted = 0usize;
    for row in rows {
        tx.execute(
            "INSERT INTO transactions (account_id, posted_at, description, amount, currency) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                account_ids[row.account.as_str()],
                row.posted_at,
                row.description,
                row.amount,
                row.currency
            ],
        )?;
        inserted += 1;
    }
    tx.commit()?;

    Ok(ImportResult {
        accounts: account_ids.len(),
        created_accounts,
        inserted,
    })
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub sheet: Option<String>,
    pub header_row: usize,
    /// Replace guessed columns for these roles.
    pub overrides: Vec<(ColumnRole, String)>,
    pub defaults: Defaults,
}

pub fn import_file(
    conn: &Connection,
    path: &Path,
    institution_id: i64,
    options: &ImportOptions,
) -> Result<ImportResult> {
    let table = read_table(path, options.sheet.as_deref(), options.header_row)?;
    let mut mapping = guess_mapping(&table.headers);
    for (role, column) in &options.overrides {
        mapping.insert(*role, column.clone());
    }
    tracing::debug!(?mapping, file = %path.display(), "column mapping");

    let rows = normalize(&table, &mapping, &options.defaults)?;
    import_rows(conn, &rows, institution_id)
}

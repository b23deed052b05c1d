use std::path::PathBuf;

use crate::cli::institutions::resolve_institution;
use crate::cli::open_scope;
use crate::error::{FinanzaError, Result};
use crate::importer::{import_file, ColumnRole, Defaults, ImportOptions};
use crate::scope::Scope;
use crate::settings::Settings;

pub struct ImportArgs<'a> {
    pub file: &'a str,
    pub scope: &'a str,
    pub institution: &'a str,
    pub sheet: Option<&'a str>,
    pub header_row: usize,
    pub map: &'a [String],
    pub account: Option<&'a str>,
    pub currency: Option<&'a str>,
}

/// Parses `role=column` overrides.
pub fn parse_overrides(map: &[String]) -> Result<Vec<(ColumnRole, String)>> {
    map.iter()
        .map(|entry| -> Result<(ColumnRole, String)> {
            let (role, column) = entry.split_once('=').ok_or_else(|| {
                FinanzaError::Import(format!("expected role=column, got: {entry}"))
            })?;
            Ok((role.parse()?, column.trim().to_string()))
        })
        .collect()
}

pub fn run(settings: &Settings, args: ImportArgs<'_>) -> Result<()> {
    let file_path = PathBuf::from(args.file);
    if !file_path.exists() {
        return Err(FinanzaError::Import(format!("file not found: {}", args.file)));
    }
    let scope: Scope = args.scope.parse()?;
    if scope.is_general() {
        return Err(FinanzaError::Other(
            "imports go into YYYY or YYYY-MM databases".into(),
        ));
    }

    let mut defaults = Defaults {
        currency: settings.default_currency.clone(),
        ..Defaults::default()
    };
    if let Some(account) = args.account {
        defaults.account = account.to_string();
    }
    if let Some(currency) = args.currency {
        defaults.currency = currency.to_string();
    }
    let options = ImportOptions {
        sheet: args.sheet.map(str::to_string),
        header_row: args.header_row,
        overrides: parse_overrides(args.map)?,
        defaults,
    };

    let conn = open_scope(settings, scope)?;
    let institution_id = resolve_institution(&conn, args.institution)?;
    let result = import_file(&conn, &file_path, institution_id, &options)?;

    println!(
        "✔ {} transactions imported into {scope} across {} accounts ({} new)",
        result.inserted, result.accounts, result.created_accounts
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let map = vec!["amount=Importe".to_string(), "date = Fecha Op".to_string()];
        let parsed = parse_overrides(&map).unwrap();
        assert_eq!(parsed[0], (ColumnRole::Amount, "Importe".to_string()));
        assert_eq!(parsed[1], (ColumnRole::Date, "Fecha Op".to_string()));
    }

    #[test]
    fn test_parse_overrides_rejects_bad_entries() {
        assert!(parse_overrides(&["amount".to_string()]).is_err());
        assert!(parse_overrides(&["saldo=Saldo".to_string()]).is_err());
    }
}

use chrono::Datelike;

use crate::core_sync::SyncOutcome;
use crate::error::{FinanzaError, Result};
use crate::seed::{seed_general, seed_scope, DEFAULT_ACCOUNT, DEFAULT_INSTITUTION};
use crate::settings::Settings;

pub fn general(settings: &Settings) -> Result<()> {
    let institution_id = seed_general(&settings.data_dir())?;
    println!(
        "✔ General database seeded: institution {} (id {institution_id}), account {DEFAULT_ACCOUNT}",
        DEFAULT_INSTITUTION.0
    );
    Ok(())
}

pub fn scope(settings: &Settings, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let today = chrono::Local::now();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(FinanzaError::InvalidScope(format!("{year}-{month}")));
    }

    for (scope, outcome) in seed_scope(&settings.data_dir(), year, month)? {
        match outcome {
            SyncOutcome::AlreadyPopulated => println!("{scope}: already populated"),
            SyncOutcome::Copied { accounts, categories, .. } => {
                println!("✔ {scope}: {accounts} accounts, {categories} categories copied")
            }
        }
    }
    Ok(())
}

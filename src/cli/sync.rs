use std::path::Path;

use colored::Colorize;

use crate::cli::parse_scope;
use crate::core_sync::{ensure_core_cloned, sync_all, sync_core_from_general, SyncOutcome, SyncReport};
use crate::error::{FinanzaError, Result};
use crate::scope::{general_path, Scope};
use crate::settings::Settings;

pub fn run(settings: &Settings, scope: Option<&str>, force: bool) -> Result<()> {
    let data_dir = settings.data_dir();
    let reports = match scope {
        Some(raw) => {
            let scope = parse_scope(Some(raw), Scope::current_month())?;
            if scope.is_general() {
                return Err(FinanzaError::Other(
                    "general is the sync source; pass YYYY or YYYY-MM".into(),
                ));
            }
            let general = general_path(&data_dir);
            let path = scope.path_in(&data_dir);
            let outcome = if force {
                sync_core_from_general(&general, &path)?
            } else {
                ensure_core_cloned(&general, &path)?
            };
            vec![SyncReport { path, outcome }]
        }
        None => sync_all(&data_dir, force)?,
    };

    if reports.is_empty() {
        println!("No period databases in {}.", data_dir.display());
        return Ok(());
    }
    for report in &reports {
        print_report(report);
    }
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_report(report: &SyncReport) {
    let name = file_label(&report.path);
    match report.outcome {
        SyncOutcome::AlreadyPopulated => println!(
            "{} {name}: already has accounts, skipped (use --force to add missing rows)",
            "!".yellow()
        ),
        SyncOutcome::Copied {
            institutions,
            accounts,
            categories,
        } => println!(
            "✔ {name}: {institutions} institutions, {accounts} accounts, {categories} categories copied"
        ),
    }
}

use crate::db::ensure_schema;
use crate::error::Result;
use crate::scope::general_path;
use crate::settings::{save_settings, Settings};

/// Creates the data directory and general database, then saves the
/// resolved data directory so later commands find it without `--data-dir`.
pub fn run(settings: &Settings) -> Result<()> {
    let mut settings = settings.clone();
    let data_dir = settings.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let data_dir = std::fs::canonicalize(&data_dir)?;
    settings.data_dir = data_dir.to_string_lossy().to_string();

    let general = general_path(&data_dir);
    let existed = general.exists();
    ensure_schema(&general)?;
    save_settings(&settings)?;

    if existed {
        println!("✔ Using existing database at {}", general.display());
    } else {
        println!("✔ Created {}", general.display());
    }
    println!("Data dir: {}", data_dir.display());
    Ok(())
}

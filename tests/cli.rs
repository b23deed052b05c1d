use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn data_dir(&self) -> std::path::PathBuf {
        self.home.path().join("data")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("finanza").unwrap();
        cmd.env("HOME", self.home.path())
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.data_dir());
        cmd
    }

    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd().args(args).assert()
    }

    fn seeded(self) -> Self {
        self.run(&["init"]).success();
        self.run(&["seed", "general"]).success();
        self
    }
}

fn exists(dir: &Path, name: &str) -> bool {
    dir.join(name).exists()
}

#[test]
fn test_init_creates_general_database_and_settings() {
    let env = Env::new();
    env.run(&["init"])
        .success()
        .stdout(predicate::str::contains("general.db"));
    assert!(exists(&env.data_dir(), "general.db"));
    assert!(env.home.path().join(".config/finanza/settings.json").exists());

    env.run(&["init"])
        .success()
        .stdout(predicate::str::contains("Using existing database"));
}

#[test]
fn test_account_flows_into_period_and_balance() {
    let env = Env::new();
    env.run(&["init"]).success();
    env.run(&["institutions", "add", "Genérica", "--alias", "GEN"]).success();
    env.run(&["accounts", "add", "Caja", "--institution", "GEN", "--position", "1"])
        .success()
        .stdout(predicate::str::contains("Added account: Caja (wallet, ARS)"));
    env.run(&["categories", "add", "Comida", "--type", "OUT"]).success();

    env.run(&[
        "tx", "add", "--scope", "2025-01", "--account", "Caja", "--amount", "-1.500,00",
        "--date", "2025-01-10", "--description", "super", "--category", "Comida",
    ])
    .success()
    .stdout(predicate::str::contains("Recorded #1 in 2025-01"));
    assert!(exists(&env.data_dir(), "2025-01.db"));

    env.run(&["balance", "2025-01"])
        .success()
        .stdout(predicate::str::contains("-ARS 1.500,00"));
    env.run(&["tx", "list", "2025-01"])
        .success()
        .stdout(predicate::str::contains("super"));
}

#[test]
fn test_deleted_transaction_leaves_balance() {
    let env = Env::new().seeded();
    env.run(&["tx", "add", "--scope", "2025-02", "--account", "General", "--amount", "100"])
        .success();
    env.run(&["tx", "delete", "1", "--scope", "2025-02"])
        .success()
        .stdout(predicate::str::contains("Deleted transaction #1"));
    env.run(&["balance", "2025-02"])
        .success()
        .stdout(predicate::str::contains("Total: ARS 0,00"));
}

#[test]
fn test_category_without_type_is_reported() {
    let env = Env::new().seeded();
    env.run(&["categories", "add", "Varios"])
        .failure()
        .stderr(predicate::str::contains("was not created"));
    env.run(&["categories", "list"])
        .success()
        .stdout(predicate::str::contains("Varios").not());
}

#[test]
fn test_sync_skips_populated_periods_unless_forced() {
    let env = Env::new().seeded();
    env.run(&["seed", "scope", "--year", "2025", "--month", "3"])
        .success()
        .stdout(predicate::str::contains("2025-03: 1 accounts, 2 categories copied"));

    env.run(&["categories", "add", "Transporte", "--type", "OUT"]).success();
    env.run(&["sync"])
        .success()
        .stdout(predicate::str::contains("already has accounts"));
    env.run(&["categories", "list", "2025-03"])
        .success()
        .stdout(predicate::str::contains("Transporte").not());

    env.run(&["sync", "2025-03", "--force"])
        .success()
        .stdout(predicate::str::contains("0 accounts, 1 categories copied"));
    env.run(&["categories", "list", "2025-03"])
        .success()
        .stdout(predicate::str::contains("Transporte"));
}

#[test]
fn test_sync_into_general_is_rejected() {
    let env = Env::new().seeded();
    env.run(&["sync", "general"])
        .failure()
        .stderr(predicate::str::contains("general is the sync source"))
        .stderr(predicate::str::contains("expected general").not());
}

#[test]
fn test_tx_into_general_is_rejected() {
    let env = Env::new().seeded();
    env.run(&[
        "tx", "add", "--scope", "general", "--account", "Caja", "--amount", "10",
    ])
    .failure()
    .stderr(predicate::str::contains("transactions are recorded in YYYY or YYYY-MM"))
    .stderr(predicate::str::contains("expected general").not());
}

#[test]
fn test_import_csv_creates_missing_accounts() {
    let env = Env::new().seeded();
    let csv = env.home.path().join("movimientos.csv");
    std::fs::write(
        &csv,
        "Fecha,Cuenta,Descripcion,Monto\n\
         2025-03-01,General,Sueldo,\"150.000,00\"\n\
         2025-03-02,Tarjeta,Super,\"-2.500,50\"\n\
         ,General,sin fecha,10\n",
    )
    .unwrap();

    env.cmd()
        .args(["import", csv.to_str().unwrap(), "--scope", "2025-03", "--institution", "Genérica"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 transactions imported into 2025-03 across 2 accounts (1 new)"));

    env.run(&["accounts", "list", "2025-03"])
        .success()
        .stdout(predicate::str::contains("Tarjeta"));
}

#[test]
fn test_import_requires_known_institution() {
    let env = Env::new().seeded();
    let csv = env.home.path().join("m.csv");
    std::fs::write(&csv, "Fecha,Monto\n2025-03-01,10\n").unwrap();
    env.cmd()
        .args(["import", csv.to_str().unwrap(), "--scope", "2025-03", "--institution", "Nadie"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown institution"));
}

#[test]
fn test_register_confirm_login() {
    let env = Env::new();
    env.run(&["init"]).success();

    let output = env
        .cmd()
        .args(["auth", "register", "--name", "Ana", "--email", "ana@example.com", "--password-stdin"])
        .write_stdin("secreto\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let token = stdout
        .lines()
        .find_map(|l| l.strip_prefix("Confirmation token: "))
        .unwrap()
        .trim()
        .to_string();

    env.cmd()
        .args(["auth", "login", "--email", "ana@example.com", "--password-stdin"])
        .write_stdin("secreto\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not active"));

    env.run(&["auth", "confirm", &token])
        .success()
        .stdout(predicate::str::contains("confirmed"));

    env.cmd()
        .args(["auth", "login", "--email", "ana@example.com", "--password-stdin"])
        .write_stdin("secreto\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, Ana"));

    env.cmd()
        .args(["auth", "login", "--email", "ana@example.com", "--password-stdin"])
        .write_stdin("otra\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));
}

#[test]
fn test_invalid_scope() {
    let env = Env::new().seeded();
    env.run(&["balance", "2025-13"])
        .failure()
        .stderr(predicate::str::contains("Invalid scope: 2025-13"));
}

#[test]
fn test_status_lists_databases() {
    let env = Env::new().seeded();
    env.run(&["seed", "scope", "--year", "2024", "--month", "12"]).success();
    env.run(&["status"])
        .success()
        .stdout(predicate::str::contains("general.db"))
        .stdout(predicate::str::contains("2024-12.db"))
        .stdout(predicate::str::contains("Users:      0"));
}

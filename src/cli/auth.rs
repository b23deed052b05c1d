use std::io::BufRead;

use zeroize::Zeroizing;

use crate::auth::{JsonFileRepository, UserStore};
use crate::error::{FinanzaError, Result};
use crate::settings::Settings;

fn open_store(settings: &Settings) -> Result<UserStore<JsonFileRepository>> {
    UserStore::open(JsonFileRepository::new(&settings.users_path()))
}

/// First line of stdin, without the trailing newline.
fn read_stdin_password() -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    std::io::stdin().lock().read_line(&mut line)?;
    let trimmed = Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string());
    Ok(trimmed)
}

fn read_password(from_stdin: bool, confirm: bool) -> Result<Zeroizing<String>> {
    let password = if from_stdin {
        read_stdin_password()?
    } else {
        let first = Zeroizing::new(rpassword::prompt_password("Password: ")?);
        if confirm {
            let again = Zeroizing::new(rpassword::prompt_password("Repeat password: ")?);
            if *first != *again {
                return Err(FinanzaError::Other("Passwords do not match".into()));
            }
        }
        first
    };
    if password.is_empty() {
        return Err(FinanzaError::Other("Password is required".into()));
    }
    Ok(password)
}

pub fn register(settings: &Settings, name: &str, email: &str, password_stdin: bool) -> Result<()> {
    let mut store = open_store(settings)?;
    let password = read_password(password_stdin, true)?;
    let token = store.register(name.trim(), email.trim(), &password)?;

    println!("✔ Registered {email} (pending confirmation)");
    println!("Confirmation token: {}", token.token);
    println!("Valid until {}", token.expires_at.format("%Y-%m-%d %H:%M UTC"));
    Ok(())
}

pub fn confirm(settings: &Settings, token: &str) -> Result<()> {
    let mut store = open_store(settings)?;
    let user = store.confirm(token.trim())?;
    println!("✔ Account {} confirmed", user.email);
    Ok(())
}

pub fn login(settings: &Settings, email: &str, password_stdin: bool) -> Result<()> {
    let store = open_store(settings)?;
    let password = read_password(password_stdin, false)?;
    let user = store.login(email.trim(), &password)?;
    println!("✔ Welcome, {}", user.name);
    Ok(())
}

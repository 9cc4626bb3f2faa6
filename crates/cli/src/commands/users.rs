//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Bootstrap the first administrator (the shell cannot create one)
//! dd-cli --data-dir ./data users create -n "Admin" -e admin@doacao.com -s "s3cret" -r administrator
//!
//! # List every account, as an administrator
//! dd-cli --data-dir ./data users list -e admin@doacao.com -s "s3cret"
//! ```

use std::io::Write;

use donation_desk_core::{Email, Role, User, UserId};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::config::CliConfig;
use crate::error::CommandError;
use crate::render;
use crate::workspace::Workspace;

/// Create an account of any role and save it.
///
/// # Errors
///
/// Returns an error if the email or role is malformed, no data directory is
/// configured, or the email is already registered.
pub fn create_user(
    config: &CliConfig,
    name: &str,
    email: &str,
    secret: &SecretString,
    role: &str,
) -> Result<UserId, CommandError> {
    let role: Role = role.parse()?;
    let email = Email::parse(email)?;

    let mut workspace = Workspace::open_persistent(config)?;
    info!("Creating user: {} ({})", email, role);

    let id = workspace
        .ledger_mut()
        .register(name, email.as_str(), secret.expose_secret(), role)?
        .id;
    workspace.persist()?;

    info!("User created successfully! ID: {id}, Email: {email}, Role: {role}");
    Ok(id)
}

/// Log in as an administrator and write every account, active or not.
///
/// Returns the number of accounts written.
///
/// # Errors
///
/// Returns an error if the data cannot be loaded, the credentials are
/// wrong, the account is not an administrator, or writing fails.
pub fn list(
    config: &CliConfig,
    email: &str,
    secret: &SecretString,
    json: bool,
    out: &mut impl Write,
) -> Result<usize, CommandError> {
    let mut workspace = Workspace::open(config)?;
    let ledger = workspace.ledger_mut();
    ledger.authenticate(email, secret.expose_secret())?;

    let users: Vec<&User> = ledger.list_users()?;
    info!(%email, count = users.len(), "Listing users");

    if json {
        serde_json::to_writer_pretty(&mut *out, &users)?;
        writeln!(out)?;
    } else {
        render::write_users(out, &users)?;
    }
    Ok(users.len())
}

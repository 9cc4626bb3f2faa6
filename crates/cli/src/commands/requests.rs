//! Non-interactive request listing.

use std::io::Write;

use donation_desk_core::Request;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::config::CliConfig;
use crate::error::CommandError;
use crate::render;
use crate::workspace::Workspace;

/// Log in and write the requests that account can see, newest first.
///
/// Returns the number of requests written.
///
/// # Errors
///
/// Returns an error if the data cannot be loaded, the credentials are
/// wrong, or writing fails.
pub fn list(
    config: &CliConfig,
    email: &str,
    secret: &SecretString,
    json: bool,
    out: &mut impl Write,
) -> Result<usize, CommandError> {
    let mut workspace = Workspace::open(config)?;
    let ledger = workspace.ledger_mut();
    let role = ledger.authenticate(email, secret.expose_secret())?.role;

    let requests: Vec<&Request> = ledger.list_requests();
    info!(%email, %role, count = requests.len(), "Listing requests");

    if json {
        serde_json::to_writer_pretty(&mut *out, &requests)?;
        writeln!(out)?;
    } else {
        render::write_table(out, &requests)?;
    }
    Ok(requests.len())
}

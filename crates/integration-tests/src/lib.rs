//! Integration tests for Donation Desk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p donation-desk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `identity` - Registration, login and the single session
//! - `request_lifecycle` - Creation, visibility and review across roles
//! - `persistence` - Flat-file round trips
//!
//! This crate only holds shared fixtures; the tests live in `tests/`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Duration, Utc};
use donation_desk_core::{Item, Ledger, LedgerError, Role, SteppingClock};

pub const SECRET: &str = "123";
pub const ADMIN: &str = "admin@doacao.com";
pub const INSTITUTION: &str = "ong@apoio.org";
pub const OTHER_INSTITUTION: &str = "abrigo@esperanca.org";
pub const DONOR: &str = "carlos@doador.com";

/// Ledger type used across the tests.
pub type TestLedger = Ledger<SteppingClock>;

/// First instant handed out by [`clock`].
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(19_000)
}

/// A clock that moves forward one minute per request, so creation order and
/// timestamp order agree.
#[must_use]
pub fn clock_from(start: DateTime<Utc>) -> SteppingClock {
    SteppingClock::new(start, Duration::minutes(1))
}

/// See [`clock_from`].
#[must_use]
pub fn clock() -> SteppingClock {
    clock_from(epoch())
}

/// An empty ledger on a stepping clock.
#[must_use]
pub fn empty_ledger() -> TestLedger {
    Ledger::with_clock(clock())
}

/// A ledger with one account per role plus a second institution. No session.
///
/// # Errors
///
/// Propagates registration failures.
pub fn ledger_with_accounts() -> Result<TestLedger, LedgerError> {
    let mut ledger = empty_ledger();
    ledger.register("Admin Master", ADMIN, SECRET, Role::Administrator)?;
    ledger.register("Casa de Apoio", INSTITUTION, SECRET, Role::Institution)?;
    ledger.register("Abrigo Esperança", OTHER_INSTITUTION, SECRET, Role::Institution)?;
    ledger.register("Carlos Doador", DONOR, SECRET, Role::Donor)?;
    Ok(ledger)
}

/// A single-item list.
///
/// # Errors
///
/// Fails for a zero quantity.
pub fn one_item(product_name: &str, quantity: u32, category: &str) -> Result<Vec<Item>, LedgerError> {
    Ok(vec![Item::new(product_name, quantity, category)?])
}

/// Log in as `email` with the shared secret.
///
/// # Errors
///
/// [`LedgerError::InvalidCredentials`] for unknown accounts.
pub fn login(ledger: &mut TestLedger, email: &str) -> Result<(), LedgerError> {
    ledger.authenticate(email, SECRET).map(|_| ())
}

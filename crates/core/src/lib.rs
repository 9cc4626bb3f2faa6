//! Donation Desk Core - identity, sessions and the donation request ledger.
//!
//! Users register with one of three roles and log in; institutions create
//! donation requests, administrators review them, and donors browse the
//! approved ones. This crate owns those rules:
//!
//! - unique, increasing identifiers for users and requests
//! - unique logins
//! - a single active session per [`Ledger`]
//! - role-gated creation, listing and review of requests
//!
//! # Architecture
//!
//! The crate performs no terminal I/O and no logging. Front ends call the
//! operations on [`Ledger`] and render the results; every failure comes back
//! as a [`LedgerError`] (or [`storage::StorageError`] for persistence).
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, logins, secrets, roles and statuses
//! - [`identity`] - User registry and the active session
//! - [`requests`] - Donation requests and their review rules
//! - [`ledger`] - The facade tying both together with a clock
//! - [`clock`] - Injectable time source
//! - [`seed`] - Demo data and seed files
//! - [`storage`] - Delimited flat-file persistence
//!
//! # Example
//!
//! ```
//! use donation_desk_core::{Item, Ledger, RequestStatus, Role};
//!
//! let mut ledger = Ledger::new();
//! ledger.register("Casa de Apoio", "ong@apoio.org", "123", Role::Institution)?;
//! ledger.register("Admin", "admin@doacao.com", "123", Role::Administrator)?;
//!
//! ledger.authenticate("ong@apoio.org", "123")?;
//! let id = ledger.create_request("Urgent", vec![Item::new("Rice", 10, "Food")?])?;
//!
//! ledger.authenticate("admin@doacao.com", "123")?;
//! ledger.set_status(id, "approved")?;
//! assert_eq!(ledger.get_request(id).map(|r| r.status), Some(RequestStatus::Approved));
//! # Ok::<(), donation_desk_core::LedgerError>(())
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clock;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod requests;
pub mod seed;
pub mod storage;
pub mod types;

pub use clock::{Clock, FixedClock, SteppingClock, SystemClock};
pub use error::LedgerError;
pub use identity::{IdentityStore, User};
pub use ledger::Ledger;
pub use requests::{Item, MAX_JUSTIFICATION_CHARS, Request, RequestLedger, StatusSummary};
pub use seed::{SeedData, SeedReport};
pub use types::*;

//! Core types for Donation Desk.
//!
//! This module provides type-safe wrappers for identifiers, logins, secrets,
//! roles and request statuses.

pub mod email;
pub mod id;
pub mod secret;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use secret::Secret;
pub use status::*;

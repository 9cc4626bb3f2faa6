//! CLI command implementations.

pub mod requests;
pub mod seed;
pub mod shell;
pub mod users;

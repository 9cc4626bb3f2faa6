//! Closed enumerations for user roles and request statuses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a role name is not one of the recognised roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role: {0}. Valid roles: administrator, institution, donor")]
pub struct RoleParseError(pub String);

/// Error returned when a status name is not one of the recognised statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status: {0}. Valid statuses: pending, approved, rejected")]
pub struct StatusParseError(pub String);

/// Role of a registered user, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reviews requests and changes their status.
    Administrator,
    /// Creates donation requests and sees its own.
    Institution,
    /// Browses approved requests.
    Donor,
}

impl Role {
    /// All roles, in menu order.
    pub const ALL: [Self; 3] = [Self::Administrator, Self::Institution, Self::Donor];

    /// Canonical name, as written to storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Institution => "institution",
            Self::Donor => "donor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "administrator" | "admin" => Ok(Self::Administrator),
            "institution" | "ong" | "ngo" => Ok(Self::Institution),
            "donor" => Ok(Self::Donor),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

/// Review status of a donation request.
///
/// Every request starts as [`RequestStatus::Pending`]. Administrators may
/// move it between any two statuses; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// All statuses, in menu order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Canonical name, as written to storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(StatusParseError(s.to_owned())),
        }
    }
}

//! Identity & session store.
//!
//! Owns the registry of users and the single active session. Users are
//! never deleted. The only attribute that changes after registration is the
//! active flag, which an administrator toggles; inactive users cannot log in.

use serde::Serialize;

use crate::error::LedgerError;
use crate::types::{Email, Role, Secret, UserId};

/// A registered user.
///
/// The secret is private; it can only be checked through
/// [`User::verify_secret`].
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID, assigned at registration.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login, unique across users.
    pub email: Email,
    /// Role, fixed at registration.
    pub role: Role,
    /// Whether the user may log in.
    pub active: bool,
    #[serde(skip)]
    secret: Secret,
}

impl User {
    /// Build an active user record. Used when restoring persisted users.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, email: Email, secret: Secret, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            email,
            role,
            active: true,
            secret,
        }
    }

    /// Set the active flag.
    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Check a candidate secret against this user's secret.
    #[must_use]
    pub fn verify_secret(&self, candidate: &str) -> bool {
        self.secret.verify(candidate)
    }

    pub(crate) const fn secret(&self) -> &Secret {
        &self.secret
    }
}

/// Registry of users plus the single authenticated session.
#[derive(Debug, Default)]
pub struct IdentityStore {
    users: Vec<User>,
    session: Option<UserId>,
}

impl IdentityStore {
    /// Create an empty store with no active session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            users: Vec::new(),
            session: None,
        }
    }

    /// Restore a store from persisted users.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] if two users share an
    /// identifier or an email.
    pub fn from_users(users: Vec<User>) -> Result<Self, LedgerError> {
        let mut store = Self::new();
        for user in users {
            if store.users.iter().any(|u| u.id == user.id) {
                return Err(LedgerError::InvalidInput(format!(
                    "duplicate user id {}",
                    user.id
                )));
            }
            if store.find_by_email(user.email.as_str()).is_some() {
                return Err(LedgerError::InvalidInput(format!(
                    "duplicate user email {}",
                    user.email
                )));
            }
            store.users.push(user);
        }
        store.users.sort_by_key(|u| u.id);
        Ok(store)
    }

    /// Register a new user.
    ///
    /// No validation is applied to `name`, `email` or `secret`; empty values
    /// are accepted. The identifier is max existing + 1, or 1 when empty.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicateEmail`] if the email (exact, case-sensitive)
    ///   is already registered.
    /// - [`LedgerError::InvalidInput`] once the highest identifier is
    ///   `i32::MAX`.
    ///
    /// The store is unchanged on failure.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        secret: &str,
        role: Role,
    ) -> Result<&User, LedgerError> {
        if self.find_by_email(email).is_some() {
            return Err(LedgerError::DuplicateEmail(email.to_owned()));
        }

        let id = self.next_id()?;
        self.users.push(User::new(
            id,
            name,
            Email::new(email),
            Secret::new(secret),
            role,
        ));
        self.users
            .last()
            .ok_or_else(|| LedgerError::NotFound(format!("user {id}")))
    }

    /// Log in.
    ///
    /// On success the session is set to the matching user. On failure the
    /// current session, if any, is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidCredentials`] when no active user has
    /// exactly this email and secret. An inactive account is reported the
    /// same way as a wrong secret.
    pub fn authenticate(&mut self, email: &str, secret: &str) -> Result<&User, LedgerError> {
        let user = self
            .users
            .iter()
            .find(|u| u.active && u.email == email && u.verify_secret(secret))
            .ok_or(LedgerError::InvalidCredentials)?;
        self.session = Some(user.id);
        Ok(user)
    }

    /// Log out. Idempotent.
    pub fn end_session(&mut self) {
        self.session = None;
    }

    /// The currently authenticated user, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<&User> {
        let id = self.session?;
        self.users.iter().find(|u| u.id == id)
    }

    /// Every user, active or not, in identifier order. Administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotAuthorized`] without an administrator
    /// session.
    pub fn list_users(&self) -> Result<Vec<&User>, LedgerError> {
        self.require_administrator()?;
        Ok(self.users.iter().collect())
    }

    /// Activate or deactivate a user. Administrators only.
    ///
    /// Setting the flag to its current value is not an error.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] without an administrator session.
    /// - [`LedgerError::InvalidInput`] when the administrator tries to
    ///   deactivate their own account.
    /// - [`LedgerError::NotFound`] for an unknown identifier.
    pub fn set_active(&mut self, id: UserId, active: bool) -> Result<&User, LedgerError> {
        let admin = self.require_administrator()?.id;
        if admin == id && !active {
            return Err(LedgerError::InvalidInput(
                "cannot deactivate the logged-in account".to_owned(),
            ));
        }
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| LedgerError::NotFound(format!("user {id}")))?;
        user.active = active;
        Ok(user)
    }

    /// Look up a user by exact email.
    #[must_use]
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// All users in identifier order.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    /// Number of registered users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn require_administrator(&self) -> Result<&User, LedgerError> {
        self.current_session()
            .filter(|u| u.role == Role::Administrator)
            .ok_or(LedgerError::NotAuthorized)
    }

    fn next_id(&self) -> Result<UserId, LedgerError> {
        match self.users.iter().map(|u| u.id).max() {
            None => Ok(UserId::FIRST),
            Some(max) => max.next().ok_or_else(|| LedgerError::ids_exhausted("user")),
        }
    }
}

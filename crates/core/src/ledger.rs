//! The `Ledger`: one identity store, one request ledger, one clock.
//!
//! Every request operation reads the active session from the identity store
//! and hands it to the request ledger explicitly. There is no global state;
//! independent `Ledger` values never interact.

use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::identity::{IdentityStore, User};
use crate::requests::{Item, Request, RequestLedger, StatusSummary};
use crate::types::{RequestId, RequestStatus, Role, UserId};

/// Donation desk state for a single process and a single session.
#[derive(Debug, Default)]
pub struct Ledger<C: Clock = SystemClock> {
    pub(crate) identity: IdentityStore,
    pub(crate) requests: RequestLedger,
    pub(crate) clock: C,
}

impl Ledger<SystemClock> {
    /// Create an empty ledger using the wall clock.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> Ledger<C> {
    /// Create an empty ledger using the given clock.
    #[must_use]
    pub const fn with_clock(clock: C) -> Self {
        Self {
            identity: IdentityStore::new(),
            requests: RequestLedger::new(),
            clock,
        }
    }

    /// Assemble a ledger from restored parts. No session is active.
    #[must_use]
    pub const fn from_parts(identity: IdentityStore, requests: RequestLedger, clock: C) -> Self {
        Self {
            identity,
            requests,
            clock,
        }
    }

    /// The identity store.
    #[must_use]
    pub const fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    /// The request collection.
    #[must_use]
    pub const fn requests(&self) -> &RequestLedger {
        &self.requests
    }

    /// See [`IdentityStore::register`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::DuplicateEmail`] or [`LedgerError::InvalidInput`].
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        secret: &str,
        role: Role,
    ) -> Result<&User, LedgerError> {
        self.identity.register(name, email, secret, role)
    }

    /// See [`IdentityStore::authenticate`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidCredentials`].
    pub fn authenticate(&mut self, email: &str, secret: &str) -> Result<&User, LedgerError> {
        self.identity.authenticate(email, secret)
    }

    /// Log out. Idempotent.
    pub fn end_session(&mut self) {
        self.identity.end_session();
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<&User> {
        self.identity.current_session()
    }

    /// See [`IdentityStore::list_users`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`].
    pub fn list_users(&self) -> Result<Vec<&User>, LedgerError> {
        self.identity.list_users()
    }

    /// See [`IdentityStore::set_active`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`], [`LedgerError::InvalidInput`] or
    /// [`LedgerError::NotFound`].
    pub fn set_user_active(&mut self, id: UserId, active: bool) -> Result<&User, LedgerError> {
        self.identity.set_active(id, active)
    }

    /// See [`RequestLedger::create`]. The timestamp comes from the clock.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`] or [`LedgerError::InvalidInput`].
    pub fn create_request(
        &mut self,
        justification: &str,
        items: Vec<Item>,
    ) -> Result<RequestId, LedgerError> {
        let now = self.clock.now();
        self.requests
            .create(self.identity.current_session(), justification, items, now)
    }

    /// See [`RequestLedger::list`].
    #[must_use]
    pub fn list_requests(&self) -> Vec<&Request> {
        self.requests.list(self.identity.current_session())
    }

    /// See [`RequestLedger::get`].
    #[must_use]
    pub fn get_request(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(id)
    }

    /// See [`RequestLedger::set_status`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`], [`LedgerError::InvalidInput`] or
    /// [`LedgerError::NotFound`].
    pub fn set_status(&mut self, id: RequestId, new_status: &str) -> Result<(), LedgerError> {
        self.requests
            .set_status(self.identity.current_session(), id, new_status)
    }

    /// See [`RequestLedger::set_status_typed`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`] or [`LedgerError::NotFound`].
    pub fn set_status_typed(
        &mut self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<(), LedgerError> {
        self.requests
            .set_status_typed(self.identity.current_session(), id, status)
    }

    /// Boolean form of [`Ledger::set_status`]: `true` iff the status was
    /// updated, with no hint of why it was not.
    pub fn try_set_status(&mut self, id: RequestId, new_status: &str) -> bool {
        self.set_status(id, new_status).is_ok()
    }

    /// See [`RequestLedger::reject_with_reason`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`] or [`LedgerError::NotFound`].
    pub fn reject_with_reason(&mut self, id: RequestId, reason: &str) -> Result<(), LedgerError> {
        self.requests
            .reject_with_reason(self.identity.current_session(), id, reason)
    }

    /// See [`RequestLedger::summary`].
    #[must_use]
    pub fn summary(&self) -> StatusSummary {
        self.requests.summary()
    }
}

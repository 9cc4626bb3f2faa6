//! Request ledger.
//!
//! Owns every donation request and enforces the role rules for creating,
//! listing and reviewing them. The ledger does not track sessions itself:
//! each operation receives the session user from the caller, normally
//! [`crate::Ledger`], which reads it from the [`crate::IdentityStore`].

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::LedgerError;
use crate::identity::User;
use crate::types::{Email, RequestId, RequestStatus, Role};

/// Maximum number of characters kept from a justification or rejection reason.
pub const MAX_JUSTIFICATION_CHARS: usize = 100;

/// One requested product line. Owned by its [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Product name, e.g. "Rice 5kg".
    pub product_name: String,
    /// Requested units, always positive.
    pub quantity: NonZeroU32,
    /// Free-form category, e.g. "Food".
    pub category: String,
}

impl Item {
    /// Build an item.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] if `quantity` is zero.
    pub fn new(
        product_name: impl Into<String>,
        quantity: u32,
        category: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        let quantity = NonZeroU32::new(quantity)
            .ok_or_else(|| LedgerError::InvalidInput("quantity must be positive".to_owned()))?;
        Ok(Self {
            product_name: product_name.into(),
            quantity,
            category: category.into(),
        })
    }
}

/// A donation request created by an institution.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Unique request ID, assigned at creation.
    pub id: RequestId,
    /// Email of the institution that created the request.
    pub institution_email: Email,
    /// Reason for the request, at most [`MAX_JUSTIFICATION_CHARS`] characters.
    pub justification: String,
    /// Current review status.
    pub status: RequestStatus,
    /// Reason given by an administrator when rejecting, if any.
    pub rejection_reason: Option<String>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// Requested items, never empty.
    pub items: Vec<Item>,
}

/// Count of requests per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusSummary {
    /// Total number of requests counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.approved + self.rejected
    }
}

/// The collection of donation requests.
#[derive(Debug, Default)]
pub struct RequestLedger {
    requests: Vec<Request>,
}

impl RequestLedger {
    /// Create an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: Vec::new(),
        }
    }

    /// Restore a ledger from persisted requests.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] on a duplicate identifier, a
    /// request without items, or a justification or rejection reason longer
    /// than [`MAX_JUSTIFICATION_CHARS`].
    pub fn from_requests(requests: Vec<Request>) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        for request in requests {
            if ledger.get(request.id).is_some() {
                return Err(LedgerError::InvalidInput(format!(
                    "duplicate request id {}",
                    request.id
                )));
            }
            if request.items.is_empty() {
                return Err(LedgerError::InvalidInput(format!(
                    "request {} has no items",
                    request.id
                )));
            }
            let too_long = |text: &str| text.chars().count() > MAX_JUSTIFICATION_CHARS;
            if too_long(request.justification.as_str())
                || request.rejection_reason.as_deref().is_some_and(too_long)
            {
                return Err(LedgerError::InvalidInput(format!(
                    "request {} has text over {MAX_JUSTIFICATION_CHARS} characters",
                    request.id
                )));
            }
            ledger.requests.push(request);
        }
        ledger.requests.sort_by_key(|r| r.id);
        Ok(ledger)
    }

    /// Create a request on behalf of the session's institution.
    ///
    /// The justification is silently truncated to
    /// [`MAX_JUSTIFICATION_CHARS`] characters. The new request is
    /// [`RequestStatus::Pending`] and stamped with `now`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAuthorized`] without an institution session.
    /// - [`LedgerError::InvalidInput`] if `items` is empty, or no request
    ///   identifier is left after `i32::MAX`.
    pub fn create(
        &mut self,
        session: Option<&User>,
        justification: &str,
        items: Vec<Item>,
        now: DateTime<Utc>,
    ) -> Result<RequestId, LedgerError> {
        let institution = require_role(session, Role::Institution)?;

        if items.is_empty() {
            return Err(LedgerError::InvalidInput(
                "a request needs at least one item".to_owned(),
            ));
        }

        let id = self.next_id()?;
        self.requests.push(Request {
            id,
            institution_email: institution.email.clone(),
            justification: truncate_chars(justification, MAX_JUSTIFICATION_CHARS),
            status: RequestStatus::Pending,
            rejection_reason: None,
            created_at: now,
            items,
        });
        Ok(id)
    }

    /// Requests visible to the session, most recent first.
    ///
    /// - No session: nothing.
    /// - Administrator: everything.
    /// - Institution: its own requests.
    /// - Donor: approved requests.
    ///
    /// Requests with equal timestamps keep insertion order.
    #[must_use]
    pub fn list(&self, session: Option<&User>) -> Vec<&Request> {
        let Some(user) = session else {
            return Vec::new();
        };

        let mut visible: Vec<&Request> = self
            .requests
            .iter()
            .filter(|r| match user.role {
                Role::Administrator => true,
                Role::Institution => r.institution_email == user.email,
                Role::Donor => r.status == RequestStatus::Approved,
            })
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible
    }

    /// Look up a request by identifier, without visibility filtering.
    #[must_use]
    pub fn get(&self, id: RequestId) -> Option<&Request> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Change a request's status from its string name.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`LedgerError::NotAuthorized`] without an administrator session.
    /// - [`LedgerError::InvalidInput`] if `new_status` is not a known status.
    /// - [`LedgerError::NotFound`] if no request has this identifier.
    pub fn set_status(
        &mut self,
        session: Option<&User>,
        id: RequestId,
        new_status: &str,
    ) -> Result<(), LedgerError> {
        require_role(session, Role::Administrator)?;
        let status = new_status
            .parse::<RequestStatus>()
            .map_err(|e| LedgerError::InvalidInput(e.to_string()))?;
        self.apply_status(id, status, None)
    }

    /// Change a request's status.
    ///
    /// Any status may follow any other. A previous rejection reason is
    /// cleared.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`] or [`LedgerError::NotFound`], as for
    /// [`RequestLedger::set_status`].
    pub fn set_status_typed(
        &mut self,
        session: Option<&User>,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<(), LedgerError> {
        require_role(session, Role::Administrator)?;
        self.apply_status(id, status, None)
    }

    /// Reject a request and record why.
    ///
    /// The reason is truncated like a justification.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotAuthorized`] or [`LedgerError::NotFound`].
    pub fn reject_with_reason(
        &mut self,
        session: Option<&User>,
        id: RequestId,
        reason: &str,
    ) -> Result<(), LedgerError> {
        require_role(session, Role::Administrator)?;
        let reason = truncate_chars(reason.trim(), MAX_JUSTIFICATION_CHARS);
        let reason = (!reason.is_empty()).then_some(reason);
        self.apply_status(id, RequestStatus::Rejected, reason)
    }

    /// Count requests per status, across the whole collection.
    #[must_use]
    pub fn summary(&self) -> StatusSummary {
        self.requests
            .iter()
            .fold(StatusSummary::default(), |mut acc, r| {
                match r.status {
                    RequestStatus::Pending => acc.pending += 1,
                    RequestStatus::Approved => acc.approved += 1,
                    RequestStatus::Rejected => acc.rejected += 1,
                }
                acc
            })
    }

    /// All requests in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter()
    }

    /// Number of requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the ledger holds no request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn apply_status(
        &mut self,
        id: RequestId,
        status: RequestStatus,
        reason: Option<String>,
    ) -> Result<(), LedgerError> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| LedgerError::request_not_found(id))?;
        request.status = status;
        request.rejection_reason = reason;
        Ok(())
    }

    fn next_id(&self) -> Result<RequestId, LedgerError> {
        match self.requests.iter().map(|r| r.id).max() {
            None => Ok(RequestId::FIRST),
            Some(max) => max
                .next()
                .ok_or_else(|| LedgerError::ids_exhausted("request")),
        }
    }
}

fn require_role(session: Option<&User>, role: Role) -> Result<&User, LedgerError> {
    session
        .filter(|user| user.role == role)
        .ok_or(LedgerError::NotAuthorized)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::types::{Secret, UserId};

    fn user(id: i32, email: &str, role: Role) -> User {
        User::new(UserId::new(id), "test", Email::new(email), Secret::new("pw"), role)
    }

    fn rice() -> Vec<Item> {
        vec![Item::new("Rice", 10, "Food").unwrap()]
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(minutes)
    }

    #[test]
    fn test_item_rejects_zero_quantity() {
        assert!(matches!(
            Item::new("Rice", 0, "Food"),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_create_as_institution() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let mut ledger = RequestLedger::new();

        let id = ledger.create(Some(&ong), "Urgent", rice(), at(0)).unwrap();

        let request = ledger.get(id).unwrap();
        assert_eq!(id, RequestId::FIRST);
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.institution_email, ong.email);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.created_at, at(0));
    }

    #[test]
    fn test_create_requires_institution() {
        let admin = user(1, "admin@doacao.com", Role::Administrator);
        let donor = user(2, "carlos@doador.com", Role::Donor);
        let mut ledger = RequestLedger::new();

        for session in [None, Some(&admin), Some(&donor)] {
            assert_eq!(
                ledger.create(session, "x", rice(), at(0)).unwrap_err(),
                LedgerError::NotAuthorized
            );
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_create_checks_authorization_before_items() {
        let donor = user(1, "d@x.org", Role::Donor);
        let mut ledger = RequestLedger::new();
        assert_eq!(
            ledger.create(Some(&donor), "x", Vec::new(), at(0)).unwrap_err(),
            LedgerError::NotAuthorized
        );
    }

    #[test]
    fn test_create_rejects_empty_items() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let mut ledger = RequestLedger::new();
        assert!(matches!(
            ledger.create(Some(&ong), "x", Vec::new(), at(0)),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_create_truncates_justification_by_chars() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let mut ledger = RequestLedger::new();

        let long = "ç".repeat(150);
        let id = ledger.create(Some(&ong), &long, rice(), at(0)).unwrap();
        let stored = &ledger.get(id).unwrap().justification;
        assert_eq!(stored.chars().count(), MAX_JUSTIFICATION_CHARS);

        let short = ledger.create(Some(&ong), "Urgent", rice(), at(1)).unwrap();
        assert_eq!(ledger.get(short).unwrap().justification, "Urgent");
    }

    #[test]
    fn test_ids_are_sequential() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let mut ledger = RequestLedger::new();
        let ids: Vec<i32> = (0..5)
            .map(|i| ledger.create(Some(&ong), "x", rice(), at(i)).unwrap().as_i32())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_list_visibility_by_role() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let other = user(2, "other@x.org", Role::Institution);
        let admin = user(3, "admin@doacao.com", Role::Administrator);
        let donor = user(4, "d@x.org", Role::Donor);
        let mut ledger = RequestLedger::new();

        let mine = ledger.create(Some(&ong), "a", rice(), at(0)).unwrap();
        let theirs = ledger.create(Some(&other), "b", rice(), at(1)).unwrap();
        ledger
            .set_status_typed(Some(&admin), theirs, RequestStatus::Approved)
            .unwrap();

        assert!(ledger.list(None).is_empty());
        assert_eq!(ledger.list(Some(&admin)).len(), 2);

        let own: Vec<RequestId> = ledger.list(Some(&ong)).iter().map(|r| r.id).collect();
        assert_eq!(own, vec![mine]);

        let approved: Vec<RequestId> = ledger.list(Some(&donor)).iter().map(|r| r.id).collect();
        assert_eq!(approved, vec![theirs]);
    }

    #[test]
    fn test_list_sorted_newest_first_with_stable_ties() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let admin = user(2, "admin@doacao.com", Role::Administrator);
        let mut ledger = RequestLedger::new();

        let first = ledger.create(Some(&ong), "a", rice(), at(5)).unwrap();
        let tie = ledger.create(Some(&ong), "b", rice(), at(5)).unwrap();
        let newest = ledger.create(Some(&ong), "c", rice(), at(9)).unwrap();
        let oldest = ledger.create(Some(&ong), "d", rice(), at(1)).unwrap();

        let order: Vec<RequestId> = ledger.list(Some(&admin)).iter().map(|r| r.id).collect();
        assert_eq!(order, vec![newest, first, tie, oldest]);
    }

    #[test]
    fn test_get_ignores_visibility() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let mut ledger = RequestLedger::new();
        let id = ledger.create(Some(&ong), "a", rice(), at(0)).unwrap();
        assert!(ledger.get(id).is_some());
        assert!(ledger.get(RequestId::new(99)).is_none());
    }

    #[test]
    fn test_set_status_requires_administrator() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let mut ledger = RequestLedger::new();
        let id = ledger.create(Some(&ong), "a", rice(), at(0)).unwrap();

        assert_eq!(
            ledger.set_status(Some(&ong), id, "approved").unwrap_err(),
            LedgerError::NotAuthorized
        );
        assert_eq!(
            ledger.set_status(None, id, "approved").unwrap_err(),
            LedgerError::NotAuthorized
        );
        assert_eq!(ledger.get(id).unwrap().status, RequestStatus::Pending);
    }

    #[test]
    fn test_set_status_error_order() {
        let admin = user(1, "admin@doacao.com", Role::Administrator);
        let donor = user(2, "d@x.org", Role::Donor);
        let mut ledger = RequestLedger::new();

        assert_eq!(
            ledger.set_status(Some(&donor), RequestId::new(7), "bogus").unwrap_err(),
            LedgerError::NotAuthorized
        );
        assert!(matches!(
            ledger.set_status(Some(&admin), RequestId::new(7), "bogus"),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.set_status(Some(&admin), RequestId::new(7), "approved"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_every_transition_is_allowed() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let admin = user(2, "admin@doacao.com", Role::Administrator);
        let mut ledger = RequestLedger::new();
        let id = ledger.create(Some(&ong), "a", rice(), at(0)).unwrap();

        for from in RequestStatus::ALL {
            for to in RequestStatus::ALL {
                ledger.set_status_typed(Some(&admin), id, from).unwrap();
                ledger.set_status_typed(Some(&admin), id, to).unwrap();
                assert_eq!(ledger.get(id).unwrap().status, to);
            }
        }
    }

    #[test]
    fn test_reject_with_reason_then_reopen_clears_reason() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let admin = user(2, "admin@doacao.com", Role::Administrator);
        let mut ledger = RequestLedger::new();
        let id = ledger.create(Some(&ong), "a", rice(), at(0)).unwrap();

        ledger
            .reject_with_reason(Some(&admin), id, "  Out of scope  ")
            .unwrap();
        let request = ledger.get(id).unwrap();
        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.rejection_reason.as_deref(), Some("Out of scope"));

        ledger.set_status(Some(&admin), id, "pending").unwrap();
        assert!(ledger.get(id).unwrap().rejection_reason.is_none());
    }

    #[test]
    fn test_reject_with_blank_reason_stores_none() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let admin = user(2, "admin@doacao.com", Role::Administrator);
        let mut ledger = RequestLedger::new();
        let id = ledger.create(Some(&ong), "a", rice(), at(0)).unwrap();

        ledger.reject_with_reason(Some(&admin), id, "   ").unwrap();
        assert!(ledger.get(id).unwrap().rejection_reason.is_none());
        assert_eq!(
            ledger.reject_with_reason(Some(&ong), id, "no").unwrap_err(),
            LedgerError::NotAuthorized
        );
    }

    #[test]
    fn test_summary_counts_statuses() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let admin = user(2, "admin@doacao.com", Role::Administrator);
        let mut ledger = RequestLedger::new();
        for i in 0..4 {
            ledger.create(Some(&ong), "a", rice(), at(i)).unwrap();
        }
        ledger.set_status(Some(&admin), RequestId::new(1), "approved").unwrap();
        ledger.set_status(Some(&admin), RequestId::new(2), "rejected").unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_from_requests_validates() {
        let request = |id: i32, items: Vec<Item>| Request {
            id: RequestId::new(id),
            institution_email: Email::new("ong@apoio.org"),
            justification: String::new(),
            status: RequestStatus::Pending,
            rejection_reason: None,
            created_at: at(0),
            items,
        };

        assert!(matches!(
            RequestLedger::from_requests(vec![request(1, rice()), request(1, rice())]),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            RequestLedger::from_requests(vec![request(1, Vec::new())]),
            Err(LedgerError::InvalidInput(_))
        ));

        let ong = user(1, "ong@apoio.org", Role::Institution);
        let mut ledger =
            RequestLedger::from_requests(vec![request(3, rice()), request(8, rice())]).unwrap();
        let id = ledger.create(Some(&ong), "next", rice(), at(1)).unwrap();
        assert_eq!(id, RequestId::new(9));
    }

    fn stored(id: i32, justification: &str, reason: Option<&str>) -> Request {
        Request {
            id: RequestId::new(id),
            institution_email: Email::new("ong@apoio.org"),
            justification: justification.to_owned(),
            status: RequestStatus::Rejected,
            rejection_reason: reason.map(str::to_owned),
            created_at: at(0),
            items: rice(),
        }
    }

    #[test]
    fn test_from_requests_enforces_text_bound() {
        let at_limit = "é".repeat(MAX_JUSTIFICATION_CHARS);
        let over = "é".repeat(MAX_JUSTIFICATION_CHARS + 1);

        assert!(RequestLedger::from_requests(vec![stored(1, &at_limit, Some(&at_limit))]).is_ok());
        assert!(matches!(
            RequestLedger::from_requests(vec![stored(1, &over, None)]),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            RequestLedger::from_requests(vec![stored(1, "ok", Some(&over))]),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_create_fails_once_ids_run_out() {
        let ong = user(1, "ong@apoio.org", Role::Institution);
        let admin = user(2, "admin@doacao.com", Role::Administrator);
        let mut ledger = RequestLedger::from_requests(vec![stored(i32::MAX, "last", None)]).unwrap();

        assert!(matches!(
            ledger.create(Some(&ong), "one more", rice(), at(1)),
            Err(LedgerError::InvalidInput(_))
        ));
        assert_eq!(ledger.len(), 1);

        // The existing request is still the only one a status change reaches.
        ledger
            .set_status_typed(Some(&admin), RequestId::new(i32::MAX), RequestStatus::Approved)
            .unwrap();
        assert_eq!(ledger.summary().approved, 1);
        assert_eq!(ledger.get(RequestId::new(i32::MAX)).unwrap().justification, "last");
    }
}

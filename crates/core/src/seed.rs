//! Fixture data: the built-in demo set and user-supplied seed files.
//!
//! Seeding goes through the same rules as interactive use. Requests are
//! created on behalf of their institution's account and reviewed on behalf
//! of a registered administrator, so a seed file cannot produce a request
//! the ledger would not have accepted. The active session is never touched.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::clock::Clock;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::requests::Item;
use crate::types::{RequestStatus, Role};

/// A fixture file: users first, then their requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub requests: Vec<SeedRequest>,
}

/// A user to register.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub secret: String,
    pub role: Role,
}

/// A request to create.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedRequest {
    /// Email of an existing institution account.
    pub institution: String,
    pub justification: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Creation time; the ledger clock is used when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<SeedItem>,
}

/// One item of a [`SeedRequest`].
#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub product_name: String,
    pub quantity: u32,
    pub category: String,
}

/// Outcome of [`Ledger::apply_seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    /// Users whose email was already registered.
    pub users_skipped: usize,
    pub requests_created: usize,
}

impl SeedData {
    /// The demo set: one account per role, all with secret `123`, and two
    /// requests from the institution (one pending, one approved).
    #[must_use]
    pub fn demo() -> Self {
        let user = |name: &str, email: &str, role| SeedUser {
            name: name.to_owned(),
            email: email.to_owned(),
            secret: "123".to_owned(),
            role,
        };
        let item = |product_name: &str, quantity, category: &str| SeedItem {
            product_name: product_name.to_owned(),
            quantity,
            category: category.to_owned(),
        };

        Self {
            users: vec![
                user("Admin Master", "admin@doacao.com", Role::Administrator),
                user("Casa de Apoio S.J.", "ong@apoio.org", Role::Institution),
                user("Carlos Doador", "carlos@doador.com", Role::Donor),
            ],
            requests: vec![
                SeedRequest {
                    institution: "ong@apoio.org".to_owned(),
                    justification: "Year-end emergency for 50 families.".to_owned(),
                    status: RequestStatus::Pending,
                    rejection_reason: None,
                    created_at: None,
                    items: vec![
                        item("Rice 5kg", 100, "Food"),
                        item("Laundry soap", 50, "Hygiene"),
                    ],
                },
                SeedRequest {
                    institution: "ong@apoio.org".to_owned(),
                    justification: "New furniture and winter clothing.".to_owned(),
                    status: RequestStatus::Approved,
                    rejection_reason: None,
                    created_at: None,
                    items: vec![item("Chairs", 10, "Furniture"), item("Coats (L)", 30, "Clothing")],
                },
            ],
        }
    }
}

impl Ledger {
    /// An in-memory ledger preloaded with [`SeedData::demo`].
    ///
    /// # Errors
    ///
    /// Never fails on the built-in data; the `Result` mirrors
    /// [`Ledger::apply_seed`].
    pub fn with_demo_data() -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        ledger.apply_seed(&SeedData::demo())?;
        Ok(ledger)
    }
}

impl<C: Clock> Ledger<C> {
    /// Register the seed users and create the seed requests.
    ///
    /// Users whose email already exists are skipped. Requests are always
    /// created anew.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] if a request names an unknown institution.
    /// - [`LedgerError::NotAuthorized`] if that account is not an
    ///   institution, or a non-pending status is requested while no
    ///   administrator is registered.
    /// - [`LedgerError::InvalidInput`] for empty item lists or zero quantities.
    ///
    /// Records applied before the failing one are kept.
    pub fn apply_seed(&mut self, seed: &SeedData) -> Result<SeedReport, LedgerError> {
        let mut report = SeedReport::default();

        for user in &seed.users {
            if self.identity.find_by_email(&user.email).is_some() {
                report.users_skipped += 1;
                continue;
            }
            self.identity
                .register(&user.name, &user.email, &user.secret, user.role)?;
            report.users_created += 1;
        }

        for request in &seed.requests {
            let items = request
                .items
                .iter()
                .map(|i| Item::new(&i.product_name, i.quantity, &i.category))
                .collect::<Result<Vec<_>, _>>()?;

            let institution = self
                .identity
                .find_by_email(&request.institution)
                .ok_or_else(|| {
                    LedgerError::NotFound(format!("institution {}", request.institution))
                })?;
            let created_at = request.created_at.unwrap_or_else(|| self.clock.now());
            let id = self.requests.create(
                Some(institution),
                &request.justification,
                items,
                created_at,
            )?;
            report.requests_created += 1;

            if request.status == RequestStatus::Pending {
                continue;
            }
            let admin = self
                .identity
                .users()
                .find(|u| u.role == Role::Administrator);
            match (request.status, request.rejection_reason.as_deref()) {
                (RequestStatus::Rejected, Some(reason)) => {
                    self.requests.reject_with_reason(admin, id, reason)?;
                }
                (status, _) => self.requests.set_status_typed(admin, id, status)?,
            }
        }

        Ok(report)
    }
}

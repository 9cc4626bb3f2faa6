//! The ledger a command works on, plus where (if anywhere) it is saved.

use donation_desk_core::storage::FlatFileStore;
use donation_desk_core::{Ledger, SeedData};
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::error::CommandError;

/// A loaded ledger and its optional flat-file store.
pub struct Workspace {
    ledger: Ledger,
    store: Option<FlatFileStore>,
}

impl Workspace {
    /// Load the ledger described by `config`.
    ///
    /// With a data directory the flat files are opened (and created when
    /// missing); without one an empty in-memory ledger is used. Demo data is
    /// applied only when no user exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the files cannot be read or are inconsistent.
    pub fn open(config: &CliConfig) -> Result<Self, CommandError> {
        let mut workspace = match &config.data_dir {
            Some(dir) => {
                let store = FlatFileStore::open(dir)?;
                let ledger = store.load()?;
                info!(
                    dir = %dir.display(),
                    users = ledger.identity().len(),
                    requests = ledger.requests().len(),
                    "Loaded data directory"
                );
                Self {
                    ledger,
                    store: Some(store),
                }
            }
            None => {
                debug!("No data directory configured, running in memory");
                Self::in_memory(Ledger::new())
            }
        };

        if config.demo_data {
            if workspace.ledger.identity().is_empty() {
                let report = workspace.ledger.apply_seed(&SeedData::demo())?;
                info!(
                    users = report.users_created,
                    requests = report.requests_created,
                    "Loaded demo data"
                );
                workspace.persist()?;
            } else {
                debug!("Ledger already has users, skipping demo data");
            }
        }

        Ok(workspace)
    }

    /// Wrap a ledger without persistence.
    #[must_use]
    pub const fn in_memory(ledger: Ledger) -> Self {
        Self {
            ledger,
            store: None,
        }
    }

    /// Open a workspace, insisting on a data directory.
    ///
    /// # Errors
    ///
    /// [`CommandError::MissingDataDir`] when none is configured, otherwise as
    /// for [`Workspace::open`].
    pub fn open_persistent(config: &CliConfig) -> Result<Self, CommandError> {
        if config.data_dir.is_none() {
            return Err(CommandError::MissingDataDir);
        }
        Self::open(config)
    }

    /// The ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The ledger, mutably.
    pub const fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Whether changes are written to disk.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Write the ledger to the data directory, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the files cannot be written.
    pub fn persist(&self) -> Result<(), CommandError> {
        if let Some(store) = &self.store {
            store.save(&self.ledger)?;
            debug!(dir = %store.dir().display(), "Saved ledger");
        }
        Ok(())
    }
}

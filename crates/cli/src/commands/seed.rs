//! Load users and requests from a YAML fixture file.
//!
//! ```yaml
//! users:
//!   - { name: Admin, email: admin@doacao.com, secret: "123", role: administrator }
//!   - { name: Casa de Apoio, email: ong@apoio.org, secret: "123", role: institution }
//! requests:
//!   - institution: ong@apoio.org
//!     justification: Winter drive
//!     status: approved
//!     items:
//!       - { product_name: Coats, quantity: 30, category: Clothing }
//! ```
//!
//! Users whose email is already registered are skipped, so re-running a
//! file only adds what is missing from the user list. Requests are always
//! created.

use std::path::Path;

use donation_desk_core::{Email, SeedData, SeedReport};
use tracing::{error, info};

use crate::config::CliConfig;
use crate::error::CommandError;
use crate::workspace::Workspace;

/// Seed the data directory from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if it fails
/// validation, if no data directory is configured, or if the ledger
/// refuses a record (for example a request naming an unknown institution).
pub fn from_file(config: &CliConfig, path: &Path) -> Result<SeedReport, CommandError> {
    info!(path = %path.display(), "Loading seed file");

    let content = std::fs::read_to_string(path).map_err(|source| CommandError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let seed: SeedData = serde_yaml::from_str(&content)?;
    info!(
        users = seed.users.len(),
        requests = seed.requests.len(),
        "Parsed seed file"
    );

    // Validate before touching the data directory
    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidSeed(errors.len()));
    }

    let mut workspace = Workspace::open_persistent(config)?;
    let report = workspace.ledger_mut().apply_seed(&seed)?;
    workspace.persist()?;

    info!("Seeding complete!");
    info!("  Users created: {}", report.users_created);
    info!("  Users skipped (already exist): {}", report.users_skipped);
    info!("  Requests created: {}", report.requests_created);

    Ok(report)
}

/// Problems the ledger would not catch on its own.
fn validate(seed: &SeedData) -> Vec<String> {
    let mut errors = Vec::new();
    for user in &seed.users {
        if let Err(e) = Email::parse(user.email.as_str()) {
            errors.push(format!("user {:?}: {e}", user.email));
        }
        if user.secret.is_empty() {
            errors.push(format!("user {:?}: empty secret", user.email));
        }
    }
    for (index, request) in seed.requests.iter().enumerate() {
        if request.items.is_empty() {
            errors.push(format!("request #{}: no items", index + 1));
        }
        if request.items.iter().any(|item| item.quantity == 0) {
            errors.push(format!("request #{}: zero quantity", index + 1));
        }
    }
    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write as _;

    use donation_desk_core::storage::FlatFileStore;
    use donation_desk_core::{RequestId, RequestStatus};

    use super::*;

    const FIXTURE: &str = r#"
users:
  - { name: Admin, email: admin@doacao.com, secret: "123", role: administrator }
  - { name: Casa de Apoio, email: ong@apoio.org, secret: "123", role: institution }
requests:
  - institution: ong@apoio.org
    justification: Winter drive
    status: rejected
    rejection_reason: Duplicate of an earlier request
    created_at: 2024-06-01T12:00:00Z
    items:
      - { product_name: Coats, quantity: 30, category: Clothing }
"#;

    fn write_fixture(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("seed.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_seed_file_is_applied_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), FIXTURE);
        let config = CliConfig {
            data_dir: Some(dir.path().join("data")),
            demo_data: false,
        };

        let report = from_file(&config, &path).unwrap();
        assert_eq!(report.users_created, 2);
        assert_eq!(report.requests_created, 1);

        let ledger = FlatFileStore::open(dir.path().join("data"))
            .unwrap()
            .load()
            .unwrap();
        let request = ledger.get_request(RequestId::FIRST).unwrap();
        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(
            request.rejection_reason.as_deref(),
            Some("Duplicate of an earlier request")
        );
        assert_eq!(request.created_at.to_rfc3339(), "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_rerun_skips_existing_users() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), FIXTURE);
        let config = CliConfig {
            data_dir: Some(dir.path().join("data")),
            demo_data: false,
        };

        from_file(&config, &path).unwrap();
        let report = from_file(&config, &path).unwrap();
        assert_eq!(report.users_created, 0);
        assert_eq!(report.users_skipped, 2);
    }

    #[test]
    fn test_invalid_fixture_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "users:\n  - { name: X, email: nope, secret: \"\", role: donor }\n",
        );
        let config = CliConfig {
            data_dir: Some(dir.path().join("data")),
            demo_data: false,
        };

        let err = from_file(&config, &path).unwrap_err();
        assert!(matches!(err, CommandError::InvalidSeed(2)));
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: Some(dir.path().to_path_buf()),
            demo_data: false,
        };
        let err = from_file(&config, &dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, CommandError::ReadFile { .. }));
    }
}

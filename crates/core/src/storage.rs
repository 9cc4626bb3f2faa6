//! Flat-file persistence.
//!
//! Three delimited text files live in one directory, each starting with a
//! header row and holding one record per line:
//!
//! | File           | Columns                                                              |
//! |----------------|----------------------------------------------------------------------|
//! | `users.txt`    | `id;name;email;secret;role;active`                                   |
//! | `requests.txt` | `id;institution_email;justification;status;created_at;rejection_reason` |
//! | `items.txt`    | `request_id;product_name;quantity;category`                          |
//!
//! Field text is escaped (`\\`, `\;`, `\n`, `\r`) so user input cannot break
//! a record. Timestamps are RFC 3339 and `active` is `1` or `0`. Next
//! identifiers are not stored; they are recomputed as max + 1 when the ledger
//! is rebuilt.
//!
//! [`FlatFileStore::save`] writes every file to a `.txt.tmp` sibling before
//! renaming any of them, so a failed write leaves all three files as they
//! were. Each rename is atomic on its own, but there is no guarantee across
//! files: a crash between renames can leave a mix of old and new files.
//!
//! # Example
//!
//! ```no_run
//! use donation_desk_core::storage::FlatFileStore;
//!
//! let store = FlatFileStore::open("data")?;
//! let mut ledger = store.load()?;
//! ledger.authenticate("ong@apoio.org", "123")?;
//! store.save(&ledger)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::identity::{IdentityStore, User};
use crate::ledger::Ledger;
use crate::requests::{Item, Request, RequestLedger};
use crate::types::{Email, RequestId, RequestStatus, Role, Secret, UserId};

const USERS_FILE: &str = "users.txt";
const REQUESTS_FILE: &str = "requests.txt";
const ITEMS_FILE: &str = "items.txt";

const USERS_HEADER: &str = "id;name;email;secret;role;active";
const REQUESTS_HEADER: &str =
    "id;institution_email;justification;status;created_at;rejection_reason";
const ITEMS_HEADER: &str = "request_id;product_name;quantity;category";

const DELIMITER: char = ';';

/// Errors raised while reading or writing the flat files.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line could not be parsed.
    #[error("{file}:{line}: {reason}")]
    Malformed {
        /// File name within the data directory.
        file: &'static str,
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// The records parsed but violate a ledger invariant.
    #[error("inconsistent data: {0}")]
    Ledger(#[from] LedgerError),
}

/// Directory-backed store for a [`Ledger`].
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    dir: PathBuf,
}

impl FlatFileStore {
    /// Open a data directory, creating it and any missing file (header only).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory or a file cannot be
    /// created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self { dir: dir.into() };
        fs::create_dir_all(&store.dir).map_err(|source| StorageError::Io {
            path: store.dir.clone(),
            source,
        })?;
        for (file, header) in [
            (USERS_FILE, USERS_HEADER),
            (REQUESTS_FILE, REQUESTS_HEADER),
            (ITEMS_FILE, ITEMS_HEADER),
        ] {
            let path = store.dir.join(file);
            if !path.exists() {
                let tmp = write_temp(&path, &format!("{header}\n"))?;
                commit_temp(&tmp, &path)?;
            }
        }
        Ok(store)
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a ledger that stamps new requests with the wall clock.
    ///
    /// # Errors
    ///
    /// See [`FlatFileStore::load_with_clock`].
    pub fn load(&self) -> Result<Ledger, StorageError> {
        self.load_with_clock(SystemClock)
    }

    /// Load a ledger using the given clock. No session is active afterwards.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`] if a file cannot be read.
    /// - [`StorageError::Malformed`] for a bad header, field count or value.
    /// - [`StorageError::Ledger`] for duplicate identifiers or emails, or a
    ///   request without items.
    pub fn load_with_clock<C: Clock>(&self, clock: C) -> Result<Ledger<C>, StorageError> {
        let users = self
            .read_records(USERS_FILE, USERS_HEADER)?
            .into_iter()
            .map(|(line, fields)| parse_user(line, &fields))
            .collect::<Result<Vec<_>, _>>()?;

        let mut items_by_request: BTreeMap<RequestId, Vec<Item>> = BTreeMap::new();
        for (line, fields) in self.read_records(ITEMS_FILE, ITEMS_HEADER)? {
            let (request_id, item) = parse_item(line, &fields)?;
            items_by_request.entry(request_id).or_default().push(item);
        }

        let mut requests = Vec::new();
        for (line, fields) in self.read_records(REQUESTS_FILE, REQUESTS_HEADER)? {
            let mut request = parse_request(line, &fields)?;
            request.items = items_by_request.remove(&request.id).unwrap_or_default();
            requests.push(request);
        }
        if let Some(orphan) = items_by_request.keys().next() {
            return Err(StorageError::Malformed {
                file: ITEMS_FILE,
                line: 0,
                reason: format!("items reference unknown request {orphan}"),
            });
        }

        Ok(Ledger::from_parts(
            IdentityStore::from_users(users)?,
            RequestLedger::from_requests(requests)?,
            clock,
        ))
    }

    /// Rewrite all three files from the ledger's current contents.
    ///
    /// All three temporary siblings are written first; only then is each
    /// renamed into place. See the module docs for what this does and does
    /// not guarantee.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on any write or rename failure. A write
    /// failure removes the temporary files already written.
    pub fn save<C: Clock>(&self, ledger: &Ledger<C>) -> Result<(), StorageError> {
        let mut users = format!("{USERS_HEADER}\n");
        for user in ledger.identity().users() {
            push_record(
                &mut users,
                &[
                    &user.id.to_string(),
                    &user.name,
                    user.email.as_str(),
                    user.secret().expose(),
                    user.role.as_str(),
                    if user.active { "1" } else { "0" },
                ],
            );
        }

        let mut requests = format!("{REQUESTS_HEADER}\n");
        let mut items = format!("{ITEMS_HEADER}\n");
        for request in ledger.requests().iter() {
            let id = request.id.to_string();
            push_record(
                &mut requests,
                &[
                    &id,
                    request.institution_email.as_str(),
                    &request.justification,
                    request.status.as_str(),
                    &request.created_at.to_rfc3339(),
                    request.rejection_reason.as_deref().unwrap_or(""),
                ],
            );
            for item in &request.items {
                push_record(
                    &mut items,
                    &[
                        &id,
                        &item.product_name,
                        &item.quantity.to_string(),
                        &item.category,
                    ],
                );
            }
        }

        let targets = [
            (self.dir.join(USERS_FILE), users),
            (self.dir.join(ITEMS_FILE), items),
            (self.dir.join(REQUESTS_FILE), requests),
        ];
        let mut staged = Vec::with_capacity(targets.len());
        for (path, content) in targets {
            match write_temp(&path, &content) {
                Ok(tmp) => staged.push((tmp, path)),
                Err(err) => {
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(err);
                }
            }
        }
        for (tmp, path) in &staged {
            commit_temp(tmp, path)?;
        }
        Ok(())
    }

    /// Read a file's data rows as `(line number, fields)`.
    ///
    /// A missing file has no rows. Blank lines are skipped.
    fn read_records(
        &self,
        file: &'static str,
        header: &str,
    ) -> Result<Vec<(usize, Vec<String>)>, StorageError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content =
            fs::read_to_string(&path).map_err(|source| StorageError::Io { path, source })?;

        let mut lines = content.lines().enumerate();
        match lines.next() {
            Some((_, first)) if first.trim_end() == header => {}
            Some(_) => {
                return Err(StorageError::Malformed {
                    file,
                    line: 1,
                    reason: format!("expected header `{header}`"),
                });
            }
            None => return Ok(Vec::new()),
        }

        lines
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                split_fields(line)
                    .map(|fields| (index + 1, fields))
                    .map_err(|reason| StorageError::Malformed {
                        file,
                        line: index + 1,
                        reason,
                    })
            })
            .collect()
    }
}

fn parse_user(line: usize, fields: &[String]) -> Result<User, StorageError> {
    let malformed = |reason: String| StorageError::Malformed {
        file: USERS_FILE,
        line,
        reason,
    };
    let [id, name, email, secret, role, active] = fields else {
        return Err(malformed(format!("expected 6 fields, found {}", fields.len())));
    };
    let id = id
        .parse::<UserId>()
        .map_err(|e| malformed(format!("bad id `{id}`: {e}")))?;
    let role = role.parse::<Role>().map_err(|e| malformed(format!("{e}")))?;
    let active = match active.trim() {
        "1" => true,
        "0" => false,
        other => return Err(malformed(format!("bad active flag `{other}`, expected 1 or 0"))),
    };
    Ok(User::new(
        id,
        name.as_str(),
        Email::new(email.as_str()),
        Secret::new(secret.as_str()),
        role,
    )
    .with_active(active))
}

fn parse_request(line: usize, fields: &[String]) -> Result<Request, StorageError> {
    let malformed = |reason: String| StorageError::Malformed {
        file: REQUESTS_FILE,
        line,
        reason,
    };
    let [id, email, justification, status, created_at, reason] = fields else {
        return Err(malformed(format!("expected 6 fields, found {}", fields.len())));
    };
    let id = id
        .parse::<RequestId>()
        .map_err(|e| malformed(format!("bad id `{id}`: {e}")))?;
    let status = status.parse::<RequestStatus>().map_err(|e| malformed(format!("{e}")))?;
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| malformed(format!("bad timestamp `{created_at}`: {e}")))?
        .with_timezone(&Utc);
    Ok(Request {
        id,
        institution_email: Email::new(email.as_str()),
        justification: justification.clone(),
        status,
        rejection_reason: (!reason.is_empty()).then(|| reason.clone()),
        created_at,
        items: Vec::new(),
    })
}

fn parse_item(line: usize, fields: &[String]) -> Result<(RequestId, Item), StorageError> {
    let malformed = |reason: String| StorageError::Malformed {
        file: ITEMS_FILE,
        line,
        reason,
    };
    let [request_id, product_name, quantity, category] = fields else {
        return Err(malformed(format!("expected 4 fields, found {}", fields.len())));
    };
    let request_id = request_id
        .parse::<RequestId>()
        .map_err(|e| malformed(format!("bad request id `{request_id}`: {e}")))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|e| malformed(format!("bad quantity `{quantity}`: {e}")))?;
    let item = Item::new(product_name.as_str(), quantity, category.as_str())
        .map_err(|e| malformed(e.to_string()))?;
    Ok((request_id, item))
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        escape_into(out, field);
    }
    out.push('\n');
}

fn escape_into(out: &mut String, field: &str) {
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            DELIMITER => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
}

fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\\') => current.push('\\'),
                Some(';') => current.push(';'),
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => return Err(format!("unknown escape `\\{other}`")),
                None => return Err("dangling escape at end of line".to_owned()),
            },
            DELIMITER => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    Ok(fields)
}

fn write_temp(path: &Path, content: &str) -> Result<PathBuf, StorageError> {
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, content).map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    Ok(tmp)
}

fn commit_temp(tmp: &Path, path: &Path) -> Result<(), StorageError> {
    fs::rename(tmp, path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

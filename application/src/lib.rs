use async_trait::async_trait;
use domain::{CodecError, DomainError, Personnel, Record};
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub mod index;
pub mod ledger;
pub mod personnel;
pub mod project;

#[cfg(test)]
pub(crate) mod test_support;

pub use index::{IndexManager, IndexName, PERSONNEL_INDEX_KEY, PROJECT_INDEX_KEY};
pub use ledger::{INIT_KEY, Ledger};
pub use personnel::PersonnelService;
pub use project::ProjectService;

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("This {kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: String },
    #[error("{0}")]
    NotFound(String),
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Received unknown function {0}")]
    UnknownFunction(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Field validation failures
    #[error("Codec error: {0}")]
    CodecError(#[from] CodecError),
}

/// Coarse classification of [`ApplicationError`], used by hosts to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    AlreadyExists,
    NotFound,
    StoreError,
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::InvalidArgument(_)
            | ApplicationError::UnknownFunction(_)
            | ApplicationError::DomainError(_) => ErrorKind::InvalidArgument,
            ApplicationError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ApplicationError::NotFound(_) => ErrorKind::NotFound,
            ApplicationError::StoreError(_) | ApplicationError::CodecError(_) => {
                ErrorKind::StoreError
            }
        }
    }
}

// --- Infrastructure Interfaces (Traits) ---

/// Byte-valued key-value store the ledger runs against.
///
/// Reads of unset keys return `Ok(None)`. A write is visible to every read
/// that follows it within the same invocation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ApplicationError>;
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), ApplicationError>;
    /// Writes several keys. The default writes them one by one and is NOT
    /// atomic; stores that can commit all entries together should override it.
    #[instrument(skip(self, entries))]
    async fn put_batch(&self, entries: &[(String, Vec<u8>)]) -> Result<(), ApplicationError> {
        warn!(
            count = entries.len(),
            "Store has no atomic batch write; writing entries one by one"
        );
        for (key, value) in entries {
            self.put(key, value).await?;
        }
        Ok(())
    }
}

// --- Configuration ---

/// How a creation operation commits the new record and its index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationPolicy {
    /// Record first, then index append. A failed append is logged and the
    /// record stays visible but unindexed; nothing is rolled back.
    #[default]
    Sequential,
    /// Record and updated index go out in a single `put_batch`.
    Atomic,
}

impl FromStr for CreationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(CreationPolicy::Sequential),
            "atomic" => Ok(CreationPolicy::Atomic),
            other => Err(format!("unknown creation policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub creation_policy: CreationPolicy,
}

// --- Request Models (DTOs) ---

/// One named operation with its positional string arguments.
#[derive(Deserialize, Debug, Clone)]
pub struct InvocationRequest {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Raw personnel fields as received from a caller; `level` is still text.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PersonnelRequest {
    pub id: String,
    pub name: String,
    pub job_title: String,
    pub level: String,
    pub job_group: String,
}

impl PersonnelRequest {
    /// Builds a request from the positional `id, name, jobTitle, level, jobGroup` form.
    /// The caller checks the argument count.
    pub fn from_args(args: &[String]) -> Option<Self> {
        match args {
            [id, name, job_title, level, job_group] => Some(Self {
                id: id.clone(),
                name: name.clone(),
                job_title: job_title.clone(),
                level: level.clone(),
                job_group: job_group.clone(),
            }),
            _ => None,
        }
    }

    pub fn parse(&self) -> Result<Personnel, DomainError> {
        Personnel::parse(
            &self.id,
            &self.name,
            &self.job_title,
            &self.level,
            &self.job_group,
        )
    }
}

/// Reads and decodes the record at `key`.
///
/// `Ok(None)` means the key was never written. Bytes that fail to decode are
/// logged and treated as the zero-valued record.
pub(crate) async fn load_record<T: Record>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    let Some(bytes) = store.get(key).await? else {
        debug!(key = %key, "Key not present in store");
        return Ok(None);
    };
    match T::try_decode(&bytes) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            warn!(key = %key, "Stored value did not decode, using zero value: {}", e);
            Ok(Some(T::default()))
        }
    }
}

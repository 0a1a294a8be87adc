//! Translation repository capability seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    TranslationEntry,
    TranslationFilter,
    TranslationKey,
};

/// Defines errors that may occur against a backing store
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Error when the backing store cannot be reached
    #[error("Backing store unreachable: {0}")]
    Unreachable(#[from] std::io::Error),
    /// Error when stored data cannot be read or written
    #[error("Stored data could not be decoded: {0}")]
    Storage(#[from] serde_json::Error),
    /// Error when a filter pattern is not a valid glob
    #[error("Invalid filter pattern: {0}")]
    InvalidFilter(#[from] globset::Error),
    /// Error when an entry cannot be persisted as given
    #[error("Entry rejected: {0}")]
    InvalidEntry(String),
    /// Error when writing to a read-only repository
    #[error("Repository does not accept writes")]
    ReadOnly,
}

/// A backing store for translation entries.
///
/// Implementations must be safe for unlimited concurrent readers. Read-only
/// stores return [`RepositoryError::ReadOnly`] from [`save`](Self::save).
#[async_trait]
pub trait TranslationRepository: Send + Sync {
    /// Look up the entry stored under exactly `key`.
    ///
    /// `Ok(None)` is a miss, not a failure; fallback handling belongs to the
    /// caller.
    async fn get(&self, key: &TranslationKey)
    -> Result<Option<TranslationEntry>, RepositoryError>;

    /// Insert or update an entry.
    async fn save(&self, entry: &TranslationEntry) -> Result<(), RepositoryError>;

    /// All entries passing `filter`, ordered by text key ascending.
    async fn query(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationEntry>, RepositoryError>;
}

//! Repository trait for the vocabulary the populator pre-warms.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::VocabWord;
use crate::error::PipelineError;

/// Read-only view of the vocabulary database.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgVocabularyRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::NullVocabularyRepository`] - no database configured
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    /// Every distinct word present in any user's vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Vocabulary`] on database errors.
    async fn all_user_words(&self) -> Result<Vec<VocabWord>, PipelineError>;

    /// Words created at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Vocabulary`] on database errors.
    async fn words_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<VocabWord>, PipelineError>;
}

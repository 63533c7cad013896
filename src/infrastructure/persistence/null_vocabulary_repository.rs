//! Vocabulary repository used when no database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::VocabWord;
use crate::domain::repositories::VocabularyRepository;
use crate::error::PipelineError;

/// Always empty. The populator then only pre-warms the curated list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVocabularyRepository;

#[async_trait]
impl VocabularyRepository for NullVocabularyRepository {
    async fn all_user_words(&self) -> Result<Vec<VocabWord>, PipelineError> {
        Ok(Vec::new())
    }

    async fn words_created_since(
        &self,
        _since: DateTime<Utc>,
    ) -> Result<Vec<VocabWord>, PipelineError> {
        Ok(Vec::new())
    }
}

//! PostgreSQL implementation of the vocabulary repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::VocabWord;
use crate::domain::repositories::VocabularyRepository;
use crate::error::PipelineError;

#[derive(sqlx::FromRow)]
struct WordRow {
    word: String,
    translation: Option<String>,
}

impl From<WordRow> for VocabWord {
    fn from(row: WordRow) -> Self {
        VocabWord::new(row.word, row.translation)
    }
}

/// Reads `words` and `user_vocabulary` owned by the main application.
///
/// Queries are checked at runtime; this crate does not own the schema.
pub struct PgVocabularyRepository {
    pool: Arc<PgPool>,
}

impl PgVocabularyRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VocabularyRepository for PgVocabularyRepository {
    async fn all_user_words(&self) -> Result<Vec<VocabWord>, PipelineError> {
        let rows = sqlx::query_as::<_, WordRow>(
            r#"
            SELECT DISTINCT ON (lower(w.word)) w.word, w.translation
            FROM user_vocabulary uv
            JOIN words w ON w.id = uv.word_id
            ORDER BY lower(w.word), w.id
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(VocabWord::from).collect())
    }

    async fn words_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<VocabWord>, PipelineError> {
        let rows = sqlx::query_as::<_, WordRow>(
            r#"
            SELECT w.word, w.translation
            FROM words w
            WHERE w.created_at >= $1
            ORDER BY w.created_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(VocabWord::from).collect())
    }
}

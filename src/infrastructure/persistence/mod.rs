//! Vocabulary sources for the populator.
//!
//! - [`PgVocabularyRepository`] - PostgreSQL via SQLx
//! - [`NullVocabularyRepository`] - empty source when no database is configured

pub mod null_vocabulary_repository;
pub mod pg_vocabulary_repository;

pub use null_vocabulary_repository::NullVocabularyRepository;
pub use pg_vocabulary_repository::PgVocabularyRepository;

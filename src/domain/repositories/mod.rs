//! Repository trait definitions for the domain layer.
//!
//! Implementations live in `crate::infrastructure::persistence`; mocks are
//! generated via `mockall` for unit tests.

pub mod vocabulary_repository;

pub use vocabulary_repository::VocabularyRepository;

#[cfg(test)]
pub use vocabulary_repository::MockVocabularyRepository;

//! Word normalization and cache key derivation.
//!
//! Every component that addresses a word (enqueue, worker, cache readers)
//! must go through [`normalize_word`] and [`cache_key`]. Computing the key
//! any other way fragments the cache and breaks queue deduplication.

use sha2::{Digest, Sha256};

/// Returns the identity form of a vocabulary word: trimmed and lowercased.
///
/// Lowercasing is Unicode-aware, so `"Kuća"` and `"kuća"` collapse to the
/// same identity.
///
/// # Examples
///
/// ```
/// use image_pipeline::utils::normalize::normalize_word;
///
/// assert_eq!(normalize_word("  Kuća "), "kuća");
/// ```
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Derives the deterministic cache key for a word.
///
/// SHA-256 over the normalized word, hex-encoded (64 lowercase characters).
pub fn cache_key(word: &str) -> String {
    let normalized = normalize_word(word);
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_word("  PAS\t"), "pas");
        assert_eq!(normalize_word("Kuća"), "kuća");
        assert_eq!(normalize_word("ŠUMA"), "šuma");
    }

    #[test]
    fn test_normalize_keeps_inner_whitespace() {
        assert_eq!(normalize_word(" Dobar Dan "), "dobar dan");
    }

    #[test]
    fn test_cache_key_collapses_variants() {
        let key = cache_key("kuća");

        assert_eq!(cache_key("Kuća"), key);
        assert_eq!(cache_key("  kuća  "), key);
        assert_eq!(key.len(), 64);
    }

    #[test]
    fn test_cache_key_differs_between_words() {
        assert_ne!(cache_key("pas"), cache_key("mačka"));
    }
}

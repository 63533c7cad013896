//! Vocabulary word as seen by the populator.

/// A word with its optional translation hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabWord {
    pub word: String,
    pub translation: Option<String>,
}

impl VocabWord {
    pub fn new(word: impl Into<String>, translation: Option<String>) -> Self {
        Self {
            word: word.into(),
            translation,
        }
    }
}

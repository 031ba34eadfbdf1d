//! Word normalization and the exclusion list.

use std::collections::BTreeSet;

/// Punctuation stripped from words before they reach the engine.
const STRIPPED: &[char] = &[',', '.', '!'];

/// Canonical form of a raw word.
///
/// Lowercases, removes the punctuation in `STRIPPED`, and drops any
/// whitespace. Returns `None` if nothing is left.
pub fn normalize_word(raw: &str) -> Option<String> {
    let word: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED.contains(c))
        .flat_map(char::to_lowercase)
        .collect();

    (!word.is_empty()).then_some(word)
}

/// Splits free text on whitespace and normalizes each piece.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().filter_map(normalize_word).collect()
}

/// Words that may not be added to the cloud.
///
/// Entries are stored normalized. Changing the list never touches words
/// already in the cloud; it only filters future additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    words: BTreeSet<String>,
}

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a word. Returns `true` if it was not excluded before.
    pub fn exclude(&mut self, word: &str) -> bool {
        normalize_word(word).is_some_and(|word| self.words.insert(word))
    }

    /// Removes a word. Returns `true` if it was excluded.
    pub fn include(&mut self, word: &str) -> bool {
        normalize_word(word).is_some_and(|word| self.words.remove(&word))
    }

    pub fn contains(&self, word: &str) -> bool {
        normalize_word(word).is_some_and(|word| self.words.contains(&word))
    }

    /// Excluded words in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for word in iter {
            list.exclude(word.as_ref());
        }
        list
    }
}

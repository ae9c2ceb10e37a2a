//! Legal-word vocabulary and per-token OCR correction.
//!
//! The vocabulary is every word that appears in a catalog item name, plus a
//! few fixed extras. OCR tokens are snapped to the closest legal word within
//! a configurable edit distance; tokens that are too far from every word are
//! rejected.

use std::collections::BTreeMap;

use crate::catalog::CatalogItem;

use super::distance::distance_chars;

/// Words that are always legal even when no catalog name contains them.
pub const EXTRA_WORDS: &[&str] = &["Forma"];

/// Set of legal words.
///
/// Iteration order is lexicographic by the canonical spelling, which is also
/// the tie-break order used by [`correct`].
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    /// canonical word -> lowercase characters used for comparison
    words: BTreeMap<String, Vec<char>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the vocabulary from every word of every item name, plus [`EXTRA_WORDS`].
    pub fn from_items(items: &[CatalogItem]) -> Self {
        let mut vocabulary = Self::new();
        for item in items {
            for word in item.words() {
                vocabulary.insert(word);
            }
        }
        for word in EXTRA_WORDS {
            vocabulary.insert(word);
        }
        vocabulary
    }

    /// Adds a word. Empty strings are ignored.
    pub fn insert(&mut self, word: &str) {
        if word.is_empty() || self.words.contains_key(word) {
            return;
        }
        self.words.insert(word.to_string(), lowercase_chars(word));
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Iterates canonical words in tie-break order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut vocabulary = Vocabulary::new();
        for word in iter {
            vocabulary.insert(word.as_ref());
        }
        vocabulary
    }
}

fn lowercase_chars(s: &str) -> Vec<char> {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Snaps a raw OCR token to the closest vocabulary word.
///
/// Distance is computed case-insensitively. Returns the closest word together
/// with `true` when its distance is at most `max_distance`; otherwise the
/// closest word (or `""` for an empty vocabulary) and `false`. When several
/// words share the minimum distance the lexicographically first one wins.
pub fn correct<'v>(raw: &str, vocabulary: &'v Vocabulary, max_distance: usize) -> (&'v str, bool) {
    let raw = lowercase_chars(raw);

    let mut best: Option<(&'v str, usize)> = None;
    for (word, lower) in &vocabulary.words {
        let d = distance_chars(&raw, lower);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((word.as_str(), d));
            if d == 0 {
                break;
            }
        }
    }

    match best {
        Some((word, d)) => (word, d <= max_distance),
        None => ("", false),
    }
}

/// A vocabulary bound to a correction threshold.
#[derive(Debug, Clone)]
pub struct WordCorrector {
    vocabulary: Vocabulary,
    max_distance: usize,
}

impl WordCorrector {
    pub fn new(vocabulary: Vocabulary, max_distance: usize) -> Self {
        Self {
            vocabulary,
            max_distance,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// Returns the corrected word, or `None` when the token is rejected.
    pub fn correct(&self, raw: &str) -> Option<&str> {
        match correct(raw, &self.vocabulary, self.max_distance) {
            (word, true) => Some(word),
            _ => None,
        }
    }

    /// Corrects a sequence of tokens, dropping the rejected ones and keeping order.
    pub fn correct_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        tokens
            .iter()
            .filter_map(|token| {
                let token = token.as_ref();
                let corrected = self.correct(token);
                if corrected.is_none() {
                    log::debug!("Rejected OCR token {:?}", token);
                }
                corrected.map(str::to_string)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        ["Prime", "Blueprint", "Chassis", "Ash", "Systems", "Neuroptics"]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_correct_transposition() {
        assert_eq!(correct("Pirme", &vocab(), 2), ("Prime", true));
    }

    #[test]
    fn test_correct_rejects_short_fragment() {
        let (_, found) = correct("Pr", &vocab(), 2);
        assert!(!found);
    }

    #[test]
    fn test_correct_is_case_insensitive() {
        assert_eq!(correct("BLUEPRINT", &vocab(), 0), ("Blueprint", true));
        assert_eq!(correct("chassis", &vocab(), 0), ("Chassis", true));
    }

    #[test]
    fn test_correct_threshold_is_inclusive() {
        // "Chasss" -> "Chassis" is one insertion away.
        assert_eq!(correct("Chasss", &vocab(), 1), ("Chassis", true));
        assert_eq!(correct("Chasss", &vocab(), 0), ("Chassis", false));
    }

    #[test]
    fn test_correct_tie_prefers_lexicographic_first() {
        // "Bat" is one substitution from both "Bar" and "Cat".
        let vocabulary: Vocabulary = ["Cat", "Bar"].into_iter().collect();
        assert_eq!(correct("Bat", &vocabulary, 2), ("Bar", true));

        // Insertion order does not matter.
        let vocabulary: Vocabulary = ["Bar", "Cat"].into_iter().collect();
        assert_eq!(correct("Bat", &vocabulary, 2), ("Bar", true));
    }

    #[test]
    fn test_correct_empty_vocabulary() {
        assert_eq!(correct("Prime", &Vocabulary::new(), 2), ("", false));
    }

    #[test]
    fn test_correct_empty_and_foreign_tokens() {
        let (_, found) = correct("", &vocab(), 2);
        assert!(!found);
        let (_, found) = correct("#%&$*!", &vocab(), 2);
        assert!(!found);
    }

    #[test]
    fn test_from_items_includes_extra_words() {
        let items = vec![
            CatalogItem::new("1", "ash_prime_blueprint", "Ash Prime Blueprint"),
            CatalogItem::new("2", "ash_prime_systems_blueprint", "Ash Prime Systems Blueprint"),
        ];
        let vocabulary = Vocabulary::from_items(&items);

        let words: Vec<&str> = vocabulary.iter().collect();
        assert_eq!(words, vec!["Ash", "Blueprint", "Forma", "Prime", "Systems"]);
    }

    #[test]
    fn test_word_corrector_drops_rejected_tokens() {
        let corrector = WordCorrector::new(vocab(), 2);
        let row = corrector.correct_tokens(&["Ash", "Pirme", "xq", "BIueprint", "~~~~~~~~"]);
        assert_eq!(row, vec!["Ash", "Prime", "Blueprint"]);
    }
}

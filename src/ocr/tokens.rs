//! Splits OCR text into word tokens.

use serde::{Deserialize, Serialize};

/// How recognized text is cut into tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMode {
    /// Split on whitespace and any non-letter character.
    #[default]
    Words,
    /// A token that does not correct as a whole is also tried in pieces cut
    /// at lower-to-upper case changes ("AshPrime" -> "Ash", "Prime").
    CaseSplit,
}

/// Maximal runs of alphabetic characters.
pub fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits before every uppercase letter that follows a lowercase one.
pub fn split_case_boundaries(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in word.chars() {
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase();
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_drops_punctuation() {
        assert_eq!(
            split_words("  Ash Prime\n Blueprint|  Tenora-Prime 3 "),
            vec!["Ash", "Prime", "Blueprint", "Tenora", "Prime"]
        );
        assert!(split_words("  ~~ 12 ").is_empty());
    }

    #[test]
    fn test_split_case_boundaries() {
        assert_eq!(split_case_boundaries("AshPrime"), vec!["Ash", "Prime"]);
        assert_eq!(
            split_case_boundaries("NikanaPrimeBlueprint"),
            vec!["Nikana", "Prime", "Blueprint"]
        );
        assert_eq!(split_case_boundaries("FORMA"), vec!["FORMA"]);
        assert_eq!(split_case_boundaries("prime"), vec!["prime"]);
        assert!(split_case_boundaries("").is_empty());
    }
}

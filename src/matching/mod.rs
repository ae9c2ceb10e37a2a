//! Maps OCR output onto catalog items.
//!
//! Two pipelines share this module:
//! - token rows: OCR words are corrected against the catalog vocabulary and
//!   then resolved through the name trie, see [`resolve`];
//! - single box: one noisy string per reward slot is aligned against every
//!   catalog name, see [`best_match`].
//!
//! [`Matcher`] bundles the per-catalog state (trie and vocabulary) so it can
//! be built once and reused until the catalog changes.

pub mod align;
pub mod distance;
pub mod resolver;
pub mod row;
pub mod trie;
pub mod vocabulary;

use std::sync::Arc;

use crate::catalog::CatalogItem;

pub use self::row::Row;
pub use self::trie::NameTrie;
pub use self::vocabulary::{Vocabulary, WordCorrector};

/// Resolves two rows of already-corrected tokens into catalog items.
pub fn resolve<S: AsRef<str>>(
    upper: &[S],
    lower: &[S],
    catalog: &[CatalogItem],
) -> Vec<CatalogItem> {
    let trie = NameTrie::build(catalog);
    let mut upper = Row::new(upper.iter().map(|s| s.as_ref()));
    let mut lower = Row::new(lower.iter().map(|s| s.as_ref()));

    resolver::resolve_rows(&mut upper, &mut lower, &trie)
        .into_iter()
        .map(|index| catalog[index].clone())
        .collect()
}

/// The catalog item whose name aligns best with `noisy`.
pub fn best_match<'c>(noisy: &str, catalog: &'c [CatalogItem]) -> Option<&'c CatalogItem> {
    let names: Vec<&str> = catalog.iter().map(|item| item.name.as_str()).collect();
    align::best_match(noisy, &names).map(|index| &catalog[index])
}

/// Matching state for one catalog.
#[derive(Debug)]
pub struct Matcher {
    fingerprint: String,
    items: Vec<CatalogItem>,
    trie: NameTrie,
    corrector: WordCorrector,
}

impl Matcher {
    /// Builds the trie and vocabulary for `items`.
    ///
    /// `fingerprint` identifies the catalog contents, see [`MatcherCache`].
    pub fn new(fingerprint: impl Into<String>, items: Vec<CatalogItem>, max_distance: usize) -> Self {
        let trie = NameTrie::build(&items);
        let corrector = WordCorrector::new(Vocabulary::from_items(&items), max_distance);
        let fingerprint = fingerprint.into();

        log::debug!(
            "Built matcher for catalog {}: {} items, {} trie nodes, {} words",
            fingerprint,
            items.len(),
            trie.len(),
            corrector.vocabulary().len()
        );

        Self {
            fingerprint,
            items,
            trie,
            corrector,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn corrector(&self) -> &WordCorrector {
        &self.corrector
    }

    /// Corrects raw OCR tokens into a row of legal words.
    pub fn correct_row<S: AsRef<str>>(&self, tokens: &[S]) -> Row {
        Row::new(self.corrector.correct_tokens(tokens))
    }

    /// Corrects tokens with an explicit threshold instead of the default one.
    pub fn correct_row_within<S: AsRef<str>>(&self, tokens: &[S], max_distance: usize) -> Row {
        let words = tokens.iter().filter_map(|token| {
            match vocabulary::correct(token.as_ref(), self.corrector.vocabulary(), max_distance) {
                (word, true) => Some(word),
                _ => None,
            }
        });
        Row::new(words)
    }

    /// Resolves two corrected rows, consuming them.
    pub fn resolve_rows(&self, mut upper: Row, mut lower: Row) -> Vec<&CatalogItem> {
        resolver::resolve_rows(&mut upper, &mut lower, &self.trie)
            .into_iter()
            .map(|index| &self.items[index])
            .collect()
    }

    /// Aligns one noisy string against every catalog name.
    pub fn match_text(&self, noisy: &str) -> Option<&CatalogItem> {
        best_match(noisy, &self.items)
    }
}

/// Keeps the last built [`Matcher`] and rebuilds it only when the catalog
/// fingerprint or the correction threshold changes.
#[derive(Debug, Default)]
pub struct MatcherCache {
    current: Option<Arc<Matcher>>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &mut self,
        fingerprint: &str,
        items: &[CatalogItem],
        max_distance: usize,
    ) -> Arc<Matcher> {
        if let Some(matcher) = &self.current {
            if matcher.fingerprint() == fingerprint
                && matcher.corrector().max_distance() == max_distance
            {
                return Arc::clone(matcher);
            }
        }

        let matcher = Arc::new(Matcher::new(fingerprint, items.to_vec(), max_distance));
        self.current = Some(Arc::clone(&matcher));
        matcher
    }
}

//! One on-screen text line of corrected words, and the single-row matcher.

use super::trie::{NameTrie, NodeId};

/// An ordered sequence of corrected words.
///
/// Words are only ever removed as one contiguous slice; order never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    words: Vec<String>,
}

impl Row {
    pub fn new<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Removes `words[offset..offset + count]`. Out-of-range parts are ignored.
    pub fn consume(&mut self, offset: usize, count: usize) {
        let start = offset.min(self.words.len());
        let end = offset.saturating_add(count).min(self.words.len());
        self.words.drain(start..end);
    }

    /// Removes the first word, if any.
    pub fn drop_first(&mut self) -> Option<String> {
        if self.words.is_empty() {
            None
        } else {
            Some(self.words.remove(0))
        }
    }
}

/// Result of [`seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A full item name: `consumed` words starting at `offset` map to catalog index `item`.
    Complete {
        item: usize,
        offset: usize,
        consumed: usize,
    },
    /// A name prefix ending at the non-terminal `node`, to be continued in another row.
    Partial {
        node: NodeId,
        offset: usize,
        consumed: usize,
    },
    NoMatch,
}

#[cfg(test)]
impl MatchOutcome {
    /// The matched catalog index for a complete match.
    pub fn item(&self) -> Option<usize> {
        match *self {
            MatchOutcome::Complete { item, .. } => Some(item),
            _ => None,
        }
    }

    /// The `(offset, consumed)` slice this outcome covers.
    pub fn span(&self) -> Option<(usize, usize)> {
        match *self {
            MatchOutcome::Complete {
                offset, consumed, ..
            }
            | MatchOutcome::Partial {
                offset, consumed, ..
            } => Some((offset, consumed)),
            MatchOutcome::NoMatch => None,
        }
    }
}

/// Finds the best match for `row` starting from trie node `start`.
///
/// Every starting index from `start_offset` onward is tried in order. From
/// each start the walk follows trie edges word by word until a word has no
/// edge, remembering the longest terminal and the longest non-terminal node
/// reached. The first start with a terminal wins, with its longest terminal.
/// Otherwise the partial path from the earliest start that produced one is
/// returned.
pub fn seek(row: &[String], start_offset: usize, start: NodeId, trie: &NameTrie) -> MatchOutcome {
    let mut partial = MatchOutcome::NoMatch;

    for skip in start_offset..row.len() {
        let mut node = start;
        let mut complete: Option<(usize, usize)> = None;
        let mut unterminated: Option<(NodeId, usize)> = None;

        for (i, word) in row[skip..].iter().enumerate() {
            let Some(next) = trie.child(node, word) else {
                break;
            };
            node = next;
            match trie.item(node) {
                Some(item) => complete = Some((item, i + 1)),
                None => unterminated = Some((node, i + 1)),
            }
        }

        if let Some((item, consumed)) = complete {
            return MatchOutcome::Complete {
                item,
                offset: skip,
                consumed,
            };
        }
        if partial == MatchOutcome::NoMatch {
            if let Some((node, consumed)) = unterminated {
                partial = MatchOutcome::Partial {
                    node,
                    offset: skip,
                    consumed,
                };
            }
        }
    }

    partial
}

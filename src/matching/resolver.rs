//! Recovers item names from two on-screen rows.
//!
//! Reward names wrap onto a second line when they are too long for their
//! slot, so an item can start in the upper row and finish in the lower one.

use super::row::{MatchOutcome, Row, seek};
use super::trie::NameTrie;

/// Resolves every item in `upper` and `lower`, consuming both rows.
///
/// Returns catalog indices in the order they were found. Complete names in the
/// lower row are tried first, then complete names in the upper row, then a
/// name started in the upper row and finished in the lower one. When none of
/// those apply the first upper word is dropped, or the first lower word once
/// the upper row is empty.
pub fn resolve_rows(upper: &mut Row, lower: &mut Row, trie: &NameTrie) -> Vec<usize> {
    run(upper, lower, trie).0
}

/// Returns the found items and the number of loop iterations taken.
fn run(upper: &mut Row, lower: &mut Row, trie: &NameTrie) -> (Vec<usize>, usize) {
    let mut found = Vec::new();
    let mut iterations = 0;

    while !upper.is_empty() || !lower.is_empty() {
        iterations += 1;

        if let MatchOutcome::Complete {
            item,
            offset,
            consumed,
        } = seek(lower.words(), 0, NameTrie::ROOT, trie)
        {
            lower.consume(offset, consumed);
            found.push(item);
            continue;
        }

        let head = seek(upper.words(), 0, NameTrie::ROOT, trie);
        match head {
            MatchOutcome::Complete {
                item,
                offset,
                consumed,
            } => {
                upper.consume(offset, consumed);
                found.push(item);
                continue;
            }
            MatchOutcome::Partial {
                node,
                offset: head_offset,
                consumed: head_consumed,
            } => {
                if let MatchOutcome::Complete {
                    item,
                    offset,
                    consumed,
                } = seek(lower.words(), 0, node, trie)
                {
                    upper.consume(head_offset, head_consumed);
                    lower.consume(offset, consumed);
                    found.push(item);
                    continue;
                }
            }
            MatchOutcome::NoMatch => {}
        }

        let dropped = match upper.drop_first() {
            Some(word) => word,
            None => lower.drop_first().unwrap_or_default(),
        };
        log::debug!("No item at row head, dropping {:?}", dropped);
    }

    (found, iterations)
}

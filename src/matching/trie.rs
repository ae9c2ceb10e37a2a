//! Prefix tree over catalog item names, one edge per word.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A node is terminal
//! when a full item name ends there; terminal nodes may still have children
//! ("Chassis" and "Chassis Prime" share a path).

use std::collections::HashMap;

use crate::catalog::CatalogItem;

/// Index of a node in the trie arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: HashMap<String, NodeId>,
    /// Index of the catalog item whose name ends at this node.
    item: Option<usize>,
}

/// Word-level prefix tree. Read-only once built.
#[derive(Debug, Clone)]
pub struct NameTrie {
    nodes: Vec<TrieNode>,
}

impl Default for NameTrie {
    fn default() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }
}

impl NameTrie {
    /// The node representing the empty prefix.
    pub const ROOT: NodeId = 0;

    /// Builds a trie from `items`. Terminal nodes store the item's index in `items`.
    pub fn build(items: &[CatalogItem]) -> Self {
        let mut trie = Self::default();
        for (index, item) in items.iter().enumerate() {
            trie.insert(item.words(), index);
        }
        trie
    }

    /// Inserts a word path ending in `item`. A previous item at the same path
    /// is replaced.
    pub fn insert<'w>(&mut self, words: impl IntoIterator<Item = &'w str>, item: usize) {
        let mut node = Self::ROOT;
        let mut depth = 0;
        for word in words {
            node = match self.nodes[node].children.get(word) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(word.to_string(), child);
                    child
                }
            };
            depth += 1;
        }

        // An empty name would mark the root terminal and match zero words.
        if depth == 0 {
            return;
        }

        if let Some(previous) = self.nodes[node].item.replace(item) {
            log::debug!(
                "Duplicate item name: item #{} replaces item #{} in name trie",
                item,
                previous
            );
        }
    }

    /// Follows the edge labelled `word` from `node`.
    pub fn child(&self, node: NodeId, word: &str) -> Option<NodeId> {
        self.nodes.get(node)?.children.get(word).copied()
    }

    /// The catalog index terminating at `node`, if any.
    pub fn item(&self, node: NodeId) -> Option<usize> {
        self.nodes.get(node)?.item
    }

    /// Walks a full word path from the root.
    #[cfg(test)]
    pub fn find<'w>(&self, words: impl IntoIterator<Item = &'w str>) -> Option<NodeId> {
        words
            .into_iter()
            .try_fold(Self::ROOT, |node, word| self.child(node, word))
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no name has been inserted.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("1", "chassis_prime", "Chassis Prime"),
            CatalogItem::new("2", "systems_prime", "Systems Prime"),
            CatalogItem::new("3", "chassis", "Chassis"),
        ]
    }

    #[test]
    fn test_build_marks_terminals() {
        let trie = NameTrie::build(&items());

        let node = trie.find(["Chassis", "Prime"]).unwrap();
        assert_eq!(trie.item(node), Some(0));

        let node = trie.find(["Systems", "Prime"]).unwrap();
        assert_eq!(trie.item(node), Some(1));
    }

    #[test]
    fn test_prefix_can_be_terminal_with_children() {
        let trie = NameTrie::build(&items());

        let chassis = trie.child(NameTrie::ROOT, "Chassis").unwrap();
        assert_eq!(trie.item(chassis), Some(2));
        assert!(trie.child(chassis, "Prime").is_some());
    }

    #[test]
    fn test_non_terminal_prefix() {
        let trie = NameTrie::build(&items());

        let systems = trie.child(NameTrie::ROOT, "Systems").unwrap();
        assert_eq!(trie.item(systems), None);
    }

    #[test]
    fn test_edges_are_case_sensitive() {
        let trie = NameTrie::build(&items());
        assert!(trie.child(NameTrie::ROOT, "chassis").is_none());
    }

    #[test]
    fn test_shared_prefix_nodes_are_reused() {
        let trie = NameTrie::build(&items());
        // root, Chassis, Chassis Prime, Systems, Systems Prime
        assert_eq!(trie.len(), 5);
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let items = vec![
            CatalogItem::new("a", "dup_a", "Bo Prime Handle"),
            CatalogItem::new("b", "dup_b", "Bo Prime Handle"),
        ];
        let trie = NameTrie::build(&items);

        let node = trie.find(["Bo", "Prime", "Handle"]).unwrap();
        assert_eq!(trie.item(node), Some(1));
    }

    #[test]
    fn test_empty_catalog_and_empty_name() {
        let trie = NameTrie::build(&[]);
        assert!(trie.is_empty());
        assert_eq!(trie.item(NameTrie::ROOT), None);

        let trie = NameTrie::build(&[CatalogItem::new("x", "x", "")]);
        assert!(trie.is_empty());
        assert_eq!(trie.item(NameTrie::ROOT), None);
    }

    #[test]
    fn test_unknown_node_is_harmless() {
        let trie = NameTrie::build(&items());
        assert_eq!(trie.child(999, "Chassis"), None);
        assert_eq!(trie.item(999), None);
    }
}

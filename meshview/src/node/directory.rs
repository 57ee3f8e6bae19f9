//! Hash index over the current node list.

use std::collections::HashMap;

use super::{Node, NodeHash};

/// Mapping from node hash to index in the node list.
///
/// Rebuilt from scratch on every refresh. Nodes with hash 0 are not
/// indexed, and on collision the last node in list order wins.
#[derive(Debug, Clone, Default)]
pub struct NodeDirectory {
    by_hash: HashMap<NodeHash, usize>,
}

impl NodeDirectory {
    /// Build the index for a node list.
    pub fn build(nodes: &[Node]) -> Self {
        let mut by_hash = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if node.hash != 0 {
                by_hash.insert(node.hash, index);
            }
        }
        Self { by_hash }
    }

    /// Index of the node with this hash.
    pub fn get(&self, hash: NodeHash) -> Option<usize> {
        self.by_hash.get(&hash).copied()
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

/// A reference to a node as it appears in event payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    /// Numeric hash, resolved through the directory.
    Hash(NodeHash),
    /// Public-key hex prefix.
    KeyPrefix(String),
    /// Prefix of either the public-key hex or the hash's hex encoding.
    Token(String),
}

/// The node list together with its hash index.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: Vec<Node>,
    directory: NodeDirectory,
}

impl NodeTable {
    pub fn new(nodes: Vec<Node>) -> Self {
        let directory = NodeDirectory::build(&nodes);
        Self { nodes, directory }
    }

    /// Replace the node list and rebuild the index.
    pub fn replace(&mut self, nodes: Vec<Node>) {
        self.directory = NodeDirectory::build(&nodes);
        self.nodes = nodes;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn directory(&self) -> &NodeDirectory {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn by_hash(&self, hash: NodeHash) -> Option<&Node> {
        self.directory.get(hash).and_then(|i| self.nodes.get(i))
    }

    /// First node in list order whose public key starts with `prefix`.
    pub fn by_key_prefix(&self, prefix: &str) -> Option<&Node> {
        if prefix.is_empty() {
            return None;
        }
        let needle = prefix.to_ascii_uppercase();
        self.nodes.iter().find(|node| node.key_starts_with(&needle))
    }

    /// First node in list order whose public key or hash hex starts with `token`.
    pub fn by_token(&self, token: &str) -> Option<&Node> {
        if token.is_empty() {
            return None;
        }
        let needle = token.to_ascii_uppercase();
        self.nodes
            .iter()
            .find(|node| node.key_starts_with(&needle) || node.hash_hex_starts_with(&needle))
    }

    pub fn resolve(&self, reference: &NodeRef) -> Option<&Node> {
        match reference {
            NodeRef::Hash(hash) => self.by_hash(*hash),
            NodeRef::KeyPrefix(prefix) => self.by_key_prefix(prefix),
            NodeRef::Token(token) => self.by_token(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, hash: NodeHash, key: &str) -> Node {
        Node {
            id,
            hash,
            public_key_hex: key.to_string(),
            ..Node::default()
        }
    }

    #[test]
    fn test_zero_hash_not_indexed() {
        let directory = NodeDirectory::build(&[node(1, 0, ""), node(2, 7, "")]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get(0), None);
        assert_eq!(directory.get(7), Some(1));
    }

    #[test]
    fn test_last_entry_wins_on_collision() {
        let table = NodeTable::new(vec![node(1, 42, ""), node(2, 42, "")]);
        assert_eq!(table.directory().len(), 1);
        assert_eq!(table.by_hash(42).map(|n| n.id), Some(2));
    }

    #[test]
    fn test_replace_drops_old_entries() {
        let mut table = NodeTable::new(vec![node(1, 10, ""), node(2, 20, "")]);
        table.replace(vec![node(3, 30, "")]);

        assert!(table.by_hash(10).is_none());
        assert!(table.by_hash(20).is_none());
        assert_eq!(table.by_hash(30).map(|n| n.id), Some(3));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_key_prefix_first_match_wins() {
        let table = NodeTable::new(vec![node(1, 1, "ABCDEF"), node(2, 2, "abcd99")]);
        assert_eq!(table.by_key_prefix("abcd").map(|n| n.id), Some(1));
        assert_eq!(table.by_key_prefix("ABCD9").map(|n| n.id), Some(2));
        assert!(table.by_key_prefix("").is_none());
        assert!(table.by_key_prefix("FF").is_none());
    }

    #[test]
    fn test_token_matches_hash_hex() {
        let table = NodeTable::new(vec![node(1, 0xBEEF, "0011"), node(2, 0x1234, "")]);
        assert_eq!(table.by_token("be").map(|n| n.id), Some(1));
        assert_eq!(table.by_token("12").map(|n| n.id), Some(2));
        assert_eq!(table.by_token("001").map(|n| n.id), Some(1));
    }

    #[test]
    fn test_key_prefix_does_not_match_hash() {
        let table = NodeTable::new(vec![node(1, 0xBEEF, "")]);
        assert!(table.resolve(&NodeRef::KeyPrefix("BE".into())).is_none());
        assert!(table.resolve(&NodeRef::Token("BE".into())).is_some());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            #[test]
            fn test_directory_indexes_every_nonzero_hash(
                hashes in proptest::collection::vec(0u32..64, 0..40)
            ) {
                let nodes: Vec<Node> = hashes
                    .iter()
                    .enumerate()
                    .map(|(i, h)| node(i as i64, *h, ""))
                    .collect();
                let table = NodeTable::new(nodes);

                let distinct: HashSet<u32> = hashes.iter().copied().filter(|h| *h != 0).collect();
                prop_assert_eq!(table.directory().len(), distinct.len());

                for hash in distinct {
                    let found = table.by_hash(hash);
                    prop_assert!(found.is_some());
                    let found = found.unwrap();
                    prop_assert_eq!(found.hash, hash);
                    // Last occurrence in list order
                    let last = hashes.iter().rposition(|h| *h == hash).unwrap();
                    prop_assert_eq!(found.id, last as i64);
                }
            }
        }
    }
}

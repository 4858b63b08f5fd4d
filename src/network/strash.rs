// SPDX-License-Identifier: Apache-2.0

//! Structural hashing: maps a gate's kind and normalized fan-ins to the node
//! already holding that structure.

use ahash::AHashMap;

use crate::network::gate::{GateKind, Node, NodeId, Signal};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct StructuralKey {
    kind: GateKind,
    fanins: Vec<Signal>,
}

impl StructuralKey {
    fn of(node: &Node) -> Option<Self> {
        let kind = node.gate_kind()?;
        // Both gate kinds are symmetric in their fan-ins.
        let mut fanins = node.fanins();
        fanins.sort();
        Some(Self { kind, fanins })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructuralHasher {
    table: AHashMap<StructuralKey, NodeId>,
}

impl StructuralHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns the node structurally equal to `node`, if one was recorded.
    pub fn lookup(&self, node: &Node) -> Option<NodeId> {
        let key = StructuralKey::of(node)?;
        self.table.get(&key).copied()
    }

    /// Records `id` as the canonical node for its structure unless an earlier
    /// node already holds it. Returns the canonical node.
    pub fn insert(&mut self, node: &Node, id: NodeId) -> NodeId {
        match StructuralKey::of(node) {
            Some(key) => *self.table.entry(key).or_insert(id),
            None => id,
        }
    }

    /// Rebuilds the table from scratch; the lowest-numbered node wins for each
    /// structure.
    pub fn rebuild(&mut self, nodes: &[Node]) {
        self.table.clear();
        for (id, node) in nodes.iter().enumerate() {
            self.insert(node, NodeId { id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(id: usize, negated: bool) -> Signal {
        Signal::new(NodeId { id }, negated)
    }

    #[test]
    fn test_fanin_order_does_not_matter() {
        let mut hasher = StructuralHasher::new();
        let ab = Node::And2 {
            a: sig(1, false),
            b: sig(2, true),
        };
        let ba = Node::And2 {
            a: sig(2, true),
            b: sig(1, false),
        };
        assert_eq!(hasher.insert(&ab, NodeId { id: 3 }), NodeId { id: 3 });
        assert_eq!(hasher.lookup(&ba), Some(NodeId { id: 3 }));
        assert_eq!(hasher.insert(&ba, NodeId { id: 4 }), NodeId { id: 3 });
        assert_eq!(hasher.len(), 1);
    }

    #[test]
    fn test_kind_and_polarity_distinguish_keys() {
        let mut hasher = StructuralHasher::new();
        hasher.insert(
            &Node::And2 {
                a: sig(1, false),
                b: sig(2, false),
            },
            NodeId { id: 4 },
        );
        let negated = Node::And2 {
            a: sig(1, true),
            b: sig(2, false),
        };
        assert_eq!(hasher.lookup(&negated), None);
        let maj = Node::Maj3 {
            a: sig(1, false),
            b: sig(2, false),
            c: sig(0, false),
        };
        assert_eq!(hasher.lookup(&maj), None);
    }

    #[test]
    fn test_non_gates_are_not_hashed() {
        let mut hasher = StructuralHasher::new();
        let input = Node::Input {
            name: "a".to_string(),
        };
        assert_eq!(hasher.insert(&input, NodeId { id: 1 }), NodeId { id: 1 });
        assert!(hasher.is_empty());
    }
}

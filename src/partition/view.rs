// SPDX-License-Identifier: Apache-2.0

//! Induced sub-network of one partition.
//!
//! A view lays its nodes out as `[constant][leaves][gates]`: the constant at
//! local index 0, then the declared inputs, then every gate reachable from the
//! declared outputs without crossing an input, each after all of its fan-ins.
//! Local indices (`ViewIndex`) are a separate index space from the parent's
//! `NodeId`s.

use std::collections::{BTreeSet, HashMap};

use crate::error::{PartitionError, Result};
use crate::network::{Network, NetworkOptions, Node, NodeId, Signal};
use crate::partition::{PartitionId, PartitionLedger};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ViewIndex(pub usize);

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct LocalSignal {
    pub index: ViewIndex,
    pub negated: bool,
}

#[derive(Debug, Clone)]
pub struct PartitionView<'a> {
    net: &'a Network,
    nodes: Vec<NodeId>,
    node_to_index: HashMap<NodeId, ViewIndex>,
    num_constants: usize,
    num_leaves: usize,
    roots: Vec<Signal>,
    fanout: Vec<usize>,
}

impl<'a> PartitionView<'a> {
    /// Builds the view bounded by `inputs` (plus `reg_outputs`) and rooted at
    /// `outputs` (plus `reg_inputs`), in the order given.
    pub fn new(
        net: &'a Network,
        inputs: &[NodeId],
        outputs: &[NodeId],
        reg_outputs: &[NodeId],
        reg_inputs: &[NodeId],
    ) -> Result<Self> {
        let mut view = PartitionView {
            net,
            nodes: Vec::new(),
            node_to_index: HashMap::new(),
            num_constants: 0,
            num_leaves: 0,
            roots: Vec::new(),
            fanout: Vec::new(),
        };
        view.push(NodeId::CONSTANT);
        view.num_constants = 1;

        for leaf in inputs.iter().chain(reg_outputs) {
            if net.is_constant(*leaf) || view.node_to_index.contains_key(leaf) {
                continue;
            }
            view.push(*leaf);
            view.num_leaves += 1;
        }

        let mut seen_roots: BTreeSet<NodeId> = BTreeSet::new();
        for root in outputs.iter().chain(reg_inputs) {
            if !seen_roots.insert(*root) {
                continue;
            }
            view.insert_cone(*root)?;
            view.roots.push(net.make_signal(*root));
        }
        log::trace!(
            "view: {} leaves, {} gates, {} roots",
            view.num_leaves,
            view.num_gates(),
            view.roots.len()
        );
        Ok(view)
    }

    fn push(&mut self, node: NodeId) {
        let index = ViewIndex(self.nodes.len());
        self.nodes.push(node);
        self.node_to_index.insert(node, index);
        self.fanout.push(0);
    }

    fn push_gate(&mut self, node: NodeId) {
        for fanin in self.net.fanins(node) {
            let producer = self.node_to_index[&fanin.node];
            self.fanout[producer.0] += 1;
        }
        self.push(node);
    }

    /// Appends the cone of `root` in postorder, stopping at nodes already in
    /// the view.
    fn insert_cone(&mut self, root: NodeId) -> Result<()> {
        let mut worklist = vec![root];
        while let Some(current) = worklist.pop() {
            if self.node_to_index.contains_key(&current) {
                continue;
            }
            if !self.net.is_gate(current) {
                return Err(PartitionError::UndeclaredLeaf { node: current });
            }
            let pending = self
                .net
                .fanins(current)
                .into_iter()
                .find(|f| !self.node_to_index.contains_key(&f.node));
            match pending {
                Some(dep) => {
                    worklist.push(current); // Revisit after dependencies
                    worklist.push(dep.node);
                }
                None => self.push_gate(current),
            }
        }
        Ok(())
    }

    pub fn network(&self) -> &'a Network {
        self.net
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_constants(&self) -> usize {
        self.num_constants
    }

    pub fn num_pis(&self) -> usize {
        self.num_leaves
    }

    pub fn num_cis(&self) -> usize {
        self.num_leaves
    }

    pub fn num_pos(&self) -> usize {
        self.roots.len()
    }

    pub fn num_gates(&self) -> usize {
        self.nodes.len() - self.num_constants - self.num_leaves
    }

    pub fn node_to_index(&self, node: NodeId) -> Option<ViewIndex> {
        self.node_to_index.get(&node).copied()
    }

    pub fn index_to_node(&self, index: ViewIndex) -> NodeId {
        self.nodes[index.0]
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node_to_index.contains_key(&node)
    }

    /// Whether `node` is one of this view's leaves.
    pub fn is_pi(&self, node: NodeId) -> bool {
        self.node_to_index(node).is_some_and(|index| {
            index.0 >= self.num_constants && index.0 < self.num_constants + self.num_leaves
        })
    }

    pub fn is_ci(&self, node: NodeId) -> bool {
        self.is_pi(node)
    }

    /// Leaves that are register outputs of the parent network.
    pub fn is_ro(&self, node: NodeId) -> bool {
        self.is_pi(node) && self.net.is_ro(node)
    }

    /// Leaves in local-index order.
    pub fn pis(&self) -> &[NodeId] {
        &self.nodes[self.num_constants..self.num_constants + self.num_leaves]
    }

    /// Declared output signals in parent space, in declaration order.
    pub fn roots(&self) -> &[Signal] {
        &self.roots
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn gates(&self) -> &[NodeId] {
        &self.nodes[self.num_constants + self.num_leaves..]
    }

    /// Number of this view's nodes that consume `node`.
    pub fn fanout_size(&self, node: NodeId) -> usize {
        self.node_to_index(node)
            .map_or(0, |index| self.fanout[index.0])
    }

    /// Fan-ins of a view gate in local coordinates; leaves have none.
    pub fn local_fanins(&self, index: ViewIndex) -> Vec<LocalSignal> {
        if index.0 < self.num_constants + self.num_leaves {
            return Vec::new();
        }
        self.net
            .fanins(self.nodes[index.0])
            .iter()
            .map(|f| LocalSignal {
                index: self.node_to_index[&f.node],
                negated: f.negated,
            })
            .collect()
    }

    /// Extracts the view as a standalone combinational network. Leaves become
    /// primary inputs and roots primary outputs, both in view order; node `i`
    /// of the result is local index `i` of the view.
    pub fn to_network(&self, name: impl Into<String>) -> Network {
        let mut sub = Network::new(name, NetworkOptions::no_opt());
        for leaf in self.pis() {
            let name = match self.net.node(*leaf) {
                Node::Input { name } => name.clone(),
                Node::RegisterOutput { register } => self.net.registers()[*register].name.clone(),
                _ => format!("n{}", leaf.id),
            };
            sub.create_pi(name);
        }
        let local = |s: Signal| -> Signal {
            Signal::new(
                NodeId {
                    id: self.node_to_index[&s.node].0,
                },
                s.negated,
            )
        };
        for gate in self.gates() {
            let kind = self
                .net
                .gate_kind(*gate)
                .unwrap_or_else(|| panic!("view gate {} is not a gate", gate));
            let fanins: Vec<Signal> = self.net.fanins(*gate).into_iter().map(local).collect();
            let created = sub.create_gate(kind, &fanins);
            debug_assert_eq!(created.node.id, self.node_to_index[gate].0);
        }
        for (i, root) in self.roots.iter().enumerate() {
            sub.create_po(format!("r{}", i), local(*root));
        }
        sub
    }
}

impl PartitionLedger {
    /// Builds the view of partition `p` from its current boundary tables.
    pub fn create_part<'a>(&self, net: &'a Network, p: PartitionId) -> Result<PartitionView<'a>> {
        let as_vec = |set: &BTreeSet<NodeId>| set.iter().copied().collect::<Vec<_>>();
        PartitionView::new(
            net,
            &as_vec(self.inputs(p)),
            &as_vec(self.outputs(p)),
            &as_vec(self.reg_outputs(p)),
            &as_vec(self.reg_inputs(p)),
        )
    }
}

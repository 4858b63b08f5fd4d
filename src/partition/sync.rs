// SPDX-License-Identifier: Apache-2.0

//! Splicing optimized sub-networks back into the parent network.
//!
//! `synchronize_part` clones an optimized sub-network's gates into the parent
//! and queues `root -> new signal` substitutions on the ledger;
//! `connect_outputs` applies every queued substitution in ascending partition
//! order. Dead-node elimination afterwards is up to the caller.

use std::collections::{BTreeMap, HashMap};

use crate::error::{PartitionError, Result};
use crate::network::{Network, NodeId, Signal};
use crate::partition::view::PartitionView;
use crate::partition::{PartitionId, PartitionLedger};

/// Queued output substitutions of one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    map: BTreeMap<NodeId, Signal>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: NodeId, value: Signal) {
        assert!(
            value.node != key,
            "Substitution with self detected: {:?} -> {:?}",
            key,
            value
        );
        self.map.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &NodeId) -> Option<&Signal> {
        self.map.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Signal)> {
        self.map.iter()
    }
}

impl Extend<(NodeId, Signal)> for SubstitutionMap {
    fn extend<T: IntoIterator<Item = (NodeId, Signal)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

impl IntoIterator for SubstitutionMap {
    type Item = (NodeId, Signal);
    type IntoIter = std::collections::btree_map::IntoIter<NodeId, Signal>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub partition: PartitionId,
    /// Gates of the optimized network cloned into the parent (after folding
    /// and structural hashing in the parent).
    pub cloned_gates: usize,
    pub queued: usize,
    /// Outputs that resolved to a constant or to a leaf of the view.
    pub skipped: usize,
}

impl PartitionLedger {
    /// Clones `optimized` into `target` on top of `view`'s leaves and queues a
    /// substitution for every root whose replacement is new logic.
    ///
    /// Input `i` of `optimized` stands for leaf `i` of the view and output `i`
    /// for root `i`. `target` must hold every node of the network the view was
    /// built from, under the same ids.
    pub fn synchronize_part(
        &mut self,
        p: PartitionId,
        view: &PartitionView<'_>,
        optimized: &Network,
        target: &mut Network,
    ) -> Result<SyncReport> {
        if optimized.num_cis() != view.num_pis() || optimized.num_cos() != view.num_pos() {
            return Err(PartitionError::InterfaceMismatch {
                expected_inputs: view.num_pis(),
                actual_inputs: optimized.num_cis(),
                expected_outputs: view.num_pos(),
                actual_outputs: optimized.num_cos(),
            });
        }
        let size_before = target.size();
        let mut old_to_new: HashMap<NodeId, Signal> = HashMap::new();
        old_to_new.insert(NodeId::CONSTANT, Signal::FALSE);
        for (ci, leaf) in optimized.cis().iter().zip(view.pis()) {
            old_to_new.insert(*ci, target.make_signal(*leaf));
        }

        for node in optimized.topo_order() {
            if !optimized.is_gate(node) {
                continue;
            }
            let children: Vec<Signal> = optimized
                .fanins(node)
                .iter()
                .map(|f| {
                    let mapped = old_to_new[&f.node];
                    if f.negated {
                        target.create_not(mapped)
                    } else {
                        mapped
                    }
                })
                .collect();
            let cloned = target.clone_node(optimized, node, &children);
            old_to_new.insert(node, cloned);
        }

        let mut report = SyncReport {
            partition: p,
            cloned_gates: target.size() - size_before,
            ..Default::default()
        };
        let queue = self.substitutions.entry(p).or_default();
        for (output, root) in optimized.cos().iter().zip(view.roots()) {
            let replacement = old_to_new[&output.node].xor_negation(output.negated ^ root.negated);
            if replacement.is_constant() || view.is_pi(replacement.node) {
                log::debug!(
                    "partition {}: root {} resolves to {}; not substituted",
                    p,
                    root,
                    replacement
                );
                report.skipped += 1;
                continue;
            }
            if replacement.node == root.node {
                report.skipped += 1;
                continue;
            }
            queue.add(root.node, replacement);
            report.queued += 1;
        }
        log::debug!(
            "partition {}: cloned {} gates, queued {} substitutions, skipped {}",
            p,
            report.cloned_gates,
            report.queued,
            report.skipped
        );
        Ok(report)
    }

    pub fn pending_substitutions(&self) -> usize {
        self.substitutions.values().map(SubstitutionMap::len).sum()
    }

    /// Applies and drains every queued substitution, partitions in ascending
    /// order. Returns the number applied.
    pub fn connect_outputs(&mut self, target: &mut Network) -> usize {
        let queued = std::mem::take(&mut self.substitutions);
        let mut applied = 0;
        for (p, substitutions) in queued {
            for (node, replacement) in substitutions {
                if replacement.node == node {
                    continue;
                }
                target.substitute_node(node, replacement);
                applied += 1;
            }
            log::trace!("connect_outputs: partition {} applied", p);
        }
        crate::network::topo::debug_assert_no_cycles(target.nodes(), "connect_outputs");
        log::info!("connect_outputs: applied {} substitutions", applied);
        applied
    }
}

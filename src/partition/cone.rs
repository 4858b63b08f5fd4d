// SPDX-License-Identifier: Apache-2.0

//! Output-cone analysis within one partition: boundary inputs, interior size,
//! logic depth and (for small cones) the exact Boolean function.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::network::topo::postorder_for_nodes;
use crate::network::{GateKind, Network, NodeId};
use crate::partition::karnaugh::KarnaughImage;
use crate::partition::{PartitionId, PartitionLedger};
use crate::truth_table::TruthTable;

/// Cones with more boundary inputs than this are not tabulated.
pub const MAX_TABULATED_INPUTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicCone {
    pub output: NodeId,
    /// Boundary nodes reached, ascending. Input `i` of the cone's truth table
    /// is `inputs[i]`.
    pub inputs: Vec<NodeId>,
    /// Distinct interior (non-boundary, non-constant) nodes, the output
    /// included.
    pub cone_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConeFeatures {
    pub output: NodeId,
    pub inputs: Vec<NodeId>,
    pub cone_size: usize,
    pub depth: usize,
    /// `None` when the cone has more than `MAX_TABULATED_INPUTS` inputs.
    pub truth_table: Option<TruthTable>,
}

/// Analyzes cones bounded by a set of partition inputs. Holds no traversal
/// state between calls.
pub struct ConeAnalyzer<'a> {
    net: &'a Network,
    inputs: &'a BTreeSet<NodeId>,
}

impl<'a> ConeAnalyzer<'a> {
    pub fn new(net: &'a Network, inputs: &'a BTreeSet<NodeId>) -> Self {
        Self { net, inputs }
    }

    pub fn for_partition(net: &'a Network, ledger: &'a PartitionLedger, p: PartitionId) -> Self {
        Self::new(net, ledger.inputs(p))
    }

    fn is_boundary(&self, node: NodeId) -> bool {
        self.inputs.contains(&node) || self.net.is_ci(node)
    }

    /// Breadth-first walk from `output` that stops at boundary nodes.
    pub fn logic_cone(&self, output: NodeId) -> LogicCone {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut inputs: BTreeSet<NodeId> = BTreeSet::new();
        let mut cone_size = 0;
        visited.insert(output);
        queue.push_back(output);
        while let Some(current) = queue.pop_front() {
            if self.net.is_constant(current) {
                continue;
            }
            if self.is_boundary(current) {
                inputs.insert(current);
                continue;
            }
            cone_size += 1;
            for fanin in self.net.fanins(current) {
                if visited.insert(fanin.node) {
                    queue.push_back(fanin.node);
                }
            }
        }
        LogicCone {
            output,
            inputs: inputs.into_iter().collect(),
            cone_size,
        }
    }

    /// Interior nodes of the cone in postorder (fan-ins first).
    fn interior_postorder(&self, cone: &LogicCone) -> Vec<NodeId> {
        let boundary: HashSet<NodeId> = cone.inputs.iter().copied().collect();
        postorder_for_nodes(&[cone.output], self.net.nodes(), &boundary)
    }

    /// Gates on the longest path from the cone's inputs to `output`.
    pub fn depth(&self, output: NodeId) -> usize {
        self.depth_of(&self.logic_cone(output))
    }

    fn depth_of(&self, cone: &LogicCone) -> usize {
        let mut levels: HashMap<NodeId, usize> = HashMap::new();
        for node in self.interior_postorder(cone) {
            let level = if self.net.is_gate(node) {
                self.net
                    .fanins(node)
                    .iter()
                    .map(|f| levels.get(&f.node).copied().unwrap_or(0))
                    .max()
                    .unwrap_or(0)
                    + 1
            } else {
                0
            };
            levels.insert(node, level);
        }
        levels.get(&cone.output).copied().unwrap_or(0)
    }

    /// The function of `output` over its cone inputs, with the polarity of the
    /// primary output driven by `output` applied. `None` above
    /// `MAX_TABULATED_INPUTS` inputs.
    pub fn truth_table(&self, output: NodeId) -> Option<TruthTable> {
        self.truth_table_of(&self.logic_cone(output))
    }

    fn truth_table_of(&self, cone: &LogicCone) -> Option<TruthTable> {
        let k = cone.inputs.len();
        if k > MAX_TABULATED_INPUTS {
            return None;
        }
        let mut memo: HashMap<NodeId, TruthTable> = HashMap::new();
        for (i, input) in cone.inputs.iter().enumerate() {
            memo.insert(*input, TruthTable::var(k, i));
        }
        for node in self.interior_postorder(cone) {
            let table = match self.net.gate_kind(node) {
                None => TruthTable::const0(k),
                Some(kind) => {
                    let children: Vec<TruthTable> = self
                        .net
                        .fanins(node)
                        .iter()
                        .map(|f| {
                            let child = if f.is_constant() {
                                TruthTable::const0(k)
                            } else {
                                memo[&f.node].clone()
                            };
                            child.maybe_not(f.negated)
                        })
                        .collect();
                    match kind {
                        GateKind::And2 => children[0].and(&children[1]),
                        GateKind::Maj3 => TruthTable::maj(&children[0], &children[1], &children[2]),
                    }
                }
            };
            memo.insert(node, table);
        }
        let negated = self
            .net
            .po_signal_for(cone.output)
            .is_some_and(|s| s.negated);
        memo.remove(&cone.output).map(|tt| tt.maybe_not(negated))
    }

    pub fn features(&self, output: NodeId) -> ConeFeatures {
        let cone = self.logic_cone(output);
        let depth = self.depth_of(&cone);
        let truth_table = self.truth_table_of(&cone);
        ConeFeatures {
            output,
            inputs: cone.inputs,
            cone_size: cone.cone_size,
            depth,
            truth_table,
        }
    }

    pub fn karnaugh_image(&self, output: NodeId) -> Option<KarnaughImage> {
        self.truth_table(output)
            .map(|tt| KarnaughImage::from_truth_table(&tt))
    }
}

impl PartitionLedger {
    /// Tabulates every output of partition `p` whose cone is small enough and
    /// caches the tables on the ledger. Returns how many were tabulated.
    pub fn generate_truth_tables(&mut self, net: &Network, p: PartitionId) -> usize {
        let mut tables = BTreeMap::new();
        {
            let analyzer = ConeAnalyzer::for_partition(net, self, p);
            for output in self.outputs(p) {
                if net.is_constant(*output) {
                    continue;
                }
                if let Some(tt) = analyzer.truth_table(*output) {
                    tables.insert(*output, tt);
                }
            }
        }
        let count = tables.len();
        log::debug!(
            "partition {}: tabulated {} of {} outputs",
            p,
            count,
            self.outputs(p).len()
        );
        self.truth_tables[p] = tables;
        count
    }

    /// Cached truth table of `output` from `generate_truth_tables`.
    pub fn truth_table(&self, p: PartitionId, output: NodeId) -> Option<&TruthTable> {
        self.truth_tables.get(p).and_then(|tables| tables.get(&output))
    }
}

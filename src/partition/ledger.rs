// SPDX-License-Identifier: Apache-2.0

//! Partition ledger: home partition of every node plus the per-partition
//! boundary tables, reverse maps and merge bookkeeping.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{PartitionError, Result};
use crate::hypergraph::{Hypergraph, HypergraphPartitioner, PartitionRequest};
use crate::network::{Network, NodeId, Representation};
use crate::partition::sync::SubstitutionMap;
use crate::partition::PartitionId;
use crate::truth_table::TruthTable;

/// Boundary tables for every partition. Enough to rebuild a ledger without
/// rerunning the partitioner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundaryTables {
    pub num_partitions: usize,
    pub partition_of: BTreeMap<NodeId, PartitionId>,
    pub scope: Vec<BTreeSet<NodeId>>,
    pub inputs: Vec<BTreeSet<NodeId>>,
    pub outputs: Vec<BTreeSet<NodeId>>,
    pub reg_outputs: Vec<BTreeSet<NodeId>>,
    pub reg_inputs: Vec<BTreeSet<NodeId>>,
}

impl BoundaryTables {
    fn empty(num_partitions: usize) -> Self {
        Self {
            num_partitions,
            partition_of: BTreeMap::new(),
            scope: vec![BTreeSet::new(); num_partitions],
            inputs: vec![BTreeSet::new(); num_partitions],
            outputs: vec![BTreeSet::new(); num_partitions],
            reg_outputs: vec![BTreeSet::new(); num_partitions],
            reg_inputs: vec![BTreeSet::new(); num_partitions],
        }
    }

    /// Classifies every node of `net` and records the boundaries implied by
    /// the assignment `partition_for`.
    pub fn build(
        net: &Network,
        num_partitions: usize,
        partition_for: impl Fn(NodeId) -> Option<PartitionId>,
    ) -> Result<Self> {
        let home = |node: NodeId| -> Result<PartitionId> {
            let partition =
                partition_for(node).ok_or(PartitionError::UnassignedNode { node })?;
            if partition >= num_partitions {
                return Err(PartitionError::PartitionIdOutOfRange {
                    node,
                    partition,
                    num_partitions,
                });
            }
            Ok(partition)
        };
        let mut tables = Self::empty(num_partitions);
        let po_nodes = net.po_nodes();
        let ri_nodes = net.ri_nodes();
        for node in net.node_ids() {
            if net.is_constant(node) {
                continue;
            }
            let p = home(node)?;
            tables.partition_of.insert(node, p);
            tables.scope[p].insert(node);
            if net.is_ci(node) {
                tables.inputs[p].insert(node);
                if net.is_ro(node) {
                    tables.reg_outputs[p].insert(node);
                }
            }
            if po_nodes.contains(&node) || ri_nodes.contains(&node) {
                tables.outputs[p].insert(node);
                if ri_nodes.contains(&node) {
                    tables.reg_inputs[p].insert(node);
                }
            }
            for fanin in net.fanins(node) {
                if fanin.is_constant() {
                    continue;
                }
                let producer = home(fanin.node)?;
                if producer != p {
                    tables.inputs[p].insert(fanin.node);
                    tables.outputs[producer].insert(fanin.node);
                }
            }
        }
        Ok(tables)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PartitionError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| PartitionError::Serialization(e.to_string()))
    }
}

/// Result of `combine_partitions`: the boundary of the merged partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedBoundary {
    pub inputs: BTreeSet<NodeId>,
    pub outputs: BTreeSet<NodeId>,
}

#[derive(Debug, Clone)]
pub struct PartitionLedger {
    pub(crate) tables: BoundaryTables,
    /// node -> partitions that consume it as an input.
    input_partitions: HashMap<NodeId, BTreeSet<PartitionId>>,
    /// node -> partitions that produce it as an output.
    output_partitions: HashMap<NodeId, BTreeSet<PartitionId>>,
    /// Boundary nodes that earlier merges turned into internal nodes.
    combined_deleted_nodes: Vec<BTreeSet<NodeId>>,
    aig_partitions: BTreeSet<PartitionId>,
    mig_partitions: BTreeSet<PartitionId>,
    pub(crate) truth_tables: Vec<BTreeMap<NodeId, TruthTable>>,
    pub(crate) substitutions: BTreeMap<PartitionId, SubstitutionMap>,
}

impl PartitionLedger {
    /// Builds the ledger from an explicit node -> partition map. Every
    /// non-constant node must be assigned.
    pub fn from_assignment(
        net: &Network,
        assignment: &HashMap<NodeId, PartitionId>,
        num_partitions: usize,
    ) -> Result<Self> {
        let tables = BoundaryTables::build(net, num_partitions, |n| assignment.get(&n).copied())?;
        Ok(Self::from_tables(tables))
    }

    /// Builds the ledger from a partitioner answer (one partition id per
    /// vertex, indexed by node id).
    pub fn from_vertex_assignment(
        net: &Network,
        assignment: &[PartitionId],
        num_partitions: usize,
    ) -> Result<Self> {
        if assignment.len() != net.size() {
            return Err(PartitionError::AssignmentLength {
                expected: net.size(),
                actual: assignment.len(),
            });
        }
        let tables = BoundaryTables::build(net, num_partitions, |n| assignment.get(n.id).copied())?;
        Ok(Self::from_tables(tables))
    }

    /// Partitions `net` into `num_partitions` parts through `partitioner`.
    /// A single partition skips the partitioner.
    pub fn with_partitioner(
        net: &Network,
        num_partitions: usize,
        imbalance: f64,
        partitioner: &dyn HypergraphPartitioner,
    ) -> Result<Self> {
        if num_partitions <= 1 {
            return Self::whole_network(net);
        }
        let hypergraph = Hypergraph::from_network(net);
        let request = PartitionRequest {
            hypergraph: &hypergraph,
            imbalance,
            num_partitions,
        };
        let assignment = partitioner
            .partition(&request)
            .map_err(|e| PartitionError::Partitioner(format!("{:#}", e)))?;
        let ledger = Self::from_vertex_assignment(net, &assignment, num_partitions)?;
        log::info!(
            "partitioned {} ({} nodes) into {} partitions",
            net.name,
            net.size(),
            num_partitions
        );
        Ok(ledger)
    }

    /// The whole network as partition 0.
    pub fn whole_network(net: &Network) -> Result<Self> {
        let tables = BoundaryTables::build(net, 1, |_| Some(0))?;
        Ok(Self::from_tables(tables))
    }

    /// Rebuilds a ledger from previously computed tables.
    pub fn from_tables(tables: BoundaryTables) -> Self {
        let num_partitions = tables.num_partitions;
        let mut ledger = Self {
            tables,
            input_partitions: HashMap::new(),
            output_partitions: HashMap::new(),
            combined_deleted_nodes: vec![BTreeSet::new(); num_partitions],
            aig_partitions: BTreeSet::new(),
            mig_partitions: BTreeSet::new(),
            truth_tables: vec![BTreeMap::new(); num_partitions],
            substitutions: BTreeMap::new(),
        };
        for p in 0..num_partitions {
            ledger.update_io(p);
        }
        ledger
    }

    fn check_partition(&self, p: PartitionId) {
        assert!(
            p < self.tables.num_partitions,
            "partition {} out of range (num_partitions = {})",
            p,
            self.tables.num_partitions
        );
    }

    /// Records partition `p`'s current boundary in the reverse maps.
    pub fn update_io(&mut self, p: PartitionId) {
        self.check_partition(p);
        for node in &self.tables.inputs[p] {
            self.input_partitions.entry(*node).or_default().insert(p);
        }
        for node in &self.tables.outputs[p] {
            self.output_partitions.entry(*node).or_default().insert(p);
        }
    }

    pub fn num_partitions(&self) -> usize {
        self.tables.num_partitions
    }

    pub fn tables(&self) -> &BoundaryTables {
        &self.tables
    }

    pub fn into_tables(self) -> BoundaryTables {
        self.tables
    }

    pub fn partition_of(&self, node: NodeId) -> Result<PartitionId> {
        self.tables
            .partition_of
            .get(&node)
            .copied()
            .ok_or(PartitionError::UnassignedNode { node })
    }

    pub fn scope(&self, p: PartitionId) -> &BTreeSet<NodeId> {
        self.check_partition(p);
        &self.tables.scope[p]
    }

    pub fn inputs(&self, p: PartitionId) -> &BTreeSet<NodeId> {
        self.check_partition(p);
        &self.tables.inputs[p]
    }

    pub fn outputs(&self, p: PartitionId) -> &BTreeSet<NodeId> {
        self.check_partition(p);
        &self.tables.outputs[p]
    }

    pub fn reg_outputs(&self, p: PartitionId) -> &BTreeSet<NodeId> {
        self.check_partition(p);
        &self.tables.reg_outputs[p]
    }

    pub fn reg_inputs(&self, p: PartitionId) -> &BTreeSet<NodeId> {
        self.check_partition(p);
        &self.tables.reg_inputs[p]
    }

    pub fn set_inputs(&mut self, p: PartitionId, inputs: BTreeSet<NodeId>) {
        self.check_partition(p);
        self.tables.inputs[p] = inputs;
    }

    pub fn set_outputs(&mut self, p: PartitionId, outputs: BTreeSet<NodeId>) {
        self.check_partition(p);
        self.tables.outputs[p] = outputs;
    }

    pub fn set_reg_outputs(&mut self, p: PartitionId, reg_outputs: BTreeSet<NodeId>) {
        self.check_partition(p);
        self.tables.reg_outputs[p] = reg_outputs;
    }

    pub fn set_reg_inputs(&mut self, p: PartitionId, reg_inputs: BTreeSet<NodeId>) {
        self.check_partition(p);
        self.tables.reg_inputs[p] = reg_inputs;
    }

    /// Partitions that consume `node` as an input.
    pub fn input_partitions(&self, node: NodeId) -> BTreeSet<PartitionId> {
        self.input_partitions.get(&node).cloned().unwrap_or_default()
    }

    /// Partitions that produce `node` as an output.
    pub fn output_partitions(&self, node: NodeId) -> BTreeSet<PartitionId> {
        self.output_partitions.get(&node).cloned().unwrap_or_default()
    }

    pub fn deleted_nodes(&self, p: PartitionId) -> &BTreeSet<NodeId> {
        self.check_partition(p);
        &self.combined_deleted_nodes[p]
    }

    /// Nodes straddling `p1` and `p2`: produced by one, consumed by the other.
    pub fn shared_io(&self, p1: PartitionId, p2: PartitionId) -> BTreeSet<NodeId> {
        let (in1, out1) = (self.inputs(p1), self.outputs(p1));
        let (in2, out2) = (self.inputs(p2), self.outputs(p2));
        in1.intersection(out2)
            .chain(out1.intersection(in2))
            .copied()
            .collect()
    }

    /// Partitions that produce one of `p`'s inputs or consume one of its
    /// outputs. Combinational inputs of the network do not connect
    /// partitions, and neither does consuming the same node.
    pub fn connected_partitions(&self, net: &Network, p: PartitionId) -> BTreeSet<PartitionId> {
        let edges = self
            .inputs(p)
            .iter()
            .map(|n| (n, &self.output_partitions))
            .chain(self.outputs(p).iter().map(|n| (n, &self.input_partitions)));
        let mut connected = BTreeSet::new();
        for (node, across) in edges {
            if net.is_ci(*node) {
                continue;
            }
            if let Some(parts) = across.get(node) {
                connected.extend(parts.iter().copied());
            }
        }
        connected.remove(&p);
        connected
    }

    /// Computes the boundary of `p1` merged with `p2` and re-homes `p2`'s
    /// reverse-map entries onto `p1`. The tables themselves are left as they
    /// were; `merge_partitions` applies the result and retires `p2`.
    pub fn combine_partitions(
        &mut self,
        net: &Network,
        p1: PartitionId,
        p2: PartitionId,
    ) -> MergedBoundary {
        assert_ne!(p1, p2, "combine_partitions: cannot merge partition {} with itself", p1);
        let mut shared = self.shared_io(p1, p2);
        shared.extend(self.combined_deleted_nodes[p1].iter().copied());
        shared.extend(self.combined_deleted_nodes[p2].iter().copied());

        let mut inputs: BTreeSet<NodeId> =
            self.inputs(p1).union(self.inputs(p2)).copied().collect();
        let mut outputs: BTreeSet<NodeId> =
            self.outputs(p1).union(self.outputs(p2)).copied().collect();

        let mut internalized = Vec::new();
        for node in &shared {
            let keep_input = net.is_ci(*node);
            let used_elsewhere = self
                .input_partitions
                .get(node)
                .is_some_and(|parts| parts.iter().any(|q| *q != p1 && *q != p2));
            let keep_output = net.is_co(*node) || used_elsewhere;
            if !keep_input {
                inputs.remove(node);
            }
            if !keep_output {
                outputs.remove(node);
            }
            if !keep_input && !keep_output {
                internalized.push(*node);
            }
        }
        log::debug!(
            "combine_partitions({}, {}): {} shared, {} internalized",
            p1,
            p2,
            shared.len(),
            internalized.len()
        );
        self.combined_deleted_nodes[p1].extend(internalized);

        for map in [&mut self.input_partitions, &mut self.output_partitions] {
            for parts in map.values_mut() {
                if parts.remove(&p2) {
                    parts.insert(p1);
                }
            }
        }
        MergedBoundary { inputs, outputs }
    }

    /// Merges `p2` into `p1`: applies `combine_partitions`, moves scope,
    /// register sets, merge history, pending substitutions and cached tables
    /// to `p1`, and leaves `p2` empty.
    pub fn merge_partitions(&mut self, net: &Network, p1: PartitionId, p2: PartitionId) {
        let merged = self.combine_partitions(net, p1, p2);
        // Nodes that stayed internal to p1 are dropped from the reverse maps.
        for map in [&mut self.input_partitions, &mut self.output_partitions] {
            for node in self.combined_deleted_nodes[p1].iter() {
                if let Some(parts) = map.get_mut(node) {
                    parts.remove(&p1);
                }
            }
        }
        for node in merged.inputs.iter() {
            self.input_partitions.entry(*node).or_default().insert(p1);
        }
        for node in self.tables.inputs[p1].union(&self.tables.inputs[p2]) {
            if !merged.inputs.contains(node) {
                if let Some(parts) = self.input_partitions.get_mut(node) {
                    parts.remove(&p1);
                }
            }
        }
        for node in self.tables.outputs[p1].union(&self.tables.outputs[p2]) {
            if !merged.outputs.contains(node) {
                if let Some(parts) = self.output_partitions.get_mut(node) {
                    parts.remove(&p1);
                }
            }
        }
        self.tables.inputs[p1] = merged.inputs;
        self.tables.outputs[p1] = merged.outputs;
        self.tables.inputs[p2].clear();
        self.tables.outputs[p2].clear();

        let scope = std::mem::take(&mut self.tables.scope[p2]);
        for node in &scope {
            self.tables.partition_of.insert(*node, p1);
        }
        self.tables.scope[p1].extend(scope);
        let reg_outputs = std::mem::take(&mut self.tables.reg_outputs[p2]);
        self.tables.reg_outputs[p1].extend(reg_outputs);
        let reg_inputs = std::mem::take(&mut self.tables.reg_inputs[p2]);
        self.tables.reg_inputs[p1].extend(reg_inputs);
        let history = std::mem::take(&mut self.combined_deleted_nodes[p2]);
        self.combined_deleted_nodes[p1].extend(history);
        let tables = std::mem::take(&mut self.truth_tables[p2]);
        self.truth_tables[p1].extend(tables);
        if let Some(pending) = self.substitutions.remove(&p2) {
            self.substitutions.entry(p1).or_default().extend(pending);
        }
        self.aig_partitions.remove(&p2);
        self.mig_partitions.remove(&p2);
        self.update_io(p1);
        log::info!(
            "merged partition {} into {}: {} inputs, {} outputs",
            p2,
            p1,
            self.tables.inputs[p1].len(),
            self.tables.outputs[p1].len()
        );
    }

    /// Whether `p` holds no nodes (never populated or merged away).
    pub fn is_retired(&self, p: PartitionId) -> bool {
        self.scope(p).is_empty()
    }

    pub fn aig_partitions(&self) -> &BTreeSet<PartitionId> {
        &self.aig_partitions
    }

    pub fn mig_partitions(&self) -> &BTreeSet<PartitionId> {
        &self.mig_partitions
    }

    /// Records the representation chosen for `p`, replacing an earlier choice.
    pub fn assign_representation(&mut self, p: PartitionId, representation: Representation) {
        self.check_partition(p);
        match representation {
            Representation::Aig => {
                self.mig_partitions.remove(&p);
                self.aig_partitions.insert(p);
            }
            Representation::Mig => {
                self.aig_partitions.remove(&p);
                self.mig_partitions.insert(p);
            }
        }
    }

    pub fn representation_of(&self, p: PartitionId) -> Option<Representation> {
        if self.aig_partitions.contains(&p) {
            Some(Representation::Aig)
        } else if self.mig_partitions.contains(&p) {
            Some(Representation::Mig)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypergraph::ChunkPartitioner;
    use crate::network::NetworkOptions;
    use crate::test_utils::{setup_partitioned_graph, setup_sequential_graph};
    use maplit::btreeset;
    use pretty_assertions::assert_eq;

    fn n(id: usize) -> NodeId {
        NodeId { id }
    }

    #[test]
    fn test_boundaries_from_assignment() {
        let g = setup_partitioned_graph();
        let ledger = PartitionLedger::from_assignment(&g.net, &g.assignment, 2).unwrap();
        assert_eq!(ledger.scope(0), &btreeset! {n(1), n(2), n(5), n(7)});
        assert_eq!(ledger.inputs(0), &btreeset! {n(1), n(2), n(6)});
        assert_eq!(ledger.outputs(0), &btreeset! {n(7)});
        assert_eq!(ledger.scope(1), &btreeset! {n(3), n(4), n(6)});
        assert_eq!(ledger.inputs(1), &btreeset! {n(3), n(4)});
        assert_eq!(ledger.outputs(1), &btreeset! {n(6)});
        assert_eq!(ledger.partition_of(g.right.node).unwrap(), 1);
        assert_eq!(ledger.input_partitions(n(6)), btreeset! {0});
        assert_eq!(ledger.output_partitions(n(6)), btreeset! {1});
    }

    #[test]
    fn test_connectivity_and_shared_io() {
        let g = setup_partitioned_graph();
        let ledger = PartitionLedger::from_assignment(&g.net, &g.assignment, 2).unwrap();
        assert_eq!(ledger.shared_io(0, 1), btreeset! {n(6)});
        assert_eq!(ledger.shared_io(1, 0), btreeset! {n(6)});
        assert_eq!(ledger.connected_partitions(&g.net, 0), btreeset! {1});
        assert_eq!(ledger.connected_partitions(&g.net, 1), btreeset! {0});
    }

    #[test]
    fn test_primary_inputs_do_not_connect_partitions() {
        let mut net = Network::new("fanout", NetworkOptions::no_opt());
        let a = net.create_pi("a");
        let b = net.create_pi("b");
        let x = net.create_and(a, b);
        let y = net.create_and(a, b.negate());
        net.create_po("x", x);
        net.create_po("y", y);
        let assignment: HashMap<NodeId, usize> =
            [(a.node, 0), (b.node, 0), (x.node, 0), (y.node, 1)].into_iter().collect();
        let ledger = PartitionLedger::from_assignment(&net, &assignment, 2).unwrap();
        assert_eq!(ledger.inputs(1), &btreeset! {a.node, b.node});
        assert_eq!(ledger.outputs(0), &btreeset! {a.node, b.node, x.node});
        assert!(ledger.connected_partitions(&net, 1).is_empty());
    }

    #[test]
    fn test_sibling_consumers_are_not_connected() {
        let mut net = Network::new("siblings", NetworkOptions::no_opt());
        let a = net.create_pi("a");
        let b = net.create_pi("b");
        let x = net.create_and(a, b);
        let y = net.create_and(x, a);
        let z = net.create_and(x, b.negate());
        net.create_po("y", y);
        net.create_po("z", z);
        let assignment: HashMap<NodeId, usize> = [
            (a.node, 0),
            (b.node, 0),
            (x.node, 0),
            (y.node, 1),
            (z.node, 2),
        ]
        .into_iter()
        .collect();
        let ledger = PartitionLedger::from_assignment(&net, &assignment, 3).unwrap();
        assert_eq!(ledger.input_partitions(x.node), btreeset! {1, 2});
        assert_eq!(ledger.connected_partitions(&net, 0), btreeset! {1, 2});
        assert_eq!(ledger.connected_partitions(&net, 1), btreeset! {0});
        assert_eq!(ledger.connected_partitions(&net, 2), btreeset! {0});
    }

    #[test]
    fn test_sequential_boundaries() {
        let g = setup_sequential_graph();
        let ledger = PartitionLedger::whole_network(&g.net).unwrap();
        assert_eq!(ledger.num_partitions(), 1);
        assert_eq!(ledger.inputs(0), &btreeset! {g.a.node, g.q.node});
        assert_eq!(ledger.reg_outputs(0), &btreeset! {g.q.node});
        assert_eq!(ledger.outputs(0), &btreeset! {g.o.node, g.d.node});
        assert_eq!(ledger.reg_inputs(0), &btreeset! {g.d.node});
    }

    #[test]
    fn test_register_output_that_is_primary_output() {
        let mut net = Network::new("ro_po", NetworkOptions::no_opt());
        let a = net.create_pi("a");
        let q = net.create_register("r", false);
        net.set_register_input(0, a);
        net.create_po("q", q);
        let ledger = PartitionLedger::whole_network(&net).unwrap();
        assert!(ledger.inputs(0).contains(&q.node));
        assert!(ledger.outputs(0).contains(&q.node));
        assert!(ledger.outputs(0).contains(&a.node));
        assert_eq!(ledger.reg_inputs(0), &btreeset! {a.node});
    }

    #[test]
    fn test_unassigned_node_is_an_error() {
        let g = setup_partitioned_graph();
        let mut assignment = g.assignment.clone();
        assignment.remove(&g.left.node);
        match PartitionLedger::from_assignment(&g.net, &assignment, 2) {
            Err(PartitionError::UnassignedNode { node }) => assert_eq!(node, g.left.node),
            other => panic!("expected UnassignedNode; got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_out_of_range_partition_is_an_error() {
        let g = setup_partitioned_graph();
        let result = PartitionLedger::from_assignment(&g.net, &g.assignment, 1);
        assert!(matches!(
            result,
            Err(PartitionError::PartitionIdOutOfRange {
                partition: 1,
                num_partitions: 1,
                ..
            })
        ));
    }

    struct ShortPartitioner;

    impl HypergraphPartitioner for ShortPartitioner {
        fn partition(&self, _request: &PartitionRequest<'_>) -> anyhow::Result<Vec<usize>> {
            Ok(vec![0])
        }
    }

    struct FailingPartitioner;

    impl HypergraphPartitioner for FailingPartitioner {
        fn partition(&self, _request: &PartitionRequest<'_>) -> anyhow::Result<Vec<usize>> {
            Err(anyhow::anyhow!("solver unavailable"))
        }
    }

    #[test]
    fn test_partitioner_failures_propagate() {
        let g = setup_partitioned_graph();
        assert!(matches!(
            PartitionLedger::with_partitioner(&g.net, 2, 0.5, &ShortPartitioner),
            Err(PartitionError::AssignmentLength {
                expected: 8,
                actual: 1
            })
        ));
        match PartitionLedger::with_partitioner(&g.net, 2, 0.5, &FailingPartitioner) {
            Err(PartitionError::Partitioner(msg)) => assert!(msg.contains("solver unavailable")),
            other => panic!("expected Partitioner error; got {:?}", other.map(|_| ())),
        }
        // A single partition never consults the partitioner.
        let whole = PartitionLedger::with_partitioner(&g.net, 1, 0.5, &FailingPartitioner).unwrap();
        assert_eq!(whole.scope(0).len(), 7);
    }

    #[test]
    fn test_chunk_partitioner_boundaries_are_complete() {
        let g = setup_partitioned_graph();
        let ledger = PartitionLedger::with_partitioner(&g.net, 2, 0.5, &ChunkPartitioner).unwrap();
        for gate in g.net.gate_ids() {
            let consumer = ledger.partition_of(gate).unwrap();
            for fanin in g.net.fanins(gate) {
                let producer = ledger.partition_of(fanin.node).unwrap();
                if producer != consumer {
                    assert!(ledger.outputs(producer).contains(&fanin.node));
                    assert!(ledger.inputs(consumer).contains(&fanin.node));
                }
            }
        }
    }

    #[test]
    fn test_combine_partitions_internalizes_shared_nodes() {
        let mut net = Network::new("chain", NetworkOptions::no_opt());
        let a = net.create_pi("a");
        let b = net.create_pi("b");
        let x = net.create_and(a, b);
        let y = net.create_and(x, b.negate());
        net.create_po("y", y);
        let assignment: HashMap<NodeId, usize> =
            [(a.node, 0), (b.node, 0), (x.node, 0), (y.node, 1)].into_iter().collect();
        let mut ledger = PartitionLedger::from_assignment(&net, &assignment, 2).unwrap();
        assert_eq!(ledger.shared_io(0, 1), btreeset! {b.node, x.node});
        let merged = ledger.combine_partitions(&net, 0, 1);
        assert_eq!(merged.inputs, btreeset! {a.node, b.node});
        assert_eq!(merged.outputs, btreeset! {y.node});
        assert_eq!(ledger.deleted_nodes(0), &btreeset! {x.node});
        assert_eq!(ledger.input_partitions(x.node), btreeset! {0});
    }

    #[test]
    fn test_combine_keeps_primary_output_and_third_party_outputs() {
        let g = setup_partitioned_graph();
        let mut ledger = PartitionLedger::from_assignment(&g.net, &g.assignment, 2).unwrap();
        let merged = ledger.combine_partitions(&g.net, 0, 1);
        assert_eq!(merged.inputs, btreeset! {n(1), n(2), n(3), n(4)});
        // `right` drives primary output o1.
        assert_eq!(merged.outputs, btreeset! {n(6), n(7)});
        assert!(ledger.deleted_nodes(0).is_empty());
    }

    #[test]
    fn test_merge_partitions_retires_second() {
        let mut net = Network::new("three", NetworkOptions::no_opt());
        let a = net.create_pi("a");
        let b = net.create_pi("b");
        let x = net.create_and(a, b);
        let y = net.create_and(x, a.negate());
        let z = net.create_and(x, y);
        net.create_po("z", z);
        let assignment: HashMap<NodeId, usize> = [
            (a.node, 0),
            (b.node, 0),
            (x.node, 0),
            (y.node, 1),
            (z.node, 2),
        ]
        .into_iter()
        .collect();
        let mut ledger = PartitionLedger::from_assignment(&net, &assignment, 3).unwrap();
        ledger.merge_partitions(&net, 0, 1);
        assert!(ledger.is_retired(1));
        assert_eq!(ledger.partition_of(y.node).unwrap(), 0);
        assert_eq!(ledger.scope(0), &btreeset! {a.node, b.node, x.node, y.node});
        // x still feeds partition 2 and stays an output.
        assert_eq!(ledger.outputs(0), &btreeset! {x.node, y.node});
        assert_eq!(ledger.inputs(0), &btreeset! {a.node, b.node});
        assert_eq!(ledger.input_partitions(x.node), btreeset! {2});
        assert_eq!(ledger.output_partitions(y.node), btreeset! {0});
        assert_eq!(ledger.connected_partitions(&net, 0), btreeset! {2});
        assert_eq!(ledger.connected_partitions(&net, 2), btreeset! {0});
        for node in ledger.inputs(0).intersection(ledger.outputs(0)) {
            assert!(net.is_ci(*node) || net.is_co(*node));
        }
    }

    #[test]
    fn test_tables_round_trip_through_bincode() {
        let g = setup_partitioned_graph();
        let ledger = PartitionLedger::from_assignment(&g.net, &g.assignment, 2).unwrap();
        let bytes = ledger.tables().to_bytes().unwrap();
        let tables = BoundaryTables::from_bytes(&bytes).unwrap();
        assert_eq!(&tables, ledger.tables());
        let reloaded = PartitionLedger::from_tables(tables);
        assert_eq!(reloaded.input_partitions(n(6)), btreeset! {0});
        assert_eq!(reloaded.connected_partitions(&g.net, 0), btreeset! {1});
        assert!(BoundaryTables::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_update_io_is_idempotent() {
        let g = setup_partitioned_graph();
        let mut ledger = PartitionLedger::from_assignment(&g.net, &g.assignment, 2).unwrap();
        ledger.update_io(0);
        ledger.update_io(0);
        assert_eq!(ledger.input_partitions(n(6)), btreeset! {0});
    }

    #[test]
    fn test_representation_buckets() {
        let g = setup_partitioned_graph();
        let mut ledger = PartitionLedger::from_assignment(&g.net, &g.assignment, 2).unwrap();
        ledger.assign_representation(0, Representation::Aig);
        ledger.assign_representation(1, Representation::Aig);
        ledger.assign_representation(1, Representation::Mig);
        assert_eq!(ledger.aig_partitions(), &btreeset! {0});
        assert_eq!(ledger.mig_partitions(), &btreeset! {1});
        assert_eq!(ledger.representation_of(1), Some(Representation::Mig));
    }

    #[test]
    #[should_panic(expected = "partition 5 out of range")]
    fn test_partition_index_out_of_range_panics() {
        let g = setup_partitioned_graph();
        let ledger = PartitionLedger::from_assignment(&g.net, &g.assignment, 2).unwrap();
        let _ = ledger.inputs(5);
    }
}

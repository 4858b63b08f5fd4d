// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use mixsynth::hypergraph::{ChunkPartitioner, Hypergraph};
use mixsynth::network::{Network, NodeId};
use mixsynth::partition::{BoundaryTables, PartitionLedger, ViewIndex};
use mixsynth::test_utils::{RandomNetworkParams, random_assignment, random_network};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn network(seed: u64, registers: usize) -> Network {
    let params = RandomNetworkParams {
        registers,
        gates: 96,
        maj_fraction: 0.3,
        ..Default::default()
    };
    random_network(seed, &params)
}

fn partitioned(seed: u64, num_partitions: usize, registers: usize) -> (Network, PartitionLedger) {
    let net = network(seed, registers);
    let ledger =
        PartitionLedger::with_partitioner(&net, num_partitions, 0.5, &ChunkPartitioner).unwrap();
    (net, ledger)
}

/// Nodes land in partitions at random, so partitions feed each other in both
/// directions and boundary nodes interleave.
fn scattered(seed: u64, num_partitions: usize, registers: usize) -> (Network, PartitionLedger) {
    let net = network(seed, registers);
    let assignment = random_assignment(seed ^ 0x5ca7, &net, num_partitions);
    let ledger = PartitionLedger::from_assignment(&net, &assignment, num_partitions).unwrap();
    (net, ledger)
}

#[test_case(1, 2, 0 ; "two partitions")]
#[test_case(2, 4, 0 ; "four partitions")]
#[test_case(3, 5, 3 ; "five partitions with registers")]
#[test_case(4, 8, 2 ; "eight partitions with registers")]
fn test_boundary_completeness(seed: u64, num_partitions: usize, registers: usize) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (net, ledger) = partitioned(seed, num_partitions, registers);
    assert_boundary_complete(&net, &ledger);
}

#[test_case(11, 3, 0 ; "three partitions")]
#[test_case(12, 4, 2 ; "four partitions with registers")]
#[test_case(13, 7, 3 ; "seven partitions with registers")]
fn test_boundary_completeness_with_scattered_nodes(
    seed: u64,
    num_partitions: usize,
    registers: usize,
) {
    let (net, ledger) = scattered(seed, num_partitions, registers);
    let feeds = |p: usize, q: usize| {
        ledger
            .outputs(p)
            .intersection(ledger.inputs(q))
            .any(|n| !net.is_ci(*n))
    };
    let feeds_back =
        (0..num_partitions).any(|p| (p + 1..num_partitions).any(|q| feeds(p, q) && feeds(q, p)));
    assert!(feeds_back, "no two partitions feed each other");
    assert_boundary_complete(&net, &ledger);
}

#[test_case(21, 4, 2 ; "four partitions")]
#[test_case(22, 6, 3 ; "six partitions")]
fn test_merges_keep_scattered_boundaries_complete(
    seed: u64,
    num_partitions: usize,
    registers: usize,
) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (net, mut ledger) = scattered(seed, num_partitions, registers);
    // Merge in a fixed, non-monotone order so histories build up on several
    // partitions before they meet.
    let order = [(1, 3), (0, 2), (0, 1)];
    for (p1, p2) in order.into_iter().chain((4..num_partitions).map(|p| (0, p))) {
        ledger.merge_partitions(&net, p1, p2);
        assert!(ledger.is_retired(p2));
        assert_boundary_complete(&net, &ledger);
        for node in ledger.inputs(p1).intersection(ledger.outputs(p1)) {
            assert!(net.is_ci(*node), "{} is both input and output of {}", node, p1);
        }
    }
    let cis: BTreeSet<NodeId> = net.cis().into_iter().collect();
    assert_eq!(ledger.inputs(0), &cis);
    assert!(ledger.connected_partitions(&net, 0).is_empty());
}

fn assert_boundary_complete(net: &Network, ledger: &PartitionLedger) {
    for gate in net.gate_ids() {
        let consumer = ledger.partition_of(gate).unwrap();
        for fanin in net.fanins(gate) {
            if fanin.is_constant() {
                continue;
            }
            let producer = ledger.partition_of(fanin.node).unwrap();
            if producer == consumer {
                continue;
            }
            assert!(
                ledger.outputs(producer).contains(&fanin.node),
                "{} feeds partition {} but is not an output of {}",
                fanin.node,
                consumer,
                producer
            );
            assert!(ledger.inputs(consumer).contains(&fanin.node));
            assert!(ledger.input_partitions(fanin.node).contains(&consumer));
            assert!(ledger.output_partitions(fanin.node).contains(&producer));
        }
    }
    for ci in net.cis() {
        let home = ledger.partition_of(ci).unwrap();
        assert!(ledger.inputs(home).contains(&ci));
        assert_eq!(net.is_ro(ci), ledger.reg_outputs(home).contains(&ci));
    }
    for co in net.cos() {
        if co.is_constant() {
            continue;
        }
        let home = ledger.partition_of(co.node).unwrap();
        assert!(ledger.outputs(home).contains(&co.node));
    }
    let total: usize = (0..ledger.num_partitions())
        .map(|p| ledger.scope(p).len())
        .sum();
    assert_eq!(total, net.size() - 1);
}

#[test_case(5, 3 ; "three partitions")]
#[test_case(6, 6 ; "six partitions")]
fn test_views_are_topologically_sound(seed: u64, num_partitions: usize) {
    let (net, ledger) = partitioned(seed, num_partitions, 2);
    for p in 0..num_partitions {
        let view = ledger.create_part(&net, p).unwrap();
        assert_eq!(view.num_constants(), 1);
        for (offset, gate) in view.gates().iter().enumerate() {
            let index = ViewIndex(view.num_constants() + view.num_pis() + offset);
            assert_eq!(view.node_to_index(*gate), Some(index));
            assert!(ledger.scope(p).contains(gate), "view gate {} escapes partition {}", gate, p);
            for fanin in view.local_fanins(index) {
                assert!(
                    fanin.index < index,
                    "partition {}: gate {} at {:?} uses {:?}",
                    p,
                    gate,
                    index,
                    fanin.index
                );
            }
        }
        let roots: BTreeSet<NodeId> = view.roots().iter().map(|r| r.node).collect();
        assert_eq!(&roots, ledger.outputs(p));
        let sub = view.to_network(format!("part_{}", p));
        assert_eq!(sub.num_pis(), view.num_pis());
        assert_eq!(sub.num_pos(), view.num_pos());
        assert_eq!(sub.num_gates(), view.num_gates());
    }
}

#[test]
fn test_combine_leaves_only_primary_io_on_both_sides() {
    let (net, ledger) = partitioned(7, 4, 2);
    for p1 in 0..4 {
        for p2 in ledger.connected_partitions(&net, p1) {
            let mut scratch = ledger.clone();
            let merged = scratch.combine_partitions(&net, p1, p2);
            for node in merged.inputs.intersection(&merged.outputs) {
                assert!(
                    net.is_ci(*node),
                    "{} is both input and output of {} + {}",
                    node,
                    p1,
                    p2
                );
            }
            for node in ledger.shared_io(p1, p2) {
                if !net.is_ci(node) {
                    assert!(!merged.inputs.contains(&node));
                }
            }
            // A second combine with the recorded history gives the same answer.
            let again = scratch.combine_partitions(&net, p1, p2);
            assert_eq!(again, merged);
        }
    }
}

#[test]
fn test_merging_everything_leaves_only_primary_io() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (net, mut ledger) = partitioned(8, 5, 3);
    for p in 1..5 {
        ledger.merge_partitions(&net, 0, p);
        assert!(ledger.is_retired(p));
        let view = ledger.create_part(&net, 0).unwrap();
        assert!(view.num_gates() > 0);
    }
    let cis: BTreeSet<NodeId> = net.cis().into_iter().collect();
    let cos: BTreeSet<NodeId> = net
        .cos()
        .into_iter()
        .filter(|s| !s.is_constant())
        .map(|s| s.node)
        .collect();
    assert_eq!(ledger.inputs(0), &cis);
    assert_eq!(ledger.outputs(0), &cos);
    assert_eq!(ledger.scope(0).len(), net.size() - 1);
    assert_eq!(ledger.reg_outputs(0).len(), net.num_registers());
    assert!(ledger.connected_partitions(&net, 0).is_empty());
}

#[test]
fn test_tables_survive_bincode() {
    let (net, ledger) = partitioned(9, 3, 1);
    let bytes = ledger.tables().to_bytes().unwrap();
    let tables = BoundaryTables::from_bytes(&bytes).unwrap();
    assert_eq!(&tables, ledger.tables());
    let reloaded = PartitionLedger::from_tables(tables);
    for p in 0..3 {
        let a = ledger.create_part(&net, p).unwrap();
        let b = reloaded.create_part(&net, p).unwrap();
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.roots(), b.roots());
        assert_eq!(
            ledger.connected_partitions(&net, p),
            reloaded.connected_partitions(&net, p)
        );
    }
    assert!(BoundaryTables::from_bytes(&bytes[..bytes.len() / 2]).is_err());
}

#[test]
fn test_hypergraph_matches_gates() {
    let (net, _) = partitioned(10, 1, 0);
    let hypergraph = Hypergraph::from_network(&net);
    assert_eq!(hypergraph.num_vertices, net.size());
    assert_eq!(hypergraph.num_hyperedges(), net.num_gates());
    for (edge, gate) in hypergraph.hyperedges().zip(net.gate_ids()) {
        assert_eq!(edge[0] as usize, gate.id);
        assert!(edge[1..].iter().all(|v| *v != 0));
    }
}

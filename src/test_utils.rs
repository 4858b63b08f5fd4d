// SPDX-License-Identifier: Apache-2.0

//! Fixture networks shared by unit tests, integration tests and benches.

use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::network::{Network, NetworkOptions, NodeId, Signal};

pub struct TestGraph {
    pub net: Network,
    pub a: Signal,
    pub b: Signal,
    pub c: Signal,
    pub ab: Signal,
    pub o: Signal,
}

/// o = (a & b) | !c
///
/// a --\
///      AND(ab) --\
/// b --/           OR(o) [output]
/// c ------NOT----/
pub fn setup_simple_graph() -> TestGraph {
    let mut net = Network::new("simple", NetworkOptions::no_opt());
    let a = net.create_pi("a");
    let b = net.create_pi("b");
    let c = net.create_pi("c");
    let ab = net.create_and(a, b);
    let o = net.create_or(ab, c.negate());
    net.create_po("o", o);
    TestGraph {
        net,
        a,
        b,
        c,
        ab,
        o,
    }
}

pub struct TestMajorityGraph {
    pub net: Network,
    pub a: Signal,
    pub b: Signal,
    pub c: Signal,
    pub m: Signal,
}

/// A single three-input majority gate driving one output.
pub fn setup_majority_graph() -> TestMajorityGraph {
    let mut net = Network::new("majority", NetworkOptions::no_opt());
    let a = net.create_pi("a");
    let b = net.create_pi("b");
    let c = net.create_pi("c");
    let m = net.create_maj(a, b, c);
    net.create_po("o", m);
    TestMajorityGraph { net, a, b, c, m }
}

pub struct TestSequentialGraph {
    pub net: Network,
    pub a: Signal,
    pub q: Signal,
    pub o: Signal,
    pub d: Signal,
}

/// One register `r` with output `q`:
/// o = q ^ a (primary output), r.next = d = a & !q.
pub fn setup_sequential_graph() -> TestSequentialGraph {
    let mut net = Network::new("sequential", NetworkOptions::no_opt());
    let a = net.create_pi("a");
    let q = net.create_register("r", false);
    let o = net.create_xor(q, a);
    let d = net.create_and(a, q.negate());
    net.set_register_input(0, d);
    net.create_po("o", o);
    TestSequentialGraph { net, a, q, o, d }
}

pub struct TestPartitionedGraph {
    pub net: Network,
    pub assignment: HashMap<NodeId, usize>,
    pub i0: Signal,
    pub i1: Signal,
    pub i2: Signal,
    pub i3: Signal,
    pub left: Signal,
    pub right: Signal,
    pub top: Signal,
}

/// Two partitions with one crossing edge:
///
/// partition 0: i0, i1, left = AND(i0, i1), top = AND(left, !right) [output o0]
/// partition 1: i2, i3, right = AND(i2, i3) [output o1]
pub fn setup_partitioned_graph() -> TestPartitionedGraph {
    let mut net = Network::new("partitioned", NetworkOptions::no_opt());
    let i0 = net.create_pi("i0");
    let i1 = net.create_pi("i1");
    let i2 = net.create_pi("i2");
    let i3 = net.create_pi("i3");
    let left = net.create_and(i0, i1);
    let right = net.create_and(i2, i3);
    let top = net.create_and(left, right.negate());
    net.create_po("o0", top);
    net.create_po("o1", right);
    let assignment: HashMap<NodeId, usize> = [
        (i0.node, 0),
        (i1.node, 0),
        (left.node, 0),
        (top.node, 0),
        (i2.node, 1),
        (i3.node, 1),
        (right.node, 1),
    ]
    .into_iter()
    .collect();
    TestPartitionedGraph {
        net,
        assignment,
        i0,
        i1,
        i2,
        i3,
        left,
        right,
        top,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RandomNetworkParams {
    pub inputs: usize,
    pub registers: usize,
    pub gates: usize,
    pub outputs: usize,
    /// Probability that a created gate is a majority gate instead of an AND.
    pub maj_fraction: f64,
}

impl Default for RandomNetworkParams {
    fn default() -> Self {
        Self {
            inputs: 8,
            registers: 0,
            gates: 64,
            outputs: 4,
            maj_fraction: 0.0,
        }
    }
}

/// Builds a seeded random network. Fan-ins are drawn from earlier signals with
/// a bias toward recent ones so the graph gets some depth; outputs and
/// register inputs are taken from the last gates created.
pub fn random_network(seed: u64, params: &RandomNetworkParams) -> Network {
    assert!(params.inputs > 0, "random_network needs at least one input");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut net = Network::new(format!("random_{}", seed), NetworkOptions::opt());
    let mut pool: Vec<Signal> = Vec::new();
    for i in 0..params.inputs {
        pool.push(net.create_pi(format!("i{}", i)));
    }
    for r in 0..params.registers {
        pool.push(net.create_register(format!("r{}", r), rng.gen_bool(0.5)));
    }
    let mut gates: Vec<Signal> = Vec::new();
    for _ in 0..params.gates {
        let pick = |rng: &mut Xoshiro256PlusPlus| {
            let lo = pool.len().saturating_sub(16);
            let index = if rng.gen_bool(0.7) {
                rng.gen_range(lo..pool.len())
            } else {
                rng.gen_range(0..pool.len())
            };
            pool[index].xor_negation(rng.gen_bool(0.5))
        };
        let signal = if rng.gen_bool(params.maj_fraction) {
            let (a, b, c) = (pick(&mut rng), pick(&mut rng), pick(&mut rng));
            net.create_maj(a, b, c)
        } else {
            let (a, b) = (pick(&mut rng), pick(&mut rng));
            net.create_and(a, b)
        };
        if !signal.is_constant() && net.is_gate(signal.node) {
            pool.push(signal);
            gates.push(signal);
        }
    }
    let sources = if gates.is_empty() { &pool } else { &gates };
    for o in 0..params.outputs {
        let signal = sources[sources.len() - 1 - (o % sources.len())];
        net.create_po(format!("o{}", o), signal.xor_negation(rng.gen_bool(0.5)));
    }
    for r in 0..params.registers {
        let signal = sources[rng.gen_range(0..sources.len())];
        net.set_register_input(r, signal);
    }
    net
}

/// Assigns every non-constant node of `net` a uniformly random partition in
/// `0..num_partitions`. Unlike contiguous chunks, partitions produced this way
/// feed each other in both directions.
pub fn random_assignment(
    seed: u64,
    net: &Network,
    num_partitions: usize,
) -> HashMap<NodeId, usize> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    net.node_ids()
        .filter(|n| !net.is_constant(*n))
        .map(|n| (n, rng.gen_range(0..num_partitions)))
        .collect()
}

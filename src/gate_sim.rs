// SPDX-License-Identifier: Apache-2.0

//! Simulation of a `Network` over its combinational inputs.
//!
//! Values are positional: combinational inputs are the primary inputs followed
//! by the register outputs, combinational outputs are the primary outputs
//! followed by the register inputs (see `Network::cis` / `Network::cos`).

use bitvec::vec::BitVec;
use rand::RngCore;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::error::{PartitionError, Result};
use crate::network::{Network, Node, Signal};

pub struct GateSimResult {
    pub outputs: Vec<bool>,
    pub all_values: Option<BitVec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collect {
    None,
    All,
}

pub fn eval(net: &Network, ci_values: &[bool], collect: Collect) -> GateSimResult {
    assert_eq!(
        ci_values.len(),
        net.num_cis(),
        "eval: expected one value per combinational input"
    );
    let mut values: BitVec = BitVec::repeat(false, net.size());
    for (ci, value) in net.cis().iter().zip(ci_values) {
        values.set(ci.id, *value);
    }
    let lookup = |values: &BitVec, s: Signal| values[s.node.id] ^ s.negated;
    for id in net.topo_order() {
        let node = net.node(id);
        if let Some(kind) = node.gate_kind() {
            let fanins: Vec<bool> = node.fanins().iter().map(|f| lookup(&values, *f)).collect();
            let result = kind.eval(&fanins);
            values.set(id.id, result);
        } else if matches!(node, Node::Constant) {
            values.set(id.id, false);
        }
    }
    let outputs = net.cos().iter().map(|s| lookup(&values, *s)).collect();
    GateSimResult {
        outputs,
        all_values: if collect == Collect::All {
            Some(values)
        } else {
            None
        },
    }
}

/// Bit-parallel simulation: bit `j` of every word is an independent input
/// pattern. Returns one word per combinational output.
pub fn eval_words(net: &Network, ci_words: &[u64]) -> Vec<u64> {
    assert_eq!(
        ci_words.len(),
        net.num_cis(),
        "eval_words: expected one word per combinational input"
    );
    let mut values = vec![0u64; net.size()];
    for (ci, word) in net.cis().iter().zip(ci_words) {
        values[ci.id] = *word;
    }
    let lookup = |values: &[u64], s: Signal| {
        if s.negated {
            !values[s.node.id]
        } else {
            values[s.node.id]
        }
    };
    for id in net.topo_order() {
        let node = net.node(id);
        if let Some(kind) = node.gate_kind() {
            let fanins: Vec<u64> = node.fanins().iter().map(|f| lookup(&values, *f)).collect();
            values[id.id] = kind.eval_words(&fanins);
        }
    }
    net.cos().iter().map(|s| lookup(&values, *s)).collect()
}

/// Compares two networks with the same combinational interface on at least
/// `samples` random input vectors (rounded up to a multiple of 64).
pub fn random_equivalence_check(
    lhs: &Network,
    rhs: &Network,
    samples: usize,
    seed: u64,
) -> Result<()> {
    if lhs.num_cis() != rhs.num_cis() || lhs.num_cos() != rhs.num_cos() {
        return Err(PartitionError::InterfaceMismatch {
            expected_inputs: lhs.num_cis(),
            actual_inputs: rhs.num_cis(),
            expected_outputs: lhs.num_cos(),
            actual_outputs: rhs.num_cos(),
        });
    }
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let rounds = samples.div_ceil(64);
    for round in 0..rounds {
        let words: Vec<u64> = (0..lhs.num_cis()).map(|_| rng.next_u64()).collect();
        let lhs_out = eval_words(lhs, &words);
        let rhs_out = eval_words(rhs, &words);
        for (output, (l, r)) in lhs_out.iter().zip(&rhs_out).enumerate() {
            let diff = l ^ r;
            if diff != 0 {
                let sample = round * 64 + diff.trailing_zeros() as usize;
                log::debug!(
                    "random_equivalence_check: {} vs {} differ at output {} (sample {})",
                    lhs.name,
                    rhs.name,
                    output,
                    sample
                );
                return Err(PartitionError::EquivalenceMismatch { output, sample });
            }
        }
    }
    Ok(())
}

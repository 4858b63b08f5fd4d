// SPDX-License-Identifier: Apache-2.0

//! Optimization scripts: `(sub-network) -> sub-network` rewrites run on the
//! networks extracted from partition views.
//!
//! A script must keep the combinational interface of its input (same number
//! of inputs and outputs, same order) and must not mutate it.

use std::collections::HashMap;
use std::fmt::Debug;

use crate::network::{GateKind, Network, NetworkOptions, Node, NodeId, Representation, Signal};

pub trait OptimizationScript: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Representation of the networks this script produces.
    fn representation(&self) -> Representation;

    fn run(&self, net: &Network) -> anyhow::Result<Network>;
}

/// Re-synthesizes a network gate by gate in one representation, with constant
/// folding, structural hashing and dead-node elimination.
#[derive(Debug, Clone)]
pub struct RebuildScript {
    name: String,
    representation: Representation,
}

impl RebuildScript {
    pub fn new(representation: Representation) -> Self {
        Self {
            name: format!("rebuild_{}", representation.to_string().to_lowercase()),
            representation,
        }
    }

    pub fn aig() -> Self {
        Self::new(Representation::Aig)
    }

    pub fn mig() -> Self {
        Self::new(Representation::Mig)
    }
}

impl OptimizationScript for RebuildScript {
    fn name(&self) -> &str {
        &self.name
    }

    fn representation(&self) -> Representation {
        self.representation
    }

    fn run(&self, net: &Network) -> anyhow::Result<Network> {
        Ok(rebuild(net, self.representation))
    }
}

fn lower_gate(
    out: &mut Network,
    kind: GateKind,
    fanins: &[Signal],
    representation: Representation,
) -> Signal {
    match (kind, representation) {
        (GateKind::And2, Representation::Aig) | (GateKind::Maj3, Representation::Mig) => {
            out.create_gate(kind, fanins)
        }
        (GateKind::And2, Representation::Mig) => {
            out.create_maj(fanins[0], fanins[1], Signal::FALSE)
        }
        (GateKind::Maj3, Representation::Aig) => {
            let (a, b, c) = (fanins[0], fanins[1], fanins[2]);
            let ab = out.create_and(a, b);
            let ac = out.create_and(a, c);
            let bc = out.create_and(b, c);
            let ab_or_ac = out.create_or(ab, ac);
            out.create_or(ab_or_ac, bc)
        }
    }
}

/// Rebuilds `net` using only the gate kind of `representation`. Inputs,
/// registers and outputs keep their order and names.
pub fn rebuild(net: &Network, representation: Representation) -> Network {
    let mut out = Network::new(net.name.clone(), NetworkOptions::opt());
    let mut old_to_new: HashMap<NodeId, Signal> = HashMap::new();
    old_to_new.insert(NodeId::CONSTANT, Signal::FALSE);
    for input in net.inputs() {
        let name = match net.node(*input) {
            Node::Input { name } => name.clone(),
            other => unreachable!("primary input {} is {:?}", input, other),
        };
        old_to_new.insert(*input, out.create_pi(name));
    }
    for register in net.registers() {
        old_to_new.insert(
            register.output,
            out.create_register(register.name.clone(), register.init),
        );
    }

    let map = |old_to_new: &HashMap<NodeId, Signal>, s: Signal| -> Signal {
        old_to_new[&s.node].xor_negation(s.negated)
    };
    for node in net.topo_order() {
        let Some(kind) = net.gate_kind(node) else {
            continue;
        };
        let fanins: Vec<Signal> = net
            .fanins(node)
            .into_iter()
            .map(|f| map(&old_to_new, f))
            .collect();
        let lowered = lower_gate(&mut out, kind, &fanins, representation);
        old_to_new.insert(node, lowered);
    }

    for output in net.outputs() {
        out.create_po(output.name.clone(), map(&old_to_new, output.signal));
    }
    for (i, register) in net.registers().iter().enumerate() {
        out.set_register_input(i, map(&old_to_new, register.input));
    }
    let (clean, _) = out.cleanup_dangling();
    log::trace!(
        "rebuild {} as {}: {} -> {} gates",
        net.name,
        representation,
        net.num_gates(),
        clean.num_gates()
    );
    clean
}

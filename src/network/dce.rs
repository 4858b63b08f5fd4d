// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};

use crate::network::gate::{Network, Node, NodeId, Output, Register, Signal};
use crate::network::strash::StructuralHasher;

impl Network {
    /// Dead-node elimination that tolerates any arena ordering.
    ///
    /// Returns a new network holding the constant, every primary input and
    /// register (in their original order) and the gates reachable from some
    /// combinational output, laid out in topological order. The second value
    /// maps each surviving old node to its new id.
    pub fn cleanup_dangling(&self) -> (Network, HashMap<NodeId, NodeId>) {
        let mut reachable: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = self.cos().iter().map(|s| s.node).collect();
        while let Some(current) = stack.pop() {
            if !reachable.insert(current) {
                continue;
            }
            stack.extend(self.nodes[current.id].fanins().iter().map(|f| f.node));
        }

        let mut old_to_new: HashMap<NodeId, NodeId> = HashMap::new();
        let mut new_nodes: Vec<Node> = Vec::with_capacity(reachable.len() + self.num_cis() + 1);
        new_nodes.push(Node::Constant);
        old_to_new.insert(NodeId::CONSTANT, NodeId::CONSTANT);

        let mut new_inputs = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            let new_id = NodeId {
                id: new_nodes.len(),
            };
            new_nodes.push(self.nodes[input.id].clone());
            old_to_new.insert(*input, new_id);
            new_inputs.push(new_id);
        }
        for register in &self.registers {
            old_to_new.insert(
                register.output,
                NodeId {
                    id: new_nodes.len(),
                },
            );
            new_nodes.push(self.nodes[register.output.id].clone());
        }

        let remap = |map: &HashMap<NodeId, NodeId>, signal: Signal| -> Signal {
            let node = *map
                .get(&signal.node)
                .unwrap_or_else(|| panic!("fan-in {} should have been remapped earlier", signal));
            Signal::new(node, signal.negated)
        };

        for id in self.topo_order() {
            if !reachable.contains(&id) || !self.nodes[id.id].is_gate() {
                continue;
            }
            let mut node = self.nodes[id.id].clone();
            for fanin in node.fanins_mut() {
                *fanin = remap(&old_to_new, *fanin);
            }
            old_to_new.insert(
                id,
                NodeId {
                    id: new_nodes.len(),
                },
            );
            new_nodes.push(node);
        }

        let new_outputs = self
            .outputs
            .iter()
            .map(|o| Output {
                name: o.name.clone(),
                signal: remap(&old_to_new, o.signal),
            })
            .collect();
        let new_registers = self
            .registers
            .iter()
            .map(|r| Register {
                name: r.name.clone(),
                output: old_to_new[&r.output],
                input: remap(&old_to_new, r.input),
                init: r.init,
            })
            .collect();

        let mut result = Network {
            name: self.name.clone(),
            nodes: new_nodes,
            inputs: new_inputs,
            outputs: new_outputs,
            registers: new_registers,
            options: self.options,
            strash: StructuralHasher::default(),
        };
        result.rehash();
        result.check_invariants_with_debug_assert();
        log::trace!(
            "cleanup_dangling: {} -> {} nodes",
            self.nodes.len(),
            result.nodes.len()
        );
        (result, old_to_new)
    }
}

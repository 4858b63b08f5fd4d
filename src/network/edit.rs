// SPDX-License-Identifier: Apache-2.0

//! Mutation primitives for `Network`: creating I/O, registers and gates (with
//! optional folding and structural hashing), cloning gates from another
//! network and redirecting all uses of a node.

use crate::network::gate::{GateKind, Network, NetworkOptions, Node, NodeId, Output, Register, Signal};

impl Network {
    pub fn create_pi(&mut self, name: impl Into<String>) -> Signal {
        let id = NodeId {
            id: self.nodes.len(),
        };
        self.nodes.push(Node::Input { name: name.into() });
        self.inputs.push(id);
        id.into()
    }

    /// Adds a register and returns its output signal. The next-state input
    /// starts as constant false; see `set_register_input`.
    pub fn create_register(&mut self, name: impl Into<String>, init: bool) -> Signal {
        let register = self.registers.len();
        let id = NodeId {
            id: self.nodes.len(),
        };
        self.nodes.push(Node::RegisterOutput { register });
        self.registers.push(Register {
            name: name.into(),
            output: id,
            input: Signal::FALSE,
            init,
        });
        id.into()
    }

    pub fn set_register_input(&mut self, register: usize, input: Signal) {
        assert!(
            register < self.registers.len(),
            "register index {} out of range (num_registers = {})",
            register,
            self.registers.len()
        );
        self.validate_ref(input.node);
        self.registers[register].input = input;
    }

    /// Adds a primary output and returns its position.
    pub fn create_po(&mut self, name: impl Into<String>, signal: Signal) -> usize {
        self.validate_ref(signal.node);
        self.outputs.push(Output {
            name: name.into(),
            signal,
        });
        self.outputs.len() - 1
    }

    pub fn create_not(&self, signal: Signal) -> Signal {
        signal.negate()
    }

    pub fn create_and(&mut self, a: Signal, b: Signal) -> Signal {
        if self.options.fold {
            if a == Signal::FALSE || b == Signal::FALSE {
                return Signal::FALSE;
            }
            if a == Signal::TRUE {
                return b;
            }
            if b == Signal::TRUE {
                return a;
            }
            if a == b {
                return a;
            }
            if a == b.negate() {
                return Signal::FALSE;
            }
        }
        self.add_gate_node(Node::And2 { a, b })
    }

    pub fn create_or(&mut self, a: Signal, b: Signal) -> Signal {
        self.create_and(a.negate(), b.negate()).negate()
    }

    pub fn create_xor(&mut self, a: Signal, b: Signal) -> Signal {
        let lhs = self.create_and(a, b.negate());
        let rhs = self.create_and(a.negate(), b);
        self.create_or(lhs, rhs)
    }

    pub fn create_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        if self.options.fold {
            if a == b || a == c {
                return a;
            }
            if b == c {
                return b;
            }
            // A complementary pair cancels out and the third operand decides.
            if a == b.negate() {
                return c;
            }
            if a == c.negate() {
                return b;
            }
            if b == c.negate() {
                return a;
            }
        }
        self.add_gate_node(Node::Maj3 { a, b, c })
    }

    pub fn create_gate(&mut self, kind: GateKind, fanins: &[Signal]) -> Signal {
        assert_eq!(
            fanins.len(),
            kind.arity(),
            "create_gate: {:?} needs {} fan-ins; got {}",
            kind,
            kind.arity(),
            fanins.len()
        );
        match kind {
            GateKind::And2 => self.create_and(fanins[0], fanins[1]),
            GateKind::Maj3 => self.create_maj(fanins[0], fanins[1], fanins[2]),
        }
    }

    /// Creates a gate of the same kind as `node` in `source`, fed by
    /// `children` (signals of this network).
    pub fn clone_node(&mut self, source: &Network, node: NodeId, children: &[Signal]) -> Signal {
        let kind = source.gate_kind(node).unwrap_or_else(|| {
            panic!(
                "clone_node: {} in {} is not a gate: {:?}",
                node,
                source.name,
                source.node(node)
            )
        });
        for child in children {
            self.validate_ref(child.node);
        }
        self.create_gate(kind, children)
    }

    fn add_gate_node(&mut self, node: Node) -> Signal {
        for fanin in node.fanins() {
            self.validate_ref(fanin.node);
        }
        if self.options.hash {
            if let Some(existing) = self.strash.lookup(&node) {
                return existing.into();
            }
        }
        let id = NodeId {
            id: self.nodes.len(),
        };
        if self.options.hash {
            self.strash.insert(&node, id);
        }
        self.nodes.push(node);
        id.into()
    }

    /// Redirects every use of `old` (gate fan-ins, primary outputs and register
    /// inputs) to `replacement`, composing inversion bits. The node itself is
    /// left in place; dead-node elimination reclaims it.
    pub fn substitute_node(&mut self, old: NodeId, replacement: Signal) {
        self.validate_ref(old);
        self.validate_ref(replacement.node);
        if replacement.node == old {
            assert!(
                !replacement.negated,
                "substitute_node: cannot replace {} with its own complement",
                old
            );
            return;
        }
        log::trace!("substitute_node: {} -> {}", old, replacement);
        let redirect = |signal: &mut Signal| {
            if signal.node == old {
                *signal = replacement.xor_negation(signal.negated);
            }
        };
        for node in self.nodes.iter_mut() {
            for fanin in node.fanins_mut() {
                redirect(fanin);
            }
        }
        for output in self.outputs.iter_mut() {
            redirect(&mut output.signal);
        }
        for register in self.registers.iter_mut() {
            redirect(&mut register.input);
        }
        self.rehash();
    }

    pub fn set_options(&mut self, options: NetworkOptions) {
        self.options = options;
        self.rehash();
    }

    /// Rebuilds the structural hash table after edits or deserialization.
    pub fn rehash(&mut self) {
        if self.options.hash {
            self.strash.rebuild(&self.nodes);
        } else {
            self.strash.clear();
        }
    }
}

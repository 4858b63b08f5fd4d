// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::network::strash::StructuralHasher;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId {
    pub id: usize,
}

impl NodeId {
    /// Node 0 of every network is the constant-false node.
    pub const CONSTANT: NodeId = NodeId { id: 0 };
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.id)
    }
}

/// A reference to a node plus an inversion bit.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Signal {
    pub node: NodeId,
    pub negated: bool,
}

impl Signal {
    pub const FALSE: Signal = Signal {
        node: NodeId::CONSTANT,
        negated: false,
    };
    pub const TRUE: Signal = Signal {
        node: NodeId::CONSTANT,
        negated: true,
    };

    pub fn new(node: NodeId, negated: bool) -> Self {
        Self { node, negated }
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            node: self.node,
            negated: !self.negated,
        }
    }

    /// Composes an additional inversion onto this signal.
    #[must_use]
    pub fn xor_negation(&self, negated: bool) -> Self {
        Self {
            node: self.node,
            negated: self.negated ^ negated,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.node == NodeId::CONSTANT
    }
}

impl From<NodeId> for Signal {
    fn from(node: NodeId) -> Self {
        Signal {
            node,
            negated: false,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "not({})", self.node)
        } else {
            write!(f, "{}", self.node)
        }
    }
}

/// Boolean operator carried by a gate node.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum GateKind {
    And2,
    Maj3,
}

impl GateKind {
    pub fn arity(self) -> usize {
        match self {
            GateKind::And2 => 2,
            GateKind::Maj3 => 3,
        }
    }

    pub fn eval(self, values: &[bool]) -> bool {
        debug_assert_eq!(values.len(), self.arity());
        match self {
            GateKind::And2 => values[0] && values[1],
            GateKind::Maj3 => {
                (values[0] && values[1]) || (values[0] && values[2]) || (values[1] && values[2])
            }
        }
    }

    /// Bit-parallel evaluation over 64 input patterns at once.
    pub fn eval_words(self, words: &[u64]) -> u64 {
        debug_assert_eq!(words.len(), self.arity());
        match self {
            GateKind::And2 => words[0] & words[1],
            GateKind::Maj3 => (words[0] & words[1]) | (words[0] & words[2]) | (words[1] & words[2]),
        }
    }
}

/// Gate families a network (or an optimization result) is built from.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Representation {
    Aig,
    Mig,
}

impl Representation {
    pub fn gate_kind(self) -> GateKind {
        match self {
            Representation::Aig => GateKind::And2,
            Representation::Mig => GateKind::Maj3,
        }
    }
}

impl std::fmt::Display for Representation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Representation::Aig => write!(f, "AIG"),
            Representation::Mig => write!(f, "MIG"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Constant,
    Input {
        name: String,
    },
    /// Combinational input driven by the state of register `register`.
    RegisterOutput {
        register: usize,
    },
    And2 {
        a: Signal,
        b: Signal,
    },
    Maj3 {
        a: Signal,
        b: Signal,
        c: Signal,
    },
}

impl Node {
    pub fn fanins(&self) -> Vec<Signal> {
        match self {
            Node::Constant | Node::Input { .. } | Node::RegisterOutput { .. } => vec![],
            Node::And2 { a, b } => vec![*a, *b],
            Node::Maj3 { a, b, c } => vec![*a, *b, *c],
        }
    }

    pub(crate) fn fanins_mut(&mut self) -> Vec<&mut Signal> {
        match self {
            Node::Constant | Node::Input { .. } | Node::RegisterOutput { .. } => vec![],
            Node::And2 { a, b } => vec![a, b],
            Node::Maj3 { a, b, c } => vec![a, b, c],
        }
    }

    pub fn gate_kind(&self) -> Option<GateKind> {
        match self {
            Node::And2 { .. } => Some(GateKind::And2),
            Node::Maj3 { .. } => Some(GateKind::Maj3),
            _ => None,
        }
    }

    pub fn is_gate(&self) -> bool {
        self.gate_kind().is_some()
    }

    /// Builds a gate node of `kind` over `fanins`.
    pub fn gate(kind: GateKind, fanins: &[Signal]) -> Node {
        assert_eq!(
            fanins.len(),
            kind.arity(),
            "{:?} gate needs {} fan-ins; got {}",
            kind,
            kind.arity(),
            fanins.len()
        );
        match kind {
            GateKind::And2 => Node::And2 {
                a: fanins[0],
                b: fanins[1],
            },
            GateKind::Maj3 => Node::Maj3 {
                a: fanins[0],
                b: fanins[1],
                c: fanins[2],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub signal: Signal,
}

/// A state element: `output` is the register-output node (a combinational
/// input), `input` is the next-state signal (a combinational output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    pub output: NodeId,
    pub input: Signal,
    pub init: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOptions {
    pub fold: bool,
    pub hash: bool,
}

impl NetworkOptions {
    /// Folding and structural hashing enabled.
    pub fn opt() -> Self {
        Self {
            fold: true,
            hash: true,
        }
    }

    pub fn no_opt() -> Self {
        Self {
            fold: false,
            hash: false,
        }
    }
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self::opt()
    }
}

/// Arena-backed logic network of two-input AND and three-input majority gates
/// with complemented edges, primary I/O and registers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) inputs: Vec<NodeId>,
    pub(crate) outputs: Vec<Output>,
    pub(crate) registers: Vec<Register>,
    pub(crate) options: NetworkOptions,
    #[serde(skip)]
    pub(crate) strash: StructuralHasher,
}

impl Network {
    pub fn new(name: impl Into<String>, options: NetworkOptions) -> Self {
        Self {
            name: name.into(),
            nodes: vec![Node::Constant],
            inputs: Vec::new(),
            outputs: Vec::new(),
            registers: Vec::new(),
            options,
            strash: StructuralHasher::default(),
        }
    }

    pub fn options(&self) -> NetworkOptions {
        self.options
    }

    /// Number of nodes in the arena, including the constant.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_pis(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_pos(&self) -> usize {
        self.outputs.len()
    }

    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    /// Combinational inputs: primary inputs followed by register outputs.
    pub fn num_cis(&self) -> usize {
        self.inputs.len() + self.registers.len()
    }

    /// Combinational outputs: primary outputs followed by register inputs.
    pub fn num_cos(&self) -> usize {
        self.outputs.len() + self.registers.len()
    }

    pub fn num_gates(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_gate()).count()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.validate_ref(id);
        &self.nodes[id.id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|id| NodeId { id })
    }

    pub fn gate_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(move |n| self.nodes[n.id].is_gate())
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Combinational inputs in positional order.
    pub fn cis(&self) -> Vec<NodeId> {
        let mut result = self.inputs.clone();
        result.extend(self.registers.iter().map(|r| r.output));
        result
    }

    /// Combinational outputs in positional order.
    pub fn cos(&self) -> Vec<Signal> {
        let mut result: Vec<Signal> = self.outputs.iter().map(|o| o.signal).collect();
        result.extend(self.registers.iter().map(|r| r.input));
        result
    }

    pub fn is_constant(&self, id: NodeId) -> bool {
        matches!(self.node(id), Node::Constant)
    }

    pub fn is_pi(&self, id: NodeId) -> bool {
        matches!(self.node(id), Node::Input { .. })
    }

    pub fn is_ro(&self, id: NodeId) -> bool {
        matches!(self.node(id), Node::RegisterOutput { .. })
    }

    pub fn is_ci(&self, id: NodeId) -> bool {
        self.is_pi(id) || self.is_ro(id)
    }

    pub fn is_gate(&self, id: NodeId) -> bool {
        self.node(id).is_gate()
    }

    /// Whether some primary output refers to `id`.
    pub fn is_po(&self, id: NodeId) -> bool {
        self.outputs.iter().any(|o| o.signal.node == id)
    }

    /// Whether some register's next-state input refers to `id`.
    pub fn is_ri(&self, id: NodeId) -> bool {
        self.registers.iter().any(|r| r.input.node == id)
    }

    pub fn is_co(&self, id: NodeId) -> bool {
        self.is_po(id) || self.is_ri(id)
    }

    pub fn po_nodes(&self) -> HashSet<NodeId> {
        self.outputs.iter().map(|o| o.signal.node).collect()
    }

    pub fn ri_nodes(&self) -> HashSet<NodeId> {
        self.registers.iter().map(|r| r.input.node).collect()
    }

    /// The first primary output signal that refers to `id`, if any.
    pub fn po_signal_for(&self, id: NodeId) -> Option<Signal> {
        self.outputs
            .iter()
            .map(|o| o.signal)
            .find(|s| s.node == id)
    }

    pub fn fanins(&self, id: NodeId) -> Vec<Signal> {
        self.node(id).fanins()
    }

    pub fn gate_kind(&self, id: NodeId) -> Option<GateKind> {
        self.node(id).gate_kind()
    }

    pub fn make_signal(&self, id: NodeId) -> Signal {
        self.validate_ref(id);
        Signal::from(id)
    }

    /// Returns the gate family the network is built from, or `None` when it
    /// mixes AND and majority gates.
    pub fn representation(&self) -> Option<Representation> {
        let has_and = self.nodes.iter().any(|n| matches!(n, Node::And2 { .. }));
        let has_maj = self.nodes.iter().any(|n| matches!(n, Node::Maj3 { .. }));
        match (has_and, has_maj) {
            (_, false) => Some(Representation::Aig),
            (false, true) => Some(Representation::Mig),
            (true, true) => None,
        }
    }

    /// Checks that the given NodeId is in-bounds for this network.
    pub fn validate_ref(&self, id: NodeId) {
        assert!(
            id.id < self.nodes.len(),
            "NodeId out of bounds: {:?} (nodes.len() = {})",
            id,
            self.nodes.len()
        );
    }

    /// Checks internal invariants, panicking if any are violated. Only active
    /// in debug-assert builds.
    pub fn check_invariants_with_debug_assert(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        let count = self.nodes.len();
        assert!(
            matches!(self.nodes.first(), Some(Node::Constant)),
            "node 0 must be the constant"
        );
        for (i, node) in self.nodes.iter().enumerate() {
            for fanin in node.fanins() {
                assert!(
                    fanin.node.id < count,
                    "Gate %{}: fan-in {:?} out of bounds (nodes.len() = {})",
                    i,
                    fanin.node,
                    count
                );
            }
            if let Node::RegisterOutput { register } = node {
                assert_eq!(
                    self.registers[*register].output.id, i,
                    "register {} does not point back at its output node %{}",
                    register, i
                );
            }
        }
        for output in &self.outputs {
            assert!(
                output.signal.node.id < count,
                "Output {} refers to out-of-bounds node {:?}",
                output.name,
                output.signal.node
            );
        }
        for register in &self.registers {
            assert!(
                register.input.node.id < count,
                "Register {} input refers to out-of-bounds node {:?}",
                register.name,
                register.input.node
            );
        }
    }

    pub fn to_string(&self) -> String {
        let mut s = String::new();
        let input_names = self
            .inputs
            .iter()
            .map(|id| match self.node(*id) {
                Node::Input { name } => name.clone(),
                _ => id.to_string(),
            })
            .collect::<Vec<String>>()
            .join(", ");
        s.push_str(&format!("network {}({}) {{\n", self.name, input_names));
        for register in &self.registers {
            s.push_str(&format!(
                "  {} = reg({}, init={})\n",
                register.output, register.name, register.init
            ));
        }
        for id in self.topo_order() {
            match self.node(id) {
                Node::And2 { a, b } => s.push_str(&format!("  {} = and({}, {})\n", id, a, b)),
                Node::Maj3 { a, b, c } => {
                    s.push_str(&format!("  {} = maj({}, {}, {})\n", id, a, b, c))
                }
                _ => {}
            }
        }
        for register in &self.registers {
            s.push_str(&format!("  {}.next = {}\n", register.name, register.input));
        }
        for output in &self.outputs {
            s.push_str(&format!("  {} = {}\n", output.name, output.signal));
        }
        s.push('}');
        s
    }
}

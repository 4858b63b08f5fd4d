// SPDX-License-Identifier: Apache-2.0

//! The circuit graph: an arena of AND / majority gates with complemented
//! edges, primary I/O and registers.

mod dce;
mod edit;
pub mod gate;
pub mod strash;
pub mod topo;

pub use gate::{
    GateKind, Network, NetworkOptions, Node, NodeId, Output, Register, Representation, Signal,
};

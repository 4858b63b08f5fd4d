// SPDX-License-Identifier: Apache-2.0

pub mod error;
pub mod flow;
pub mod gate_sim;
pub mod hypergraph;
pub mod network;
pub mod options;
pub mod partition;
pub mod scripts;
pub mod test_utils;
pub mod truth_table;

pub use error::{PartitionError, Result};
pub use network::{Network, NetworkOptions, NodeId, Representation, Signal};
pub use options::FlowOptions;
pub use partition::{PartitionId, PartitionLedger, PartitionView};

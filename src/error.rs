// SPDX-License-Identifier: Apache-2.0

use crate::network::NodeId;

/// Errors surfaced by partitioning, view construction, synchronization and the
/// optimization flows built on top of them.
#[derive(Debug)]
pub enum PartitionError {
    /// A non-constant node has no partition recorded for it.
    UnassignedNode { node: NodeId },
    /// A partition assignment names a partition outside `[0, num_partitions)`.
    PartitionIdOutOfRange {
        node: NodeId,
        partition: usize,
        num_partitions: usize,
    },
    /// The partitioner answered with a vector that does not cover every
    /// vertex.
    AssignmentLength { expected: usize, actual: usize },
    Partitioner(String),
    /// View traversal reached a combinational input that was not declared as
    /// a leaf of the view.
    UndeclaredLeaf { node: NodeId },
    /// An optimized sub-network does not have the interface of the view it
    /// was produced from.
    InterfaceMismatch {
        expected_inputs: usize,
        actual_inputs: usize,
        expected_outputs: usize,
        actual_outputs: usize,
    },
    Script { name: String, message: String },
    Classifier(String),
    /// Random simulation found a combinational output whose value differs
    /// between two networks.
    EquivalenceMismatch { output: usize, sample: usize },
    Io(std::io::Error),
    Serialization(String),
}

impl std::fmt::Display for PartitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionError::UnassignedNode { node } => {
                write!(f, "node {} has no partition assigned", node)
            }
            PartitionError::PartitionIdOutOfRange {
                node,
                partition,
                num_partitions,
            } => write!(
                f,
                "node {} is assigned to partition {} but only {} partitions exist",
                node, partition, num_partitions
            ),
            PartitionError::AssignmentLength { expected, actual } => write!(
                f,
                "partitioner returned {} assignments; expected one per vertex ({})",
                actual, expected
            ),
            PartitionError::Partitioner(msg) => write!(f, "hypergraph partitioner failed: {}", msg),
            PartitionError::UndeclaredLeaf { node } => write!(
                f,
                "view traversal reached combinational input {} which is not a declared leaf",
                node
            ),
            PartitionError::InterfaceMismatch {
                expected_inputs,
                actual_inputs,
                expected_outputs,
                actual_outputs,
            } => write!(
                f,
                "optimized sub-network has {} inputs / {} outputs; view has {} inputs / {} outputs",
                actual_inputs, actual_outputs, expected_inputs, expected_outputs
            ),
            PartitionError::Script { name, message } => {
                write!(f, "optimization script '{}' failed: {}", name, message)
            }
            PartitionError::Classifier(msg) => write!(f, "classifier failed: {}", msg),
            PartitionError::EquivalenceMismatch { output, sample } => write!(
                f,
                "patched network differs from the original at combinational output {} (sample {})",
                output, sample
            ),
            PartitionError::Io(e) => write!(f, "i/o error: {}", e),
            PartitionError::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for PartitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PartitionError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PartitionError {
    fn from(e: std::io::Error) -> Self {
        PartitionError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, PartitionError>;

// SPDX-License-Identifier: Apache-2.0

//! Hypergraph view of a network for an external partitioner.
//!
//! Every gate contributes one hyperedge holding the gate itself followed by
//! its non-constant fan-in nodes. Vertex ids are node indices, so the vertex
//! count is the network size (the constant is a vertex that no edge touches).

use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hypergraph {
    pub num_vertices: usize,
    /// CSR offsets into `hyperedge_vertices`; `num_hyperedges() + 1` entries.
    pub hyperedge_offsets: Vec<usize>,
    pub hyperedge_vertices: Vec<u32>,
}

impl Hypergraph {
    pub fn from_network(net: &Network) -> Self {
        let mut hyperedge_offsets = vec![0usize];
        let mut hyperedge_vertices: Vec<u32> = Vec::new();
        for gate in net.gate_ids() {
            let start = hyperedge_vertices.len();
            hyperedge_vertices.push(gate.id as u32);
            for fanin in net.fanins(gate) {
                if fanin.is_constant() {
                    continue;
                }
                let vertex = fanin.node.id as u32;
                // Pins are unique within an edge.
                if !hyperedge_vertices[start..].contains(&vertex) {
                    hyperedge_vertices.push(vertex);
                }
            }
            hyperedge_offsets.push(hyperedge_vertices.len());
        }
        log::debug!(
            "hypergraph for {}: {} vertices, {} hyperedges",
            net.name,
            net.size(),
            hyperedge_offsets.len() - 1
        );
        Self {
            num_vertices: net.size(),
            hyperedge_offsets,
            hyperedge_vertices,
        }
    }

    pub fn num_hyperedges(&self) -> usize {
        self.hyperedge_offsets.len() - 1
    }

    pub fn hyperedge(&self, index: usize) -> &[u32] {
        &self.hyperedge_vertices[self.hyperedge_offsets[index]..self.hyperedge_offsets[index + 1]]
    }

    pub fn hyperedges(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.num_hyperedges()).map(|i| self.hyperedge(i))
    }
}

/// One blocking call to a hypergraph partitioner.
#[derive(Debug, Clone, Copy)]
pub struct PartitionRequest<'a> {
    pub hypergraph: &'a Hypergraph,
    /// Allowed imbalance between partition weights (0.5 = 50%).
    pub imbalance: f64,
    pub num_partitions: usize,
}

/// A partitioner answers with one partition id per vertex.
pub trait HypergraphPartitioner: Sync {
    fn partition(&self, request: &PartitionRequest<'_>) -> anyhow::Result<Vec<usize>>;
}

/// Splits the vertex range into `num_partitions` contiguous chunks of
/// (nearly) equal size. Node ids follow creation order, so chunks follow the
/// network's construction order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkPartitioner;

impl HypergraphPartitioner for ChunkPartitioner {
    fn partition(&self, request: &PartitionRequest<'_>) -> anyhow::Result<Vec<usize>> {
        anyhow::ensure!(
            request.num_partitions > 0,
            "cannot split into zero partitions"
        );
        let n = request.hypergraph.num_vertices;
        let k = request.num_partitions;
        Ok((0..n).map(|v| v * k / n.max(1)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{NetworkOptions, Signal};
    use crate::test_utils::{setup_majority_graph, setup_simple_graph};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_graph_hyperedges() {
        let g = setup_simple_graph();
        let hg = Hypergraph::from_network(&g.net);
        assert_eq!(hg.num_vertices, 6);
        assert_eq!(hg.num_hyperedges(), 2);
        assert_eq!(hg.hyperedge(0), &[4, 1, 2]);
        assert_eq!(hg.hyperedge(1), &[5, 4, 3]);
        assert_eq!(hg.hyperedge_offsets, vec![0, 3, 6]);
    }

    #[test]
    fn test_majority_edge_has_three_fanins() {
        let g = setup_majority_graph();
        let hg = Hypergraph::from_network(&g.net);
        let edges: Vec<&[u32]> = hg.hyperedges().collect();
        assert_eq!(edges, vec![&[4u32, 1, 2, 3][..]]);
    }

    #[test]
    fn test_constants_are_not_pins() {
        let mut net = Network::new("const", NetworkOptions::no_opt());
        let a = net.create_pi("a");
        let g = net.create_maj(a, Signal::FALSE, a.negate());
        net.create_po("o", g);
        let hg = Hypergraph::from_network(&net);
        assert_eq!(hg.hyperedge(0), &[2, 1]);
    }

    #[test]
    fn test_empty_network() {
        let net = Network::new("empty", NetworkOptions::opt());
        let hg = Hypergraph::from_network(&net);
        assert_eq!(hg.num_hyperedges(), 0);
        assert_eq!(hg.hyperedge_offsets, vec![0]);
        assert_eq!(hg.num_vertices, 1);
    }

    #[test]
    fn test_chunk_partitioner_is_balanced() {
        let g = setup_simple_graph();
        let hg = Hypergraph::from_network(&g.net);
        let parts = ChunkPartitioner
            .partition(&PartitionRequest {
                hypergraph: &hg,
                imbalance: 0.5,
                num_partitions: 2,
            })
            .unwrap();
        assert_eq!(parts, vec![0, 0, 0, 1, 1, 1]);
        assert!(
            ChunkPartitioner
                .partition(&PartitionRequest {
                    hypergraph: &hg,
                    imbalance: 0.5,
                    num_partitions: 0,
                })
                .is_err()
        );
    }
}

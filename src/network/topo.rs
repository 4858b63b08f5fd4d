// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashSet, VecDeque};

use crate::network::gate::{Network, Node, NodeId};

/// Returns a postorder traversal of the nodes reachable from `starts`, never
/// expanding (or emitting) nodes in `boundary`.
pub fn postorder_for_nodes(
    starts: &[NodeId],
    nodes: &[Node],
    boundary: &HashSet<NodeId>,
) -> Vec<NodeId> {
    let mut worklist: Vec<NodeId> = starts.iter().rev().copied().collect();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut postorder = Vec::new();
    while let Some(current) = worklist.pop() {
        if boundary.contains(&current) || visited.contains(&current) {
            continue;
        }
        debug_assert!(
            current.id < nodes.len(),
            "postorder_for_nodes: node index out of bounds: {} (nodes.len() = {})",
            current.id,
            nodes.len()
        );
        let mut all_deps_visited = true;
        for dep in nodes[current.id].fanins() {
            if !boundary.contains(&dep.node) && !visited.contains(&dep.node) {
                worklist.push(current); // Revisit after dependencies
                worklist.push(dep.node);
                all_deps_visited = false;
                break;
            }
        }
        if all_deps_visited {
            visited.insert(current);
            postorder.push(current);
        }
    }
    postorder
}

/// Returns (topological order, None) if acyclic, or (partial order,
/// Some(not_visited_nodes)) if a cycle is detected.
pub fn topo_order_and_cycle_check(nodes: &[Node]) -> (Vec<NodeId>, Option<Vec<usize>>) {
    let node_count = nodes.len();
    let mut indegree = vec![0usize; node_count];
    let mut parents: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (i, node) in nodes.iter().enumerate() {
        for fanin in node.fanins() {
            indegree[i] += 1;
            parents[fanin.node.id].push(i);
        }
    }
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&i| indegree[i] == 0).collect();
    let mut topo: Vec<NodeId> = Vec::with_capacity(node_count);
    while let Some(node_id) = queue.pop_front() {
        topo.push(NodeId { id: node_id });
        for &parent in &parents[node_id] {
            indegree[parent] -= 1;
            if indegree[parent] == 0 {
                queue.push_back(parent);
            }
        }
    }
    if topo.len() != node_count {
        let seen: HashSet<usize> = topo.iter().map(|n| n.id).collect();
        let not_visited: Vec<usize> = (0..node_count).filter(|id| !seen.contains(id)).collect();
        (topo, Some(not_visited))
    } else {
        (topo, None)
    }
}

/// Panics (in debug builds) if the node arena contains a cycle.
pub fn debug_assert_no_cycles(nodes: &[Node], context: &str) {
    if cfg!(debug_assertions) {
        let (_, cycle) = topo_order_and_cycle_check(nodes);
        assert!(
            cycle.is_none(),
            "{}: cycle detected among nodes {:?}",
            context,
            cycle.unwrap_or_default()
        );
    }
}

impl Network {
    /// All nodes in a topological order. Substitution may leave the arena out
    /// of index order, so this does not assume `fanin.id < node.id`.
    pub fn topo_order(&self) -> Vec<NodeId> {
        let (order, cycle) = topo_order_and_cycle_check(&self.nodes);
        assert!(
            cycle.is_none(),
            "network {} contains a combinational cycle through {:?}",
            self.name,
            cycle
        );
        order
    }

    /// Per-node logic level: combinational inputs and the constant sit at
    /// level 0, every gate one above its deepest fan-in.
    pub fn levels(&self) -> Vec<usize> {
        let mut levels = vec![0usize; self.nodes.len()];
        for id in self.topo_order() {
            let node = &self.nodes[id.id];
            if node.is_gate() {
                levels[id.id] = node
                    .fanins()
                    .iter()
                    .map(|f| levels[f.node.id])
                    .max()
                    .unwrap_or(0)
                    + 1;
            }
        }
        levels
    }

    /// Longest gate path from any combinational input to any combinational
    /// output.
    pub fn depth(&self) -> usize {
        let levels = self.levels();
        self.cos()
            .iter()
            .map(|s| levels[s.node.id])
            .max()
            .unwrap_or(0)
    }
}

//! Template-partial dependency graph.
//!
//! Nodes are template paths, edges are "includes" relations collected from
//! the partial references at every nesting level of the parsed templates. The
//! graph is an index over identifiers only; template content is never read.
//!
//! Cycle detection is a depth-first search driven by an explicit stack, so
//! inclusion chains of any depth are handled without growing the call stack.

use crate::bundler::{Error, Result, collaborators::TemplateSet};
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};
use std::collections::{HashMap, HashSet};

/// Visit state of a node during cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Node has not been visited.
    Unvisited,
    /// Node is on the current DFS path.
    InProgress,
    /// Node and everything reachable from it has been visited.
    Finished,
}

/// Directed graph of template inclusion.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph for a set of parsed templates.
    ///
    /// Every template becomes a node. For each partial reference found at any
    /// depth, an edge is added from the template holding the reference to the
    /// referenced path.
    pub fn from_templates(templates: &TemplateSet) -> Self {
        let mut graph = Self::new();
        // A template's partial list is the same wherever it is expanded
        let mut seen = HashSet::new();

        for (path, template) in templates {
            graph.ensure_node(path);
            template.walk_pruned(|node| {
                if !seen.insert(node.path.as_str()) {
                    return false;
                }
                for partial in &node.partials {
                    graph.add_dependency(&node.path, &partial.name);
                }
                true
            });
        }

        graph
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Records that `from` includes `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    /// Number of templates in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct inclusion edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if `from` directly includes `to`.
    pub fn includes(&self, from: &str, to: &str) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Outgoing neighbours of `node`, sorted by template path.
    fn sorted_neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        neighbors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        neighbors
    }

    /// Finds a cycle, if any.
    ///
    /// Roots and neighbours are visited in lexical order, so the reported
    /// cycle is deterministic. The returned path starts at the node the cycle
    /// closes on and lists every node up to the one that closes it.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];

        let mut roots: Vec<NodeIndex> = self.graph.node_indices().collect();
        roots.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        // Each frame: node and the index of the next neighbour to explore
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

        for root in roots {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }

            marks[root.index()] = Mark::InProgress;
            stack.push((root, self.sorted_neighbors(root), 0));

            while let Some((node, neighbors, next)) = stack.last_mut() {
                let Some(&neighbor) = neighbors.get(*next) else {
                    marks[node.index()] = Mark::Finished;
                    stack.pop();
                    continue;
                };
                *next += 1;

                match marks[neighbor.index()] {
                    Mark::InProgress => {
                        let start = stack
                            .iter()
                            .position(|(n, _, _)| *n == neighbor)
                            .unwrap_or(0);
                        return Some(
                            stack[start..]
                                .iter()
                                .map(|(n, _, _)| self.graph[*n].clone())
                                .collect(),
                        );
                    }
                    Mark::Unvisited => {
                        marks[neighbor.index()] = Mark::InProgress;
                        let neighbors = self.sorted_neighbors(neighbor);
                        stack.push((neighbor, neighbors, 0));
                    }
                    Mark::Finished => {}
                }
            }
        }

        None
    }

    /// Fails with [`Error::CycleDetected`] if any template includes itself,
    /// directly or transitively.
    pub fn detect_cycles(&self) -> Result<()> {
        match self.find_cycle() {
            Some(cycle) => Err(Error::CycleDetected { cycle }),
            None => Ok(()),
        }
    }
}

/// Builds the inclusion graph for `templates` and checks it for cycles.
pub fn check_circular_dependencies(templates: &TemplateSet) -> Result<()> {
    let graph = DependencyGraph::from_templates(templates);
    log::debug!(
        "Template dependency graph: {} node(s), {} edge(s)",
        graph.node_count(),
        graph.edge_count()
    );
    graph.detect_cycles()
}

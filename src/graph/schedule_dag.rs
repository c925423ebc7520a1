use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};
use tracing::warn;

use crate::dependency::Dependency;
use crate::task::{TaskId, TaskSet};

/// The automatic-dependency subgraph over a task set.
///
/// Every task is a node, added in insertion order, so tasks without automatic
/// links sit at indegree 0. Only automatic edges (ASAP and not hard) whose
/// endpoints both exist are added.
pub struct ScheduleDag<'a> {
    pub graph: DiGraph<TaskId, &'a Dependency>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl<'a> ScheduleDag<'a> {
    pub fn build(tasks: &TaskSet, dependencies: &'a [Dependency]) -> Self {
        let mut graph: DiGraph<TaskId, &'a Dependency> = DiGraph::new();
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::with_capacity(tasks.len());

        for task in tasks {
            let node_ix = graph.add_node(task.id.clone());
            id_to_index.insert(task.id.clone(), node_ix);
        }

        // Edges: predecessor -> successor
        for dependency in dependencies.iter().filter(|dep| dep.is_automatic()) {
            match (id_to_index.get(&dependency.from), id_to_index.get(&dependency.to)) {
                (Some(&u), Some(&v)) => {
                    graph.add_edge(u, v, dependency);
                }
                _ => warn!(
                    dependency = %dependency.id,
                    from = %dependency.from,
                    to = %dependency.to,
                    "skipping dependency with unknown endpoint"
                ),
            }
        }

        Self { graph, id_to_index }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn task_id(&self, node_ix: NodeIndex) -> &TaskId {
        &self.graph[node_ix]
    }

    /// Incoming automatic edges of a node as `(predecessor, dependency)` pairs.
    pub fn incoming(&self, node_ix: NodeIndex) -> impl Iterator<Item = (&TaskId, &'a Dependency)> + '_ {
        self.graph
            .edges_directed(node_ix, Direction::Incoming)
            .map(|edge| (&self.graph[edge.source()], *edge.weight()))
    }

    /// Kahn's algorithm. Ready nodes are taken in insertion order, so
    /// independent tasks keep the order they were supplied in.
    ///
    /// Returns `None` when the automatic subgraph contains a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeIndex>> {
        let node_count = self.graph.node_count();
        let mut in_degree: Vec<usize> = vec![0; node_count];
        for edge in self.graph.edge_references() {
            in_degree[edge.target().index()] += 1;
        }

        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node_ix| in_degree[node_ix.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(node_count);

        while let Some(node_ix) = queue.pop_front() {
            order.push(node_ix);
            for edge in self.graph.edges_directed(node_ix, Direction::Outgoing) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    queue.push_back(target);
                }
            }
        }

        if order.len() < node_count {
            None
        } else {
            Some(order)
        }
    }

    /// Tasks that sit on a cycle: members of a strongly connected component
    /// with more than one node, or with a self-loop.
    pub fn cycle_members(&self) -> Vec<TaskId> {
        let mut members: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node_ix| self.graph.contains_edge(node_ix, node_ix))
            })
            .flatten()
            .collect();
        members.sort();
        members
            .into_iter()
            .map(|node_ix| self.graph[node_ix].clone())
            .collect()
    }
}

use std::collections::VecDeque;

use rand::Rng;
use rand_distr::{Bernoulli, Distribution, WeightedIndex};

use crate::generator::GraphSummary;

/// Candidate request graph of a single trial.
///
/// Nodes are numbered in creation order, and every node but the root hangs
/// off an earlier node, so `parent[v] < v`. The tree edge `parent[v] - v` is
/// identified by its child `v`. Chords are the cycle-closing edges.
#[derive(Debug, Clone)]
pub(crate) struct CactusGraph {
    parent: Vec<Option<usize>>,
    depth: Vec<usize>,
    on_cycle: Vec<bool>,
    chords: Vec<(usize, usize)>,
    cycle_lengths: Vec<usize>,
}

impl CactusGraph {
    pub(crate) fn new() -> Self {
        Self {
            parent: vec![None],
            depth: vec![0],
            on_cycle: vec![false],
            chords: Vec::new(),
            cycle_lengths: Vec::new(),
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.parent.len()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.node_count() - 1 + self.chords.len()
    }

    pub(crate) fn cycle_count(&self) -> usize {
        self.cycle_lengths.len()
    }

    pub(crate) fn depth(&self, node: usize) -> usize {
        self.depth[node]
    }

    pub(crate) fn attach_leaf(&mut self, parent: usize) -> usize {
        let child = self.parent.len();
        self.parent.push(Some(parent));
        self.depth.push(self.depth[parent] + 1);
        self.on_cycle.push(false);
        child
    }

    /// Tree edges as `(parent, child)` in creation order.
    pub(crate) fn tree_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.parent
            .iter()
            .enumerate()
            .filter_map(|(child, parent)| parent.map(|p| (p, child)))
    }

    pub(crate) fn chords(&self) -> &[(usize, usize)] {
        &self.chords
    }

    pub(crate) fn summary(&self) -> GraphSummary {
        GraphSummary::new(
            self.node_count(),
            self.edge_count(),
            self.cycle_lengths.clone(),
        )
    }

    /// Closes a cycle between two nodes whose tree path is still free of
    /// cycle edges, drawn uniformly among all such non-adjacent pairs.
    /// Returns `false` when no pair is eligible.
    pub(crate) fn close_cycle<R: Rng>(&mut self, rng: &mut R) -> bool {
        let components = self.free_components();

        // A free tree component with `s` nodes has (s - 1)(s - 2) / 2
        // non-adjacent pairs.
        let weights = components
            .iter()
            .map(|members| {
                let s = members.len();
                match s {
                    0..=2 => 0,
                    _ => (s - 1) * (s - 2) / 2,
                }
            })
            .collect::<Vec<usize>>();
        let total: usize = weights.iter().sum();

        if total == 0 {
            return false;
        }

        let mut pick = rng.gen_range(0..total);
        let mut chosen = &components[0];
        for (members, &weight) in components.iter().zip(&weights) {
            if pick < weight {
                chosen = members;
                break;
            }
            pick -= weight;
        }

        let (a, b) = loop {
            let a = chosen[rng.gen_range(0..chosen.len())];
            let b = chosen[rng.gen_range(0..chosen.len())];

            if a != b && !self.adjacent(a, b) {
                break (a, b);
            }
        };

        let length = self.mark_path(a, b) + 1;
        self.chords.push((a, b));
        self.cycle_lengths.push(length);
        true
    }

    fn adjacent(&self, a: usize, b: usize) -> bool {
        self.parent[a] == Some(b) || self.parent[b] == Some(a)
    }

    /// Groups nodes connected through tree edges that do not lie on a cycle.
    fn free_components(&self) -> Vec<Vec<usize>> {
        let mut label = vec![0; self.node_count()];
        let mut components: Vec<Vec<usize>> = Vec::new();

        for v in 0..self.node_count() {
            match self.parent[v] {
                Some(p) if !self.on_cycle[v] => {
                    label[v] = label[p];
                    components[label[v]].push(v);
                }
                _ => {
                    label[v] = components.len();
                    components.push(vec![v]);
                }
            }
        }

        components
    }

    /// Marks the tree path between `a` and `b` as lying on a cycle and
    /// returns its length in edges.
    fn mark_path(&mut self, a: usize, b: usize) -> usize {
        let (mut x, mut y) = (a, b);
        let mut length = 0;

        while x != y {
            let deeper = if self.depth[x] >= self.depth[y] {
                &mut x
            } else {
                &mut y
            };

            let parent = match self.parent[*deeper] {
                Some(p) => p,
                None => break,
            };

            self.on_cycle[*deeper] = true;
            *deeper = parent;
            length += 1;
        }

        length
    }
}

/// Validated construction controls shared by all trials of one generator.
#[derive(Debug, Clone)]
pub(crate) struct CactusShape {
    pub(crate) max_nodes: usize,
    pub(crate) max_edges: Option<usize>,
    pub(crate) layers: usize,
    pub(crate) max_cycles: usize,
    pub(crate) branching: WeightedIndex<f64>,
    pub(crate) closing: Bernoulli,
}

impl CactusShape {
    /// Grows one candidate graph.
    ///
    /// The growth phase expands the frontier breadth-first, interleaving
    /// cycle-closing attempts, until the frontier is exhausted or a size
    /// bound is hit. The closing phase then spends the remaining cycle slots.
    pub(crate) fn grow<R: Rng>(&self, rng: &mut R) -> CactusGraph {
        let mut graph = CactusGraph::new();
        let mut frontier = VecDeque::new();

        if self.layers > 0 {
            frontier.push_back(0);
        }

        while !frontier.is_empty() && !self.saturated(&graph) {
            if self.cycle_allowed(&graph) && self.closing.sample(rng) && graph.close_cycle(rng) {
                continue;
            }

            let node = match frontier.pop_front() {
                Some(n) => n,
                None => break,
            };

            for _ in 0..self.branching.sample(rng) {
                if self.saturated(&graph) {
                    break;
                }

                let child = graph.attach_leaf(node);
                if graph.depth(child) < self.layers {
                    frontier.push_back(child);
                }
            }
        }

        for _ in graph.cycle_count()..self.max_cycles {
            if !self.cycle_allowed(&graph) {
                break;
            }

            if self.closing.sample(rng) && !graph.close_cycle(rng) {
                break;
            }
        }

        graph
    }

    fn saturated(&self, graph: &CactusGraph) -> bool {
        graph.node_count() >= self.max_nodes || self.edges_exhausted(graph)
    }

    fn cycle_allowed(&self, graph: &CactusGraph) -> bool {
        graph.cycle_count() < self.max_cycles && !self.edges_exhausted(graph)
    }

    fn edges_exhausted(&self, graph: &CactusGraph) -> bool {
        match self.max_edges {
            Some(max) => graph.edge_count() >= max,
            None => false,
        }
    }
}

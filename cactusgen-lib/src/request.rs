use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt::Display,
};

use serde::Serialize;

use crate::generator::GraphSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestNode {
    name: String,
    node_type: String,
    demand: f64,
    allowed_nodes: Vec<String>,
}

impl RequestNode {
    pub fn new(
        name: impl Into<String>,
        node_type: impl Into<String>,
        demand: f64,
        allowed_nodes: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            demand,
            allowed_nodes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn demand(&self) -> f64 {
        self.demand
    }

    /// Substrate nodes this request node may be mapped onto.
    pub fn allowed_nodes(&self) -> &[String] {
        &self.allowed_nodes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEdge {
    tail: String,
    head: String,
    demand: f64,
}

impl RequestEdge {
    pub fn new(tail: impl Into<String>, head: impl Into<String>, demand: f64) -> Self {
        Self {
            tail: tail.into(),
            head: head.into(),
            demand,
        }
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn demand(&self) -> f64 {
        self.demand
    }
}

/// A generated virtual network request, owned by the caller and independent of
/// the generator that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    name: String,
    nodes: Vec<RequestNode>,
    edges: Vec<RequestEdge>,
    summary: GraphSummary,
}

impl Request {
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<RequestNode>,
        edges: Vec<RequestEdge>,
        summary: GraphSummary,
    ) -> Self {
        Self {
            name: name.into(),
            nodes,
            edges,
            summary,
        }
    }

    pub fn node_name(index: usize) -> String {
        format!("n{}", index)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[RequestNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RequestEdge] {
        &self.edges
    }

    pub fn summary(&self) -> &GraphSummary {
        &self.summary
    }

    /// Undirected adjacency, ignoring edge orientation.
    pub fn neighbourhoods(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut result: BTreeMap<&str, BTreeSet<&str>> = self
            .nodes
            .iter()
            .map(|node| (node.name(), BTreeSet::new()))
            .collect();

        for edge in &self.edges {
            result.entry(edge.tail()).or_default().insert(edge.head());
            result.entry(edge.head()).or_default().insert(edge.tail());
        }

        result
    }

    pub fn is_connected(&self) -> bool {
        let neighbourhoods = self.neighbourhoods();
        let start = match neighbourhoods.keys().next() {
            Some(s) => *s,
            None => return true,
        };

        let mut seen = BTreeSet::from([start]);
        let mut q = VecDeque::from([start]);

        while let Some(n) = q.pop_front() {
            for &neigh in &neighbourhoods[n] {
                if seen.insert(neigh) {
                    q.push_back(neigh);
                }
            }
        }

        seen.len() == neighbourhoods.len()
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Request `{}` ({} nodes, {} edges, {} cycles)",
            self.name,
            self.nodes.len(),
            self.edges.len(),
            self.summary.cycle_count()
        )
    }
}

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SubstrateError;

#[derive(Debug, Clone, PartialEq)]
pub struct SubstrateNode {
    types: BTreeSet<String>,
    capacity: BTreeMap<String, f64>,
    cost: f64,
}

impl SubstrateNode {
    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    /// Capacity offered for `node_type`, zero when the type is unsupported.
    pub fn capacity(&self, node_type: &str) -> f64 {
        self.capacity.get(node_type).copied().unwrap_or(0.0)
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubstrateEdge {
    capacity: f64,
    cost: f64,
}

impl SubstrateEdge {
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }
}

/// Capacitated network that request graphs are generated against.
///
/// The substrate is assembled once through [`Substrate::add_node`] and
/// [`Substrate::add_edge`] and only read afterwards, so a shared reference can
/// be handed to any number of generator workers.
#[derive(Debug, Clone, PartialEq)]
pub struct Substrate {
    id: String,
    nodes: BTreeMap<String, SubstrateNode>,
    edges: BTreeMap<(String, String), SubstrateEdge>,
}

impl Substrate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    pub fn add_node<I, S>(
        &mut self,
        id: impl Into<String>,
        types: I,
        capacity: BTreeMap<String, f64>,
        cost: f64,
    ) -> Result<(), SubstrateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(SubstrateError::DuplicateNode { id });
        }

        let types = types.into_iter().map(Into::into).collect::<BTreeSet<String>>();
        for (node_type, &value) in &capacity {
            if !types.contains(node_type) {
                return Err(SubstrateError::UnsupportedCapacityType {
                    id,
                    node_type: node_type.clone(),
                });
            }

            Self::check_capacity(&id, value)?;
        }

        self.nodes.insert(
            id,
            SubstrateNode {
                types,
                capacity,
                cost,
            },
        );
        Ok(())
    }

    /// Adds the edge `tail -> head`, and `head -> tail` as well when
    /// `bidirected` is set. Either both orientations are inserted or none.
    pub fn add_edge(
        &mut self,
        tail: &str,
        head: &str,
        capacity: f64,
        cost: f64,
        bidirected: bool,
    ) -> Result<(), SubstrateError> {
        for id in [tail, head] {
            if !self.nodes.contains_key(id) {
                return Err(SubstrateError::UnknownNode { id: id.to_owned() });
            }
        }

        if tail == head {
            return Err(SubstrateError::SelfLoop {
                id: tail.to_owned(),
            });
        }

        Self::check_capacity(&format!("{}->{}", tail, head), capacity)?;

        let mut pairs = vec![(tail.to_owned(), head.to_owned())];
        if bidirected {
            pairs.push((head.to_owned(), tail.to_owned()));
        }

        for (a, b) in &pairs {
            if self.edges.contains_key(&(a.clone(), b.clone())) {
                return Err(SubstrateError::DuplicateEdge {
                    tail: a.clone(),
                    head: b.clone(),
                });
            }
        }

        for pair in pairs {
            self.edges.insert(pair, SubstrateEdge { capacity, cost });
        }

        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node(&self, id: &str) -> Option<&SubstrateNode> {
        self.nodes.get(id)
    }

    pub fn edge(&self, tail: &str, head: &str) -> Option<&SubstrateEdge> {
        self.edges.get(&(tail.to_owned(), head.to_owned()))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Union of the resource types supported by any node.
    pub fn types(&self) -> BTreeSet<&str> {
        self.nodes
            .values()
            .flat_map(|node| node.types.iter().map(String::as_str))
            .collect()
    }

    pub fn nodes_supporting(&self, node_type: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.types.contains(node_type))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn total_node_capacity(&self, node_type: &str) -> f64 {
        self.nodes.values().map(|node| node.capacity(node_type)).sum()
    }

    pub fn total_edge_capacity(&self) -> f64 {
        self.edges.values().map(|edge| edge.capacity).sum()
    }

    /// Nodes connected to `id` by an edge in either orientation.
    pub fn neighbours(&self, id: &str) -> BTreeSet<&str> {
        let mut result = BTreeSet::new();

        for (tail, head) in self.edges.keys() {
            if tail == id {
                result.insert(head.as_str());
            } else if head == id {
                result.insert(tail.as_str());
            }
        }

        result
    }

    fn check_capacity(element: &str, value: f64) -> Result<(), SubstrateError> {
        if !value.is_finite() || value < 0.0 {
            return Err(SubstrateError::InvalidCapacity {
                element: element.to_owned(),
                value,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universal(capacity: f64) -> BTreeMap<String, f64> {
        BTreeMap::from([(String::from("universal"), capacity)])
    }

    fn two_node_substrate() -> Substrate {
        let mut substrate = Substrate::new("simple");
        substrate
            .add_node("u", ["universal"], universal(1000.0), 1000.0)
            .expect("u is valid");
        substrate
            .add_node("v", ["universal"], universal(1000.0), 1000.0)
            .expect("v is valid");
        substrate
            .add_edge("u", "v", 1000.0, 1000.0, true)
            .expect("edge is valid");
        substrate
    }

    #[test]
    fn bidirected_edge_inserts_both_orientations() {
        let substrate = two_node_substrate();

        assert_eq!(substrate.edge_count(), 2);
        assert!(substrate.edge("u", "v").is_some());
        assert!(substrate.edge("v", "u").is_some());
        assert_eq!(substrate.total_edge_capacity(), 2000.0);
        assert_eq!(substrate.neighbours("u"), BTreeSet::from(["v"]));
    }

    #[test]
    fn aggregates_capacities_per_type() {
        let mut substrate = two_node_substrate();
        substrate
            .add_node(
                "w",
                ["universal", "storage"],
                BTreeMap::from([(String::from("storage"), 5.0)]),
                1.0,
            )
            .expect("w is valid");

        assert_eq!(substrate.types(), BTreeSet::from(["storage", "universal"]));
        assert_eq!(substrate.total_node_capacity("universal"), 2000.0);
        assert_eq!(substrate.total_node_capacity("storage"), 5.0);
        assert_eq!(substrate.nodes_supporting("storage"), vec!["w"]);
        assert_eq!(substrate.node_count(), 3);
    }

    #[test]
    fn rejects_duplicate_nodes_and_edges() {
        let mut substrate = two_node_substrate();

        let err = substrate
            .add_node("u", ["universal"], universal(1.0), 1.0)
            .expect_err("duplicate node");
        assert_eq!(err, SubstrateError::DuplicateNode { id: "u".into() });

        let err = substrate
            .add_edge("v", "u", 1.0, 1.0, false)
            .expect_err("duplicate edge");
        assert!(matches!(err, SubstrateError::DuplicateEdge { .. }));
    }

    #[test]
    fn rejects_invalid_capacities_and_endpoints() {
        let mut substrate = two_node_substrate();

        let err = substrate
            .add_node("x", ["universal"], universal(-1.0), 1.0)
            .expect_err("negative capacity");
        assert!(matches!(err, SubstrateError::InvalidCapacity { .. }));

        let err = substrate
            .add_node("y", ["cpu"], universal(1.0), 1.0)
            .expect_err("capacity for unsupported type");
        assert!(matches!(err, SubstrateError::UnsupportedCapacityType { .. }));

        let err = substrate
            .add_edge("u", "z", 1.0, 1.0, false)
            .expect_err("unknown endpoint");
        assert_eq!(err, SubstrateError::UnknownNode { id: "z".into() });

        let err = substrate
            .add_edge("u", "u", 1.0, 1.0, false)
            .expect_err("self-loop");
        assert_eq!(err, SubstrateError::SelfLoop { id: "u".into() });

        let err = substrate
            .add_edge("u", "v", f64::NAN, 1.0, false)
            .expect_err("nan capacity");
        assert!(matches!(err, SubstrateError::InvalidCapacity { .. }));
    }
}

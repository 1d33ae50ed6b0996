//! Unit and property tests for the cactus request generator.

use std::collections::{BTreeMap, BTreeSet};

use proptest::{prelude::any, prop_assert, prop_assert_eq, proptest};
use rand::{rngs::StdRng, SeedableRng};
use rstest::rstest;

use super::*;

fn universal(capacity: f64) -> BTreeMap<String, f64> {
    BTreeMap::from([(String::from("universal"), capacity)])
}

fn simple_substrate() -> Substrate {
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

/// Biconnected blocks of an undirected simple graph as `(vertices, edges)`.
struct Blocks {
    adjacency: Vec<Vec<(usize, usize)>>,
    disc: Vec<Option<usize>>,
    low: Vec<usize>,
    time: usize,
    stack: Vec<usize>,
    edges: Vec<(usize, usize)>,
    found: Vec<(usize, usize)>,
}

impl Blocks {
    fn of(n: usize, edges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
        let mut adjacency = vec![Vec::new(); n];
        for (id, &(a, b)) in edges.iter().enumerate() {
            adjacency[a].push((b, id));
            adjacency[b].push((a, id));
        }

        let mut blocks = Self {
            adjacency,
            disc: vec![None; n],
            low: vec![0; n],
            time: 0,
            stack: Vec::new(),
            edges,
            found: Vec::new(),
        };

        for v in 0..n {
            if blocks.disc[v].is_none() {
                blocks.visit(v, None);
            }
        }

        blocks.found
    }

    fn visit(&mut self, u: usize, parent_edge: Option<usize>) {
        self.disc[u] = Some(self.time);
        self.low[u] = self.time;
        self.time += 1;

        for (v, e) in self.adjacency[u].clone() {
            if Some(e) == parent_edge {
                continue;
            }

            let disc_u = self.disc[u].unwrap_or(0);
            match self.disc[v] {
                None => {
                    self.stack.push(e);
                    self.visit(v, Some(e));
                    self.low[u] = self.low[u].min(self.low[v]);

                    if self.low[v] >= disc_u {
                        self.pop_block(e);
                    }
                }
                Some(disc_v) if disc_v < disc_u => {
                    self.stack.push(e);
                    self.low[u] = self.low[u].min(disc_v);
                }
                Some(_) => {}
            }
        }
    }

    fn pop_block(&mut self, until: usize) {
        let mut vertices = BTreeSet::new();
        let mut count = 0;

        while let Some(e) = self.stack.pop() {
            let (a, b) = self.edges[e];
            vertices.insert(a);
            vertices.insert(b);
            count += 1;

            if e == until {
                break;
            }
        }

        self.found.push((vertices.len(), count));
    }
}

/// Checks connectivity and that every block is a bridge or a simple cycle,
/// returning the cycle lengths found.
fn cactus_cycles(request: &Request) -> Option<Vec<usize>> {
    if !request.is_connected() {
        return None;
    }

    let index = request
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| (node.name().to_owned(), i))
        .collect::<BTreeMap<String, usize>>();
    let edges = request
        .edges()
        .iter()
        .map(|edge| (index[edge.tail()], index[edge.head()]))
        .collect::<Vec<_>>();

    let mut cycles = Vec::new();
    for (vertices, edges) in Blocks::of(request.nodes().len(), edges) {
        match edges {
            1 => {}
            _ if edges == vertices => cycles.push(edges),
            _ => return None,
        }
    }

    cycles.sort_unstable();
    Some(cycles)
}

#[test]
fn block_check_rejects_two_cycles_sharing_an_edge() {
    // Two triangles glued along 0-1.
    let blocks = Blocks::of(4, vec![(0, 1), (1, 2), (2, 0), (0, 3), (3, 1)]);
    assert_eq!(blocks, vec![(4, 5)]);
}

#[test]
fn single_node_bounds_always_succeed() {
    let substrate = simple_substrate();
    let params = CactusParameters {
        min_number_of_nodes: 1,
        max_number_of_nodes: 1,
        probability: 1.0,
        ..Default::default()
    };
    let generator = CactusRequestGenerator::new(&params, &substrate).expect("valid parameters");
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..200 {
        assert_eq!(
            generator.generate(&mut rng),
            Ok(GraphSummary::new(1, 0, Vec::new()))
        );
    }
}

#[test]
fn zero_probability_generates_trees() {
    let substrate = simple_substrate();
    let params = CactusParameters {
        min_number_of_nodes: 3,
        max_number_of_nodes: 5,
        probability: 0.0,
        ..Default::default()
    };
    let generator = CactusRequestGenerator::new(&params, &substrate).expect("valid parameters");
    let mut rng = StdRng::seed_from_u64(12);

    for _ in 0..500 {
        if let Ok(summary) = generator.generate(&mut rng) {
            assert_eq!(summary.cycle_count(), 0);
            assert_eq!(summary.edges(), summary.nodes() - 1);
            assert!((3..=5).contains(&summary.nodes()));
        }
    }
}

#[test]
fn starved_growth_fails_with_too_few_nodes() {
    let substrate = simple_substrate();
    let params = CactusParameters {
        min_number_of_nodes: 3,
        layers: 0,
        ..Default::default()
    };
    let generator = CactusRequestGenerator::new(&params, &substrate).expect("valid parameters");
    let mut rng = StdRng::seed_from_u64(13);

    assert_eq!(
        generator.generate(&mut rng),
        Err(TrialFailure::TooFewNodes { nodes: 1, min: 3 })
    );
}

#[test]
fn unreachable_edge_minimum_is_rejected_before_any_trial() {
    let substrate = simple_substrate();
    let params = CactusParameters {
        min_number_of_nodes: 2,
        max_number_of_nodes: 4,
        min_number_of_edges: 10,
        ..Default::default()
    };

    let err = CactusRequestGenerator::new(&params, &substrate).expect_err("no cactus has 10 edges");
    assert_eq!(
        err,
        ConfigurationError::EdgeMinimumUnreachable {
            min: 10,
            reachable: 4
        }
    );
}

#[test]
fn edge_minimum_at_the_cactus_limit_is_reachable() {
    let substrate = simple_substrate();
    let params = CactusParameters {
        min_number_of_nodes: 5,
        max_number_of_nodes: 5,
        min_number_of_edges: 6,
        layers: 4,
        branching_distribution: vec![0.0, 1.0],
        probability: 1.0,
        max_cycles: 2,
        ..Default::default()
    };
    let generator = CactusRequestGenerator::new(&params, &substrate).expect("valid parameters");
    let mut rng = StdRng::seed_from_u64(14);

    let successes = (0..200)
        .filter_map(|_| generator.generate(&mut rng).ok())
        .inspect(|summary| assert_eq!(summary.edges(), 6))
        .count();
    assert!(successes > 0);
}

#[rstest]
#[case(CactusParameters { min_number_of_nodes: 5, max_number_of_nodes: 3, ..Default::default() })]
#[case(CactusParameters { probability: -0.5, ..Default::default() })]
fn free_function_rejects_invalid_parameters(#[case] params: CactusParameters) {
    let mut rng = StdRng::seed_from_u64(15);
    let result = generate(&params, &simple_substrate(), &mut rng);

    assert!(result.is_err());
}

#[test]
fn substrate_without_types_is_rejected() {
    let mut substrate = Substrate::new("bare");
    substrate
        .add_node("u", Vec::<String>::new(), BTreeMap::new(), 1.0)
        .expect("node is valid");

    let err = CactusRequestGenerator::new(&CactusParameters::default(), &substrate)
        .expect_err("no resource types");
    assert_eq!(
        err,
        ConfigurationError::SubstrateWithoutResources {
            substrate: "bare".into()
        }
    );
}

#[test]
fn requests_split_resources_evenly() {
    let substrate = simple_substrate();
    let params = CactusParameters {
        min_number_of_nodes: 4,
        max_number_of_nodes: 4,
        layers: 4,
        branching_distribution: vec![0.0, 1.0],
        max_cycles: 1,
        probability: 1.0,
        node_resource_factor: 0.5,
        edge_resource_factor: 0.25,
        potential_nodes_factor: 0.5,
        ..Default::default()
    };
    let generator = CactusRequestGenerator::new(&params, &substrate).expect("valid parameters");
    let mut rng = StdRng::seed_from_u64(16);

    let request = generator
        .generate_request("r0", &mut rng)
        .expect("a path of four nodes always fits");

    assert_eq!(request.name(), "r0");
    assert_eq!(request.nodes().len(), 4);
    for node in request.nodes() {
        assert_eq!(node.node_type(), "universal");
        assert_eq!(node.demand(), 0.5 * 2000.0 / 4.0);
        assert_eq!(node.allowed_nodes().len(), 1);
    }

    let edge_count = request.edges().len();
    assert_eq!(edge_count, request.summary().edges());
    for edge in request.edges() {
        assert_eq!(edge.demand(), 0.25 * 2000.0 / edge_count as f64);
    }
}

#[test]
fn tree_edges_point_away_from_the_root_without_arbitrary_orientation() {
    let substrate = simple_substrate();
    let params = CactusParameters {
        min_number_of_nodes: 1,
        max_number_of_nodes: 12,
        probability: 0.0,
        ..Default::default()
    };
    let generator = CactusRequestGenerator::new(&params, &substrate).expect("valid parameters");
    let mut rng = StdRng::seed_from_u64(17);

    for i in 0..100 {
        let request = match generator.generate_request(format!("r{}", i), &mut rng) {
            Ok(r) => r,
            Err(_) => continue,
        };

        for edge in request.edges() {
            let tail = edge.tail()[1..].parse::<usize>().expect("numbered node");
            let head = edge.head()[1..].parse::<usize>().expect("numbered node");
            assert!(tail < head, "{} -> {}", edge.tail(), edge.head());
        }
    }
}

proptest! {
    #[test]
    fn successful_requests_are_cacti_within_bounds(
        min_nodes in 1usize..6,
        extra_nodes in 0usize..10,
        layers in 0usize..6,
        weights in proptest::collection::vec(0.0f64..1.0, 1..5),
        probability in 0.0f64..=1.0,
        max_cycles in 0usize..5,
        orientations in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let mut branching_distribution = weights;
        branching_distribution.push(0.5);

        let params = CactusParameters {
            min_number_of_nodes: min_nodes,
            max_number_of_nodes: min_nodes + extra_nodes,
            layers,
            branching_distribution,
            probability,
            max_cycles,
            arbitrary_edge_orientations: orientations,
            ..Default::default()
        };
        let substrate = simple_substrate();
        let generator = CactusRequestGenerator::new(&params, &substrate)
            .expect("strategy only builds valid parameters");
        let mut rng = StdRng::seed_from_u64(seed);

        for i in 0..20 {
            let request = match generator.generate_request(format!("r{}", i), &mut rng) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let summary = request.summary();

            prop_assert!(summary.nodes() >= params.min_number_of_nodes);
            prop_assert!(summary.nodes() <= params.max_number_of_nodes);
            prop_assert!(summary.cycle_count() <= params.max_cycles);
            prop_assert_eq!(summary.edges(), summary.nodes() - 1 + summary.cycle_count());
            prop_assert_eq!(request.edges().len(), summary.edges());

            let cycles = cactus_cycles(&request);
            prop_assert!(cycles.is_some(), "not a cactus: {:?}", request);

            let mut expected = summary.cycle_lengths().to_vec();
            expected.sort_unstable();
            prop_assert_eq!(cycles, Some(expected));
        }
    }
}

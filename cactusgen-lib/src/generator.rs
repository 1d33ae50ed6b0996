use rand::{
    prelude::{IteratorRandom, SliceRandom},
    Rng,
};
use rand_distr::{Bernoulli, WeightedIndex};
use serde::Serialize;
use tracing::trace;

use crate::{
    cactus::{CactusGraph, CactusShape},
    error::{ConfigurationError, TrialFailure},
    params::CactusParameters,
    request::{Request, RequestEdge, RequestNode},
    substrate::Substrate,
};

/// What survives of a successful trial once its graph is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    nodes: usize,
    edges: usize,
    cycle_lengths: Vec<usize>,
}

impl GraphSummary {
    pub fn new(nodes: usize, edges: usize, cycle_lengths: Vec<usize>) -> Self {
        Self {
            nodes,
            edges,
            cycle_lengths,
        }
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn edges(&self) -> usize {
        self.edges
    }

    pub fn cycle_lengths(&self) -> &[usize] {
        &self.cycle_lengths
    }

    pub fn cycle_count(&self) -> usize {
        self.cycle_lengths.len()
    }

    /// Edges lying on a cycle. Cycles of a cactus are edge-disjoint, so this is
    /// the sum of their lengths.
    pub fn cycle_edges(&self) -> usize {
        self.cycle_lengths.iter().sum()
    }
}

/// Rejection-sampling generator of cactus-shaped request graphs.
///
/// Construction is validated once; every call to [`generate`] afterwards is a
/// fresh, independent trial that either yields a [`GraphSummary`] within the
/// configured bounds or a [`TrialFailure`]. The generator keeps no state
/// between trials and only borrows the substrate, so it can be shared across
/// worker threads as long as every worker brings its own RNG.
///
/// [`generate`]: CactusRequestGenerator::generate
#[derive(Debug, Clone)]
pub struct CactusRequestGenerator<'a> {
    parameters: CactusParameters,
    substrate: &'a Substrate,
    shape: CactusShape,
    types: Vec<&'a str>,
}

impl<'a> CactusRequestGenerator<'a> {
    pub fn new(
        parameters: &CactusParameters,
        substrate: &'a Substrate,
    ) -> Result<Self, ConfigurationError> {
        parameters.validate()?;

        let types = substrate.types().into_iter().collect::<Vec<&str>>();
        if types.is_empty() {
            return Err(ConfigurationError::SubstrateWithoutResources {
                substrate: substrate.id().to_owned(),
            });
        }

        let branching = WeightedIndex::new(&parameters.branching_distribution)
            .map_err(|_| ConfigurationError::ZeroBranchingMass)?;
        let closing = Bernoulli::new(parameters.probability).map_err(|_| {
            ConfigurationError::InvalidProbability {
                name: "probability",
                value: parameters.probability,
            }
        })?;

        let shape = CactusShape {
            max_nodes: parameters.max_number_of_nodes,
            max_edges: parameters.max_number_of_edges,
            layers: parameters.layers,
            max_cycles: parameters.max_cycles,
            branching,
            closing,
        };

        Ok(Self {
            parameters: parameters.clone(),
            substrate,
            shape,
            types,
        })
    }

    pub fn parameters(&self) -> &CactusParameters {
        &self.parameters
    }

    pub fn substrate(&self) -> &Substrate {
        self.substrate
    }

    /// Runs one trial and returns the summary of the accepted graph.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<GraphSummary, TrialFailure> {
        let graph = self.try_generate(rng)?;
        Ok(graph.summary())
    }

    /// Runs one trial and materialises the accepted graph as a [`Request`]
    /// with node types, demands and allowed substrate nodes.
    pub fn generate_request<R: Rng>(
        &self,
        name: impl Into<String>,
        rng: &mut R,
    ) -> Result<Request, TrialFailure> {
        let graph = self.try_generate(rng)?;
        let node_count = graph.node_count();

        let mut nodes = Vec::with_capacity(node_count);
        for index in 0..node_count {
            let node_type = self.types.choose(rng).copied().unwrap_or_default();
            nodes.push(self.request_node(index, node_type, node_count, rng));
        }

        let orientations = graph
            .tree_edges()
            .chain(graph.chords().iter().copied())
            .collect::<Vec<(usize, usize)>>();
        let edge_demand = match orientations.len() {
            0 => 0.0,
            count => {
                self.parameters.edge_resource_factor * self.substrate.total_edge_capacity()
                    / count as f64
            }
        };

        let mut edges = Vec::with_capacity(orientations.len());
        for (tail, head) in orientations {
            let (tail, head) =
                if self.parameters.arbitrary_edge_orientations && rng.gen_bool(0.5) {
                    (head, tail)
                } else {
                    (tail, head)
                };

            edges.push(RequestEdge::new(
                Request::node_name(tail),
                Request::node_name(head),
                edge_demand,
            ));
        }

        Ok(Request::new(name, nodes, edges, graph.summary()))
    }

    fn try_generate<R: Rng>(&self, rng: &mut R) -> Result<CactusGraph, TrialFailure> {
        let graph = self.shape.grow(rng);

        if let Err(failure) = self.check_bounds(graph.node_count(), graph.edge_count()) {
            trace!(%failure, "rejected candidate graph");
            return Err(failure);
        }

        Ok(graph)
    }

    fn check_bounds(&self, nodes: usize, edges: usize) -> Result<(), TrialFailure> {
        let params = &self.parameters;

        if nodes < params.min_number_of_nodes {
            return Err(TrialFailure::TooFewNodes {
                nodes,
                min: params.min_number_of_nodes,
            });
        }

        if nodes > params.max_number_of_nodes {
            return Err(TrialFailure::TooManyNodes {
                nodes,
                max: params.max_number_of_nodes,
            });
        }

        if edges < params.min_number_of_edges {
            return Err(TrialFailure::TooFewEdges {
                edges,
                min: params.min_number_of_edges,
            });
        }

        match params.max_number_of_edges {
            Some(max) if edges > max => Err(TrialFailure::TooManyEdges { edges, max }),
            _ => Ok(()),
        }
    }

    fn request_node<R: Rng>(
        &self,
        index: usize,
        node_type: &str,
        node_count: usize,
        rng: &mut R,
    ) -> RequestNode {
        let demand = self.parameters.node_resource_factor
            * self.substrate.total_node_capacity(node_type)
            / node_count as f64;

        let supporting = self.substrate.nodes_supporting(node_type);
        let allowed = (self.parameters.potential_nodes_factor * supporting.len() as f64)
            .ceil()
            .max(1.0) as usize;
        let allowed_nodes = supporting
            .into_iter()
            .choose_multiple(rng, allowed)
            .into_iter()
            .map(str::to_owned)
            .collect();

        RequestNode::new(Request::node_name(index), node_type, demand, allowed_nodes)
    }
}

/// Validates `parameters` against `substrate` and runs a single trial.
pub fn generate<R: Rng>(
    parameters: &CactusParameters,
    substrate: &Substrate,
    rng: &mut R,
) -> Result<Result<GraphSummary, TrialFailure>, ConfigurationError> {
    let generator = CactusRequestGenerator::new(parameters, substrate)?;
    Ok(generator.generate(rng))
}

#[cfg(test)]
mod tests;

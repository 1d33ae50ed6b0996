//! Error types exposed by the generator, the accumulator and the substrate.

use thiserror::Error;

/// Malformed or inconsistent configuration. Raised before any trial runs.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("min_number_of_nodes must be at least 1 (got {got})")]
    ZeroMinNodes { got: usize },
    #[error("min_number_of_nodes ({min}) exceeds max_number_of_nodes ({max})")]
    NodeBoundsInverted { min: usize, max: usize },
    #[error("min_number_of_edges ({min}) exceeds max_number_of_edges ({max})")]
    EdgeBoundsInverted { min: usize, max: usize },
    #[error("max_number_of_edges ({max}) cannot connect min_number_of_nodes ({nodes}) nodes")]
    EdgeMaximumDisconnects { max: usize, nodes: usize },
    #[error("min_number_of_edges ({min}) exceeds the {reachable} edges any cactus within the bounds can have")]
    EdgeMinimumUnreachable { min: usize, reachable: usize },
    #[error("branching_distribution must contain at least one weight")]
    EmptyBranchingDistribution,
    #[error("branching_distribution weight {index} is invalid ({weight})")]
    InvalidBranchingWeight { index: usize, weight: f64 },
    #[error("branching_distribution weights sum to zero")]
    ZeroBranchingMass,
    #[error("`{name}` must lie in [0, 1] (got {value})")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("`{name}` must be finite and non-negative (got {value})")]
    InvalidResourceFactor { name: &'static str, value: f64 },
    #[error("potential_nodes_factor must lie in (0, 1] (got {value})")]
    InvalidPotentialNodesFactor { value: f64 },
    #[error("unknown parameter `{key}`")]
    UnknownParameter { key: String },
    #[error("parameter `{key}` expects {expected}")]
    ParameterTypeMismatch { key: String, expected: &'static str },
    #[error("parameter axis `{key}` has no values")]
    EmptyAxis { key: String },
    #[error("substrate `{substrate}` offers no resource types to embed on")]
    SubstrateWithoutResources { substrate: String },
    #[error("the number of iterations must be positive")]
    NoIterations,
    #[error("the chunk size must be positive")]
    ZeroChunkSize,
}

/// A single construction attempt that missed its bounds.
///
/// This is an expected outcome of rejection sampling: callers count it, they
/// do not propagate it.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum TrialFailure {
    #[error("generated {nodes} nodes, at least {min} required")]
    TooFewNodes { nodes: usize, min: usize },
    #[error("generated {nodes} nodes, at most {max} allowed")]
    TooManyNodes { nodes: usize, max: usize },
    #[error("generated {edges} edges, at least {min} required")]
    TooFewEdges { edges: usize, min: usize },
    #[error("generated {edges} edges, at most {max} allowed")]
    TooManyEdges { edges: usize, max: usize },
}

/// A derived statistic was requested but is undefined for the aggregate.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum DegenerateResultError {
    #[error("no generation attempts were recorded")]
    NoTrials,
    #[error("none of the {attempts} generation attempts succeeded")]
    NoSuccessfulTrials { attempts: u64 },
    #[error("successful trials generated no edges")]
    NoEdgesGenerated,
}

/// Violations found while building a [`crate::Substrate`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SubstrateError {
    #[error("node `{id}` already exists")]
    DuplicateNode { id: String },
    #[error("edge `{tail}` -> `{head}` already exists")]
    DuplicateEdge { tail: String, head: String },
    #[error("edge references unknown node `{id}`")]
    UnknownNode { id: String },
    #[error("edge `{id}` -> `{id}` is a self-loop")]
    SelfLoop { id: String },
    #[error("capacity for `{element}` must be finite and non-negative (got {value})")]
    InvalidCapacity { element: String, value: f64 },
    #[error("node `{id}` has capacity for unsupported type `{node_type}`")]
    UnsupportedCapacityType { id: String, node_type: String },
}

/// Errors surfaced by [`crate::EmpiricalEstimator`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EstimateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("estimation cancelled after {completed} trials")]
    Cancelled { completed: u64 },
}

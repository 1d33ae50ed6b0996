//! Random cactus-shaped virtual network requests and Monte-Carlo estimates of
//! their structure.

mod cactus;
pub mod error;
mod estimator;
mod generator;
mod params;
mod request;
mod stats;
mod substrate;
mod sweep;

pub use error::{
    ConfigurationError, DegenerateResultError, EstimateError, SubstrateError, TrialFailure,
};
pub use estimator::{estimate, EmpiricalEstimator, DEFAULT_CHUNK_SIZE};
pub use generator::{generate, CactusRequestGenerator, GraphSummary};
pub use params::{CactusParameters, ParameterValue, PARAMETER_KEYS};
pub use request::{Request, RequestEdge, RequestNode};
pub use stats::AdvancedGenerationInformation;
pub use substrate::{Substrate, SubstrateEdge, SubstrateNode};
pub use sweep::ParameterGrid;

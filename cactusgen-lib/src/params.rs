//! Typed configuration of the cactus request generator.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::error::ConfigurationError;

/// Every key accepted by [`CactusParameters::apply`].
pub const PARAMETER_KEYS: &[&str] = &[
    "min_number_of_nodes",
    "max_number_of_nodes",
    "min_number_of_edges",
    "max_number_of_edges",
    "layers",
    "branching_distribution",
    "probability",
    "max_cycles",
    "arbitrary_edge_orientations",
    "node_resource_factor",
    "edge_resource_factor",
    "potential_nodes_factor",
];

/// A dynamically keyed parameter value, as found on a sweep axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Flag(bool),
    Integer(usize),
    Float(f64),
    Weights(Vec<f64>),
}

/// Shape and resource controls for one cactus request generator.
///
/// `branching_distribution[k]` is the relative weight of an expanded node
/// receiving `k` children. `probability` is the chance of attempting to close
/// a cycle at each construction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CactusParameters {
    pub min_number_of_nodes: usize,
    pub max_number_of_nodes: usize,
    pub min_number_of_edges: usize,
    pub max_number_of_edges: Option<usize>,
    pub layers: usize,
    pub branching_distribution: Vec<f64>,
    pub probability: f64,
    pub max_cycles: usize,
    pub arbitrary_edge_orientations: bool,
    pub node_resource_factor: f64,
    pub edge_resource_factor: f64,
    pub potential_nodes_factor: f64,
}

impl Default for CactusParameters {
    fn default() -> Self {
        Self {
            min_number_of_nodes: 3,
            max_number_of_nodes: 10,
            min_number_of_edges: 0,
            max_number_of_edges: None,
            layers: 3,
            branching_distribution: vec![0.2, 0.4, 0.4],
            probability: 0.3,
            max_cycles: 3,
            arbitrary_edge_orientations: false,
            node_resource_factor: 0.5,
            edge_resource_factor: 0.5,
            potential_nodes_factor: 1.0,
        }
    }
}

impl CactusParameters {
    /// Checks the bounds and distributions. Run once before any trial.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_number_of_nodes == 0 {
            return Err(ConfigurationError::ZeroMinNodes {
                got: self.min_number_of_nodes,
            });
        }

        if self.min_number_of_nodes > self.max_number_of_nodes {
            return Err(ConfigurationError::NodeBoundsInverted {
                min: self.min_number_of_nodes,
                max: self.max_number_of_nodes,
            });
        }

        if let Some(max) = self.max_number_of_edges {
            if self.min_number_of_edges > max {
                return Err(ConfigurationError::EdgeBoundsInverted {
                    min: self.min_number_of_edges,
                    max,
                });
            }

            if max < self.min_number_of_nodes - 1 {
                return Err(ConfigurationError::EdgeMaximumDisconnects {
                    max,
                    nodes: self.min_number_of_nodes,
                });
            }
        }

        // Every cycle spends at least two tree edges, so a cactus on n nodes
        // has at most (n - 1) / 2 of them.
        let tree_edges = self.max_number_of_nodes - 1;
        let reachable = tree_edges + self.max_cycles.min(tree_edges / 2);
        if self.min_number_of_edges > reachable {
            return Err(ConfigurationError::EdgeMinimumUnreachable {
                min: self.min_number_of_edges,
                reachable,
            });
        }

        if self.branching_distribution.is_empty() {
            return Err(ConfigurationError::EmptyBranchingDistribution);
        }

        for (index, &weight) in self.branching_distribution.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigurationError::InvalidBranchingWeight { index, weight });
            }
        }

        if self.branching_distribution.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigurationError::ZeroBranchingMass);
        }

        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigurationError::InvalidProbability {
                name: "probability",
                value: self.probability,
            });
        }

        for (name, value) in [
            ("node_resource_factor", self.node_resource_factor),
            ("edge_resource_factor", self.edge_resource_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidResourceFactor { name, value });
            }
        }

        // NaN fails both comparisons.
        if !(self.potential_nodes_factor > 0.0 && self.potential_nodes_factor <= 1.0) {
            return Err(ConfigurationError::InvalidPotentialNodesFactor {
                value: self.potential_nodes_factor,
            });
        }

        Ok(())
    }

    /// Sets the field named `key`. Unknown keys and values of the wrong shape
    /// are rejected; the result is not validated.
    pub fn apply(&mut self, key: &str, value: &ParameterValue) -> Result<(), ConfigurationError> {
        match key {
            "min_number_of_nodes" => self.min_number_of_nodes = Self::integer(key, value)?,
            "max_number_of_nodes" => self.max_number_of_nodes = Self::integer(key, value)?,
            "min_number_of_edges" => self.min_number_of_edges = Self::integer(key, value)?,
            "max_number_of_edges" => self.max_number_of_edges = Some(Self::integer(key, value)?),
            "layers" => self.layers = Self::integer(key, value)?,
            "max_cycles" => self.max_cycles = Self::integer(key, value)?,
            "probability" => self.probability = Self::float(key, value)?,
            "node_resource_factor" => self.node_resource_factor = Self::float(key, value)?,
            "edge_resource_factor" => self.edge_resource_factor = Self::float(key, value)?,
            "potential_nodes_factor" => self.potential_nodes_factor = Self::float(key, value)?,
            "arbitrary_edge_orientations" => match value {
                ParameterValue::Flag(flag) => self.arbitrary_edge_orientations = *flag,
                _ => return Err(Self::mismatch(key, "a boolean")),
            },
            "branching_distribution" => match value {
                ParameterValue::Weights(weights) => self.branching_distribution = weights.clone(),
                _ => return Err(Self::mismatch(key, "a list of weights")),
            },
            _ => {
                return Err(ConfigurationError::UnknownParameter {
                    key: key.to_owned(),
                })
            }
        }

        Ok(())
    }

    pub fn is_known_key(key: &str) -> bool {
        PARAMETER_KEYS.contains(&key)
    }

    /// Hex SHA-512 digest over every field, stable across runs.
    pub fn fingerprint(&self) -> String {
        format!("{:X}", self.digest())
    }

    /// Seed derived from the fingerprint, so a parameter combination always
    /// replays the same trials.
    pub fn seed(&self) -> u64 {
        self.digest()
            .iter()
            .take(8)
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    }

    fn digest(&self) -> sha2::digest::Output<Sha512> {
        let weights = self
            .branching_distribution
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<String>>();
        let max_edges = match self.max_number_of_edges {
            Some(max) => max.to_string(),
            None => String::from("-"),
        };

        let parts = [
            format!("min_number_of_nodes={}", self.min_number_of_nodes),
            format!("max_number_of_nodes={}", self.max_number_of_nodes),
            format!("min_number_of_edges={}", self.min_number_of_edges),
            format!("max_number_of_edges={}", max_edges),
            format!("layers={}", self.layers),
            format!("branching_distribution={}", weights.join(",")),
            format!("probability={}", self.probability),
            format!("max_cycles={}", self.max_cycles),
            format!(
                "arbitrary_edge_orientations={}",
                self.arbitrary_edge_orientations
            ),
            format!("node_resource_factor={}", self.node_resource_factor),
            format!("edge_resource_factor={}", self.edge_resource_factor),
            format!("potential_nodes_factor={}", self.potential_nodes_factor),
        ];

        let mut hasher = Sha512::new();
        hasher.update(parts.join("|"));
        hasher.finalize()
    }

    fn integer(key: &str, value: &ParameterValue) -> Result<usize, ConfigurationError> {
        match value {
            ParameterValue::Integer(v) => Ok(*v),
            _ => Err(Self::mismatch(key, "a non-negative integer")),
        }
    }

    fn float(key: &str, value: &ParameterValue) -> Result<f64, ConfigurationError> {
        match value {
            ParameterValue::Float(v) => Ok(*v),
            ParameterValue::Integer(v) => Ok(*v as f64),
            _ => Err(Self::mismatch(key, "a number")),
        }
    }

    fn mismatch(key: &str, expected: &'static str) -> ConfigurationError {
        ConfigurationError::ParameterTypeMismatch {
            key: key.to_owned(),
            expected,
        }
    }
}

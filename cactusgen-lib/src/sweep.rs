use crate::{
    error::ConfigurationError,
    params::{CactusParameters, ParameterValue},
};

/// Axes of a parameter sweep. Every combination of one value per axis is a
/// parameter set to estimate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterGrid {
    axes: Vec<(String, Vec<ParameterValue>)>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an axis. Unknown keys and empty value lists are rejected here,
    /// before any combination is built.
    pub fn axis(
        mut self,
        key: impl Into<String>,
        values: Vec<ParameterValue>,
    ) -> Result<Self, ConfigurationError> {
        let key = key.into();

        if !CactusParameters::is_known_key(&key) {
            return Err(ConfigurationError::UnknownParameter { key });
        }

        if values.is_empty() {
            return Err(ConfigurationError::EmptyAxis { key });
        }

        self.axes.push((key, values));
        Ok(self)
    }

    /// Number of combinations; an empty grid has exactly one, the base.
    pub fn len(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of the axes applied to `base`, last axis varying
    /// fastest. Every item is validated.
    pub fn combinations<'a>(
        &'a self,
        base: &'a CactusParameters,
    ) -> impl Iterator<Item = Result<CactusParameters, ConfigurationError>> + 'a {
        (0..self.len()).map(move |index| self.combination(base, index))
    }

    fn combination(
        &self,
        base: &CactusParameters,
        mut index: usize,
    ) -> Result<CactusParameters, ConfigurationError> {
        let mut params = base.clone();

        for (key, values) in self.axes.iter().rev() {
            params.apply(key, &values[index % values.len()])?;
            index /= values.len();
        }

        params.validate()?;
        Ok(params)
    }
}

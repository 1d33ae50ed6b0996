use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    error::{ConfigurationError, EstimateError},
    generator::CactusRequestGenerator,
    params::CactusParameters,
    stats::AdvancedGenerationInformation,
    substrate::Substrate,
};

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Monte-Carlo driver for a [`CactusRequestGenerator`].
///
/// Trials are cut into consecutive chunks and every chunk draws from its own
/// RNG seeded from `(seed, chunk index)`. Sequential and parallel runs with
/// the same seed and chunk size therefore produce identical aggregates.
#[derive(Debug, Clone)]
pub struct EmpiricalEstimator {
    iterations: usize,
    seed: u64,
    chunk_size: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl EmpiricalEstimator {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            seed: rand::random(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Once `flag` is set, no further trial starts.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[instrument(skip_all, fields(iterations = self.iterations, seed = self.seed))]
    pub fn estimate(
        &self,
        parameters: &CactusParameters,
        substrate: &Substrate,
    ) -> Result<AdvancedGenerationInformation, EstimateError> {
        let generator = self.prepare(parameters, substrate)?;
        let completed = AtomicU64::new(0);
        let mut result = AdvancedGenerationInformation::new();

        for chunk in 0..self.chunk_count() {
            match self.run_chunk(&generator, chunk, &completed) {
                Some(part) => result.merge(part),
                None => return Err(Self::interrupted(&completed)),
            }
        }

        Self::report(&result);
        Ok(result)
    }

    #[instrument(skip_all, fields(iterations = self.iterations, seed = self.seed))]
    pub fn estimate_parallel(
        &self,
        parameters: &CactusParameters,
        substrate: &Substrate,
    ) -> Result<AdvancedGenerationInformation, EstimateError> {
        let generator = self.prepare(parameters, substrate)?;
        let completed = AtomicU64::new(0);

        // Every started chunk has returned once the reduction does, so the
        // counter is final when it is read.
        let result = (0..self.chunk_count())
            .into_par_iter()
            .map(|chunk| self.run_chunk(&generator, chunk, &completed))
            .try_reduce(AdvancedGenerationInformation::new, |a, b| Some(a.merged(b)))
            .ok_or_else(|| Self::interrupted(&completed))?;

        Self::report(&result);
        Ok(result)
    }

    fn prepare<'a>(
        &self,
        parameters: &CactusParameters,
        substrate: &'a Substrate,
    ) -> Result<CactusRequestGenerator<'a>, ConfigurationError> {
        if self.iterations == 0 {
            return Err(ConfigurationError::NoIterations);
        }

        if self.chunk_size == 0 {
            return Err(ConfigurationError::ZeroChunkSize);
        }

        CactusRequestGenerator::new(parameters, substrate)
    }

    fn chunk_count(&self) -> usize {
        self.iterations.div_ceil(self.chunk_size)
    }

    /// Runs one chunk and adds its finished trials to `completed`. Returns
    /// `None` when the cancellation flag stopped it early.
    fn run_chunk(
        &self,
        generator: &CactusRequestGenerator<'_>,
        chunk: usize,
        completed: &AtomicU64,
    ) -> Option<AdvancedGenerationInformation> {
        let start = chunk * self.chunk_size;
        let trials = self.chunk_size.min(self.iterations - start);
        let mut rng = StdRng::seed_from_u64(Self::chunk_seed(self.seed, chunk));
        let mut result = AdvancedGenerationInformation::new();

        for done in 0..trials {
            if self.cancelled() {
                debug!(chunk, done, "cancelled at trial boundary");
                completed.fetch_add(done as u64, Ordering::Relaxed);
                return None;
            }

            result.record(&generator.generate(&mut rng));
        }

        completed.fetch_add(trials as u64, Ordering::Relaxed);

        debug!(
            chunk,
            trials,
            failed = result.generation_tries_failed(),
            "chunk finished"
        );
        Some(result)
    }

    fn interrupted(completed: &AtomicU64) -> EstimateError {
        EstimateError::Cancelled {
            completed: completed.load(Ordering::Relaxed),
        }
    }

    fn cancelled(&self) -> bool {
        match &self.cancel {
            Some(flag) => flag.load(Ordering::Acquire),
            None => false,
        }
    }

    fn chunk_seed(seed: u64, chunk: usize) -> u64 {
        seed ^ (chunk as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    fn report(result: &AdvancedGenerationInformation) {
        info!(
            tries = result.generation_tries_overall(),
            failed = result.generation_tries_failed(),
            nodes = result.nodes_generated(),
            edges = result.edges_generated(),
            "estimation finished"
        );
    }
}

/// Runs `iterations` trials sequentially with a random seed.
pub fn estimate(
    parameters: &CactusParameters,
    substrate: &Substrate,
    iterations: usize,
) -> Result<AdvancedGenerationInformation, EstimateError> {
    EmpiricalEstimator::new(iterations).estimate(parameters, substrate)
}

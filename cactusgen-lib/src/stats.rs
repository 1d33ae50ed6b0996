//! Streaming aggregate over many generation trials.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    error::{DegenerateResultError, TrialFailure},
    generator::GraphSummary,
};

/// Running totals over generation trials.
///
/// Only per-trial summaries are folded in, never graphs. Two aggregates built
/// from disjoint sets of trials combine with [`merge`] into the aggregate of
/// their union, so trials can be split across workers freely.
///
/// [`merge`]: AdvancedGenerationInformation::merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdvancedGenerationInformation {
    nodes_generated: u64,
    edges_generated: u64,
    generated_cycles: Vec<usize>,
    cycle_lengths: BTreeMap<usize, u64>,
    overall_cycle_edges: u64,
    generation_tries_overall: u64,
    generation_tries_failed: u64,
    node_edge_combination: Vec<(usize, usize)>,
}

impl AdvancedGenerationInformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &Result<GraphSummary, TrialFailure>) {
        match outcome {
            Ok(summary) => self.record_success(summary),
            Err(failure) => self.record_failure(failure),
        }
    }

    pub fn record_success(&mut self, summary: &GraphSummary) {
        self.generation_tries_overall += 1;
        self.nodes_generated += summary.nodes() as u64;
        self.edges_generated += summary.edges() as u64;
        self.generated_cycles.push(summary.cycle_count());
        self.overall_cycle_edges += summary.cycle_edges() as u64;
        self.node_edge_combination
            .push((summary.nodes(), summary.edges()));

        for &length in summary.cycle_lengths() {
            *self.cycle_lengths.entry(length).or_insert(0) += 1;
        }
    }

    pub fn record_failure(&mut self, _failure: &TrialFailure) {
        self.generation_tries_overall += 1;
        self.generation_tries_failed += 1;
    }

    /// Folds `other` into `self`. Sequences of `other` are appended after
    /// those of `self`.
    pub fn merge(&mut self, other: Self) {
        self.nodes_generated += other.nodes_generated;
        self.edges_generated += other.edges_generated;
        self.generated_cycles.extend(other.generated_cycles);
        self.overall_cycle_edges += other.overall_cycle_edges;
        self.generation_tries_overall += other.generation_tries_overall;
        self.generation_tries_failed += other.generation_tries_failed;
        self.node_edge_combination.extend(other.node_edge_combination);

        for (length, count) in other.cycle_lengths {
            *self.cycle_lengths.entry(length).or_insert(0) += count;
        }
    }

    pub fn merged(mut self, other: Self) -> Self {
        self.merge(other);
        self
    }

    pub fn nodes_generated(&self) -> u64 {
        self.nodes_generated
    }

    pub fn edges_generated(&self) -> u64 {
        self.edges_generated
    }

    /// Number of cycles of every successful trial, in fold order.
    pub fn generated_cycles(&self) -> &[usize] {
        &self.generated_cycles
    }

    /// Histogram from cycle length to number of cycles of that length.
    pub fn cycle_lengths(&self) -> &BTreeMap<usize, u64> {
        &self.cycle_lengths
    }

    pub fn overall_cycle_edges(&self) -> u64 {
        self.overall_cycle_edges
    }

    pub fn generation_tries_overall(&self) -> u64 {
        self.generation_tries_overall
    }

    pub fn generation_tries_failed(&self) -> u64 {
        self.generation_tries_failed
    }

    /// `(nodes, edges)` of every successful trial, in fold order.
    pub fn node_edge_combination(&self) -> &[(usize, usize)] {
        &self.node_edge_combination
    }

    pub fn successful_trials(&self) -> u64 {
        self.generation_tries_overall - self.generation_tries_failed
    }

    pub fn expected_nodes(&self) -> Result<f64, DegenerateResultError> {
        self.per_success(self.nodes_generated)
    }

    pub fn expected_edges(&self) -> Result<f64, DegenerateResultError> {
        self.per_success(self.edges_generated)
    }

    pub fn expected_cycles(&self) -> Result<f64, DegenerateResultError> {
        let cycles = self.generated_cycles.iter().map(|&c| c as u64).sum();
        self.per_success(cycles)
    }

    /// Fraction of all generated edges that lie on a cycle.
    pub fn cycle_edge_fraction(&self) -> Result<f64, DegenerateResultError> {
        self.successes()?;

        if self.edges_generated == 0 {
            return Err(DegenerateResultError::NoEdgesGenerated);
        }

        Ok(self.overall_cycle_edges as f64 / self.edges_generated as f64)
    }

    pub fn failure_rate(&self) -> Result<f64, DegenerateResultError> {
        if self.generation_tries_overall == 0 {
            return Err(DegenerateResultError::NoTrials);
        }

        Ok(self.generation_tries_failed as f64 / self.generation_tries_overall as f64)
    }

    /// Edge counts of successful trials grouped by their node count.
    pub fn edge_counts_by_node_count(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut result: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        for &(nodes, edges) in &self.node_edge_combination {
            result.entry(nodes).or_default().push(edges);
        }

        result
    }

    fn successes(&self) -> Result<u64, DegenerateResultError> {
        match (self.generation_tries_overall, self.successful_trials()) {
            (0, _) => Err(DegenerateResultError::NoTrials),
            (attempts, 0) => Err(DegenerateResultError::NoSuccessfulTrials { attempts }),
            (_, successes) => Ok(successes),
        }
    }

    fn per_success(&self, total: u64) -> Result<f64, DegenerateResultError> {
        let successes = self.successes()?;
        Ok(total as f64 / successes as f64)
    }
}

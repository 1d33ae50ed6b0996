mod logging;

use std::{collections::BTreeMap, process::ExitCode};

use cactusgen_lib::{
    AdvancedGenerationInformation, CactusParameters, DegenerateResultError, EmpiricalEstimator,
    EstimateError, ParameterGrid, ParameterValue, Substrate,
};
use rayon::prelude::*;
use tracing::{error, info, warn};

const DEFAULT_ITERATIONS: usize = 100_000;

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }

    let iterations = match std::env::args().nth(1) {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(err) => {
                error!(%raw, %err, "iterations must be a non-negative integer");
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_ITERATIONS,
    };

    let substrate = match simple_substrate() {
        Ok(s) => s,
        Err(err) => {
            error!(%err, "failed to build the substrate");
            return ExitCode::FAILURE;
        }
    };

    let combinations = match sweep() {
        Ok(c) => c,
        Err(err) => {
            error!(%err, "invalid parameter grid");
            return ExitCode::FAILURE;
        }
    };

    info!(
        combinations = combinations.len(),
        iterations, "inspecting cactus request generation"
    );

    let results = combinations
        .par_iter()
        .map(|params| {
            EmpiricalEstimator::new(iterations)
                .with_seed(params.seed())
                .estimate(params, &substrate)
        })
        .collect::<Vec<Result<AdvancedGenerationInformation, EstimateError>>>();

    let mut failed = false;
    for (index, (params, result)) in combinations.iter().zip(results).enumerate() {
        match result {
            Ok(info) => report(index, params, &info),
            Err(err) => {
                error!(index, %err, "estimation failed");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn simple_substrate() -> Result<Substrate, cactusgen_lib::SubstrateError> {
    let capacity = || BTreeMap::from([(String::from("universal"), 1000.0)]);

    let mut substrate = Substrate::new("stupid_simple");
    substrate.add_node("u", ["universal"], capacity(), 1000.0)?;
    substrate.add_node("v", ["universal"], capacity(), 1000.0)?;
    substrate.add_edge("u", "v", 1000.0, 1000.0, true)?;
    Ok(substrate)
}

fn sweep() -> Result<Vec<CactusParameters>, cactusgen_lib::ConfigurationError> {
    let base = CactusParameters {
        min_number_of_nodes: 3,
        layers: 4,
        branching_distribution: vec![0.1, 0.4, 0.3, 0.2],
        ..Default::default()
    };

    ParameterGrid::new()
        .axis(
            "max_number_of_nodes",
            vec![ParameterValue::Integer(6), ParameterValue::Integer(12)],
        )?
        .axis(
            "probability",
            vec![
                ParameterValue::Float(0.0),
                ParameterValue::Float(0.3),
                ParameterValue::Float(0.6),
            ],
        )?
        .axis(
            "max_cycles",
            vec![ParameterValue::Integer(2), ParameterValue::Integer(4)],
        )?
        .combinations(&base)
        .collect()
}

fn report(index: usize, params: &CactusParameters, info: &AdvancedGenerationInformation) {
    let failure_rate = info.failure_rate().unwrap_or(0.0) * 100.0;

    match expectations(info) {
        Ok((nodes, edges, cycles, cycle_edges)) => {
            println!(
                "#{} max |V| {}, p {}, max |C| {} | Exp. |V|: {:.3}; Exp. |E|: {:.3}; Exp. |C|: {:.3}; Exp. CC: {:.3} | failed: {:.2}%",
                index,
                params.max_number_of_nodes,
                params.probability,
                params.max_cycles,
                nodes,
                edges,
                cycles,
                cycle_edges,
                failure_rate
            );
            for line in distributions(info) {
                println!("    {}", line);
            }
        }
        Err(err) => {
            warn!(index, %err, failure_rate, "no usable samples, ratios withheld");
            println!(
                "#{} max |V| {}, p {}, max |C| {} | failed: {:.2}%",
                index,
                params.max_number_of_nodes,
                params.probability,
                params.max_cycles,
                failure_rate
            );
        }
    }
}

fn expectations(
    info: &AdvancedGenerationInformation,
) -> Result<(f64, f64, f64, f64), DegenerateResultError> {
    Ok((
        info.expected_nodes()?,
        info.expected_edges()?,
        info.expected_cycles()?,
        info.cycle_edge_fraction()?,
    ))
}

/// Edge counts per node count and the cycle-count histogram of the
/// successful trials, one line each.
fn distributions(info: &AdvancedGenerationInformation) -> Vec<String> {
    let mut lines = info
        .edge_counts_by_node_count()
        .into_iter()
        .map(|(nodes, edges)| {
            let min = edges.iter().copied().min().unwrap_or(0);
            let max = edges.iter().copied().max().unwrap_or(0);
            let mean = edges.iter().sum::<usize>() as f64 / edges.len() as f64;
            format!(
                "|V| {}: |E| {}..={}, mean {:.3} ({} trials)",
                nodes,
                min,
                max,
                mean,
                edges.len()
            )
        })
        .collect::<Vec<String>>();

    let mut cycles: BTreeMap<usize, u64> = BTreeMap::new();
    for &count in info.generated_cycles() {
        *cycles.entry(count).or_default() += 1;
    }
    let histogram = cycles
        .iter()
        .map(|(count, trials)| format!("{}: {}", count, trials))
        .collect::<Vec<String>>();
    lines.push(format!("|C| histogram: {}", histogram.join(", ")));

    lines
}

use std::collections::HashMap;

use log::{info, warn};

use voltaic_core::circuit::Circuit;
use voltaic_core::config::SolverConfig;
use voltaic_core::preprocess::preprocess;
use voltaic_devices::component::Component;
use voltaic_devices::stamp::{StampContext, Stampable};
use voltaic_numeric::matrix::DenseMatrix;
use voltaic_numeric::solve::cascading_solve;

use crate::convergence::convergence_check;
use crate::error::Error;

/// The steady-state operating point: node voltages and branch currents keyed
/// by name, plus whether mode iteration converged (always `true` for purely
/// linear circuits, which solve in a single pass).
#[derive(Debug, Clone)]
pub struct DcResult {
    pub node_voltages: HashMap<String, f64>,
    pub branch_currents: HashMap<String, f64>,
    pub converged: bool,
}

/// Solves for the DC operating point: capacitors are treated as open
/// circuits (their stamp is skipped entirely) and inductors as shorts (their
/// existing zero-conductance, present-current stamp already approximates
/// this at `t = 0`, since the state vector starts at each inductor's initial
/// current). Nonlinear devices start from whatever mode an empty solution
/// implies (diodes derive `Off`, MOSFETs derive cutoff) and iterate until
/// the solution stops changing mode or the iteration cap is hit.
pub fn solve_dc(circuit: &Circuit, config: &SolverConfig) -> Result<DcResult, Error> {
    let plan = preprocess(circuit, config)?;
    let has_nonlinear = circuit
        .components()
        .iter()
        .any(|c| !matches!(c, Component::Capacitor(_)) && c.is_nonlinear());

    let unknowns = plan.index_map.total_size();
    let mut solution: Vec<f64> = Vec::new();
    let mut converged = false;

    for iteration in 0..config.maximum_iterations {
        let (matrix, rhs) = assemble_dc(circuit, &plan.index_map, &solution, &plan.initial_state, config);
        let guess = if solution.is_empty() { vec![0.0; unknowns] } else { solution.clone() };
        let outcome = cascading_solve(&matrix, &rhs, &guess, &config.linear_solver)?;

        if !has_nonlinear {
            solution = outcome.x;
            converged = true;
            break;
        }

        if convergence_check(&solution, &outcome.x, plan.index_map.node_count(), config) {
            info!("dc operating point converged after {} iterations", iteration + 1);
            solution = outcome.x;
            converged = true;
            break;
        }
        solution = outcome.x;
    }

    if !converged && has_nonlinear {
        warn!("dc operating point did not settle after {} iterations", config.maximum_iterations);
    }

    let mut node_voltages = HashMap::new();
    for (name, &index) in plan.index_map.nodes_iter() {
        node_voltages.insert(name.clone(), solution[index]);
    }
    let mut branch_currents = HashMap::new();
    for (identifier, &index) in plan.index_map.currents_iter() {
        branch_currents.insert(identifier.clone(), solution[index]);
    }

    Ok(DcResult {
        node_voltages,
        branch_currents,
        converged,
    })
}

fn assemble_dc(
    circuit: &Circuit,
    index_map: &voltaic_devices::index_map::IndexMap,
    solution: &[f64],
    initial_state: &[f64],
    config: &SolverConfig,
) -> (DenseMatrix, Vec<f64>) {
    let mut conductance = Vec::new();
    let mut rhs_entries = Vec::new();
    let mut state_cursor = 0usize;

    for component in circuit.components() {
        let state_index = if component.is_state_variable() {
            let index = state_cursor;
            state_cursor += 1;
            Some(index)
        } else {
            None
        };

        if matches!(component, Component::Capacitor(_)) {
            continue;
        }

        let ctx = StampContext {
            index_map,
            solution,
            state: initial_state,
            state_index,
            t: 0.0,
        };
        conductance.extend(component.stamp_conductance(&ctx));
        rhs_entries.extend(component.stamp_rhs(&ctx));
    }

    let mut matrix = DenseMatrix::from_triplets(index_map.total_size(), &conductance);
    matrix.add_to_diagonal(config.gmin);

    let mut rhs = vec![0.0; index_map.total_size()];
    for entry in rhs_entries {
        rhs[entry.row] += entry.value;
    }
    (matrix, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_devices::diode::Diode;
    use voltaic_devices::resistor::Resistor;
    use voltaic_devices::voltage_source::VoltageSource;
    use voltaic_devices::waveform::Waveform;

    #[test]
    fn resistor_divider_splits_voltage_evenly() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::VoltageSource(VoltageSource::new(
            "1",
            "in",
            "0",
            Waveform::Dc { value: 10.0 },
        )));
        circuit.add_component(Component::Resistor(Resistor::new("1", "in", "out", 1_000.0).unwrap()));
        circuit.add_component(Component::Resistor(Resistor::new("2", "out", "0", 1_000.0).unwrap()));

        let result = solve_dc(&circuit, &SolverConfig::default()).unwrap();
        assert!(result.converged);
        assert!((result.node_voltages["out"] - 5.0).abs() < 1e-6);
        assert!((result.node_voltages["in"] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn diode_limiter_clamps_output_near_forward_voltage() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::VoltageSource(VoltageSource::new(
            "1",
            "1",
            "0",
            Waveform::Dc { value: 5.0 },
        )));
        circuit.add_component(Component::Resistor(Resistor::new("1", "1", "2", 1_000.0).unwrap()));
        circuit.add_component(Component::Diode(Diode::new("1", "2", "0", 0.7, 1e-3, 1e6).unwrap()));

        let result = solve_dc(&circuit, &SolverConfig::default()).unwrap();
        assert!(result.converged);
        assert!((result.node_voltages["1"] - 5.0).abs() < 1e-6);
        assert!((result.node_voltages["2"] - 0.7).abs() < 0.01);
        assert!((result.branch_currents["V1"] - (-4.3e-3)).abs() < 0.1e-3);
    }
}

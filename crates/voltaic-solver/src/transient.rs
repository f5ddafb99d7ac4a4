use std::collections::HashMap;

use log::{debug, info};

use voltaic_core::circuit::Circuit;
use voltaic_core::config::SolverConfig;
use voltaic_core::preprocess::{preprocess, Plan};
use voltaic_devices::component::Component;
use voltaic_devices::index_map::IndexMap;
use voltaic_devices::stamp::{StampContext, Stampable};
use voltaic_numeric::matrix::DenseMatrix;
use voltaic_numeric::solve::cascading_solve;

use crate::error::{Error, PartialTransientResult};
use crate::integration::IntegrationMethod;

/// A caller-supplied control function: given the present time, returns the
/// `{component_name -> value}` map applied via each device's mutable drive
/// input (PWM gate signals, commanded switch state, and the like).
pub type ControlFn<'a> = dyn FnMut(f64) -> HashMap<String, f64> + 'a;

#[derive(Debug, Clone)]
pub struct TransientParams {
    pub start_time: f64,
    pub stop_time: f64,
    pub time_step: f64,
    pub max_time_step: Option<f64>,
    pub method: IntegrationMethod,
}

impl Default for TransientParams {
    fn default() -> Self {
        TransientParams {
            start_time: 0.0,
            stop_time: 1e-3,
            time_step: 1e-6,
            max_time_step: None,
            method: IntegrationMethod::ForwardEuler,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransientResult {
    pub times: Vec<f64>,
    pub node_voltages: HashMap<String, Vec<f64>>,
    pub state_variables: HashMap<String, Vec<f64>>,
}

/// Runs a full transient from `params.start_time` to `params.stop_time`,
/// bootstrapping initial voltages with one solve at `t_start`, then stepping
/// with a fixed time step. `progress`, if given, is invoked after every step
/// with `(step_index, time)`; returning `false` cancels the run early.
pub fn run_transient(
    circuit: &mut Circuit,
    config: &SolverConfig,
    params: &TransientParams,
    mut control_fn: Option<&mut ControlFn<'_>>,
    mut progress: Option<&mut dyn FnMut(usize, f64) -> bool>,
) -> Result<TransientResult, PartialTransientResult> {
    if params.method != IntegrationMethod::ForwardEuler {
        return Err(PartialTransientResult::empty(Error::Unsupported(params.method.name())));
    }

    let plan = preprocess(circuit, config).map_err(|e| PartialTransientResult::empty(e.into()))?;
    let dt = params.time_step;
    let num_steps = ((params.stop_time - params.start_time) / dt).round().max(0.0) as usize;

    let mut state = plan.initial_state.clone();
    let mut solution = vec![0.0; plan.index_map.total_size()];
    let mut time = params.start_time;

    let (matrix, rhs) = assemble_step(circuit, &plan, config, &state, &solution, time);
    let outcome = cascading_solve(&matrix, &rhs, &solution, &config.linear_solver)
        .map_err(|e| PartialTransientResult::empty(e.into()))?;
    solution = outcome.x;

    let mut times = vec![time];
    let mut node_voltages: HashMap<String, Vec<f64>> =
        plan.index_map.nodes_iter().map(|(name, _)| (name.clone(), Vec::new())).collect();
    for (name, &index) in plan.index_map.nodes_iter() {
        node_voltages.get_mut(name).unwrap().push(solution[index]);
    }
    let mut state_variables: HashMap<String, Vec<f64>> = plan
        .state_variables
        .iter()
        .map(|sv| (sv.component_name.clone(), vec![sv.initial_value]))
        .collect();

    info!(
        "starting transient analysis from t={}s to t={}s with a {}s time step ({} steps)",
        params.start_time, params.stop_time, dt, num_steps
    );

    'stepping: for step in 1..=num_steps {
        if let Some(control_fn) = control_fn.as_mut() {
            let controls = control_fn(time);
            for component in circuit.components_mut() {
                if let Some(&value) = controls.get(component.name()) {
                    component.apply_control(value);
                }
            }
        }

        if let Err(e) = advance(circuit, &plan, config, &mut state, &mut solution, &mut time, dt, step) {
            return Err(PartialTransientResult {
                error: e,
                trajectory: TransientResult {
                    times,
                    node_voltages,
                    state_variables,
                },
            });
        }

        times.push(time);
        for (name, &index) in plan.index_map.nodes_iter() {
            node_voltages.get_mut(name).unwrap().push(solution[index]);
        }
        for (index, sv) in plan.state_variables.iter().enumerate() {
            state_variables.get_mut(&sv.component_name).unwrap().push(state[index]);
        }

        if step % config.progress_log_interval == 0 {
            info!("transient step {step}/{num_steps} (t={time:.6}s)");
        } else {
            debug!("transient step {step}/{num_steps} (t={time:.6}s)");
        }

        if let Some(progress) = progress.as_mut() {
            if !progress(step, time) {
                break 'stepping;
            }
        }
    }

    Ok(TransientResult {
        times,
        node_voltages,
        state_variables,
    })
}

/// The stepping interface for feedback/closed-loop simulations, where the
/// caller injects controls one step at a time rather than handing over a
/// whole-run control function.
pub struct TransientStepper {
    circuit: Circuit,
    plan: Plan,
    config: SolverConfig,
    state: Vec<f64>,
    solution: Vec<f64>,
    time: f64,
    dt: f64,
    step_index: usize,
}

#[derive(Debug, Clone)]
pub struct StepOutput {
    pub time: f64,
    pub node_voltages: HashMap<String, f64>,
    pub state_variables: HashMap<String, f64>,
}

impl TransientStepper {
    pub fn init(circuit: Circuit, config: SolverConfig, dt: f64) -> Result<Self, Error> {
        let plan = preprocess(&circuit, &config)?;
        let state = plan.initial_state.clone();
        let solution = vec![0.0; plan.index_map.total_size()];
        let mut stepper = TransientStepper {
            circuit,
            plan,
            config,
            state,
            solution,
            time: 0.0,
            dt,
            step_index: 0,
        };
        let (matrix, rhs) = assemble_step(&stepper.circuit, &stepper.plan, &stepper.config, &stepper.state, &stepper.solution, stepper.time);
        let outcome = cascading_solve(&matrix, &rhs, &stepper.solution, &stepper.config.linear_solver)?;
        stepper.solution = outcome.x;
        Ok(stepper)
    }

    pub fn step(&mut self, controls: Option<&HashMap<String, f64>>) -> Result<StepOutput, Error> {
        if let Some(controls) = controls {
            for component in self.circuit.components_mut() {
                if let Some(&value) = controls.get(component.name()) {
                    component.apply_control(value);
                }
            }
        }

        self.step_index += 1;
        advance(
            &self.circuit,
            &self.plan,
            &self.config,
            &mut self.state,
            &mut self.solution,
            &mut self.time,
            self.dt,
            self.step_index,
        )?;

        let mut node_voltages = HashMap::new();
        for (name, &index) in self.plan.index_map.nodes_iter() {
            node_voltages.insert(name.clone(), self.solution[index]);
        }
        let mut state_variables = HashMap::new();
        for (index, sv) in self.plan.state_variables.iter().enumerate() {
            state_variables.insert(sv.component_name.clone(), self.state[index]);
        }

        Ok(StepOutput {
            time: self.time,
            node_voltages,
            state_variables,
        })
    }

    pub fn destroy(self) {}
}

fn assemble_step(
    circuit: &Circuit,
    plan: &Plan,
    config: &SolverConfig,
    state: &[f64],
    solution_guess: &[f64],
    t: f64,
) -> (DenseMatrix, Vec<f64>) {
    let mut matrix = plan.base_matrix.clone();
    if plan.has_nonlinear_components {
        let mut state_cursor = 0usize;
        for component in circuit.components() {
            let state_index = if component.is_state_variable() {
                let index = state_cursor;
                state_cursor += 1;
                Some(index)
            } else {
                None
            };
            if component.is_nonlinear() {
                let ctx = StampContext {
                    index_map: &plan.index_map,
                    solution: solution_guess,
                    state,
                    state_index,
                    t,
                };
                for triplet in component.stamp_conductance(&ctx) {
                    matrix.add(triplet.row, triplet.col, triplet.value);
                }
            }
        }
    }

    let mut rhs = vec![0.0; plan.index_map.total_size()];
    let mut state_cursor = 0usize;
    for component in circuit.components() {
        let state_index = if component.is_state_variable() {
            let index = state_cursor;
            state_cursor += 1;
            Some(index)
        } else {
            None
        };
        let ctx = StampContext {
            index_map: &plan.index_map,
            solution: solution_guess,
            state,
            state_index,
            t,
        };
        for entry in component.stamp_rhs(&ctx) {
            rhs[entry.row] += entry.value;
        }
    }
    (matrix, rhs)
}

fn detect_event(circuit: &Circuit, index_map: &IndexMap, previous: &[f64], tentative: &[f64]) -> Option<usize> {
    let mut candidates: Vec<(u8, usize)> = Vec::new();
    for (index, component) in circuit.components().iter().enumerate() {
        if let Some(priority) = component.event_priority() {
            if let (Some(before), Some(after)) =
                (component.zero_crossing(previous, index_map), component.zero_crossing(tentative, index_map))
            {
                if before.signum() != after.signum() {
                    candidates.push((priority, index));
                }
            }
        }
    }
    candidates.sort_by_key(|&(priority, _)| priority);
    candidates.first().map(|&(_, index)| index)
}

/// Bisects `[t0, t1]` to find where `circuit.components()[component_index]`'s
/// zero-crossing function changes sign, re-solving the resistive network at
/// each midpoint.
#[allow(clippy::too_many_arguments)]
fn localize_event(
    circuit: &Circuit,
    plan: &Plan,
    config: &SolverConfig,
    state: &[f64],
    previous_solution: &[f64],
    t0: f64,
    t1: f64,
    component_index: usize,
    step: usize,
) -> Result<(f64, Vec<f64>), Error> {
    let mut lo = t0;
    let mut hi = t1;
    let mut lo_solution = previous_solution.to_vec();

    for _ in 0..config.max_event_bisection_iterations {
        let mid = 0.5 * (lo + hi);
        let (matrix, rhs) = assemble_step(circuit, plan, config, state, &lo_solution, mid);
        let outcome = cascading_solve(&matrix, &rhs, &lo_solution, &config.linear_solver)?;
        let mid_solution = outcome.x;

        let component = &circuit.components()[component_index];
        let crossing_mid = component
            .zero_crossing(&mid_solution, &plan.index_map)
            .expect("event component always reports a zero crossing");
        let crossing_lo = component
            .zero_crossing(&lo_solution, &plan.index_map)
            .expect("event component always reports a zero crossing");

        if crossing_mid.abs() < config.event_localization_tolerance {
            return Ok((mid, mid_solution));
        }
        if crossing_mid.signum() == crossing_lo.signum() {
            lo = mid;
            lo_solution = mid_solution;
        } else {
            hi = mid;
        }
    }

    Err(Error::EventLocalizationFailed {
        step,
        iterations: config.max_event_bisection_iterations,
    })
}

fn compute_derivatives(
    circuit: &Circuit,
    plan: &Plan,
    solution: &[f64],
    state: &[f64],
    config: &SolverConfig,
) -> Result<Vec<f64>, Error> {
    let mut derivatives = vec![0.0; plan.state_variables.len()];

    for (index, sv) in plan.state_variables.iter().enumerate() {
        let component = &circuit.components()[sv.component_index];
        match component {
            Component::Capacitor(capacitor) => {
                let vp = plan.index_map.node(&capacitor.plus).map(|i| solution[i]).unwrap_or(0.0);
                let vm = plan.index_map.node(&capacitor.minus).map(|i| solution[i]).unwrap_or(0.0);
                let current = capacitor.current(vp, vm, state[index]);
                let clamp = config.capacitor_voltage_clamp;
                derivatives[index] = capacitor.derivative(current).clamp(-clamp, clamp);
            }
            Component::Inductor(inductor) => {
                let vp = plan.index_map.node(&inductor.plus).map(|i| solution[i]).unwrap_or(0.0);
                let vm = plan.index_map.node(&inductor.minus).map(|i| solution[i]).unwrap_or(0.0);
                derivatives[index] = inductor.derivative(vp, vm);
            }
            _ => {}
        }
    }

    for group in circuit.coupled_inductor_groups() {
        let member_indices: Vec<usize> = group
            .inductor_names
            .iter()
            .map(|name| {
                plan.state_variables
                    .iter()
                    .position(|sv| &sv.component_name == name)
                    .expect("coupled inductor group member must be a registered state variable")
            })
            .collect();

        let inductances: Vec<f64> = member_indices
            .iter()
            .map(|&i| match &circuit.components()[plan.state_variables[i].component_index] {
                Component::Inductor(inductor) => inductor.inductance,
                _ => unreachable!("coupled inductor group member must be an inductor"),
            })
            .collect();

        let voltages: Vec<f64> = member_indices
            .iter()
            .map(|&i| match &circuit.components()[plan.state_variables[i].component_index] {
                Component::Inductor(inductor) => {
                    let vp = plan.index_map.node(&inductor.plus).map(|j| solution[j]).unwrap_or(0.0);
                    let vm = plan.index_map.node(&inductor.minus).map(|j| solution[j]).unwrap_or(0.0);
                    vp - vm
                }
                _ => unreachable!("coupled inductor group member must be an inductor"),
            })
            .collect();

        let group_derivatives = group.derivatives(&inductances, &voltages)?;
        for (k, &i) in member_indices.iter().enumerate() {
            derivatives[i] = group_derivatives[k];
        }
    }

    Ok(derivatives)
}

#[allow(clippy::too_many_arguments)]
fn advance(
    circuit: &Circuit,
    plan: &Plan,
    config: &SolverConfig,
    state: &mut Vec<f64>,
    solution: &mut Vec<f64>,
    time: &mut f64,
    dt: f64,
    step: usize,
) -> Result<(), Error> {
    let t_next = *time + dt;
    let (matrix, rhs) = assemble_step(circuit, plan, config, state, solution, t_next);
    let outcome = cascading_solve(&matrix, &rhs, solution, &config.linear_solver)?;
    let mut new_solution = outcome.x;
    let mut t_used = t_next;

    if plan.has_nonlinear_components {
        if let Some(component_index) = detect_event(circuit, &plan.index_map, solution, &new_solution) {
            let (event_time, event_solution) =
                localize_event(circuit, plan, config, state, solution, *time, t_next, component_index, step)?;
            t_used = event_time;
            new_solution = event_solution;
        }
    }

    let dt_used = t_used - *time;
    let derivatives = compute_derivatives(circuit, plan, &new_solution, state, config)?;
    for (index, derivative) in derivatives.iter().enumerate() {
        state[index] += dt_used * derivative;
    }

    if new_solution.iter().chain(state.iter()).any(|v| !v.is_finite()) {
        return Err(Error::NumericalBlowup { step, time: t_used });
    }

    *solution = new_solution;
    *time = t_used;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_devices::capacitor::Capacitor;
    use voltaic_devices::diode::Diode;
    use voltaic_devices::inductor::Inductor;
    use voltaic_devices::resistor::Resistor;
    use voltaic_devices::voltage_source::VoltageSource;
    use voltaic_devices::waveform::Waveform;

    fn rc_circuit() -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::VoltageSource(VoltageSource::new(
            "1",
            "in",
            "0",
            Waveform::Dc { value: 5.0 },
        )));
        circuit.add_component(Component::Resistor(Resistor::new("1", "in", "out", 1_000.0).unwrap()));
        circuit.add_component(Component::Capacitor(Capacitor::new("1", "out", "0", 1e-6, 0.0).unwrap()));
        circuit
    }

    #[test]
    fn rc_charge_approaches_source_voltage() {
        let mut circuit = rc_circuit();
        let config = SolverConfig::default();
        let params = TransientParams {
            start_time: 0.0,
            stop_time: 5e-3,
            time_step: 1e-6,
            max_time_step: None,
            method: IntegrationMethod::ForwardEuler,
        };
        let result = run_transient(&mut circuit, &config, &params, None, None).unwrap();
        let final_voltage = *result.state_variables["1"].last().unwrap();
        assert!(final_voltage > 4.9, "expected capacitor to approach 5V, got {final_voltage}");
    }

    #[test]
    fn stepper_advances_one_step_at_a_time() {
        let circuit = rc_circuit();
        let mut stepper = TransientStepper::init(circuit, SolverConfig::default(), 1e-6).unwrap();
        let first = stepper.step(None).unwrap();
        assert!((first.time - 1e-6).abs() < 1e-12);
        let second = stepper.step(None).unwrap();
        assert!((second.time - 2e-6).abs() < 1e-12);
        stepper.destroy();
    }

    #[test]
    fn diode_half_wave_rectifier_clips_negative_swing() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::VoltageSource(VoltageSource::new(
            "1",
            "ac",
            "0",
            Waveform::Sine {
                offset: 0.0,
                amplitude: 10.0,
                frequency: 1000.0,
                delay: 0.0,
                damping: 0.0,
            },
        )));
        circuit.add_component(Component::Diode(Diode::new("1", "ac", "dc", 0.7, 10e-3, 1e6).unwrap()));
        circuit.add_component(Component::Resistor(Resistor::new("load", "dc", "0", 1_000.0).unwrap()));

        let config = SolverConfig::default();
        let params = TransientParams {
            start_time: 0.0,
            stop_time: 5e-3,
            time_step: 2e-6,
            max_time_step: None,
            method: IntegrationMethod::ForwardEuler,
        };
        let result = run_transient(&mut circuit, &config, &params, None, None).unwrap();
        let dc = &result.node_voltages["dc"];
        let max = dc.iter().cloned().fold(f64::MIN, f64::max);
        let min = dc.iter().cloned().fold(f64::MAX, f64::min);
        let average: f64 = dc.iter().sum::<f64>() / dc.len() as f64;
        assert!((max - 9.3).abs() < 0.2, "expected max(V(dc)) ~= 9.3V, got {max}");
        assert!(min >= -0.1, "expected min(V(dc)) >= -0.1V, got {min}");
        assert!(average > 0.0, "expected a net positive average, got {average}");
    }

    #[test]
    fn buck_average_model_holds_steady_state() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::VoltageSource(VoltageSource::new(
            "1",
            "vin",
            "0",
            Waveform::Dc { value: 12.0 },
        )));
        circuit.add_component(Component::Inductor(Inductor::new("1", "vin", "out", 150e-6, 1.2).unwrap()));
        circuit.add_component(Component::Diode(Diode::new("1", "0", "out", 0.7, 10e-3, 1e6).unwrap()));
        circuit.add_component(Component::Capacitor(Capacitor::new("2", "out", "0", 47e-6, 12.0).unwrap()));
        circuit.add_component(Component::Resistor(Resistor::new("load", "out", "0", 10.0).unwrap()));

        let config = SolverConfig::default();
        let params = TransientParams {
            start_time: 0.0,
            stop_time: 200e-6,
            time_step: 1e-6,
            max_time_step: None,
            method: IntegrationMethod::ForwardEuler,
        };
        let result = run_transient(&mut circuit, &config, &params, None, None).unwrap();
        let final_voltage = *result.node_voltages["out"].last().unwrap();
        let final_current = *result.state_variables["1"].last().unwrap();
        assert!((final_voltage - 12.0).abs() / 12.0 < 0.05, "expected V(out) ~= 12V +/- 5%, got {final_voltage}");
        assert!((final_current - 1.2).abs() / 1.2 < 0.05, "expected I(L) ~= 1.2A +/- 5%, got {final_current}");
    }

    #[test]
    fn rlc_step_response_overshoots_and_rings_near_natural_frequency() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::VoltageSource(VoltageSource::new(
            "1",
            "in",
            "0",
            Waveform::Dc { value: 5.0 },
        )));
        circuit.add_component(Component::Resistor(Resistor::new("1", "in", "a", 1.0).unwrap()));
        circuit.add_component(Component::Inductor(Inductor::new("1", "a", "b", 10e-6, 0.0).unwrap()));
        circuit.add_component(Component::Capacitor(Capacitor::new("2", "b", "0", 1e-6, 0.0).unwrap()));

        let config = SolverConfig::default();
        let params = TransientParams {
            start_time: 0.0,
            stop_time: 60e-6,
            time_step: 2e-9,
            max_time_step: None,
            method: IntegrationMethod::ForwardEuler,
        };
        let result = run_transient(&mut circuit, &config, &params, None, None).unwrap();
        let times = &result.times;
        let vc = &result.node_voltages["b"];

        let peak = vc.iter().cloned().fold(f64::MIN, f64::max);
        assert!(peak > 5.0 * 1.4, "expected first-peak overshoot > 40% of V_in, got peak {peak}");

        let mut peak_times = Vec::new();
        for i in 1..vc.len() - 1 {
            if vc[i] > vc[i - 1] && vc[i] >= vc[i + 1] {
                peak_times.push(times[i]);
            }
            if peak_times.len() == 2 {
                break;
            }
        }
        assert_eq!(peak_times.len(), 2, "expected to observe at least two ringing peaks");
        let period = peak_times[1] - peak_times[0];
        let measured_frequency = 1.0 / period;
        let expected_frequency = 1.0 / (2.0 * std::f64::consts::PI * (10e-6_f64 * 1e-6).sqrt());
        let relative_error = (measured_frequency - expected_frequency).abs() / expected_frequency;
        assert!(
            relative_error < 0.1,
            "expected oscillation frequency within 10% of {expected_frequency}, got {measured_frequency}"
        );
    }
}

use serde::Deserialize;
use voltaic_numeric::LinearSolverConfig;

/// Every numeric tunable the core exposes, collected into one struct so it
/// can be loaded from an optional TOML file at the CLI boundary. The library
/// itself only ever consumes a value of this type; it never touches the
/// filesystem.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Relative convergence tolerance for the DC mode-iteration and
    /// Newton-like loops.
    pub relative_tolerance: f64,
    pub current_absolute_tolerance: f64,
    pub voltage_absolute_tolerance: f64,
    /// Iteration cap for DC operating-point mode iteration.
    pub maximum_iterations: usize,
    /// Small conductance added to every diagonal for numerical regularization.
    pub gmin: f64,
    /// The capacitor companion model's large-admittance constant, in siemens.
    pub large_admittance: f64,
    pub minimum_resistance: f64,
    pub minimum_conductance: f64,
    /// Bounds a single step's change in capacitor voltage to this many volts,
    /// the integrator's blowup protection clamp.
    pub capacitor_voltage_clamp: f64,
    pub max_event_bisection_iterations: usize,
    pub event_localization_tolerance: f64,
    pub min_time_step: f64,
    pub max_time_step_multiplier: f64,
    /// Emit a progress log line every this many transient steps.
    pub progress_log_interval: usize,
    #[serde(skip)]
    pub linear_solver: LinearSolverConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            relative_tolerance: 0.001,
            current_absolute_tolerance: 1e-12,
            voltage_absolute_tolerance: 1e-6,
            maximum_iterations: 300,
            gmin: 1e-12,
            large_admittance: voltaic_devices::capacitor::DEFAULT_LARGE_ADMITTANCE,
            minimum_resistance: 1e-3,
            minimum_conductance: 1e-12,
            capacitor_voltage_clamp: 50.0,
            max_event_bisection_iterations: 50,
            event_localization_tolerance: 1e-12,
            min_time_step: 1e-15,
            max_time_step_multiplier: 10.0,
            progress_log_interval: 1000,
            linear_solver: LinearSolverConfig::default(),
        }
    }
}

use log::warn;

use voltaic_devices::component::StateKind;
use voltaic_devices::index_map::{is_ground, IndexMap};
use voltaic_devices::stamp::{StampContext, Stampable};
use voltaic_numeric::matrix::{DenseMatrix, Triplet};

use crate::circuit::Circuit;
use crate::error::Error;
use crate::config::SolverConfig;

/// A single integration-state unknown (a capacitor voltage or an inductor
/// current), carrying enough back-reference to let the transient integrator
/// find the component that owns it again without a name lookup per step.
#[derive(Debug, Clone)]
pub struct StateVariable {
    pub component_name: String,
    pub component_index: usize,
    pub kind: StateKind,
    pub initial_value: f64,
}

/// The immutable result of preprocessing a [`Circuit`]: every index a solver
/// needs to stamp and solve, assembled once up front. Running preprocessing
/// twice on the same circuit produces the same indices, the same initial
/// state, and the same base matrix every time.
#[derive(Debug, Clone)]
pub struct Plan {
    pub index_map: IndexMap,
    pub state_variables: Vec<StateVariable>,
    pub initial_state: Vec<f64>,
    pub base_matrix: DenseMatrix,
    pub has_nonlinear_components: bool,
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn unknown_count(&self) -> usize {
        self.index_map.total_size()
    }
}

/// Builds a [`Plan`] from a circuit: enumerates nodes and branch-current
/// unknowns, registers integration state, assembles the base (linear-only)
/// conductance matrix, and collects non-fatal structural warnings.
pub fn preprocess(circuit: &Circuit, config: &SolverConfig) -> Result<Plan, Error> {
    validate_names(circuit)?;
    validate_node_references(circuit)?;

    let index_map = build_index_map(circuit);
    let state_variables = build_state_variables(circuit);
    let initial_state: Vec<f64> = state_variables.iter().map(|sv| sv.initial_value).collect();

    let base_matrix = assemble_base_matrix(circuit, &index_map, &initial_state, config);
    let has_nonlinear_components = circuit.components().iter().any(Stampable::is_nonlinear);

    let mut warnings = Vec::new();
    collect_structural_warnings(circuit, &index_map, &base_matrix, &mut warnings);

    Ok(Plan {
        index_map,
        state_variables,
        initial_state,
        base_matrix,
        has_nonlinear_components,
        warnings,
    })
}

fn validate_names(circuit: &Circuit) -> Result<(), Error> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for component in circuit.components() {
        let identifier = component.identifier();
        if !seen.insert(identifier.clone()) {
            duplicates.push(identifier);
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicateComponentNames(duplicates))
    }
}

fn validate_node_references(circuit: &Circuit) -> Result<(), Error> {
    let mut malformed = Vec::new();
    for component in circuit.components() {
        for node in component.nodes() {
            if node.trim().is_empty() {
                malformed.push(component.identifier());
            }
        }
    }
    if malformed.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidNodeReference(malformed))
    }
}

/// First pass: assign node indices in first-seen order, then branch-current
/// indices (for voltage-defining elements) immediately after, mirroring the
/// reference's two-block MNA unknown ordering.
fn build_index_map(circuit: &Circuit) -> IndexMap {
    let mut index_map = IndexMap::new();
    let mut next_node = 0usize;
    for component in circuit.components() {
        for node in component.nodes() {
            if is_ground(node) {
                continue;
            }
            if index_map.node(node).is_none() {
                index_map.insert_node(node, next_node);
                next_node += 1;
            }
        }
    }

    let mut next_current = next_node;
    for component in circuit.components() {
        if component.needs_current_variable() {
            index_map.insert_current(&component.identifier(), next_current);
            next_current += 1;
        }
    }

    index_map
}

fn build_state_variables(circuit: &Circuit) -> Vec<StateVariable> {
    let mut state_variables = Vec::new();
    for (component_index, component) in circuit.components().iter().enumerate() {
        if component.is_state_variable() {
            state_variables.push(StateVariable {
                component_name: component.name().to_string(),
                component_index,
                kind: component.state_kind().expect("state variable must report a state kind"),
                initial_value: component.initial_state(),
            });
        }
    }
    state_variables
}

/// Stamps every linear component once into the base matrix. Nonlinear
/// components (diodes, switches, MOSFETs) are deliberately excluded: their
/// contribution depends on an operating point decided per step, not here.
fn assemble_base_matrix(
    circuit: &Circuit,
    index_map: &IndexMap,
    initial_state: &[f64],
    config: &SolverConfig,
) -> DenseMatrix {
    let mut triplets: Vec<Triplet> = Vec::new();
    let mut state_cursor = 0usize;

    for component in circuit.components() {
        let state_index = if component.is_state_variable() {
            let idx = state_cursor;
            state_cursor += 1;
            Some(idx)
        } else {
            None
        };

        if component.is_nonlinear() {
            continue;
        }

        let ctx = StampContext {
            index_map,
            solution: &[],
            state: initial_state,
            state_index,
            t: 0.0,
        };
        triplets.extend(component.stamp_conductance(&ctx));
    }

    let mut matrix = DenseMatrix::from_triplets(index_map.total_size(), &triplets);
    matrix.add_to_diagonal(config.gmin);
    matrix
}

fn collect_structural_warnings(
    circuit: &Circuit,
    index_map: &IndexMap,
    matrix: &DenseMatrix,
    warnings: &mut Vec<String>,
) {
    if !matrix.has_full_diagonal(1e-15) {
        let message = "base matrix has a zero (or near-zero) diagonal entry; a node may be floating".to_string();
        warn!("{message}");
        warnings.push(message);
    }

    if !matrix.is_resistive_block_symmetric(index_map.node_count(), 1e-9) {
        let message = "resistive sub-block is not symmetric; check controlled-source wiring".to_string();
        warn!("{message}");
        warnings.push(message);
    }

    let references_ground = circuit
        .components()
        .iter()
        .any(|c| c.nodes().iter().any(|n| is_ground(n)));
    if !references_ground {
        let message = "no component references the ground node; the circuit has no voltage reference".to_string();
        warn!("{message}");
        warnings.push(message);
    }

    for node in one_connection_nodes(circuit) {
        let message = format!("node '{node}' is referenced by only one component");
        warn!("{message}");
        warnings.push(message);
    }
}

/// Nodes referenced by exactly one component, ground excluded. Non-fatal per
/// §7: a single-connection node is often a legitimate dangling test point.
fn one_connection_nodes(circuit: &Circuit) -> Vec<String> {
    use std::collections::HashSet;
    let mut owners: std::collections::HashMap<&str, HashSet<String>> = std::collections::HashMap::new();
    for component in circuit.components() {
        let identifier = component.identifier();
        for node in component.nodes() {
            if is_ground(node) {
                continue;
            }
            owners.entry(node).or_default().insert(identifier.clone());
        }
    }
    let mut nodes: Vec<String> = owners
        .into_iter()
        .filter(|(_, components)| components.len() == 1)
        .map(|(node, _)| node.to_string())
        .collect();
    nodes.sort();
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_devices::capacitor::Capacitor;
    use voltaic_devices::component::Component;
    use voltaic_devices::resistor::Resistor;
    use voltaic_devices::voltage_source::VoltageSource;
    use voltaic_devices::waveform::Waveform;

    fn voltage_divider() -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::VoltageSource(VoltageSource::new(
            "1",
            "in",
            "0",
            Waveform::Dc { value: 10.0 },
        )));
        circuit.add_component(Component::Resistor(Resistor::new("1", "in", "out", 1_000.0).unwrap()));
        circuit.add_component(Component::Resistor(Resistor::new("2", "out", "0", 1_000.0).unwrap()));
        circuit
    }

    #[test]
    fn assigns_nodes_before_currents_in_first_seen_order() {
        let circuit = voltage_divider();
        let plan = preprocess(&circuit, &SolverConfig::default()).unwrap();
        assert_eq!(plan.index_map.node("in"), Some(0));
        assert_eq!(plan.index_map.node("out"), Some(1));
        assert_eq!(plan.index_map.current("V1"), Some(2));
        assert_eq!(plan.unknown_count(), 3);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::Resistor(Resistor::new("1", "a", "0", 100.0).unwrap()));
        circuit.add_component(Component::Resistor(Resistor::new("1", "a", "0", 200.0).unwrap()));
        let result = preprocess(&circuit, &SolverConfig::default());
        assert!(matches!(result, Err(Error::DuplicateComponentNames(_))));
    }

    #[test]
    fn registers_capacitor_state_with_its_initial_voltage() {
        let mut circuit = voltage_divider();
        circuit.add_component(Component::Capacitor(
            Capacitor::new("1", "out", "0", 1e-6, 2.5).unwrap(),
        ));
        let plan = preprocess(&circuit, &SolverConfig::default()).unwrap();
        assert_eq!(plan.state_variables.len(), 1);
        assert_eq!(plan.state_variables[0].initial_value, 2.5);
        assert_eq!(plan.initial_state, vec![2.5]);
    }

    #[test]
    fn preprocessing_twice_yields_identical_plans() {
        let circuit = voltage_divider();
        let config = SolverConfig::default();
        let first = preprocess(&circuit, &config).unwrap();
        let second = preprocess(&circuit, &config).unwrap();
        for i in 0..first.unknown_count() {
            for j in 0..first.unknown_count() {
                assert_eq!(first.base_matrix.get(i, j), second.base_matrix.get(i, j));
            }
        }
    }

    #[test]
    fn warns_when_circuit_has_no_ground_reference() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::Resistor(Resistor::new("1", "a", "b", 100.0).unwrap()));
        let plan = preprocess(&circuit, &SolverConfig::default()).unwrap();
        assert!(plan.warnings.iter().any(|w| w.contains("ground")));
    }

    #[test]
    fn warns_on_one_connection_node_without_rejecting_it() {
        let mut circuit = voltage_divider();
        circuit.add_component(Component::Resistor(Resistor::new("3", "dangling", "0", 50.0).unwrap()));
        let plan = preprocess(&circuit, &SolverConfig::default()).unwrap();
        assert!(plan.warnings.iter().any(|w| w.contains("dangling") && w.contains("only one component")));
    }

    #[test]
    fn fully_connected_circuit_has_no_one_connection_warning() {
        let circuit = voltage_divider();
        let plan = preprocess(&circuit, &SolverConfig::default()).unwrap();
        assert!(!plan.warnings.iter().any(|w| w.contains("only one component")));
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use voltaic_core::circuit::Circuit;
use voltaic_core::config::SolverConfig;
use voltaic_devices::component::Component;
use voltaic_devices::coupled_inductor::CoupledInductorGroup;

use crate::directives::{parse_dc, parse_tran, AnalysisDirective};
use crate::elements::{
    parse_capacitor, parse_cccs, parse_ccvs, parse_coupling, parse_current_source, parse_diode, parse_inductor,
    parse_mosfet, parse_resistor, parse_switch, parse_vccs, parse_vcvs, parse_voltage_source, CouplingSpec,
};
use crate::models::{parse_model_line, Model};
use crate::prelude::{Error, Result};

/// The result of parsing a netlist: the assembled circuit plus whichever
/// analysis directives it requested. `directives` is ordered as encountered;
/// most netlists carry exactly one `.tran` or `.dc`.
#[derive(Debug, Clone, Default)]
pub struct ParsedNetlist {
    pub circuit: Circuit,
    pub directives: Vec<AnalysisDirective>,
}

fn is_comment_or_blank(line: &str) -> bool {
    line.is_empty() || line.starts_with('*') || line.starts_with(';') || line.starts_with('$')
}

fn strip_inductor_prefix(token: &str) -> &str {
    token.strip_prefix(['L', 'l']).unwrap_or(token)
}

/// Parses a complete SPICE-style netlist: case-insensitive, one component per
/// line, order-independent, comments introduced by `*`, `;`, or `$`.
/// `config.large_admittance` is stamped into every parsed capacitor's
/// companion model.
pub fn parse_netlist(input: &str, config: &SolverConfig) -> Result<ParsedNetlist> {
    let mut circuit = Circuit::new();
    let mut models: HashMap<String, Model> = HashMap::new();
    let mut diode_models: Vec<(String, String)> = Vec::new();
    let mut mosfet_models: Vec<(String, String)> = Vec::new();
    let mut couplings: Vec<CouplingSpec> = Vec::new();
    let mut directives = Vec::new();

    for (line_number, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if is_comment_or_blank(line) {
            continue;
        }

        let lowered = line.to_lowercase();
        if lowered == ".end" {
            continue;
        }
        if lowered.starts_with(".model") {
            let (name, model) = parse_model_line(line).map_err(|e| with_line(e, line_number))?;
            models.insert(name, model);
            continue;
        }
        if lowered.starts_with(".tran") {
            let tran = parse_tran(line).map_err(|e| with_line(e, line_number))?;
            directives.push(AnalysisDirective::Tran(tran));
            continue;
        }
        if lowered.starts_with(".dc") {
            parse_dc(line).map_err(|e| with_line(e, line_number))?;
            directives.push(AnalysisDirective::Dc);
            continue;
        }

        let prefix = line.chars().next().ok_or_else(|| Error::UnrecognizedLine(line.to_string()))?;
        match prefix.to_ascii_uppercase() {
            'R' => { circuit.add_component(Component::Resistor(parse_resistor(line).map_err(|e| with_line(e, line_number))?)); }
            'C' => { circuit.add_component(Component::Capacitor(
                parse_capacitor(line, config.large_admittance).map_err(|e| with_line(e, line_number))?,
            )); }
            'L' => { circuit.add_component(Component::Inductor(parse_inductor(line).map_err(|e| with_line(e, line_number))?)); }
            'V' => { circuit.add_component(Component::VoltageSource(
                parse_voltage_source(line).map_err(|e| with_line(e, line_number))?,
            )); }
            'I' => { circuit.add_component(Component::CurrentSource(
                parse_current_source(line).map_err(|e| with_line(e, line_number))?,
            )); }
            'S' => { circuit.add_component(Component::Switch(parse_switch(line).map_err(|e| with_line(e, line_number))?)); }
            'E' => { circuit.add_component(Component::Vcvs(parse_vcvs(line).map_err(|e| with_line(e, line_number))?)); }
            'G' => { circuit.add_component(Component::Vccs(parse_vccs(line).map_err(|e| with_line(e, line_number))?)); }
            'F' => { circuit.add_component(Component::Cccs(parse_cccs(line).map_err(|e| with_line(e, line_number))?)); }
            'H' => { circuit.add_component(Component::Ccvs(parse_ccvs(line).map_err(|e| with_line(e, line_number))?)); }
            'D' => {
                let (diode, model) = parse_diode(line).map_err(|e| with_line(e, line_number))?;
                let identifier = diode.identifier();
                circuit.add_component(Component::Diode(diode));
                if let Some(model_name) = model {
                    diode_models.push((identifier, model_name));
                }
            }
            'M' => {
                let (mosfet, model) = parse_mosfet(line).map_err(|e| with_line(e, line_number))?;
                let identifier = mosfet.identifier();
                circuit.add_component(Component::Mosfet(mosfet));
                if let Some(model_name) = model {
                    mosfet_models.push((identifier, model_name));
                }
            }
            'K' => couplings.push(parse_coupling(line).map_err(|e| with_line(e, line_number))?),
            _ => return Err(Error::UnrecognizedLine(line.to_string())),
        };
    }

    if circuit.is_empty() {
        return Err(Error::EmptyNetlist);
    }

    apply_models(&mut circuit, &models, &diode_models, &mosfet_models)?;
    for group in build_coupling_groups(&circuit, &couplings)? {
        circuit.add_coupled_inductor_group(group);
    }

    Ok(ParsedNetlist { circuit, directives })
}

pub fn parse_netlist_file(path: &Path, config: &SolverConfig) -> Result<ParsedNetlist> {
    let contents = fs::read_to_string(path)?;
    parse_netlist(&contents, config)
}

fn with_line(error: Error, line_number: usize) -> Error {
    match error {
        Error::ParseError { message, .. } => Error::ParseError { line: line_number + 1, message },
        other => other,
    }
}

fn apply_models(
    circuit: &mut Circuit,
    models: &HashMap<String, Model>,
    diode_models: &[(String, String)],
    mosfet_models: &[(String, String)],
) -> Result<()> {
    for (identifier, model_name) in diode_models {
        let model = models.get(model_name).ok_or_else(|| Error::UndefinedModel(model_name.clone()))?;
        let Model::Diode { forward_voltage, on_resistance, off_resistance } = model else {
            return Err(Error::Unsupported(format!("model '{model_name}' is not a diode model")));
        };
        let diode = circuit
            .components_mut()
            .iter_mut()
            .find_map(|c| match c {
                Component::Diode(d) if &d.identifier() == identifier => Some(d),
                _ => None,
            })
            .expect("diode referenced by its own identifier must exist");
        diode.forward_voltage = *forward_voltage;
        diode.on_resistance = *on_resistance;
        diode.off_resistance = *off_resistance;
    }

    for (identifier, model_name) in mosfet_models {
        let model = models.get(model_name).ok_or_else(|| Error::UndefinedModel(model_name.clone()))?;
        let Model::Mosfet { threshold_voltage, beta, lambda } = model else {
            return Err(Error::Unsupported(format!("model '{model_name}' is not a MOSFET model")));
        };
        let mosfet = circuit
            .components_mut()
            .iter_mut()
            .find_map(|c| match c {
                Component::Mosfet(m) if &m.identifier() == identifier => Some(m),
                _ => None,
            })
            .expect("mosfet referenced by its own identifier must exist");
        mosfet.threshold_voltage = *threshold_voltage;
        mosfet.beta = *beta;
        mosfet.lambda = *lambda;
    }

    Ok(())
}

fn build_coupling_groups(circuit: &Circuit, couplings: &[CouplingSpec]) -> Result<Vec<CoupledInductorGroup>> {
    let mut groups = Vec::with_capacity(couplings.len());
    for spec in couplings {
        let a = strip_inductor_prefix(&spec.inductor_a);
        let b = strip_inductor_prefix(&spec.inductor_b);
        for name in [a, b] {
            if !circuit.components().iter().any(|c| matches!(c, Component::Inductor(i) if i.name == name)) {
                return Err(Error::UndefinedModel(format!("coupling '{}' references unknown inductor '{name}'", spec.name)));
            }
        }
        let mut group = CoupledInductorGroup::new(&spec.name, vec![a.to_string(), b.to_string()]);
        group.set_coupling(0, 1, spec.coupling);
        groups.push(group);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::TranDirective;

    fn config() -> SolverConfig {
        SolverConfig::default()
    }

    #[test]
    fn parses_resistor_divider() {
        let netlist = "V1 in 0 10\nR1 in out 1k\nR2 out 0 1k\n.end\n";
        let parsed = parse_netlist(netlist, &config()).unwrap();
        assert_eq!(parsed.circuit.components().len(), 3);
    }

    #[test]
    fn skips_comment_lines() {
        let netlist = "* a comment\nV1 in 0 10\n; another comment\nR1 in 0 1k\n";
        let parsed = parse_netlist(netlist, &config()).unwrap();
        assert_eq!(parsed.circuit.components().len(), 2);
    }

    #[test]
    fn rejects_empty_netlist() {
        assert!(matches!(parse_netlist("* nothing but comments\n", &config()), Err(Error::EmptyNetlist)));
    }

    #[test]
    fn captures_tran_directive() {
        let netlist = "V1 in 0 10\nR1 in 0 1k\n.tran 1u 5m\n";
        let parsed = parse_netlist(netlist, &config()).unwrap();
        assert_eq!(parsed.directives.len(), 1);
        match parsed.directives[0] {
            AnalysisDirective::Tran(TranDirective { time_step, stop_time, .. }) => {
                assert_eq!(time_step, 1e-6);
                assert_eq!(stop_time, 5e-3);
            }
            _ => panic!("expected tran directive"),
        }
    }

    #[test]
    fn applies_diode_model() {
        let netlist = ".model MYDIODE D(VF=0.3 RON=0.01 ROFF=1e7)\nD1 a c MYDIODE\nR1 a 0 1k\n";
        let parsed = parse_netlist(netlist, &config()).unwrap();
        let diode = parsed.circuit.components().iter().find_map(|c| match c {
            Component::Diode(d) => Some(d),
            _ => None,
        });
        assert_eq!(diode.unwrap().forward_voltage, 0.3);
    }

    #[test]
    fn builds_coupled_inductor_group_from_k_line() {
        let netlist = "L1 a 0 1m\nL2 b 0 1m\nK1 L1 L2 0.5\n";
        let parsed = parse_netlist(netlist, &config()).unwrap();
        assert_eq!(parsed.circuit.coupled_inductor_groups().len(), 1);
        assert_eq!(parsed.circuit.coupled_inductor_groups()[0].inductor_names, vec!["1", "2"]);
    }

    #[test]
    fn rejects_undefined_model_reference() {
        let netlist = "D1 a c NOSUCHMODEL\nR1 a 0 1k\n";
        assert!(matches!(parse_netlist(netlist, &config()), Err(Error::UndefinedModel(_))));
    }
}

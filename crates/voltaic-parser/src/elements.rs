use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::space1,
    combinator::{all_consuming, map, opt},
    sequence::preceded,
    IResult, Parser,
};

use voltaic_devices::capacitor::Capacitor;
use voltaic_devices::controlled_sources::{Cccs, Ccvs, Vccs, Vcvs};
use voltaic_devices::current_source::CurrentSource;
use voltaic_devices::diode::Diode;
use voltaic_devices::inductor::Inductor;
use voltaic_devices::mosfet::Mosfet;
use voltaic_devices::resistor::Resistor;
use voltaic_devices::switch::Switch;
use voltaic_devices::voltage_source::VoltageSource;
use voltaic_devices::waveform::Waveform;

use crate::prelude::{Error, Result};
use crate::value::{alphanumeric_or_underscore1, value_parser};
use crate::waveform::waveform_parser;

fn err(e: nom::Err<nom::error::Error<&str>>) -> Error {
    Error::ParseError { line: 0, message: e.to_string() }
}

/// A source specification: either a bare DC literal or one of the explicit
/// waveform descriptors.
fn source_value(input: &str) -> IResult<&str, Waveform> {
    alt((waveform_parser, map(value_parser, |value| Waveform::Dc { value }))).parse(input)
}

#[allow(clippy::type_complexity)]
fn resistor_fields(input: &str) -> IResult<&str, (&str, &str, &str, f64, Option<f64>, Option<f64>, Option<f64>)> {
    let (input, _) = tag_no_case("r").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, value) = preceded(space1, value_parser).parse(input)?;
    let (input, tc1) = opt(preceded(space1, preceded(tag_no_case("tc1="), value_parser))).parse(input)?;
    let (input, tc2) = opt(preceded(space1, preceded(tag_no_case("tc2="), value_parser))).parse(input)?;
    let (input, temp) = opt(preceded(space1, preceded(tag_no_case("temp="), value_parser))).parse(input)?;
    Ok((input, (name, plus, minus, value, tc1, tc2, temp)))
}

pub fn parse_resistor(line: &str) -> Result<Resistor> {
    let (_, (name, plus, minus, value, tc1, tc2, temp)) = all_consuming(resistor_fields).parse(line).map_err(err)?;
    let resistor = Resistor::new(name, plus, minus, value)?;
    if tc1.is_some() || tc2.is_some() || temp.is_some() {
        Ok(resistor.with_temperature_coefficients(
            tc1.unwrap_or(0.0),
            tc2.unwrap_or(0.0),
            temp.unwrap_or(voltaic_devices::resistor::NOMINAL_TEMPERATURE),
        ))
    } else {
        Ok(resistor)
    }
}

fn capacitor_fields(input: &str) -> IResult<&str, (&str, &str, &str, f64, Option<f64>)> {
    let (input, _) = tag_no_case("c").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, value) = preceded(space1, value_parser).parse(input)?;
    let (input, ic) = opt(preceded(space1, preceded(tag_no_case("ic="), value_parser))).parse(input)?;
    Ok((input, (name, plus, minus, value, ic)))
}

pub fn parse_capacitor(line: &str, large_admittance: f64) -> Result<Capacitor> {
    let (_, (name, plus, minus, value, ic)) = all_consuming(capacitor_fields).parse(line).map_err(err)?;
    Ok(Capacitor::new(name, plus, minus, value, ic.unwrap_or(0.0))?.with_large_admittance(large_admittance))
}

fn inductor_fields(input: &str) -> IResult<&str, (&str, &str, &str, f64, Option<f64>)> {
    let (input, _) = tag_no_case("l").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, value) = preceded(space1, value_parser).parse(input)?;
    let (input, ic) = opt(preceded(space1, preceded(tag_no_case("ic="), value_parser))).parse(input)?;
    Ok((input, (name, plus, minus, value, ic)))
}

pub fn parse_inductor(line: &str) -> Result<Inductor> {
    let (_, (name, plus, minus, value, ic)) = all_consuming(inductor_fields).parse(line).map_err(err)?;
    Ok(Inductor::new(name, plus, minus, value, ic.unwrap_or(0.0))?)
}

fn voltage_source_fields(input: &str) -> IResult<&str, (&str, &str, &str, Waveform)> {
    let (input, _) = tag_no_case("v").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, waveform) = preceded(space1, source_value).parse(input)?;
    Ok((input, (name, plus, minus, waveform)))
}

pub fn parse_voltage_source(line: &str) -> Result<VoltageSource> {
    let (_, (name, plus, minus, waveform)) = all_consuming(voltage_source_fields).parse(line).map_err(err)?;
    Ok(VoltageSource::new(name, plus, minus, waveform))
}

fn current_source_fields(input: &str) -> IResult<&str, (&str, &str, &str, Waveform)> {
    let (input, _) = tag_no_case("i").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, waveform) = preceded(space1, source_value).parse(input)?;
    Ok((input, (name, plus, minus, waveform)))
}

pub fn parse_current_source(line: &str) -> Result<CurrentSource> {
    let (_, (name, plus, minus, waveform)) = all_consuming(current_source_fields).parse(line).map_err(err)?;
    Ok(CurrentSource::new(name, plus, minus, waveform))
}

fn diode_fields(input: &str) -> IResult<&str, (&str, &str, &str, Option<&str>)> {
    let (input, _) = tag_no_case("d").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, anode) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, cathode) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, model) = opt(preceded(space1, alphanumeric_or_underscore1)).parse(input)?;
    Ok((input, (name, anode, cathode, model)))
}

/// Returns the diode built with default companion parameters and the model
/// name it referenced, if any; the netlist assembler overrides the
/// parameters once every `.model` line has been collected.
pub fn parse_diode(line: &str) -> Result<(Diode, Option<String>)> {
    let (_, (name, anode, cathode, model)) = all_consuming(diode_fields).parse(line).map_err(err)?;
    Ok((Diode::default_params(name, anode, cathode)?, model.map(str::to_string)))
}

fn mosfet_fields(input: &str) -> IResult<&str, (&str, &str, &str, &str, Option<&str>)> {
    let (input, _) = tag_no_case("m").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, drain) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, gate) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, source) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, model) = opt(preceded(space1, alphanumeric_or_underscore1)).parse(input)?;
    Ok((input, (name, drain, gate, source, model)))
}

/// Default region parameters (`V_th = 2V`, unit transconductance, no channel
/// length modulation); overridden by a referenced `.model` line.
pub fn parse_mosfet(line: &str) -> Result<(Mosfet, Option<String>)> {
    let (_, (name, drain, gate, source, model)) = all_consuming(mosfet_fields).parse(line).map_err(err)?;
    Ok((Mosfet::new(name, drain, gate, source, 2.0, 1e-3, 0.0)?, model.map(str::to_string)))
}

fn switch_fields(input: &str) -> IResult<&str, (&str, &str, &str, bool)> {
    let (input, _) = tag_no_case("s").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, closed) = preceded(
        space1,
        alt((map(tag_no_case("on"), |_| true), map(tag_no_case("off"), |_| false))),
    )
    .parse(input)?;
    Ok((input, (name, plus, minus, closed)))
}

pub fn parse_switch(line: &str) -> Result<Switch> {
    let (_, (name, plus, minus, closed)) = all_consuming(switch_fields).parse(line).map_err(err)?;
    Ok(Switch::default_params(name, plus, minus, closed)?)
}

fn four_node_fields(input: &str) -> IResult<&str, (&str, &str, &str, &str, &str, f64)> {
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, out_plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, out_minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, ctrl_plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, ctrl_minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, gain) = preceded(space1, value_parser).parse(input)?;
    Ok((input, (name, out_plus, out_minus, ctrl_plus, ctrl_minus, gain)))
}

pub fn parse_vcvs(line: &str) -> Result<Vcvs> {
    let (_, rest) = tag_no_case::<_, _, nom::error::Error<&str>>("e").parse(line).map_err(err)?;
    let (_, (name, out_plus, out_minus, ctrl_plus, ctrl_minus, gain)) =
        all_consuming(four_node_fields).parse(rest).map_err(err)?;
    Ok(Vcvs {
        name: name.to_string(),
        out_plus: out_plus.to_string(),
        out_minus: out_minus.to_string(),
        ctrl_plus: ctrl_plus.to_string(),
        ctrl_minus: ctrl_minus.to_string(),
        gain,
    })
}

pub fn parse_vccs(line: &str) -> Result<Vccs> {
    let (_, rest) = tag_no_case::<_, _, nom::error::Error<&str>>("g").parse(line).map_err(err)?;
    let (_, (name, out_plus, out_minus, ctrl_plus, ctrl_minus, transconductance)) =
        all_consuming(four_node_fields).parse(rest).map_err(err)?;
    Ok(Vccs {
        name: name.to_string(),
        out_plus: out_plus.to_string(),
        out_minus: out_minus.to_string(),
        ctrl_plus: ctrl_plus.to_string(),
        ctrl_minus: ctrl_minus.to_string(),
        transconductance,
    })
}

fn monitor_fields(input: &str) -> IResult<&str, (&str, &str, &str, &str, f64)> {
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, out_plus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, out_minus) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, monitor) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, gain) = preceded(space1, value_parser).parse(input)?;
    Ok((input, (name, out_plus, out_minus, monitor, gain)))
}

pub fn parse_cccs(line: &str) -> Result<Cccs> {
    let (_, rest) = tag_no_case::<_, _, nom::error::Error<&str>>("f").parse(line).map_err(err)?;
    let (_, (name, out_plus, out_minus, monitor, gain)) = all_consuming(monitor_fields).parse(rest).map_err(err)?;
    Ok(Cccs {
        name: name.to_string(),
        out_plus: out_plus.to_string(),
        out_minus: out_minus.to_string(),
        monitor_identifier: monitor.to_string(),
        gain,
    })
}

pub fn parse_ccvs(line: &str) -> Result<Ccvs> {
    let (_, rest) = tag_no_case::<_, _, nom::error::Error<&str>>("h").parse(line).map_err(err)?;
    let (_, (name, out_plus, out_minus, monitor, gain)) = all_consuming(monitor_fields).parse(rest).map_err(err)?;
    Ok(Ccvs {
        name: name.to_string(),
        out_plus: out_plus.to_string(),
        out_minus: out_minus.to_string(),
        monitor_identifier: monitor.to_string(),
        gain,
    })
}

/// A `K<name> <L1> <L2> <coupling>` coupling statement, naming two inductors
/// declared elsewhere in the netlist by their own names (not identifiers).
#[derive(Debug, Clone)]
pub struct CouplingSpec {
    pub name: String,
    pub inductor_a: String,
    pub inductor_b: String,
    pub coupling: f64,
}

fn coupling_fields(input: &str) -> IResult<&str, (&str, &str, &str, f64)> {
    let (input, _) = tag_no_case("k").parse(input)?;
    let (input, name) = alphanumeric_or_underscore1(input)?;
    let (input, l1) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, l2) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, k) = preceded(space1, value_parser).parse(input)?;
    Ok((input, (name, l1, l2, k)))
}

pub fn parse_coupling(line: &str) -> Result<CouplingSpec> {
    let (_, (name, l1, l2, k)) = all_consuming(coupling_fields).parse(line).map_err(err)?;
    Ok(CouplingSpec { name: name.to_string(), inductor_a: l1.to_string(), inductor_b: l2.to_string(), coupling: k })
}

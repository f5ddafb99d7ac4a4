use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{space0, space1},
    combinator::{all_consuming, map},
    multi::separated_list0,
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::prelude::{Error, Result};
use crate::value::{alphanumeric_or_underscore1, value_parser};

/// A `.model` definition's companion parameters, keyed by device kind. Field
/// defaults mirror the devices the model-less constructors already assume
/// (`Diode::default_params`, `Mosfet::new` with `V_th = 2V`).
#[derive(Debug, Clone)]
pub enum Model {
    Diode { forward_voltage: f64, on_resistance: f64, off_resistance: f64 },
    Mosfet { threshold_voltage: f64, beta: f64, lambda: f64 },
}

fn parameter(input: &str) -> IResult<&str, (String, f64)> {
    let (input, key) = alphanumeric_or_underscore1(input)?;
    let (input, _) = tag("=").parse(input)?;
    let (input, value) = value_parser(input)?;
    Ok((input, (key.to_uppercase(), value)))
}

fn parameter_list(input: &str) -> IResult<&str, HashMap<String, f64>> {
    map(separated_list0(space1, parameter), |pairs| pairs.into_iter().collect()).parse(input)
}

fn model_fields(input: &str) -> IResult<&str, (&str, &str, HashMap<String, f64>)> {
    let (input, _) = tag_no_case(".model").parse(input)?;
    let (input, name) = preceded(space1, alphanumeric_or_underscore1).parse(input)?;
    let (input, kind) = preceded(space1, alt((tag_no_case("nmos"), tag_no_case("pmos"), tag_no_case("d")))).parse(input)?;
    let (input, params) = delimited(
        preceded(space0, tag("(")),
        preceded(space0, parameter_list),
        preceded(space0, tag(")")),
    )
    .parse(input)?;
    Ok((input, (name, kind, params)))
}

/// Parses one `.model <name> D(...)` or `.model <name> NMOS(...)`/`PMOS(...)` line.
pub fn parse_model_line(line: &str) -> Result<(String, Model)> {
    let (_, (name, kind, params)) = all_consuming(model_fields)
        .parse(line.trim())
        .map_err(|e| Error::ParseError { line: 0, message: e.to_string() })?;

    let model = match kind.to_lowercase().as_str() {
        "d" => Model::Diode {
            forward_voltage: params.get("VF").copied().unwrap_or(0.7),
            on_resistance: params.get("RON").copied().unwrap_or(1e-3),
            off_resistance: params.get("ROFF").copied().unwrap_or(1e6),
        },
        "nmos" | "pmos" => Model::Mosfet {
            threshold_voltage: params.get("VTO").copied().unwrap_or(2.0),
            beta: params.get("KP").copied().unwrap_or(1e-3),
            lambda: params.get("LAMBDA").copied().unwrap_or(0.0),
        },
        other => return Err(Error::Unsupported(format!(".model kind '{other}'"))),
    };

    Ok((name.to_string(), model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_diode_model() {
        let (name, model) = parse_model_line(".model MYDIODE D(VF=0.6 RON=0.01 ROFF=1e7)").unwrap();
        assert_eq!(name, "MYDIODE");
        match model {
            Model::Diode { forward_voltage, on_resistance, off_resistance } => {
                assert_eq!(forward_voltage, 0.6);
                assert_eq!(on_resistance, 0.01);
                assert_eq!(off_resistance, 1e7);
            }
            _ => panic!("expected diode model"),
        }
    }

    #[test]
    fn parses_mosfet_model_with_defaults() {
        let (_, model) = parse_model_line(".model SWFET NMOS(VTO=1.5)").unwrap();
        match model {
            Model::Mosfet { threshold_voltage, beta, lambda } => {
                assert_eq!(threshold_voltage, 1.5);
                assert_eq!(beta, 1e-3);
                assert_eq!(lambda, 0.0);
            }
            _ => panic!("expected mosfet model"),
        }
    }
}

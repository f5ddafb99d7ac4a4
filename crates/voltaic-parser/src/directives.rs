use nom::{
    bytes::complete::tag_no_case,
    character::complete::space1,
    combinator::{all_consuming, opt},
    sequence::preceded,
    IResult, Parser,
};

use crate::prelude::{Error, Result};
use crate::value::value_parser;

/// A `.tran <tstep> <tstop> [tstart]` directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranDirective {
    pub time_step: f64,
    pub stop_time: f64,
    pub start_time: f64,
}

/// The analysis directives a netlist can request. `.dc` is recognized but
/// carries no sweep parameters yet: this parser only feeds the operating
/// point solver, which has none to sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisDirective {
    Tran(TranDirective),
    Dc,
}

fn tran_fields(input: &str) -> IResult<&str, (f64, f64, Option<f64>)> {
    let (input, _) = tag_no_case(".tran").parse(input)?;
    let (input, time_step) = preceded(space1, value_parser).parse(input)?;
    let (input, stop_time) = preceded(space1, value_parser).parse(input)?;
    let (input, start_time) = opt(preceded(space1, value_parser)).parse(input)?;
    Ok((input, (time_step, stop_time, start_time)))
}

pub fn parse_tran(line: &str) -> Result<TranDirective> {
    let (_, (time_step, stop_time, start_time)) = all_consuming(tran_fields)
        .parse(line.trim())
        .map_err(|e| Error::ParseError { line: 0, message: e.to_string() })?;
    Ok(TranDirective { time_step, stop_time, start_time: start_time.unwrap_or(0.0) })
}

pub fn parse_dc(line: &str) -> Result<()> {
    all_consuming(tag_no_case::<_, _, nom::error::Error<&str>>(".dc"))
        .parse(line.trim())
        .map(|_| ())
        .map_err(|e| Error::ParseError { line: 0, message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tran_with_start_time() {
        let d = parse_tran(".tran 1u 5m 1m").unwrap();
        assert_eq!(d.time_step, 1e-6);
        assert_eq!(d.stop_time, 5e-3);
        assert_eq!(d.start_time, 1e-3);
    }

    #[test]
    fn parses_tran_defaults_start_time_to_zero() {
        let d = parse_tran(".tran 1u 5m").unwrap();
        assert_eq!(d.start_time, 0.0);
    }

    #[test]
    fn parses_bare_dc_directive() {
        assert!(parse_dc(".dc").is_ok());
    }
}

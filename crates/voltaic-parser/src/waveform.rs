use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{space0, space1},
    combinator::map,
    multi::{many1, separated_list0},
    sequence::{delimited, preceded},
    IResult, Parser,
};

use voltaic_devices::waveform::Waveform;

use crate::value::value_parser;

/// Parses one of the netlist's source waveform descriptors: `DC(v)`,
/// `SINE(offset amplitude frequency [delay] [damping])`,
/// `PULSE(v1 v2 td tr tf pw per)`, `EXP(v1 v2 td1 tau1 td2 tau2)`, or
/// `PWL((t1 v1) (t2 v2) ...)`.
pub fn waveform_parser(input: &str) -> IResult<&str, Waveform> {
    alt((dc_waveform, sine_waveform, pulse_waveform, exp_waveform, pwl_waveform)).parse(input)
}

fn values(input: &str) -> IResult<&str, Vec<f64>> {
    separated_list0(space1, value_parser).parse(input)
}

fn dc_waveform(input: &str) -> IResult<&str, Waveform> {
    map(
        preceded(
            tag_no_case("dc"),
            delimited(preceded(space0, tag("(")), preceded(space0, value_parser), preceded(space0, tag(")"))),
        ),
        |value| Waveform::Dc { value },
    )
    .parse(input)
}

fn sine_waveform(input: &str) -> IResult<&str, Waveform> {
    let (input, fields) = preceded(
        tag_no_case("sine"),
        delimited(preceded(space0, tag("(")), preceded(space0, values), preceded(space0, tag(")"))),
    )
    .parse(input)?;

    Ok((
        input,
        Waveform::Sine {
            offset: *fields.first().unwrap_or(&0.0),
            amplitude: *fields.get(1).unwrap_or(&0.0),
            frequency: *fields.get(2).unwrap_or(&0.0),
            delay: *fields.get(3).unwrap_or(&0.0),
            damping: *fields.get(4).unwrap_or(&0.0),
        },
    ))
}

fn pulse_waveform(input: &str) -> IResult<&str, Waveform> {
    let (input, fields) = preceded(
        tag_no_case("pulse"),
        delimited(preceded(space0, tag("(")), preceded(space0, values), preceded(space0, tag(")"))),
    )
    .parse(input)?;

    Ok((
        input,
        Waveform::Pulse {
            v1: *fields.first().unwrap_or(&0.0),
            v2: *fields.get(1).unwrap_or(&0.0),
            delay_time: *fields.get(2).unwrap_or(&0.0),
            rise_time: *fields.get(3).unwrap_or(&0.0),
            fall_time: *fields.get(4).unwrap_or(&0.0),
            pulse_width: *fields.get(5).unwrap_or(&0.0),
            period: *fields.get(6).unwrap_or(&0.0),
        },
    ))
}

fn exp_waveform(input: &str) -> IResult<&str, Waveform> {
    let (input, fields) = preceded(
        tag_no_case("exp"),
        delimited(preceded(space0, tag("(")), preceded(space0, values), preceded(space0, tag(")"))),
    )
    .parse(input)?;

    Ok((
        input,
        Waveform::Exp {
            v1: *fields.first().unwrap_or(&0.0),
            v2: *fields.get(1).unwrap_or(&0.0),
            delay_time_1: *fields.get(2).unwrap_or(&0.0),
            time_constant_1: *fields.get(3).unwrap_or(&1e-12),
            delay_time_2: *fields.get(4).unwrap_or(&0.0),
            time_constant_2: *fields.get(5).unwrap_or(&1e-12),
        },
    ))
}

fn pwl_point(input: &str) -> IResult<&str, (f64, f64)> {
    delimited(
        preceded(space0, tag("(")),
        (preceded(space0, value_parser), preceded(space1, value_parser)),
        preceded(space0, tag(")")),
    )
    .parse(input)
}

fn pwl_waveform(input: &str) -> IResult<&str, Waveform> {
    let (input, points) = preceded(
        tag_no_case("pwl"),
        delimited(preceded(space0, tag("(")), many1(preceded(space0, pwl_point)), preceded(space0, tag(")"))),
    )
    .parse(input)?;

    Ok((input, Waveform::Pwl { points }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dc() {
        let (_, w) = waveform_parser("DC(5)").unwrap();
        assert_eq!(w, Waveform::Dc { value: 5.0 });
    }

    #[test]
    fn parses_sine_with_defaults() {
        let (_, w) = waveform_parser("SINE(0 5 1k)").unwrap();
        match w {
            Waveform::Sine { offset, amplitude, frequency, delay, damping } => {
                assert_eq!(offset, 0.0);
                assert_eq!(amplitude, 5.0);
                assert_eq!(frequency, 1000.0);
                assert_eq!(delay, 0.0);
                assert_eq!(damping, 0.0);
            }
            _ => panic!("expected sine"),
        }
    }

    #[test]
    fn parses_pulse() {
        let (_, w) = waveform_parser("PULSE(0 5 1u 100u 100u 5u 10u)").unwrap();
        match w {
            Waveform::Pulse { v1, v2, delay_time, .. } => {
                assert_eq!(v1, 0.0);
                assert_eq!(v2, 5.0);
                assert!((delay_time - 1e-6).abs() < 1e-12);
            }
            _ => panic!("expected pulse"),
        }
    }

    #[test]
    fn parses_pwl_points() {
        let (_, w) = waveform_parser("PWL((0 0) (1m 5) (2m 0))").unwrap();
        match w {
            Waveform::Pwl { points } => assert_eq!(points.len(), 3),
            _ => panic!("expected pwl"),
        }
    }
}

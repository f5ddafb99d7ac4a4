use nom::{
    bytes::complete::{is_not, take_while1},
    combinator::map_res,
    IResult, Parser,
};

use crate::prelude::{Error, Result};

/// Parses a SPICE-style numeric literal with an optional engineering suffix.
///
/// Recognized suffixes (case-insensitive, checked longest-first so `MEG`
/// doesn't get shadowed by a bare `M`): `f` (1e-15), `p` (1e-12), `n` (1e-9),
/// `u`/`μ` (1e-6), `m` (1e-3), `k` (1e3), `MEG` (1e6), `g` (1e9). Per SPICE
/// convention `M` means milli and `MEG` means mega, not the other way round.
pub fn parse_value(s: &str) -> Result<f64> {
    let upper = s.to_uppercase();

    let (mantissa, multiplier) = if let Some(stripped) = upper.strip_suffix("MEG") {
        (stripped, 1e6)
    } else if let Some(last) = upper.chars().last() {
        match last {
            'F' => (&upper[..upper.len() - 1], 1e-15),
            'P' => (&upper[..upper.len() - 1], 1e-12),
            'N' => (&upper[..upper.len() - 1], 1e-9),
            'U' => (&upper[..upper.len() - 1], 1e-6),
            'M' => (&upper[..upper.len() - 1], 1e-3),
            'K' => (&upper[..upper.len() - 1], 1e3),
            'G' => (&upper[..upper.len() - 1], 1e9),
            _ => (upper.as_str(), 1.0),
        }
    } else {
        (upper.as_str(), 1.0)
    };

    // `μ` (U+03BC) is two bytes in UTF-8; the single-char suffix match above
    // only strips ASCII, so handle it as its own case.
    let (mantissa, multiplier) = if let Some(stripped) = mantissa.strip_suffix('\u{3bc}') {
        (stripped, 1e-6)
    } else {
        (mantissa, multiplier)
    };

    mantissa
        .parse::<f64>()
        .map(|base| base * multiplier)
        .map_err(|_| Error::InvalidValue(s.to_string()))
}

pub fn alphanumeric_or_underscore1(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(input)
}

/// A token (anything but whitespace or parentheses) parsed as an engineering value.
pub fn value_parser(input: &str) -> IResult<&str, f64> {
    map_res(is_not(" \t\r\n()"), parse_value).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_suffix() {
        let epsilon = 1e-20;
        assert!((parse_value("1.5k").unwrap() - 1500.0).abs() < epsilon);
        assert!((parse_value("10u").unwrap() - 10e-6).abs() < epsilon);
        assert!((parse_value("22n").unwrap() - 22e-9).abs() < epsilon);
        assert!((parse_value("1.2p").unwrap() - 1.2e-12).abs() < epsilon);
        assert!((parse_value("3MEG").unwrap() - 3e6).abs() < epsilon);
        assert!((parse_value("5meg").unwrap() - 5e6).abs() < epsilon);
        assert!((parse_value("1G").unwrap() - 1e9).abs() < epsilon);
        assert!((parse_value("100").unwrap() - 100.0).abs() < epsilon);
    }

    #[test]
    fn parses_scientific_notation() {
        assert!((parse_value("1e-6").unwrap() - 1e-6).abs() < 1e-20);
        assert!((parse_value("1.23E-9").unwrap() - 1.23e-9).abs() < 1e-20);
    }

    #[test]
    fn meg_takes_priority_over_milli() {
        // "M" alone means milli; "MEG" must not be parsed as "M" + garbage "EG".
        assert!((parse_value("1M").unwrap() - 1e-3).abs() < 1e-20);
        assert!((parse_value("1MEG").unwrap() - 1e6).abs() < 1e-20);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_value("1.5x").is_err());
        assert!(parse_value("garbage").is_err());
    }
}

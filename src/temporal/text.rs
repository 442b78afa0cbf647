//! Text input and output of temporal values.
//!
//! ```text
//! 1@2000-01-01 00:00:00+00                        instant
//! {1@2000-01-01, 2@2000-01-02}                    discrete sequence
//! [1@2000-01-01, 2@2000-01-02)                    sequence
//! {[1@2000-01-01, 2@2000-01-02], [3@2000-01-04]}  sequence set
//! Interp=Step;[1.5@2000-01-01, 2.5@2000-01-02]    step float sequence
//! SRID=4326;[POINT(1 1)@2000-01-01, ...]          point sequence
//! ```

use super::transform::default_interp;
use super::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal};
use crate::config::DEFAULT_FLOAT_DIGITS;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::parse::{split_top_level, strip_braces};
use crate::types::point::split_srid;
use crate::types::{TemporalValue, TimestampTz, ValueContext};
use std::fmt;
use std::str::FromStr;

fn instant_text<V: TemporalValue>(inst: &TInstant<V>, maxdd: usize) -> String {
    format!("{}@{}", inst.value.format_value(maxdd), inst.t)
}

fn sequence_text<V: TemporalValue>(seq: &TSequence<V>, maxdd: usize) -> String {
    let body = seq
        .instants
        .iter()
        .map(|i| instant_text(i, maxdd))
        .collect::<Vec<_>>()
        .join(", ");
    if seq.is_discrete() {
        return format!("{{{}}}", body);
    }
    format!(
        "{}{}{}",
        if seq.lower_inc { '[' } else { '(' },
        body,
        if seq.upper_inc { ']' } else { ')' }
    )
}

/// Leading `SRID=n;` and `Interp=...;` options, in either order.
fn split_options(text: &str) -> Result<(Option<i32>, Option<Interpolation>, &str)> {
    let mut rest = text.trim_start();
    let (mut srid, mut interp) = (None, None);
    loop {
        if rest.len() >= 5 && rest[..5].eq_ignore_ascii_case("SRID=") {
            let (s, r) = split_srid(rest)?;
            srid = s;
            rest = r;
        } else if rest.len() >= 7 && rest[..7].eq_ignore_ascii_case("Interp=") {
            let (name, r) = rest[7..].split_once(';').ok_or_else(|| {
                ChronotopeError::TextInput(format!("Missing ';' after interpolation in '{}'", text))
            })?;
            interp = Some(match name.trim().to_ascii_lowercase().as_str() {
                "step" => Interpolation::Step,
                "linear" => Interpolation::Linear,
                other => {
                    return Err(ChronotopeError::TextInput(format!(
                        "Invalid interpolation '{}'",
                        other
                    )));
                }
            });
            rest = r.trim_start();
        } else {
            return Ok((srid, interp, rest));
        }
    }
}

fn parse_instant<V: TemporalValue>(text: &str, ctx: &ValueContext) -> Result<TInstant<V>> {
    let (value, t) = text.rsplit_once('@').ok_or_else(|| {
        ChronotopeError::TextInput(format!("Missing '@' in temporal instant '{}'", text))
    })?;
    Ok(TInstant::new(V::parse_value(value, ctx)?, TimestampTz::parse(t)?))
}

fn parse_instants<V: TemporalValue>(body: &str, ctx: &ValueContext) -> Result<Vec<TInstant<V>>> {
    split_top_level(body)?
        .into_iter()
        .map(|part| parse_instant(part, ctx))
        .collect()
}

fn parse_sequence<V: TemporalValue>(
    text: &str,
    interp: Interpolation,
    ctx: &ValueContext,
) -> Result<TSequence<V>> {
    let text = text.trim();
    let lower_inc = match text.chars().next() {
        Some('[') => true,
        Some('(') => false,
        _ => {
            return Err(ChronotopeError::TextInput(format!(
                "Could not parse temporal sequence '{}'",
                text
            )));
        }
    };
    let upper_inc = match text.chars().last() {
        Some(']') => true,
        Some(')') => false,
        _ => {
            return Err(ChronotopeError::TextInput(format!(
                "Missing closing bracket in temporal sequence '{}'",
                text
            )));
        }
    };
    let instants = parse_instants(&text[1..text.len() - 1], ctx)?;
    TSequence::make_inner(instants, lower_inc, upper_inc, interp, true)
}

impl<V: TemporalValue> Temporal<V> {
    /// Text form with at most `maxdd` decimals for floating point values.
    pub fn to_text(&self, maxdd: usize) -> String {
        let mut out = String::new();
        let srid = self.start_value().context().srid;
        if srid != 0 {
            out.push_str(&format!("SRID={};", srid));
        }
        if V::CONTINUOUS && self.interp() == Interpolation::Step {
            out.push_str("Interp=Step;");
        }
        match self {
            Self::Instant(inst) => out.push_str(&instant_text(inst, maxdd)),
            Self::Sequence(seq) => out.push_str(&sequence_text(seq, maxdd)),
            Self::SequenceSet(ss) => {
                let body = ss
                    .sequences
                    .iter()
                    .map(|s| sequence_text(s, maxdd))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!("{{{}}}", body));
            }
        }
        out
    }

    /// Parse any temporal variant. Sequences default to linear
    /// interpolation for continuous base types and to step otherwise.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_inner(input).reported()
    }

    pub(crate) fn parse_inner(input: &str) -> Result<Self> {
        let (srid, interp, body) = split_options(input)?;
        let ctx = ValueContext {
            srid: srid.unwrap_or(0),
            has_z: false,
        };
        let interp = interp.unwrap_or_else(default_interp::<V>);
        let body = body.trim();
        match body.chars().next() {
            Some('{') => {
                let inner = strip_braces(body, "temporal value")?;
                if inner.trim_start().starts_with(['[', '(']) {
                    let sequences = split_top_level(inner)?
                        .into_iter()
                        .map(|part| parse_sequence(part, interp, &ctx))
                        .collect::<Result<Vec<_>>>()?;
                    let ss = TSequenceSet::make_inner(sequences, true)?;
                    return Ok(Self::SequenceSet(ss));
                }
                let instants = parse_instants(inner, &ctx)?;
                let seq =
                    TSequence::make_inner(instants, true, true, Interpolation::Discrete, true)?;
                Ok(Self::Sequence(seq))
            }
            Some('[') | Some('(') => Ok(Self::Sequence(parse_sequence(body, interp, &ctx)?)),
            Some(_) => Ok(Self::Instant(parse_instant(body, &ctx)?)),
            None => Err(ChronotopeError::TextInput(
                "Empty temporal value".to_string(),
            )),
        }
    }
}

impl<V: TemporalValue> fmt::Display for Temporal<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(DEFAULT_FLOAT_DIGITS))
    }
}

impl<V: TemporalValue> FromStr for Temporal<V> {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    #[test]
    fn test_instant_text() {
        let v: Temporal<i32> = "5@2000-01-01".parse().unwrap();
        assert_eq!(v.to_string(), "5@2000-01-01 00:00:00+00");
        let b: Temporal<bool> = "t@2000-01-01 08:00:00+02".parse().unwrap();
        assert_eq!(b.to_string(), "t@2000-01-01 06:00:00+00");
    }

    #[test]
    fn test_sequence_text() {
        let v: Temporal<f64> = "(1.5@2000-01-01, 2.25@2000-01-02]".parse().unwrap();
        assert_eq!(
            v.to_string(),
            "(1.5@2000-01-01 00:00:00+00, 2.25@2000-01-02 00:00:00+00]"
        );
        assert_eq!(v.interp(), Interpolation::Linear);

        let step: Temporal<f64> = "Interp=Step;[1@2000-01-01, 2@2000-01-02]".parse().unwrap();
        assert_eq!(step.interp(), Interpolation::Step);
        assert!(step.to_string().starts_with("Interp=Step;["));

        let ints: Temporal<i32> = "[1@2000-01-01, 2@2000-01-02]".parse().unwrap();
        assert_eq!(ints.interp(), Interpolation::Step);
        assert!(ints.to_string().starts_with('['));
    }

    #[test]
    fn test_discrete_and_set_text() {
        let d: Temporal<i32> = "{1@2000-01-01, 2@2000-01-02}".parse().unwrap();
        assert_eq!(d.interp(), Interpolation::Discrete);
        assert_eq!(
            d.to_string(),
            "{1@2000-01-01 00:00:00+00, 2@2000-01-02 00:00:00+00}"
        );

        let ss: Temporal<f64> =
            "{[1@2000-01-01, 2@2000-01-02], [3@2000-01-04, 3@2000-01-05]}".parse().unwrap();
        assert_eq!(ss.num_sequences(), 2);
        assert_eq!(
            ss.to_string(),
            "{[1@2000-01-01 00:00:00+00, 2@2000-01-02 00:00:00+00], \
             [3@2000-01-04 00:00:00+00, 3@2000-01-05 00:00:00+00]}"
        );
    }

    #[test]
    fn test_point_text_with_srid() {
        let v: Temporal<GeoPoint> =
            "SRID=4326;[POINT(1 1)@2000-01-01, POINT(2 2)@2000-01-02]".parse().unwrap();
        assert_eq!(v.start_value().srid, 4326);
        assert_eq!(
            v.to_string(),
            "SRID=4326;[POINT(1 1)@2000-01-01 00:00:00+00, POINT(2 2)@2000-01-02 00:00:00+00]"
        );
        let both: Temporal<GeoPoint> =
            "Interp=Step;SRID=3857;[POINT(1 1)@2000-01-01]".parse().unwrap();
        assert_eq!(both.interp(), Interpolation::Step);
        assert_eq!(both.start_value().srid, 3857);
    }

    #[test]
    fn test_text_values_with_at_sign() {
        let v: Temporal<String> = "[\"a@b\"@2000-01-01, \"c\"@2000-01-02]".parse().unwrap();
        assert_eq!(v.start_value(), "a@b");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Temporal::<i32>::parse("").is_err());
        assert!(Temporal::<i32>::parse("5").is_err());
        assert!(Temporal::<i32>::parse("[1@2000-01-01, 2@2000-01-02").is_err());
        assert!(Temporal::<i32>::parse("Interp=Cubic;[1@2000-01-01]").is_err());
        assert!(matches!(
            Temporal::<i32>::parse("Interp=Linear;[1@2000-01-01, 2@2000-01-02]"),
            Err(ChronotopeError::FeatureNotSupported(_))
        ));
        assert!(Temporal::<i32>::parse("[2@2000-01-02, 1@2000-01-01]").is_err());
    }
}

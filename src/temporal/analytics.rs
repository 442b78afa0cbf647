//! Time-weighted summaries, rates of change, binning and trajectory
//! simplification.

use super::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal};
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{FloatSpan, TstzSpan};
use crate::types::time::USECS_PER_SEC;
use crate::types::{GeoPoint, Interval, MetricValue, NumericValue, TemporalValue, TimestampTz};

fn seq_integral<V: NumericValue>(seq: &TSequence<V>) -> f64 {
    if seq.is_discrete() {
        return 0.0;
    }
    seq.instants
        .windows(2)
        .map(|w| {
            let dt = (w[1].t.micros() - w[0].t.micros()) as f64;
            let (a, b) = (w[0].value.to_f64(), w[1].value.to_f64());
            match seq.interp {
                Interpolation::Linear => (a + b) / 2.0 * dt,
                _ => a * dt,
            }
        })
        .sum()
}

fn mean<'a, V: NumericValue + 'a>(instants: impl Iterator<Item = &'a TInstant<V>>) -> f64 {
    let (sum, count) = instants.fold((0.0, 0usize), |(s, n), i| (s + i.value.to_f64(), n + 1));
    sum / count as f64
}

impl<V: NumericValue> Temporal<V> {
    /// Area under the curve, in value times microseconds. Discrete values
    /// have no area.
    pub fn integral(&self) -> f64 {
        self.sequence_views().iter().map(seq_integral).sum()
    }

    /// Time-weighted average. Values without duration fall back to the
    /// plain average of their instants.
    pub fn twavg(&self) -> f64 {
        let sequences = self.sequence_views();
        let duration: i64 = sequences
            .iter()
            .filter(|s| !s.is_discrete())
            .map(|s| s.end_timestamp().micros() - s.start_timestamp().micros())
            .sum();
        if duration == 0 {
            return mean(sequences.iter().flat_map(|s| s.instants.iter()));
        }
        self.integral() / duration as f64
    }
}

fn seconds_between<V: TemporalValue>(start: &TInstant<V>, end: &TInstant<V>) -> f64 {
    (end.t.micros() - start.t.micros()) as f64 / USECS_PER_SEC as f64
}

/// Step sequence carrying `rate(start, end)` of every segment from its
/// start, the last rate repeated at the end. Instantaneous sequences have
/// no rate.
fn seq_rate<V, F>(seq: &TSequence<V>, rate: F) -> Result<Option<TSequence<f64>>>
where
    V: TemporalValue,
    F: Fn(&TInstant<V>, &TInstant<V>) -> f64,
{
    if seq.instants.len() < 2 {
        return Ok(None);
    }
    let mut instants: Vec<TInstant<f64>> = seq
        .instants
        .windows(2)
        .map(|w| w[0].with_value(rate(&w[0], &w[1])))
        .collect();
    let last = instants[instants.len() - 1].value;
    instants.push(seq.end_instant().with_value(last));
    TSequence::make_inner(instants, seq.lower_inc, seq.upper_inc, Interpolation::Step, true)
        .map(Some)
}

fn temporal_rate<V, F>(value: &Temporal<V>, rate: F) -> Result<Option<Temporal<f64>>>
where
    V: TemporalValue,
    F: Fn(&TInstant<V>, &TInstant<V>) -> f64,
{
    if value.interp() != Interpolation::Linear {
        return Err(ChronotopeError::InvalidArg(
            "The temporal value must have linear interpolation".to_string(),
        ));
    }
    let mut pieces = Vec::new();
    for seq in value.sequence_views().iter() {
        if let Some(piece) = seq_rate(seq, &rate)? {
            pieces.push(piece);
        }
    }
    Temporal::from_pieces(pieces)
}

impl<V: NumericValue> Temporal<V> {
    /// Slope of every linear segment in value units per second, as a step
    /// function. `None` when every sequence is instantaneous.
    pub fn derivative(&self) -> Result<Option<Temporal<f64>>> {
        temporal_rate(self, |a, b| {
            (b.value.to_f64() - a.value.to_f64()) / seconds_between(a, b)
        })
        .reported()
    }
}

fn seq_length(seq: &TSequence<GeoPoint>) -> f64 {
    if seq.interp != Interpolation::Linear {
        return 0.0;
    }
    seq.instants
        .windows(2)
        .map(|w| w[0].value.distance(&w[1].value))
        .sum()
}

impl Temporal<GeoPoint> {
    /// Distance travelled. Points without linear interpolation do not move
    /// between instants.
    pub fn length(&self) -> f64 {
        self.sequence_views().iter().map(seq_length).sum()
    }

    /// Distance travelled since the start, carried over the gaps between
    /// sequences.
    pub fn cumulative_length(&self) -> Result<Temporal<f64>> {
        let run = || -> Result<Temporal<f64>> {
            if self.interp() != Interpolation::Linear {
                return Temporal::from_base_temp(0.0, self);
            }
            let mut total = 0.0;
            let mut cumulate = |seq: &TSequence<GeoPoint>| -> Result<TSequence<f64>> {
                let mut instants = Vec::with_capacity(seq.instants.len());
                for (i, inst) in seq.instants.iter().enumerate() {
                    if i > 0 {
                        total += seq.instants[i - 1].value.distance(&inst.value);
                    }
                    instants.push(inst.with_value(total));
                }
                TSequence::make_inner(instants, seq.lower_inc, seq.upper_inc, seq.interp, true)
            };
            Ok(match self {
                Temporal::Instant(inst) => Temporal::Instant(inst.with_value(0.0)),
                Temporal::Sequence(seq) => Temporal::Sequence(cumulate(seq)?),
                Temporal::SequenceSet(ss) => {
                    let mut sequences = Vec::with_capacity(ss.sequences.len());
                    for seq in &ss.sequences {
                        sequences.push(cumulate(seq)?);
                    }
                    Temporal::SequenceSet(TSequenceSet::make_inner(sequences, true)?)
                }
            })
        };
        run().reported()
    }

    /// Speed of every linear segment in distance units per second.
    pub fn speed(&self) -> Result<Option<Temporal<f64>>> {
        temporal_rate(self, |a, b| a.value.distance(&b.value) / seconds_between(a, b))
            .reported()
    }
}

fn bin_micros(duration: Interval) -> Result<i64> {
    match duration.num_microseconds() {
        Some(size) if size > 0 => Ok(size),
        _ => Err(ChronotopeError::InvalidArgValue(format!(
            "The duration must be positive: {}",
            duration
        ))),
    }
}

/// Start of the bin of width `size` aligned on `origin` that holds `t`.
fn bin_start(t: TimestampTz, size: i64, origin: TimestampTz) -> Result<TimestampTz> {
    let offset = t.micros() - origin.micros();
    origin
        .micros()
        .checked_add(offset.div_euclid(size) * size)
        .map(TimestampTz::from_micros)
        .ok_or_else(|| ChronotopeError::OutOfRange("Timestamp out of range".to_string()))
}

/// Bin boundaries of width `size` aligned on `origin` that fall inside
/// `period`.
fn boundaries_within(period: &TstzSpan, size: i64, origin: TimestampTz) -> Result<Vec<TimestampTz>> {
    let mut t = bin_start(period.lower(), size, origin)?;
    let mut result = Vec::new();
    while t <= period.upper() {
        if period.contains_value(t) {
            result.push(t);
        }
        t = match t.micros().checked_add(size) {
            Some(next) => TimestampTz::from_micros(next),
            None => break,
        };
    }
    Ok(result)
}

impl<V: TemporalValue> Temporal<V> {
    /// Fragments of the value over consecutive time bins of width
    /// `duration` aligned on `origin`, each with the start of its bin.
    /// Bins where the value is not defined are skipped.
    pub fn time_split(&self, duration: Interval, origin: TimestampTz) -> Result<Vec<(TimestampTz, Self)>> {
        let run = || -> Result<Vec<(TimestampTz, Self)>> {
            let size = bin_micros(duration)?;
            let span = self.timespan();
            let mut lower = bin_start(span.lower(), size, origin)?;
            let mut result = Vec::new();
            while lower <= span.upper() {
                let upper = lower.checked_add(duration)?;
                let bin = TstzSpan::new(lower, upper, true, false)?;
                if let Some(piece) = self.at_tstzspan(&bin)? {
                    result.push((lower, piece));
                }
                lower = upper;
            }
            Ok(result)
        };
        run().reported()
    }

    /// Value sampled at every bin boundary of width `duration` aligned on
    /// `origin`. Discrete values keep the instants lying on a boundary.
    pub fn tsample(
        &self,
        duration: Interval,
        origin: TimestampTz,
        interp: Interpolation,
    ) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            let size = bin_micros(duration)?;
            let mut pieces = Vec::new();
            for seq in self.sequence_views().iter() {
                let instants: Vec<TInstant<V>> = if seq.is_discrete() {
                    seq.instants
                        .iter()
                        .filter(|i| (i.t.micros() - origin.micros()).rem_euclid(size) == 0)
                        .cloned()
                        .collect()
                } else {
                    boundaries_within(&seq.period(), size, origin)?
                        .into_iter()
                        .map(|t| TInstant::new(seq.value_at_unchecked(t), t))
                        .collect()
                };
                if instants.is_empty() {
                    continue;
                }
                if interp == Interpolation::Discrete {
                    pieces.extend(
                        instants
                            .into_iter()
                            .map(|i| TSequence::from_instant(i, Interpolation::Discrete)),
                    );
                } else {
                    pieces.push(TSequence::make_inner(instants, true, true, interp, true)?);
                }
            }
            Temporal::from_pieces(pieces)
        };
        run().reported()
    }
}

impl<V: NumericValue> Temporal<V> {
    /// Fragments of the value over consecutive value bins of width `size`
    /// aligned on `origin`, each with the lower bound of its bin.
    pub fn value_split(&self, size: V, origin: V) -> Result<Vec<(V, Self)>> {
        let run = || -> Result<Vec<(V, Self)>> {
            let width = size.to_f64();
            if !(width > 0.0) {
                return Err(ChronotopeError::InvalidArgValue(format!(
                    "The bin size must be positive: {:?}",
                    size
                )));
            }
            let (min, max) = (self.min_value().to_f64(), self.max_value().to_f64());
            let origin = origin.to_f64();
            let mut k = ((min - origin) / width).floor();
            let mut result = Vec::new();
            loop {
                let lower = origin + k * width;
                if lower > max {
                    break;
                }
                let bin = FloatSpan::new(lower, lower + width, true, false)?;
                if let Some(piece) = self.at_span(&bin)? {
                    result.push((V::from_f64(lower)?, piece));
                }
                k += 1.0;
            }
            Ok(result)
        };
        run().reported()
    }

    /// Time-weighted average over every bin of width `duration` aligned on
    /// `origin`, placed at the start of its bin. Runs of consecutive bins
    /// form one sequence with the interpolation of the value.
    pub fn tprecision(&self, duration: Interval, origin: TimestampTz) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            let interp = self.interp();
            let mut runs: Vec<Vec<TInstant<V>>> = Vec::new();
            let mut reached: Option<TimestampTz> = None;
            for (lower, piece) in self.time_split(duration, origin)? {
                let upper = lower.checked_add(duration)?;
                let inst = TInstant::new(V::from_f64(piece.twavg())?, lower);
                let joins = interp != Interpolation::Discrete
                    && reached == Some(lower)
                    && piece.start_timestamp() == lower;
                match runs.last_mut() {
                    Some(run) if joins => run.push(inst),
                    _ => runs.push(vec![inst]),
                }
                reached = (piece.end_timestamp() == upper).then_some(upper);
            }
            let pieces = runs
                .into_iter()
                .map(|instants| TSequence::make_inner(instants, true, true, interp, true))
                .collect::<Result<Vec<_>>>()?;
            Temporal::from_pieces(pieces)
        };
        run().reported()
    }
}

/// Distance from `p` to the segment `start`-`end`. Synchronized distance
/// compares against the segment position at the timestamp of `p`.
fn segment_distance<V: MetricValue>(
    start: &TInstant<V>,
    end: &TInstant<V>,
    p: &TInstant<V>,
    synchronized: bool,
) -> f64 {
    if synchronized {
        let r = p.t.ratio(start.t, end.t);
        return p.value.distance(&V::interpolate(&start.value, &end.value, r));
    }
    match V::closest_approach(&start.value, &end.value, &p.value, &p.value) {
        Some(r) => p.value.distance(&V::interpolate(&start.value, &end.value, r)),
        None => p.value.distance(&start.value).min(p.value.distance(&end.value)),
    }
}

fn douglas_peucker<V: MetricValue>(
    instants: &[TInstant<V>],
    eps: f64,
    synchronized: bool,
) -> Vec<TInstant<V>> {
    let n = instants.len();
    if n <= 2 {
        return instants.to_vec();
    }
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;
    let mut stack = vec![(0, n - 1)];
    while let Some((i, j)) = stack.pop() {
        if j <= i + 1 {
            continue;
        }
        let (k, dist) = (i + 1..j)
            .map(|k| {
                let d = segment_distance(&instants[i], &instants[j], &instants[k], synchronized);
                (k, d)
            })
            .fold((i + 1, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if dist > eps {
            keep[k] = true;
            stack.push((i, k));
            stack.push((k, j));
        }
    }
    instants
        .iter()
        .zip(keep)
        .filter_map(|(inst, k)| k.then(|| inst.clone()))
        .collect()
}

/// Rebuild a sequence over a subset of its instants, which always keeps
/// the first and the last one.
fn rebuild<V: MetricValue>(seq: &TSequence<V>, mut instants: Vec<TInstant<V>>) -> Result<TSequence<V>> {
    let n = instants.len();
    if seq.interp == Interpolation::Step && !seq.upper_inc && n >= 2 {
        instants[n - 1].value = instants[n - 2].value.clone();
    }
    TSequence::make_inner(instants, seq.lower_inc, seq.upper_inc, seq.interp, false)
}

fn map_sequences<V, F>(value: &Temporal<V>, f: F) -> Result<Temporal<V>>
where
    V: MetricValue,
    F: Fn(&TSequence<V>) -> Result<TSequence<V>>,
{
    Ok(match value {
        Temporal::Instant(inst) => Temporal::Instant(inst.clone()),
        Temporal::Sequence(seq) => Temporal::Sequence(f(seq)?),
        Temporal::SequenceSet(ss) => {
            let sequences = ss.sequences.iter().map(f).collect::<Result<Vec<_>>>()?;
            Temporal::SequenceSet(TSequenceSet::make_inner(sequences, true)?)
        }
    })
}

/// Keep the instants selected by `keep(last_kept, candidate)`, plus the
/// first and the last ones.
fn filter_instants<V, F>(seq: &TSequence<V>, keep: F) -> Result<TSequence<V>>
where
    V: MetricValue,
    F: Fn(&TInstant<V>, &TInstant<V>) -> bool,
{
    let n = seq.instants.len();
    if n <= 2 {
        return Ok(seq.clone());
    }
    let mut result: Vec<TInstant<V>> = vec![seq.instants[0].clone()];
    for inst in &seq.instants[1..n - 1] {
        if result.last().is_some_and(|last| keep(last, inst)) {
            result.push(inst.clone());
        }
    }
    result.push(seq.instants[n - 1].clone());
    rebuild(seq, result)
}

impl<V: MetricValue> Temporal<V> {
    /// Drop instants closer than `dist` in value to the previously kept one.
    pub fn simplify_min_dist(&self, dist: f64) -> Result<Self> {
        let run = || -> Result<Self> {
            if !(dist > 0.0) {
                return Err(ChronotopeError::InvalidArgValue(format!(
                    "The distance must be positive: {}",
                    dist
                )));
            }
            map_sequences(self, |seq| {
                filter_instants(seq, |last, inst| last.value.distance(&inst.value) > dist)
            })
        };
        run().reported()
    }

    /// Drop instants closer than `mint` in time to the previously kept one.
    pub fn simplify_min_tdelta(&self, mint: Interval) -> Result<Self> {
        let run = || -> Result<Self> {
            if mint <= Interval::zero() {
                return Err(ChronotopeError::InvalidArgValue(format!(
                    "The duration must be positive: {}",
                    mint
                )));
            }
            map_sequences(self, |seq| {
                filter_instants(seq, |last, inst| inst.t.delta_since(last.t) > mint)
            })
        };
        run().reported()
    }

    /// Douglas-Peucker simplification of linear sequences with tolerance
    /// `eps`. The synchronized variant measures the distance between an
    /// instant and the simplified segment at the same timestamp; otherwise
    /// the distance to the segment in value space is used. Sequences
    /// without linear interpolation are kept as they are.
    pub fn simplify_dp(&self, eps: f64, synchronized: bool) -> Result<Self> {
        let run = || -> Result<Self> {
            if !(eps >= 0.0) {
                return Err(ChronotopeError::InvalidArgValue(format!(
                    "The tolerance must be non-negative: {}",
                    eps
                )));
            }
            map_sequences(self, |seq| {
                if seq.interp != Interpolation::Linear {
                    return Ok(seq.clone());
                }
                rebuild(seq, douglas_peucker(&seq.instants, eps, synchronized))
            })
        };
        run().reported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: f64 = 86_400_000_000.0;

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    #[test]
    fn test_integral_and_twavg_linear() {
        let v: Temporal<f64> = "[1@2000-01-01, 3@2000-01-03]".parse().unwrap();
        assert_eq!(v.integral(), 4.0 * DAY);
        assert_eq!(v.twavg(), 2.0);
    }

    #[test]
    fn test_integral_and_twavg_step() {
        let v: Temporal<i32> = "[1@2000-01-01, 3@2000-01-02, 3@2000-01-04)".parse().unwrap();
        assert_eq!(v.integral(), 7.0 * DAY);
        assert!((v.twavg() - 7.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_twavg_without_duration() {
        let v: Temporal<i32> = "{1@2000-01-01, 5@2000-01-02}".parse().unwrap();
        assert_eq!(v.integral(), 0.0);
        assert_eq!(v.twavg(), 3.0);
        let inst: Temporal<f64> = "2.5@2000-01-01".parse().unwrap();
        assert_eq!(inst.twavg(), 2.5);
    }

    #[test]
    fn test_simplify_dp() {
        let v: Temporal<f64> =
            "[0@2000-01-01, 0.1@2000-01-02, 0@2000-01-03, 5@2000-01-04]".parse().unwrap();
        let s = v.simplify_dp(0.5, true).unwrap();
        let values: Vec<f64> = s.instants().iter().map(|i| *i.value()).collect();
        assert_eq!(values, vec![0.0, 0.0, 5.0]);
        assert_eq!(s.start_timestamp(), v.start_timestamp());
        assert_eq!(s.end_timestamp(), v.end_timestamp());
    }

    #[test]
    fn test_simplify_min_dist() {
        let v: Temporal<f64> =
            "[1@2000-01-01, 1.1@2000-01-02, 3@2000-01-03, 3.05@2000-01-04]".parse().unwrap();
        let s = v.simplify_min_dist(0.5).unwrap();
        let values: Vec<f64> = s.instants().iter().map(|i| *i.value()).collect();
        assert_eq!(values, vec![1.0, 3.0, 3.05]);
        assert!(v.simplify_min_dist(-1.0).is_err());
    }

    #[test]
    fn test_simplify_min_tdelta() {
        let v: Temporal<f64> =
            "[1@2000-01-01, 3@2000-01-01 06:00:00, 5@2000-01-02, 4@2000-01-03]".parse().unwrap();
        let s = v.simplify_min_tdelta(Interval::hours(12)).unwrap();
        assert_eq!(s.num_instants(), 3);
    }

    #[test]
    fn test_derivative_is_slope_per_second() {
        let v: Temporal<f64> = "[0@2000-01-01, 86400@2000-01-02, 86400@2000-01-03]".parse().unwrap();
        let d = v.derivative().unwrap().unwrap();
        assert_eq!(d.interp(), Interpolation::Step);
        assert_eq!(d.value_at_timestamp(t(0)), Some(1.0));
        assert_eq!(d.value_at_timestamp(TimestampTz::from_micros(DAY as i64 / 2)), Some(1.0));
        assert_eq!(d.value_at_timestamp(t(1)), Some(0.0));
        assert_eq!(d.timespan(), v.timespan());

        let steps: Temporal<i32> = "[1@2000-01-01, 2@2000-01-02]".parse().unwrap();
        assert!(matches!(steps.derivative(), Err(ChronotopeError::InvalidArg(_))));
        let single: Temporal<f64> = "[2@2000-01-01]".parse().unwrap();
        assert!(single.derivative().unwrap().is_none());
    }

    #[test]
    fn test_length_and_speed_of_moving_point() {
        let p: Temporal<GeoPoint> =
            "[POINT(0 0)@2000-01-01, POINT(3 4)@2000-01-02, POINT(3 4)@2000-01-03]".parse().unwrap();
        assert_eq!(p.length(), 5.0);

        let cumulative = p.cumulative_length().unwrap();
        assert_eq!(cumulative.value_at_timestamp(t(0)), Some(0.0));
        assert_eq!(cumulative.value_at_timestamp(TimestampTz::from_micros(DAY as i64 / 2)), Some(2.5));
        assert_eq!(cumulative.value_at_timestamp(t(2)), Some(5.0));

        let speed = p.speed().unwrap().unwrap();
        assert_eq!(speed.value_at_timestamp(t(0)), Some(5.0 / 86_400.0));
        assert_eq!(speed.value_at_timestamp(t(2)), Some(0.0));
    }

    #[test]
    fn test_discrete_points_do_not_travel() {
        let p: Temporal<GeoPoint> = "{POINT(0 0)@2000-01-01, POINT(3 4)@2000-01-02}".parse().unwrap();
        assert_eq!(p.length(), 0.0);
        let cumulative = p.cumulative_length().unwrap();
        assert_eq!(cumulative.values(), vec![0.0]);
        assert_eq!(cumulative.num_instants(), 2);
        assert!(matches!(p.speed(), Err(ChronotopeError::InvalidArg(_))));
    }

    #[test]
    fn test_time_split_aligns_on_origin() {
        let v: Temporal<f64> = "[1@2000-01-01, 5@2000-01-05]".parse().unwrap();
        let bins = v.time_split(Interval::days(2), t(0)).unwrap();
        let starts: Vec<TimestampTz> = bins.iter().map(|(start, _)| *start).collect();
        assert_eq!(starts, vec![t(0), t(2), t(4)]);
        assert_eq!(bins[0].1.value_at_timestamp(t(1)), Some(2.0));
        assert_eq!(bins[0].1.value_at_timestamp(t(2)), None);
        assert_eq!(bins[2].1.num_instants(), 1);

        let shifted = v.time_split(Interval::days(2), t(1)).unwrap();
        assert_eq!(shifted[0].0, t(-1));
        assert_eq!(shifted.len(), 3);
        assert!(v.time_split(Interval::zero(), t(0)).is_err());
    }

    #[test]
    fn test_value_split_bins() {
        let v: Temporal<f64> = "[1@2000-01-01, 5@2000-01-05]".parse().unwrap();
        let bins = v.value_split(2.0, 0.0).unwrap();
        let lowers: Vec<f64> = bins.iter().map(|(lower, _)| *lower).collect();
        assert_eq!(lowers, vec![0.0, 2.0, 4.0]);
        assert_eq!(bins[0].1.timespan().upper(), t(1));
        assert_eq!(bins[2].1.end_timestamp(), t(4));
        assert!(matches!(v.value_split(0.0, 0.0), Err(ChronotopeError::InvalidArgValue(_))));
    }

    #[test]
    fn test_tsample_at_bin_boundaries() {
        let v: Temporal<f64> = "[1@2000-01-01, 5@2000-01-05]".parse().unwrap();
        let step = v.tsample(Interval::days(2), t(0), Interpolation::Step).unwrap().unwrap();
        let values: Vec<f64> = step.instants().iter().map(|i| *i.value()).collect();
        assert_eq!(values, vec![1.0, 3.0, 5.0]);
        assert_eq!(step.value_at_timestamp(t(3)), Some(3.0));

        let discrete = v.tsample(Interval::days(2), t(0), Interpolation::Discrete).unwrap().unwrap();
        assert_eq!(discrete.num_instants(), 3);
        assert_eq!(discrete.value_at_timestamp(t(1)), None);

        let instants: Temporal<i32> = "{1@2000-01-01, 2@2000-01-02, 3@2000-01-03}".parse().unwrap();
        let kept = instants.tsample(Interval::days(2), t(0), Interpolation::Discrete).unwrap().unwrap();
        assert_eq!(kept.values(), vec![1, 3]);

        let ints: Temporal<i32> = "[1@2000-01-01, 2@2000-01-03]".parse().unwrap();
        assert!(ints.tsample(Interval::days(1), t(0), Interpolation::Linear).is_err());
    }

    #[test]
    fn test_tprecision_averages_each_bin() {
        let v: Temporal<f64> = "[0@2000-01-01, 4@2000-01-05]".parse().unwrap();
        let p = v.tprecision(Interval::days(2), t(0)).unwrap().unwrap();
        assert_eq!(p.num_sequences(), 1);
        let values: Vec<f64> = p.instants().iter().map(|i| *i.value()).collect();
        assert_eq!(values, vec![1.0, 3.0, 4.0]);
        assert_eq!(p.interp(), Interpolation::Linear);

        let steps: Temporal<i32> = "[1@2000-01-01, 3@2000-01-02, 3@2000-01-04)".parse().unwrap();
        let p = steps.tprecision(Interval::days(2), t(0)).unwrap().unwrap();
        let values: Vec<i32> = p.instants().iter().map(|i| *i.value()).collect();
        assert_eq!(values, vec![2, 3]);
        assert_eq!(p.end_timestamp(), t(2));
    }
}

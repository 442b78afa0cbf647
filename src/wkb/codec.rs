//! Binary layouts of spans, sets, boxes and temporal values.

use super::{WkbDecode, WkbEncode, WkbReader, WkbWriter};
use crate::boxes::{STBox, STBoxParts, TBox};
use crate::error::{ChronotopeError, Result};
use crate::span::{FloatSpan, Set, Span, SpanBound, SpanSet, TstzSpan};
use crate::temporal::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal, TemporalSubtype};
use crate::types::catalog::expect_type;
use crate::types::{TemporalValue, TimestampTz, ValueContext, type_info};

const LOWER_INC: u8 = 0x01;
const UPPER_INC: u8 = 0x02;

const BOX_X: u8 = 0x01;
const BOX_T: u8 = 0x02;
const FLAG_Z: u8 = 0x10;
const FLAG_GEODETIC: u8 = 0x20;
const FLAG_SRID: u8 = 0x40;

fn invalid(e: ChronotopeError) -> ChronotopeError {
    match e {
        ChronotopeError::WkbInput(_) => e,
        other => ChronotopeError::WkbInput(other.to_string()),
    }
}

fn bound_flags(lower_inc: bool, upper_inc: bool) -> u8 {
    let mut flags = 0;
    if lower_inc {
        flags |= LOWER_INC;
    }
    if upper_inc {
        flags |= UPPER_INC;
    }
    flags
}

fn read_bound_flags(r: &mut WkbReader<'_>) -> Result<(bool, bool)> {
    let flags = r.get_u8()?;
    if flags & !(LOWER_INC | UPPER_INC) != 0 {
        return Err(ChronotopeError::WkbInput(format!(
            "Invalid bound flags {:#04x}",
            flags
        )));
    }
    Ok((flags & LOWER_INC != 0, flags & UPPER_INC != 0))
}

/// Bound flags and bounds, without header.
fn write_span_body<T: SpanBound>(span: &Span<T>, w: &mut WkbWriter) {
    w.put_u8(bound_flags(span.lower_inc(), span.upper_inc()));
    span.lower().write_bound(w);
    span.upper().write_bound(w);
}

fn read_span_body<T: SpanBound>(r: &mut WkbReader<'_>) -> Result<Span<T>> {
    let (lower_inc, upper_inc) = read_bound_flags(r)?;
    let lower = T::read_bound(r)?;
    let upper = T::read_bound(r)?;
    Span::make_inner(lower, upper, lower_inc, upper_inc).map_err(invalid)
}

/// Smallest encoded size of a value of `T`.
fn bound_size<T: SpanBound>() -> usize {
    type_info(T::BASE_TYPE).width.unwrap_or(1)
}

impl<T: SpanBound> WkbEncode for Span<T> {
    fn write_wkb(&self, w: &mut WkbWriter) -> Result<()> {
        w.put_endian();
        w.put_u16(T::SPAN_TYPE.id());
        write_span_body(self, w);
        Ok(())
    }
}

impl<T: SpanBound> WkbDecode for Span<T> {
    fn read_wkb(r: &mut WkbReader<'_>) -> Result<Self> {
        r.read_endian()?;
        expect_type(r.get_u16()?, T::SPAN_TYPE)?;
        read_span_body(r)
    }
}

impl<T: SpanBound> WkbEncode for SpanSet<T> {
    fn write_wkb(&self, w: &mut WkbWriter) -> Result<()> {
        w.put_endian();
        w.put_u16(T::SPANSET_TYPE.id());
        w.put_count(self.num_spans())?;
        for span in self.spans() {
            write_span_body(span, w);
        }
        Ok(())
    }
}

impl<T: SpanBound> WkbDecode for SpanSet<T> {
    fn read_wkb(r: &mut WkbReader<'_>) -> Result<Self> {
        r.read_endian()?;
        expect_type(r.get_u16()?, T::SPANSET_TYPE)?;
        let count = r.get_count(1 + 2 * bound_size::<T>())?;
        let spans = (0..count)
            .map(|_| read_span_body(r))
            .collect::<Result<Vec<_>>>()?;
        Ok(SpanSet::from_unsorted(spans))
    }
}

impl<T: SpanBound> WkbEncode for Set<T> {
    fn write_wkb(&self, w: &mut WkbWriter) -> Result<()> {
        w.put_endian();
        w.put_u16(T::SET_TYPE.id());
        w.put_count(self.num_values())?;
        for v in self.values() {
            v.write_bound(w);
        }
        Ok(())
    }
}

impl<T: SpanBound> WkbDecode for Set<T> {
    fn read_wkb(r: &mut WkbReader<'_>) -> Result<Self> {
        r.read_endian()?;
        expect_type(r.get_u16()?, T::SET_TYPE)?;
        let count = r.get_count(bound_size::<T>())?;
        let values = (0..count)
            .map(|_| T::read_bound(r))
            .collect::<Result<Vec<_>>>()?;
        Set::new_inner(values).map_err(invalid)
    }
}

impl WkbEncode for TBox {
    fn write_wkb(&self, w: &mut WkbWriter) -> Result<()> {
        w.put_endian();
        let mut flags = 0;
        if self.has_x() {
            flags |= BOX_X;
        }
        if self.has_t() {
            flags |= BOX_T;
        }
        w.put_u8(flags);
        if let Some(span) = self.span() {
            write_span_body(span, w);
        }
        if let Some(period) = self.period() {
            write_span_body(period, w);
        }
        Ok(())
    }
}

impl WkbDecode for TBox {
    fn read_wkb(r: &mut WkbReader<'_>) -> Result<Self> {
        r.read_endian()?;
        let flags = r.get_u8()?;
        if flags & !(BOX_X | BOX_T) != 0 {
            return Err(ChronotopeError::WkbInput(format!(
                "Invalid temporal box flags {:#04x}",
                flags
            )));
        }
        let span: Option<FloatSpan> = if flags & BOX_X != 0 {
            Some(read_span_body(r)?)
        } else {
            None
        };
        let period: Option<TstzSpan> = if flags & BOX_T != 0 {
            Some(read_span_body(r)?)
        } else {
            None
        };
        match (span, period) {
            (Some(s), Some(p)) => Ok(TBox::from_span_period(s, p)),
            (Some(s), None) => Ok(TBox::from_span(s)),
            (None, Some(p)) => Ok(TBox::from_period(p)),
            (None, None) => Err(ChronotopeError::WkbInput(
                "A temporal box needs a value or a time dimension".to_string(),
            )),
        }
    }
}

impl WkbEncode for STBox {
    fn write_wkb(&self, w: &mut WkbWriter) -> Result<()> {
        w.put_endian();
        let with_srid = w.extended() && self.srid() != 0;
        let mut flags = 0;
        if self.has_x() {
            flags |= BOX_X;
        }
        if self.has_t() {
            flags |= BOX_T;
        }
        if self.has_z() {
            flags |= FLAG_Z;
        }
        if self.is_geodetic() {
            flags |= FLAG_GEODETIC;
        }
        if with_srid {
            flags |= FLAG_SRID;
        }
        w.put_u8(flags);
        if with_srid {
            w.put_i32(self.srid());
        }
        if self.has_x() {
            w.put_f64(self.xmin());
            w.put_f64(self.xmax());
            w.put_f64(self.ymin());
            w.put_f64(self.ymax());
            if let (Some(zmin), Some(zmax)) = (self.zmin(), self.zmax()) {
                w.put_f64(zmin);
                w.put_f64(zmax);
            }
        }
        if let Some(period) = self.period() {
            write_span_body(period, w);
        }
        Ok(())
    }
}

impl WkbDecode for STBox {
    fn read_wkb(r: &mut WkbReader<'_>) -> Result<Self> {
        r.read_endian()?;
        let flags = r.get_u8()?;
        if flags & !(BOX_X | BOX_T | FLAG_Z | FLAG_GEODETIC | FLAG_SRID) != 0 {
            return Err(ChronotopeError::WkbInput(format!(
                "Invalid spatiotemporal box flags {:#04x}",
                flags
            )));
        }
        let srid = if flags & FLAG_SRID != 0 { r.get_i32()? } else { 0 };
        let has_x = flags & BOX_X != 0;
        let has_z = has_x && flags & FLAG_Z != 0;
        let (mut min, mut max) = ([0.0; 3], [0.0; 3]);
        if has_x {
            let axes = if has_z { 3 } else { 2 };
            for i in 0..axes {
                min[i] = r.get_f64()?;
                max[i] = r.get_f64()?;
            }
        }
        let period = if flags & BOX_T != 0 {
            Some(read_span_body(r)?)
        } else {
            None
        };
        STBox::from_parts(STBoxParts {
            min,
            max,
            period,
            srid,
            has_x,
            has_z,
            geodetic: flags & FLAG_GEODETIC != 0,
        })
        .map_err(invalid)
    }
}

fn write_instant<V: TemporalValue>(inst: &TInstant<V>, w: &mut WkbWriter) {
    inst.value().write_value(w);
    w.put_i64(inst.timestamp().micros());
}

fn read_instant<V: TemporalValue>(r: &mut WkbReader<'_>, ctx: &ValueContext) -> Result<TInstant<V>> {
    let value = V::read_value(r, ctx)?;
    let t = TimestampTz::from_micros(r.get_i64()?);
    Ok(TInstant::new(value, t))
}

fn write_sequence<V: TemporalValue>(seq: &TSequence<V>, w: &mut WkbWriter) -> Result<()> {
    w.put_count(seq.num_instants())?;
    w.put_u8(bound_flags(seq.lower_inc(), seq.upper_inc()));
    for inst in seq.instants() {
        write_instant(inst, w);
    }
    Ok(())
}

fn read_sequence<V: TemporalValue>(
    r: &mut WkbReader<'_>,
    interp: Interpolation,
    ctx: &ValueContext,
) -> Result<TSequence<V>> {
    let count = r.get_count(instant_size::<V>())?;
    let (lower_inc, upper_inc) = read_bound_flags(r)?;
    let instants = (0..count)
        .map(|_| read_instant(r, ctx))
        .collect::<Result<Vec<_>>>()?;
    TSequence::make_inner(instants, lower_inc, upper_inc, interp, false).map_err(invalid)
}

/// Smallest encoded size of an instant of `V`.
fn instant_size<V: TemporalValue>() -> usize {
    8 + type_info(V::BASE_TYPE).width.unwrap_or(8)
}

impl<V: TemporalValue> WkbEncode for Temporal<V> {
    fn write_wkb(&self, w: &mut WkbWriter) -> Result<()> {
        w.put_endian();
        w.put_u16(V::TEMPORAL_TYPE.id());
        let ctx = self.start_value().context();
        let with_srid = w.extended() && ctx.srid != 0;
        let interp = match self {
            Self::Instant(_) => 0,
            _ => self.interp().code(),
        };
        let mut flags = self.subtype().code() | (interp << 2);
        if ctx.has_z {
            flags |= FLAG_Z;
        }
        if with_srid {
            flags |= FLAG_SRID;
        }
        w.put_u8(flags);
        if with_srid {
            w.put_i32(ctx.srid);
        }
        match self {
            Self::Instant(inst) => write_instant(inst, w),
            Self::Sequence(seq) => write_sequence(seq, w)?,
            Self::SequenceSet(ss) => {
                w.put_count(ss.num_sequences())?;
                for seq in ss.sequences() {
                    write_sequence(seq, w)?;
                }
            }
        }
        Ok(())
    }
}

impl<V: TemporalValue> WkbDecode for Temporal<V> {
    fn read_wkb(r: &mut WkbReader<'_>) -> Result<Self> {
        r.read_endian()?;
        expect_type(r.get_u16()?, V::TEMPORAL_TYPE)?;
        let flags = r.get_u8()?;
        if flags & !(0x0f | FLAG_Z | FLAG_GEODETIC | FLAG_SRID) != 0 {
            return Err(ChronotopeError::WkbInput(format!(
                "Invalid temporal flags {:#04x}",
                flags
            )));
        }
        let subtype = TemporalSubtype::from_code(flags & 0x03)?;
        let ctx = ValueContext {
            srid: if flags & FLAG_SRID != 0 { r.get_i32()? } else { 0 },
            has_z: flags & FLAG_Z != 0,
        };
        if subtype == TemporalSubtype::Instant {
            return Ok(Self::Instant(read_instant(r, &ctx)?));
        }
        let interp = Interpolation::from_code((flags >> 2) & 0x03)?;
        match subtype {
            TemporalSubtype::Sequence => Ok(Self::Sequence(read_sequence(r, interp, &ctx)?)),
            _ => {
                let count = r.get_count(4 + 1 + instant_size::<V>())?;
                let sequences = (0..count)
                    .map(|_| read_sequence(r, interp, &ctx))
                    .collect::<Result<Vec<_>>>()?;
                let ss = TSequenceSet::make_inner(sequences, false).map_err(invalid)?;
                Ok(Self::SequenceSet(ss))
            }
        }
    }
}

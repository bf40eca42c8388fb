//! Math operators: element-wise arithmetic and rolling extrema.
//!
//! - [`add_into`] / [`sub_into`] - element-wise `a + b` and `a - b`
//! - [`max_into`] / [`min_into`] - highest / lowest value over a window
//! - [`maxindex_into`] - input index of the highest value over a window

use super::{check_period, period_input, shortest, window};
use crate::error::{Error, Result};
use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo,
};
use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange};

/// Lookback of the element-wise operators.
#[inline]
#[must_use]
pub const fn arithmetic_lookback() -> usize {
    0
}

fn elementwise_into(
    function: &'static str,
    a: &[f64],
    b: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
    op: impl Fn(f64, f64) -> f64,
) -> Result<OutputRange> {
    let available = shortest(&[a, b]);
    let Some(w) = window(function, start_idx, end_idx, 0, available, output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    for (k, i) in (w.first..=end_idx).enumerate() {
        output[k] = op(a[i], b[i]);
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Element-wise `a + b` over `[start_idx, end_idx]`.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`] for a bad range and
/// [`Error::BufferTooSmall`] when `output` is too short.
pub fn add_into(
    a: &[f64],
    b: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    elementwise_into("ADD", a, b, start_idx, end_idx, output, |x, y| x + y)
}

/// Element-wise `a - b` over `[start_idx, end_idx]`.
///
/// # Errors
///
/// Same as [`add_into`].
pub fn sub_into(
    a: &[f64],
    b: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    elementwise_into("SUB", a, b, start_idx, end_idx, output, |x, y| x - y)
}

/// Lookback of the rolling extrema.
#[inline]
#[must_use]
pub const fn extrema_lookback(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Walks the rolling extremum of `data`, calling `emit(k, index)` with the
/// output position and the input index of the extremum.
///
/// `better(a, b)` returns `true` when `a` should replace `b`. The tracked
/// extremum is only rescanned once it leaves the window.
fn rolling_extremum(
    data: &[f64],
    period: usize,
    first: usize,
    end_idx: usize,
    better: impl Fn(f64, f64) -> bool,
    mut emit: impl FnMut(usize, usize),
) {
    let mut best_idx: Option<usize> = None;
    for (k, today) in (first..=end_idx).enumerate() {
        let trailing = today + 1 - period;
        best_idx = match best_idx {
            Some(idx) if idx >= trailing => {
                if better(data[today], data[idx]) || data[today] == data[idx] {
                    Some(today)
                } else {
                    Some(idx)
                }
            }
            _ => {
                let mut idx = trailing;
                for i in trailing + 1..=today {
                    if better(data[i], data[idx]) || data[i] == data[idx] {
                        idx = i;
                    }
                }
                Some(idx)
            }
        };
        if let Some(idx) = best_idx {
            emit(k, idx);
        }
    }
}

fn extremum_into(
    function: &'static str,
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
    better: impl Fn(f64, f64) -> bool,
) -> Result<OutputRange> {
    check_period(period, 2)?;
    let lookback = extrema_lookback(period);
    let Some(w) = window(function, start_idx, end_idx, lookback, data.len(), output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    rolling_extremum(data, period, w.first, end_idx, better, |k, idx| {
        output[k] = data[idx];
    });
    Ok(OutputRange::new(w.first, w.count))
}

/// Highest value over each `period` window.
///
/// # Errors
///
/// Returns [`Error::BadParam`] for `period < 2`, [`Error::OutOfRangeEndIndex`]
/// for a bad range and [`Error::BufferTooSmall`] when `output` is too short.
pub fn max_into(
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    extremum_into("MAX", data, period, start_idx, end_idx, output, |a, b| a > b)
}

/// Lowest value over each `period` window.
///
/// # Errors
///
/// Same as [`max_into`].
pub fn min_into(
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    extremum_into("MIN", data, period, start_idx, end_idx, output, |a, b| a < b)
}

/// Input index of the highest value over each `period` window.
///
/// Ties resolve to the most recent index.
///
/// # Errors
///
/// Same as [`max_into`], plus [`Error::BadParam`] when an index does not fit
/// the integer output.
pub fn maxindex_into(
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [i32],
) -> Result<OutputRange> {
    check_period(period, 2)?;
    let lookback = extrema_lookback(period);
    let Some(w) = window("MAXINDEX", start_idx, end_idx, lookback, data.len(), output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    i32::try_from(end_idx).map_err(|_| Error::bad_param("index exceeds the integer output range"))?;
    rolling_extremum(data, period, w.first, end_idx, |a, b| a > b, |k, idx| {
        // idx <= end_idx, which fits in i32
        output[k] = i32::try_from(idx).unwrap_or(i32::MAX);
    });
    Ok(OutputRange::new(w.first, w.count))
}

fn arithmetic_lookback_entry(_: &OptInputs<'_>) -> Result<usize> {
    Ok(arithmetic_lookback())
}

fn extrema_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(extrema_lookback(opt.period(0)?))
}

fn add_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let a = params.real_input(0)?;
    let b = params.real_input(1)?;
    add_into(a, b, start_idx, end_idx, params.real_output(0)?)
}

fn sub_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let a = params.real_input(0)?;
    let b = params.real_input(1)?;
    sub_into(a, b, start_idx, end_idx, params.real_output(0)?)
}

fn max_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let data = params.real_input(0)?;
    max_into(data, period, start_idx, end_idx, params.real_output(0)?)
}

fn min_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let data = params.real_input(0)?;
    min_into(data, period, start_idx, end_idx, params.real_output(0)?)
}

fn maxindex_entry(
    params: &mut CallParams<'_, '_>,
    start_idx: usize,
    end_idx: usize,
) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let data = params.real_input(0)?;
    maxindex_into(data, period, start_idx, end_idx, params.integer_output(0)?)
}

const TWO_REALS: &[InputParameterInfo] = &[
    InputParameterInfo::real("inReal0"),
    InputParameterInfo::real("inReal1"),
];

/// Vector arithmetic add.
pub static ADD: FuncDef = FuncDef {
    name: "ADD",
    group: FuncGroup::MathOperators,
    hint: "Vector Arithmetic Add",
    camel_case_name: "Add",
    flags: FuncFlags::empty(),
    inputs: TWO_REALS,
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: arithmetic_lookback_entry,
    compute: add_entry,
};

/// Vector arithmetic subtraction.
pub static SUB: FuncDef = FuncDef {
    name: "SUB",
    group: FuncGroup::MathOperators,
    hint: "Vector Arithmetic Subtraction",
    camel_case_name: "Sub",
    flags: FuncFlags::empty(),
    inputs: TWO_REALS,
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: arithmetic_lookback_entry,
    compute: sub_entry,
};

/// Highest value over a specified period.
pub static MAX: FuncDef = FuncDef {
    name: "MAX",
    group: FuncGroup::MathOperators,
    hint: "Highest value over a specified period",
    camel_case_name: "Max",
    flags: FuncFlags::OVERLAP,
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 30, 2)],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: extrema_lookback_entry,
    compute: max_entry,
};

/// Lowest value over a specified period.
pub static MIN: FuncDef = FuncDef {
    name: "MIN",
    group: FuncGroup::MathOperators,
    hint: "Lowest value over a specified period",
    camel_case_name: "Min",
    flags: FuncFlags::OVERLAP,
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 30, 2)],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: extrema_lookback_entry,
    compute: min_entry,
};

/// Index of highest value over a specified period.
pub static MAXINDEX: FuncDef = FuncDef {
    name: "MAXINDEX",
    group: FuncGroup::MathOperators,
    hint: "Index of highest value over a specified period",
    camel_case_name: "MaxIndex",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 30, 2)],
    outputs: &[OutputParameterInfo::integer("outInteger", OutputFlags::LINE)],
    lookback: extrema_lookback_entry,
    compute: maxindex_entry,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_sub() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [0.5, 0.5, 1.0, 1.0];
        let mut out = [0.0; 4];
        let range = add_into(&a, &b, 1, 3, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(1, 3));
        assert_eq!(&out[..3], &[2.5, 4.0, 5.0]);
        sub_into(&a, &b, 0, 3, &mut out).unwrap();
        assert_eq!(out, [0.5, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn test_add_uses_shortest_input() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 2.0];
        let mut out = [0.0; 3];
        assert!(matches!(
            add_into(&a, &b, 0, 2, &mut out),
            Err(Error::OutOfRangeEndIndex { available: 2, .. })
        ));
    }

    #[test]
    fn test_max_min_window() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let mut out = [0.0; 8];
        let range = max_into(&data, 3, 0, 7, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(2, 6));
        assert_eq!(&out[..6], &[4.0, 4.0, 5.0, 9.0, 9.0, 9.0]);
        let range = min_into(&data, 3, 0, 7, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(2, 6));
        assert_eq!(&out[..6], &[1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_max_rejects_short_period() {
        let data = [1.0, 2.0];
        let mut out = [0.0; 2];
        assert!(matches!(
            max_into(&data, 1, 0, 1, &mut out),
            Err(Error::BadParam { .. })
        ));
    }

    #[test]
    fn test_maxindex_reports_input_indices() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let mut out = [0; 8];
        let range = maxindex_into(&data, 3, 3, 7, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(3, 5));
        assert_eq!(&out[..5], &[2, 4, 5, 5, 5]);
    }

    #[test]
    fn test_maxindex_ties_prefer_latest() {
        let data = [2.0, 2.0, 2.0];
        let mut out = [0; 3];
        maxindex_into(&data, 2, 0, 2, &mut out).unwrap();
        assert_eq!(&out[..2], &[1, 2]);
    }

    #[test]
    fn test_lookback_consumes_range() {
        let data = [1.0; 5];
        let mut out = [0.0; 5];
        assert_eq!(max_into(&data, 5, 0, 3, &mut out), Ok(OutputRange::EMPTY));
    }
}

//! Math transforms: element-wise functions of one series.

use super::window;
use crate::error::Result;
use crate::meta::{FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo};
use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange};

/// Lookback of every element-wise transform.
#[inline]
#[must_use]
pub const fn transform_lookback() -> usize {
    0
}

fn transform_into(
    function: &'static str,
    data: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
    op: fn(f64) -> f64,
) -> Result<OutputRange> {
    let Some(w) = window(function, start_idx, end_idx, 0, data.len(), output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    for (out, &value) in output.iter_mut().zip(&data[w.first..=end_idx]) {
        *out = op(value);
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Square root of each element. Negative inputs yield NaN.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for
/// a bad range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when
/// `output` is too short.
pub fn sqrt_into(data: &[f64], start_idx: usize, end_idx: usize, output: &mut [f64]) -> Result<OutputRange> {
    transform_into("SQRT", data, start_idx, end_idx, output, f64::sqrt)
}

/// Natural logarithm of each element.
///
/// # Errors
///
/// Same as [`sqrt_into`].
pub fn ln_into(data: &[f64], start_idx: usize, end_idx: usize, output: &mut [f64]) -> Result<OutputRange> {
    transform_into("LN", data, start_idx, end_idx, output, f64::ln)
}

fn transform_lookback_entry(_: &OptInputs<'_>) -> Result<usize> {
    Ok(transform_lookback())
}

fn sqrt_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let data = params.real_input(0)?;
    sqrt_into(data, start_idx, end_idx, params.real_output(0)?)
}

fn ln_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let data = params.real_input(0)?;
    ln_into(data, start_idx, end_idx, params.real_output(0)?)
}

/// Vector square root.
pub static SQRT: FuncDef = FuncDef {
    name: "SQRT",
    group: FuncGroup::MathTransform,
    hint: "Vector Square Root",
    camel_case_name: "Sqrt",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: transform_lookback_entry,
    compute: sqrt_entry,
};

/// Vector natural logarithm.
pub static LN: FuncDef = FuncDef {
    name: "LN",
    group: FuncGroup::MathTransform,
    hint: "Vector Log Natural",
    camel_case_name: "Ln",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: transform_lookback_entry,
    compute: ln_entry,
};

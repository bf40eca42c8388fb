//! Candlestick pattern recognition.
//!
//! Pattern functions emit one integer per bar: `100` when the pattern is
//! present, `0` otherwise.

use super::{shortest, window};
use crate::error::Result;
use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo, PriceFlags,
};
use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange};

/// Body size, as a fraction of the bar range, below which a bar is a doji.
pub const DOJI_BODY_RATIO: f64 = 0.1;

/// Computes the lookback period for CDLDOJI.
#[inline]
#[must_use]
pub const fn cdldoji_lookback() -> usize {
    0
}

/// Doji detection.
///
/// A bar is a doji when `|close - open| <= 0.1 × (high - low)`. A flat bar
/// (zero range, equal open and close) counts as a doji.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a
/// bad range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when
/// `output` is too short.
pub fn cdldoji_into(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [i32],
) -> Result<OutputRange> {
    let available = shortest(&[open, high, low, close]);
    let Some(w) = window("CDLDOJI", start_idx, end_idx, cdldoji_lookback(), available, output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    for (k, i) in (w.first..=end_idx).enumerate() {
        let body = (close[i] - open[i]).abs();
        let range = high[i] - low[i];
        output[k] = if body <= DOJI_BODY_RATIO * range { 100 } else { 0 };
    }
    Ok(OutputRange::new(w.first, w.count))
}

fn cdldoji_lookback_entry(_: &OptInputs<'_>) -> Result<usize> {
    Ok(cdldoji_lookback())
}

fn cdldoji_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let price = params.price_input(0)?;
    let open = price.require(PriceFlags::OPEN)?;
    let high = price.require(PriceFlags::HIGH)?;
    let low = price.require(PriceFlags::LOW)?;
    let close = price.require(PriceFlags::CLOSE)?;
    cdldoji_into(open, high, low, close, start_idx, end_idx, params.integer_output(0)?)
}

/// Doji.
pub static CDLDOJI: FuncDef = FuncDef {
    name: "CDLDOJI",
    group: FuncGroup::PatternRecognition,
    hint: "Doji",
    camel_case_name: "CdlDoji",
    flags: FuncFlags::CANDLESTICK,
    inputs: &[InputParameterInfo::price(
        "inPriceOHLC",
        PriceFlags::OPEN
            .union(PriceFlags::HIGH)
            .union(PriceFlags::LOW)
            .union(PriceFlags::CLOSE),
    )],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::integer("outInteger", OutputFlags::PATTERN_BOOL)],
    lookback: cdldoji_lookback_entry,
    compute: cdldoji_entry,
};

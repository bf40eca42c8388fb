//! Volatility indicators.
//!
//! ```text
//! TR[i]  = max(high[i], close[i-1]) - min(low[i], close[i-1])
//! ATR[i] = (ATR[i-1] × (period - 1) + TR[i]) / period
//! ```
//!
//! ATR is seeded with the mean true range of the window ending at the first
//! evaluated index.

use super::{check_period, period_input, shortest, window};
use crate::error::Result;
use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo, PriceFlags,
};
use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange};

const HLC: PriceFlags = PriceFlags::HIGH.union(PriceFlags::LOW).union(PriceFlags::CLOSE);

#[inline]
fn true_range(high: &[f64], low: &[f64], close: &[f64], i: usize) -> f64 {
    let prev_close = close[i - 1];
    high[i].max(prev_close) - low[i].min(prev_close)
}

/// Computes the lookback period for TRANGE.
#[inline]
#[must_use]
pub const fn trange_lookback() -> usize {
    1
}

/// True range.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a
/// bad range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when
/// `output` is too short.
pub fn trange_into(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    let available = shortest(&[high, low, close]);
    let Some(w) = window("TRANGE", start_idx, end_idx, trange_lookback(), available, output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    for (k, i) in (w.first..=end_idx).enumerate() {
        output[k] = true_range(high, low, close, i);
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Computes the lookback period for ATR.
///
/// Lookback = period
#[inline]
#[must_use]
pub const fn atr_lookback(period: usize) -> usize {
    period
}

/// Average true range with Wilder smoothing.
///
/// # Errors
///
/// Returns [`Error::BadParam`](crate::Error::BadParam) for a zero period, plus
/// the range and buffer errors of [`trange_into`].
pub fn atr_into(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    let available = shortest(&[high, low, close]);
    let Some(w) = window("ATR", start_idx, end_idx, atr_lookback(period), available, output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    let period_f = period as f64;
    let seed: f64 = (w.first + 1 - period..=w.first)
        .map(|i| true_range(high, low, close, i))
        .sum();
    let mut atr = seed / period_f;
    output[0] = atr;
    for (k, i) in (w.first + 1..=end_idx).enumerate() {
        atr = atr.mul_add(period_f - 1.0, true_range(high, low, close, i)) / period_f;
        output[k + 1] = atr;
    }
    Ok(OutputRange::new(w.first, w.count))
}

fn trange_lookback_entry(_: &OptInputs<'_>) -> Result<usize> {
    Ok(trange_lookback())
}

fn atr_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(atr_lookback(opt.period(0)?))
}

fn trange_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let price = params.price_input(0)?;
    let high = price.require(PriceFlags::HIGH)?;
    let low = price.require(PriceFlags::LOW)?;
    let close = price.require(PriceFlags::CLOSE)?;
    trange_into(high, low, close, start_idx, end_idx, params.real_output(0)?)
}

fn atr_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let price = params.price_input(0)?;
    let high = price.require(PriceFlags::HIGH)?;
    let low = price.require(PriceFlags::LOW)?;
    let close = price.require(PriceFlags::CLOSE)?;
    atr_into(high, low, close, period, start_idx, end_idx, params.real_output(0)?)
}

/// True range.
pub static TRANGE: FuncDef = FuncDef {
    name: "TRANGE",
    group: FuncGroup::VolatilityIndicators,
    hint: "True Range",
    camel_case_name: "TrueRange",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::price("inPriceHLC", HLC)],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: trange_lookback_entry,
    compute: trange_entry,
};

/// Average true range.
pub static ATR: FuncDef = FuncDef {
    name: "ATR",
    group: FuncGroup::VolatilityIndicators,
    hint: "Average True Range",
    camel_case_name: "Atr",
    flags: FuncFlags::UNST_PERIOD,
    inputs: &[InputParameterInfo::price("inPriceHLC", HLC)],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 14, 1)],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: atr_lookback_entry,
    compute: atr_entry,
};

//! Price transforms: per-bar combinations of the OHLC prices.

use super::{shortest, window};
use crate::error::Result;
use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo, PriceFlags,
};
use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange};

/// Lookback of every price transform.
#[inline]
#[must_use]
pub const fn price_transform_lookback() -> usize {
    0
}

/// Average price, `(open + high + low + close) / 4`.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a
/// bad range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when
/// `output` is too short.
pub fn avgprice_into(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    let available = shortest(&[open, high, low, close]);
    let Some(w) = window("AVGPRICE", start_idx, end_idx, 0, available, output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    for (k, i) in (w.first..=end_idx).enumerate() {
        output[k] = (open[i] + high[i] + low[i] + close[i]) / 4.0;
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Typical price, `(high + low + close) / 3`.
///
/// # Errors
///
/// Same as [`avgprice_into`].
pub fn typprice_into(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    let available = shortest(&[high, low, close]);
    let Some(w) = window("TYPPRICE", start_idx, end_idx, 0, available, output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    for (k, i) in (w.first..=end_idx).enumerate() {
        output[k] = (high[i] + low[i] + close[i]) / 3.0;
    }
    Ok(OutputRange::new(w.first, w.count))
}

fn price_transform_lookback_entry(_: &OptInputs<'_>) -> Result<usize> {
    Ok(price_transform_lookback())
}

fn avgprice_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let price = params.price_input(0)?;
    let open = price.require(PriceFlags::OPEN)?;
    let high = price.require(PriceFlags::HIGH)?;
    let low = price.require(PriceFlags::LOW)?;
    let close = price.require(PriceFlags::CLOSE)?;
    avgprice_into(open, high, low, close, start_idx, end_idx, params.real_output(0)?)
}

fn typprice_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let price = params.price_input(0)?;
    let high = price.require(PriceFlags::HIGH)?;
    let low = price.require(PriceFlags::LOW)?;
    let close = price.require(PriceFlags::CLOSE)?;
    typprice_into(high, low, close, start_idx, end_idx, params.real_output(0)?)
}

/// Average price.
pub static AVGPRICE: FuncDef = FuncDef {
    name: "AVGPRICE",
    group: FuncGroup::PriceTransform,
    hint: "Average Price",
    camel_case_name: "AvgPrice",
    flags: FuncFlags::OVERLAP,
    inputs: &[InputParameterInfo::price(
        "inPriceOHLC",
        PriceFlags::OPEN
            .union(PriceFlags::HIGH)
            .union(PriceFlags::LOW)
            .union(PriceFlags::CLOSE),
    )],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: price_transform_lookback_entry,
    compute: avgprice_entry,
};

/// Typical price.
pub static TYPPRICE: FuncDef = FuncDef {
    name: "TYPPRICE",
    group: FuncGroup::PriceTransform,
    hint: "Typical Price",
    camel_case_name: "TypPrice",
    flags: FuncFlags::OVERLAP,
    inputs: &[InputParameterInfo::price(
        "inPriceHLC",
        PriceFlags::HIGH.union(PriceFlags::LOW).union(PriceFlags::CLOSE),
    )],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: price_transform_lookback_entry,
    compute: typprice_entry,
};

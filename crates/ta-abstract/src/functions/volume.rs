//! Volume indicators.
//!
//! Both indicators are cumulative: they start accumulating at the first
//! evaluated index, so the produced values depend on `start_idx`.

use super::{shortest, window};
use crate::error::Result;
use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo, PriceFlags,
};
use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange};

const HLCV: PriceFlags = PriceFlags::HIGH
    .union(PriceFlags::LOW)
    .union(PriceFlags::CLOSE)
    .union(PriceFlags::VOLUME);

/// Computes the lookback period for AD.
#[inline]
#[must_use]
pub const fn ad_lookback() -> usize {
    0
}

/// Chaikin accumulation/distribution line.
///
/// Bars with `high <= low` contribute nothing.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a
/// bad range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when
/// `output` is too short.
pub fn ad_into(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    let available = shortest(&[high, low, close, volume]);
    let Some(w) = window("AD", start_idx, end_idx, ad_lookback(), available, output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    let mut ad = 0.0;
    for (k, i) in (w.first..=end_idx).enumerate() {
        let (h, l, c) = (high[i], low[i], close[i]);
        let range = h - l;
        if range > 0.0 {
            ad += ((c - l) - (h - c)) / range * volume[i];
        }
        output[k] = ad;
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Computes the lookback period for OBV.
#[inline]
#[must_use]
pub const fn obv_lookback() -> usize {
    0
}

/// On-balance volume.
///
/// Starts at the volume of the first evaluated bar, then adds or subtracts
/// each bar's volume depending on the direction of `data`.
///
/// # Errors
///
/// Same as [`ad_into`].
pub fn obv_into(
    data: &[f64],
    volume: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    let available = shortest(&[data, volume]);
    let Some(w) = window("OBV", start_idx, end_idx, obv_lookback(), available, output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    let mut obv = volume[w.first];
    let mut prev = data[w.first];
    output[0] = obv;
    for (k, i) in (w.first + 1..=end_idx).enumerate() {
        let value = data[i];
        if value > prev {
            obv += volume[i];
        } else if value < prev {
            obv -= volume[i];
        }
        prev = value;
        output[k + 1] = obv;
    }
    Ok(OutputRange::new(w.first, w.count))
}

fn zero_lookback_entry(_: &OptInputs<'_>) -> Result<usize> {
    Ok(0)
}

fn ad_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let price = params.price_input(0)?;
    let high = price.require(PriceFlags::HIGH)?;
    let low = price.require(PriceFlags::LOW)?;
    let close = price.require(PriceFlags::CLOSE)?;
    let volume = price.require(PriceFlags::VOLUME)?;
    ad_into(high, low, close, volume, start_idx, end_idx, params.real_output(0)?)
}

fn obv_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let data = params.real_input(0)?;
    let volume = params.price_input(1)?.require(PriceFlags::VOLUME)?;
    obv_into(data, volume, start_idx, end_idx, params.real_output(0)?)
}

/// Chaikin A/D line.
pub static AD: FuncDef = FuncDef {
    name: "AD",
    group: FuncGroup::VolumeIndicators,
    hint: "Chaikin A/D Line",
    camel_case_name: "Ad",
    flags: FuncFlags::VOLUME,
    inputs: &[InputParameterInfo::price("inPriceHLCV", HLCV)],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: zero_lookback_entry,
    compute: ad_entry,
};

/// On balance volume.
pub static OBV: FuncDef = FuncDef {
    name: "OBV",
    group: FuncGroup::VolumeIndicators,
    hint: "On Balance Volume",
    camel_case_name: "Obv",
    flags: FuncFlags::VOLUME,
    inputs: &[
        InputParameterInfo::real("inReal"),
        InputParameterInfo::price("inPriceV", PriceFlags::VOLUME),
    ],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: zero_lookback_entry,
    compute: obv_entry,
};

//! Built-in function catalogue.
//!
//! One module per family. Each function comes in two layers:
//!
//! - a typed kernel (`*_lookback`, `*_into`) usable directly on slices, and
//! - a `static` [`FuncDef`] wiring that kernel into the abstract calling
//!   convention.
//!
//! Kernels evaluate `[start_idx, end_idx]`, skip the lookback, and write the
//! produced values from index 0 of their output buffers.
//!
//! # Example
//!
//! ```
//! use ta_abstract::functions::overlap::{sma_into, sma_lookback};
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let mut out = [0.0; 6];
//! let range = sma_into(&data, 3, 0, 5, &mut out).unwrap();
//! assert_eq!(range.beg_idx, sma_lookback(3));
//! assert_eq!(range.nb_element, 4);
//! assert!((out[0] - 2.0).abs() < 1e-12);
//! ```

#![allow(clippy::cast_precision_loss)]

pub mod math_operators;
pub mod math_transform;
pub mod momentum;
pub mod overlap;
pub mod pattern;
pub mod price_transform;
pub mod statistic;
pub mod volatility;
pub mod volume;

use crate::error::{Error, Result};
use crate::meta::{
    IntegerListItem, IntegerRange, OptInputFlags, OptInputKind, OptInputParameterInfo, RealRange,
};
use crate::plugin::{effective_start, ensure_output_len, validate_range, FuncDef};

/// Every built-in registration record, in registration order.
pub static BUILTINS: &[&FuncDef] = &[
    &math_operators::ADD,
    &math_operators::SUB,
    &math_operators::MAX,
    &math_operators::MIN,
    &math_operators::MAXINDEX,
    &math_transform::SQRT,
    &math_transform::LN,
    &overlap::SMA,
    &overlap::EMA,
    &overlap::MA,
    &overlap::BBANDS,
    &momentum::MOM,
    &momentum::MACD,
    &momentum::BOP,
    &volatility::TRANGE,
    &volatility::ATR,
    &volume::AD,
    &volume::OBV,
    &pattern::CDLDOJI,
    &price_transform::AVGPRICE,
    &price_transform::TYPPRICE,
    &statistic::CORREL,
    &statistic::VAR,
    &statistic::STDDEV,
];

/// Largest accepted period.
pub(crate) const MAX_PERIOD: i32 = 100_000;

/// Bounds of unconstrained real optional inputs.
const REAL_LIMIT: f64 = 3.0e37;

/// Integer period optional input accepting `[min, 100000]`.
pub(crate) const fn period_input(
    param_name: &'static str,
    display_name: &'static str,
    default: i32,
    min: i32,
) -> OptInputParameterInfo {
    OptInputParameterInfo {
        kind: OptInputKind::IntegerRange(IntegerRange {
            min,
            max: MAX_PERIOD,
            suggested_start: if min > 4 { min } else { 4 },
            suggested_end: 200,
            suggested_increment: 1,
        }),
        param_name,
        flags: OptInputFlags::empty(),
        display_name,
        default_value: default as f64,
        hint: "Number of period",
    }
}

/// Real optional input accepting any finite value.
pub(crate) const fn real_input(
    param_name: &'static str,
    display_name: &'static str,
    default: f64,
    hint: &'static str,
) -> OptInputParameterInfo {
    OptInputParameterInfo {
        kind: OptInputKind::RealRange(RealRange {
            min: -REAL_LIMIT,
            max: REAL_LIMIT,
            precision: 2,
            suggested_start: -2.0,
            suggested_end: 2.0,
            suggested_increment: 0.2,
        }),
        param_name,
        flags: OptInputFlags::empty(),
        display_name,
        default_value: default,
        hint,
    }
}

/// Choices of the moving-average type optional input.
pub(crate) const MA_TYPES: [IntegerListItem; 2] = [
    IntegerListItem {
        value: 0,
        label: "SMA",
    },
    IntegerListItem {
        value: 1,
        label: "EMA",
    },
];

/// Moving-average type optional input, defaulting to SMA.
pub(crate) const fn ma_type_input() -> OptInputParameterInfo {
    OptInputParameterInfo {
        kind: OptInputKind::IntegerList(&MA_TYPES),
        param_name: "optInMAType",
        flags: OptInputFlags::empty(),
        display_name: "MA Type",
        default_value: 0.0,
        hint: "Type of Moving Average",
    }
}

/// Evaluation window of a kernel call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    /// First input index that produces an output.
    pub first: usize,
    /// Number of values to produce.
    pub count: usize,
}

/// Common kernel prologue.
///
/// Validates the requested range against the shortest input, skips the
/// lookback, and checks that `out_len` can hold the produced values. Returns
/// `None` when the lookback consumes the whole range.
pub(crate) fn window(
    function: &'static str,
    start_idx: usize,
    end_idx: usize,
    lookback: usize,
    available: usize,
    out_len: usize,
) -> Result<Option<Window>> {
    validate_range(start_idx, end_idx)?;
    if end_idx >= available {
        return Err(Error::OutOfRangeEndIndex {
            start: start_idx,
            end: end_idx,
            available,
        });
    }
    let Some(first) = effective_start(start_idx, end_idx, lookback) else {
        return Ok(None);
    };
    let count = end_idx - first + 1;
    ensure_output_len(function, out_len, count)?;
    Ok(Some(Window { first, count }))
}

/// Shortest length among `series`.
pub(crate) fn shortest(series: &[&[f64]]) -> usize {
    series.iter().map(|s| s.len()).min().unwrap_or(0)
}

/// Rejects periods below `min`.
pub(crate) const fn check_period(period: usize, min: usize) -> Result<()> {
    if period < min {
        Err(Error::bad_param("period below its minimum"))
    } else {
        Ok(())
    }
}

/// Moving-average flavour used by `MA` and `BBANDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaType {
    /// Simple moving average.
    Sma,
    /// Exponential moving average.
    Ema,
}

impl MaType {
    /// Decodes the value of an `optInMAType` input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadParam`] for an unknown code.
    pub const fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Sma),
            1 => Ok(Self::Ema),
            _ => Err(Error::bad_param("unknown moving average type")),
        }
    }
}

//! Statistic functions.
//!
//! - [`correl_into`] - Pearson correlation coefficient of two series
//! - [`var_into`] - rolling population variance
//! - [`stddev_into`] - rolling population standard deviation
//!
//! # Mathematical Conventions
//!
//! - **Population formulas**: divide by `period`, not `period - 1`
//! - **Degenerate windows**: when the variance term is zero or negative
//!   (below [`ZERO_OR_NEG`]) the result is `0.0`, never NaN

use super::{check_period, period_input, real_input, shortest, window};
use crate::error::Result;
use crate::meta::{FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo};
use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange};

/// Values below this are treated as zero or negative.
pub const ZERO_OR_NEG: f64 = 1e-8;

/// Running population variance of every `period` window ending in
/// `[first, end_idx]`, reported as `emit(k, variance)`.
///
/// The caller guarantees `first + 1 >= period` and `end_idx < data.len()`.
pub(crate) fn rolling_variance(
    data: &[f64],
    period: usize,
    first: usize,
    end_idx: usize,
    mut emit: impl FnMut(usize, f64),
) {
    let period_f = period as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &value in &data[first + 1 - period..first] {
        sum += value;
        sum_sq += value * value;
    }
    for (k, i) in (first..=end_idx).enumerate() {
        let value = data[i];
        sum += value;
        sum_sq += value * value;
        let mean = sum / period_f;
        emit(k, sum_sq / period_f - mean * mean);
        let trailing = data[i + 1 - period];
        sum -= trailing;
        sum_sq -= trailing * trailing;
    }
}

/// Returns the lookback period for CORREL.
#[inline]
#[must_use]
pub const fn correl_lookback(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Pearson correlation of `x` and `y` over each `period` window.
///
/// # Errors
///
/// Returns [`Error::BadParam`](crate::Error::BadParam) for a zero period,
/// [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a bad
/// range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when
/// `output` is too short.
pub fn correl_into(
    x: &[f64],
    y: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    let available = shortest(&[x, y]);
    let lookback = correl_lookback(period);
    let Some(w) = window("CORREL", start_idx, end_idx, lookback, available, output.len())? else {
        return Ok(OutputRange::EMPTY);
    };

    let period_f = period as f64;
    let (mut sum_x, mut sum_y, mut sum_x2, mut sum_y2, mut sum_xy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for i in w.first + 1 - period..w.first {
        sum_x += x[i];
        sum_y += y[i];
        sum_x2 += x[i] * x[i];
        sum_y2 += y[i] * y[i];
        sum_xy += x[i] * y[i];
    }

    for (k, today) in (w.first..=end_idx).enumerate() {
        let (xv, yv) = (x[today], y[today]);
        sum_x += xv;
        sum_y += yv;
        sum_x2 += xv * xv;
        sum_y2 += yv * yv;
        sum_xy += xv * yv;

        let spread = (sum_x2 - sum_x * sum_x / period_f) * (sum_y2 - sum_y * sum_y / period_f);
        output[k] = if spread < ZERO_OR_NEG {
            0.0
        } else {
            (sum_xy - sum_x * sum_y / period_f) / spread.sqrt()
        };

        let trailing = today + 1 - period;
        let (xt, yt) = (x[trailing], y[trailing]);
        sum_x -= xt;
        sum_y -= yt;
        sum_x2 -= xt * xt;
        sum_y2 -= yt * yt;
        sum_xy -= xt * yt;
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Returns the lookback period for VAR and STDDEV.
#[inline]
#[must_use]
pub const fn var_lookback(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Rolling population variance.
///
/// # Errors
///
/// Same as [`correl_into`].
pub fn var_into(
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    let Some(w) = window("VAR", start_idx, end_idx, var_lookback(period), data.len(), output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    rolling_variance(data, period, w.first, end_idx, |k, variance| {
        output[k] = variance;
    });
    Ok(OutputRange::new(w.first, w.count))
}

/// Rolling population standard deviation scaled by `nb_dev`.
///
/// # Errors
///
/// Same as [`correl_into`].
pub fn stddev_into(
    data: &[f64],
    period: usize,
    nb_dev: f64,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    let lookback = var_lookback(period);
    let Some(w) = window("STDDEV", start_idx, end_idx, lookback, data.len(), output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    rolling_variance(data, period, w.first, end_idx, |k, variance| {
        output[k] = if variance < ZERO_OR_NEG {
            0.0
        } else {
            variance.sqrt() * nb_dev
        };
    });
    Ok(OutputRange::new(w.first, w.count))
}

fn correl_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(correl_lookback(opt.period(0)?))
}

fn var_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    // nbDev is validated even though it does not change the lookback
    opt.real(1)?;
    Ok(var_lookback(opt.period(0)?))
}

fn correl_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let x = params.real_input(0)?;
    let y = params.real_input(1)?;
    correl_into(x, y, period, start_idx, end_idx, params.real_output(0)?)
}

fn var_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    params.opt_inputs().real(1)?;
    let data = params.real_input(0)?;
    var_into(data, period, start_idx, end_idx, params.real_output(0)?)
}

fn stddev_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let nb_dev = params.opt_inputs().real(1)?;
    let data = params.real_input(0)?;
    stddev_into(data, period, nb_dev, start_idx, end_idx, params.real_output(0)?)
}

/// Pearson's correlation coefficient.
pub static CORREL: FuncDef = FuncDef {
    name: "CORREL",
    group: FuncGroup::StatisticFunctions,
    hint: "Pearson's Correlation Coefficient (r)",
    camel_case_name: "Correl",
    flags: FuncFlags::empty(),
    inputs: &[
        InputParameterInfo::real("inReal0"),
        InputParameterInfo::real("inReal1"),
    ],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 30, 1)],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: correl_lookback_entry,
    compute: correl_entry,
};

/// Variance.
pub static VAR: FuncDef = FuncDef {
    name: "VAR",
    group: FuncGroup::StatisticFunctions,
    hint: "Variance",
    camel_case_name: "Variance",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[
        period_input("optInTimePeriod", "Time Period", 5, 1),
        real_input("optInNbDev", "Deviations", 1.0, "Nb of deviations"),
    ],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: var_lookback_entry,
    compute: var_entry,
};

/// Standard deviation.
pub static STDDEV: FuncDef = FuncDef {
    name: "STDDEV",
    group: FuncGroup::StatisticFunctions,
    hint: "Standard Deviation",
    camel_case_name: "StdDev",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[
        period_input("optInTimePeriod", "Time Period", 5, 2),
        real_input("optInNbDev", "Deviations", 1.0, "Nb of deviations"),
    ],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: var_lookback_entry,
    compute: stddev_entry,
};

//! Overlap studies: moving averages and bands drawn over the price.
//!
//! # Formulas
//!
//! ```text
//! SMA[i] = mean(data[i - period + 1 ..= i])
//! EMA[i] = α × data[i] + (1 - α) × EMA[i - 1],   α = 2 / (period + 1)
//! BBANDS = MA ± nbDev × stddev(window)
//! ```
//!
//! EMA is seeded with the SMA of the window ending at the first evaluated
//! index, so its values depend on `start_idx` (unstable period).

use super::statistic::rolling_variance;
use super::{check_period, ma_type_input, period_input, real_input, window, MaType};
use crate::error::Result;
use crate::meta::{FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo};
use crate::plugin::{ensure_output_len, CallParams, FuncDef, OptInputs, OutputRange};

/// Computes the lookback period for SMA.
///
/// Lookback = period - 1
#[inline]
#[must_use]
pub const fn sma_lookback(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Simple moving average over `[start_idx, end_idx]`.
///
/// # Errors
///
/// Returns [`Error::BadParam`](crate::Error::BadParam) for a zero period,
/// [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a bad
/// range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when
/// `output` is too short.
pub fn sma_into(
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    let Some(w) = window("SMA", start_idx, end_idx, sma_lookback(period), data.len(), output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    let period_f = period as f64;
    let mut sum: f64 = data[w.first + 1 - period..w.first].iter().sum();
    for (k, i) in (w.first..=end_idx).enumerate() {
        sum += data[i];
        output[k] = sum / period_f;
        sum -= data[i + 1 - period];
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Computes the lookback period for EMA.
///
/// Lookback = period - 1
#[inline]
#[must_use]
pub const fn ema_lookback(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Exponential moving average over `[start_idx, end_idx]`.
///
/// # Errors
///
/// Same as [`sma_into`].
pub fn ema_into(
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    let Some(w) = window("EMA", start_idx, end_idx, ema_lookback(period), data.len(), output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = data[w.first + 1 - period..=w.first].iter().sum::<f64>() / period as f64;
    let mut prev = seed;
    output[0] = seed;
    for (k, &value) in data[w.first + 1..=end_idx].iter().enumerate() {
        prev = alpha.mul_add(value - prev, prev);
        output[k + 1] = prev;
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// Computes the lookback period for MA.
#[inline]
#[must_use]
pub const fn ma_lookback(period: usize, ma_type: MaType) -> usize {
    if period <= 1 {
        return 0;
    }
    match ma_type {
        MaType::Sma => sma_lookback(period),
        MaType::Ema => ema_lookback(period),
    }
}

/// Moving average of the selected type. A period of 1 copies the input.
///
/// # Errors
///
/// Same as [`sma_into`].
pub fn ma_into(
    data: &[f64],
    period: usize,
    ma_type: MaType,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    if period == 1 {
        let Some(w) = window("MA", start_idx, end_idx, 0, data.len(), output.len())? else {
            return Ok(OutputRange::EMPTY);
        };
        output[..w.count].copy_from_slice(&data[w.first..=end_idx]);
        return Ok(OutputRange::new(w.first, w.count));
    }
    match ma_type {
        MaType::Sma => sma_into(data, period, start_idx, end_idx, output),
        MaType::Ema => ema_into(data, period, start_idx, end_idx, output),
    }
}

/// Bollinger Bands configuration.
///
/// ```
/// use ta_abstract::functions::overlap::Bbands;
///
/// let bands = Bbands::default();
/// assert_eq!(bands.period, 5);
/// assert_eq!(bands.lookback(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbands {
    /// Window length.
    pub period: usize,
    /// Deviation multiplier of the upper band.
    pub nb_dev_up: f64,
    /// Deviation multiplier of the lower band.
    pub nb_dev_dn: f64,
    /// Middle band average.
    pub ma_type: MaType,
}

impl Default for Bbands {
    fn default() -> Self {
        Self {
            period: 5,
            nb_dev_up: 2.0,
            nb_dev_dn: 2.0,
            ma_type: MaType::Sma,
        }
    }
}

impl Bbands {
    /// Lookback of the bands.
    #[must_use]
    pub const fn lookback(&self) -> usize {
        ma_lookback(self.period, self.ma_type)
    }

    /// Computes upper, middle and lower bands over `[start_idx, end_idx]`.
    ///
    /// # Errors
    ///
    /// Same as [`sma_into`], for any of the three outputs.
    pub fn compute_into(
        &self,
        data: &[f64],
        start_idx: usize,
        end_idx: usize,
        [upper, middle, lower]: [&mut [f64]; 3],
    ) -> Result<OutputRange> {
        let range = ma_into(data, self.period, self.ma_type, start_idx, end_idx, middle)?;
        if range.is_empty() {
            return Ok(range);
        }
        ensure_output_len("BBANDS", upper.len(), range.nb_element)?;
        ensure_output_len("BBANDS", lower.len(), range.nb_element)?;
        let end = range.beg_idx + range.nb_element - 1;
        rolling_variance(data, self.period, range.beg_idx, end, |k, variance| {
            let deviation = variance.max(0.0).sqrt();
            upper[k] = self.nb_dev_up.mul_add(deviation, middle[k]);
            lower[k] = (-self.nb_dev_dn).mul_add(deviation, middle[k]);
        });
        Ok(range)
    }
}

fn bbands_from(opt: &OptInputs<'_>) -> Result<Bbands> {
    Ok(Bbands {
        period: opt.period(0)?,
        nb_dev_up: opt.real(1)?,
        nb_dev_dn: opt.real(2)?,
        ma_type: MaType::from_code(opt.integer(3)?)?,
    })
}

fn sma_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(sma_lookback(opt.period(0)?))
}

fn ema_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(ema_lookback(opt.period(0)?))
}

fn ma_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(ma_lookback(opt.period(0)?, MaType::from_code(opt.integer(1)?)?))
}

fn bbands_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(bbands_from(opt)?.lookback())
}

fn sma_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let data = params.real_input(0)?;
    sma_into(data, period, start_idx, end_idx, params.real_output(0)?)
}

fn ema_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let data = params.real_input(0)?;
    ema_into(data, period, start_idx, end_idx, params.real_output(0)?)
}

fn ma_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let ma_type = MaType::from_code(params.opt_inputs().integer(1)?)?;
    let data = params.real_input(0)?;
    ma_into(data, period, ma_type, start_idx, end_idx, params.real_output(0)?)
}

fn bbands_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let bands = bbands_from(params.opt_inputs())?;
    let data = params.real_input(0)?;
    bands.compute_into(data, start_idx, end_idx, params.real_outputs::<3>()?)
}

/// Simple moving average.
pub static SMA: FuncDef = FuncDef {
    name: "SMA",
    group: FuncGroup::OverlapStudies,
    hint: "Simple Moving Average",
    camel_case_name: "Sma",
    flags: FuncFlags::OVERLAP,
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 30, 2)],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: sma_lookback_entry,
    compute: sma_entry,
};

/// Exponential moving average.
pub static EMA: FuncDef = FuncDef {
    name: "EMA",
    group: FuncGroup::OverlapStudies,
    hint: "Exponential Moving Average",
    camel_case_name: "Ema",
    flags: FuncFlags::OVERLAP.union(FuncFlags::UNST_PERIOD),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 30, 2)],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: ema_lookback_entry,
    compute: ema_entry,
};

/// Moving average of a selectable type.
pub static MA: FuncDef = FuncDef {
    name: "MA",
    group: FuncGroup::OverlapStudies,
    hint: "Moving average",
    camel_case_name: "MovingAverage",
    flags: FuncFlags::OVERLAP,
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[
        period_input("optInTimePeriod", "Time Period", 30, 1),
        ma_type_input(),
    ],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: ma_lookback_entry,
    compute: ma_entry,
};

/// Bollinger Bands.
pub static BBANDS: FuncDef = FuncDef {
    name: "BBANDS",
    group: FuncGroup::OverlapStudies,
    hint: "Bollinger Bands",
    camel_case_name: "Bbands",
    flags: FuncFlags::OVERLAP,
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[
        period_input("optInTimePeriod", "Time Period", 5, 2),
        real_input("optInNbDevUp", "Deviations up", 2.0, "Deviation multiplier for upper band"),
        real_input("optInNbDevDn", "Deviations down", 2.0, "Deviation multiplier for lower band"),
        ma_type_input(),
    ],
    outputs: &[
        OutputParameterInfo::real("outRealUpperBand", OutputFlags::UPPER_LIMIT),
        OutputParameterInfo::real("outRealMiddleBand", OutputFlags::LINE),
        OutputParameterInfo::real("outRealLowerBand", OutputFlags::LOWER_LIMIT),
    ],
    lookback: bbands_lookback_entry,
    compute: bbands_entry,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_sma_lookback() {
        assert_eq!(sma_lookback(1), 0);
        assert_eq!(sma_lookback(30), 29);
    }

    #[test]
    fn test_sma_basic() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut out = [0.0; 5];
        let range = sma_into(&data, 3, 0, 4, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(2, 3));
        assert!((out[0] - 2.0).abs() < EPSILON);
        assert!((out[1] - 3.0).abs() < EPSILON);
        assert!((out[2] - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_sma_sub_range() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut out = [0.0; 2];
        let range = sma_into(&data, 2, 3, 4, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(3, 2));
        assert!((out[0] - 3.5).abs() < EPSILON);
        assert!((out[1] - 4.5).abs() < EPSILON);
    }

    #[test]
    fn test_sma_buffer_too_small() {
        let data = [1.0; 10];
        let mut out = [0.0; 3];
        assert!(matches!(
            sma_into(&data, 2, 0, 9, &mut out),
            Err(Error::BufferTooSmall { function: "SMA", required: 9, actual: 3 })
        ));
    }

    #[test]
    fn test_ema_seed_and_recursion() {
        let data = [2.0, 4.0, 6.0, 8.0];
        let mut out = [0.0; 4];
        let range = ema_into(&data, 3, 0, 3, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(2, 2));
        // seed = mean(2, 4, 6) = 4, alpha = 0.5
        assert!((out[0] - 4.0).abs() < EPSILON);
        assert!((out[1] - 6.0).abs() < EPSILON);
    }

    #[test]
    fn test_ema_constant_series() {
        let data = [7.0; 12];
        let mut out = [0.0; 12];
        let range = ema_into(&data, 4, 0, 11, &mut out).unwrap();
        for value in &out[..range.nb_element] {
            assert!((value - 7.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_ma_period_one_copies() {
        let data = [1.0, 5.0, 3.0];
        let mut out = [0.0; 3];
        let range = ma_into(&data, 1, MaType::Ema, 0, 2, &mut out).unwrap();
        assert_eq!(range, OutputRange::new(0, 3));
        assert_eq!(out, data);
        assert_eq!(ma_lookback(1, MaType::Sma), 0);
    }

    #[test]
    fn test_ma_dispatches_by_type() {
        let data = [2.0, 4.0, 6.0, 8.0];
        let mut sma_out = [0.0; 4];
        let mut ema_out = [0.0; 4];
        ma_into(&data, 3, MaType::Sma, 0, 3, &mut sma_out).unwrap();
        ma_into(&data, 3, MaType::Ema, 0, 3, &mut ema_out).unwrap();
        assert!((sma_out[1] - 6.0).abs() < EPSILON);
        assert!((ema_out[1] - 6.0).abs() < EPSILON);
        assert!((sma_out[0] - ema_out[0]).abs() < EPSILON);
    }

    #[test]
    fn test_bbands_constant_series_collapses() {
        let data = [10.0; 8];
        let mut upper = [0.0; 8];
        let mut middle = [0.0; 8];
        let mut lower = [0.0; 8];
        let range = Bbands::default()
            .compute_into(&data, 0, 7, [&mut upper, &mut middle, &mut lower])
            .unwrap();
        assert_eq!(range, OutputRange::new(4, 4));
        for k in 0..range.nb_element {
            assert!((upper[k] - 10.0).abs() < 1e-6);
            assert!((middle[k] - 10.0).abs() < EPSILON);
            assert!((lower[k] - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bbands_symmetric_bands() {
        let data = [1.0, 3.0, 1.0, 3.0, 1.0, 3.0];
        let mut upper = [0.0; 6];
        let mut middle = [0.0; 6];
        let mut lower = [0.0; 6];
        let bands = Bbands {
            period: 2,
            nb_dev_up: 1.0,
            nb_dev_dn: 1.0,
            ma_type: MaType::Sma,
        };
        let range = bands
            .compute_into(&data, 0, 5, [&mut upper, &mut middle, &mut lower])
            .unwrap();
        assert_eq!(range, OutputRange::new(1, 5));
        for k in 0..5 {
            assert!((middle[k] - 2.0).abs() < EPSILON);
            assert!((upper[k] - 3.0).abs() < 1e-9);
            assert!((lower[k] - 1.0).abs() < 1e-9);
        }
    }
}

//! Momentum indicators.
//!
//! - [`mom_into`] - `price - price[n periods ago]`
//! - [`Macd`] - moving average convergence/divergence with signal and histogram
//! - [`bop_into`] - balance of power, `(close - open) / (high - low)`

use super::{check_period, period_input, shortest, window};
use crate::error::Result;
use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OutputFlags, OutputParameterInfo, PriceFlags,
};
use crate::plugin::{ensure_output_len, CallParams, FuncDef, OptInputs, OutputRange, PriceSeries};

/// Computes the lookback period for MOM.
///
/// Lookback = period
#[inline]
#[must_use]
pub const fn mom_lookback(period: usize) -> usize {
    period
}

/// Momentum over `[start_idx, end_idx]`.
///
/// # Errors
///
/// Returns [`Error::BadParam`](crate::Error::BadParam) for a zero period,
/// [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a bad range and [`Error::BufferTooSmall`](crate::Error::BufferTooSmall)
/// when `output` is too short.
pub fn mom_into(
    data: &[f64],
    period: usize,
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    check_period(period, 1)?;
    let Some(w) = window("MOM", start_idx, end_idx, mom_lookback(period), data.len(), output.len())?
    else {
        return Ok(OutputRange::EMPTY);
    };
    for (k, i) in (w.first..=end_idx).enumerate() {
        output[k] = data[i] - data[i - period];
    }
    Ok(OutputRange::new(w.first, w.count))
}

/// MACD configuration.
///
/// ```
/// use ta_abstract::functions::momentum::Macd;
///
/// let macd = Macd::default();
/// assert_eq!((macd.fast_period, macd.slow_period, macd.signal_period), (12, 26, 9));
/// assert_eq!(macd.lookback(), 33);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macd {
    /// Fast EMA period.
    pub fast_period: usize,
    /// Slow EMA period.
    pub slow_period: usize,
    /// Signal EMA period.
    pub signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    /// Periods with fast and slow swapped if given in the wrong order.
    const fn ordered(&self) -> (usize, usize) {
        if self.slow_period < self.fast_period {
            (self.slow_period, self.fast_period)
        } else {
            (self.fast_period, self.slow_period)
        }
    }

    /// Lookback of all three outputs.
    ///
    /// Lookback = (slow - 1) + (signal - 1)
    #[must_use]
    pub const fn lookback(&self) -> usize {
        let (_, slow) = self.ordered();
        slow.saturating_sub(1) + self.signal_period.saturating_sub(1)
    }

    /// Computes MACD line, signal line and histogram over `[start_idx, end_idx]`.
    ///
    /// Both EMAs are seeded with the SMA of the window ending where the MACD
    /// line starts; the signal EMA is seeded with the mean of its first
    /// `signal_period` MACD values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadParam`](crate::Error::BadParam) for a zero period,
    /// [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a bad range and
    /// [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when an output is too short.
    pub fn compute_into(
        &self,
        data: &[f64],
        start_idx: usize,
        end_idx: usize,
        [macd, signal, hist]: [&mut [f64]; 3],
    ) -> Result<OutputRange> {
        let (fast, slow) = self.ordered();
        check_period(fast, 1)?;
        check_period(self.signal_period, 1)?;
        let Some(w) = window("MACD", start_idx, end_idx, self.lookback(), data.len(), macd.len())?
        else {
            return Ok(OutputRange::EMPTY);
        };
        ensure_output_len("MACD", signal.len(), w.count)?;
        ensure_output_len("MACD", hist.len(), w.count)?;

        let line_start = w.first - (self.signal_period - 1);
        let seed = |period: usize| {
            data[line_start + 1 - period..=line_start].iter().sum::<f64>() / period as f64
        };
        let alpha = |period: usize| 2.0 / (period as f64 + 1.0);
        let (fast_alpha, slow_alpha, signal_alpha) =
            (alpha(fast), alpha(slow), alpha(self.signal_period));

        let mut fast_ema = seed(fast);
        let mut slow_ema = seed(slow);
        let mut signal_sum = 0.0;
        let mut signal_ema = 0.0;
        for today in line_start..=end_idx {
            if today > line_start {
                fast_ema = fast_alpha.mul_add(data[today] - fast_ema, fast_ema);
                slow_ema = slow_alpha.mul_add(data[today] - slow_ema, slow_ema);
            }
            let line = fast_ema - slow_ema;
            if today < w.first {
                signal_sum += line;
                continue;
            }
            signal_ema = if today == w.first {
                (signal_sum + line) / self.signal_period as f64
            } else {
                signal_alpha.mul_add(line - signal_ema, signal_ema)
            };
            let k = today - w.first;
            macd[k] = line;
            signal[k] = signal_ema;
            hist[k] = line - signal_ema;
        }
        Ok(OutputRange::new(w.first, w.count))
    }
}

/// Computes the lookback period for BOP.
#[inline]
#[must_use]
pub const fn bop_lookback() -> usize {
    0
}

/// Balance of power. Bars with a non-positive range yield `0.0`.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`](crate::Error::OutOfRangeEndIndex) for a bad range and
/// [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) when `output` is too short.
pub fn bop_into(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start_idx: usize,
    end_idx: usize,
    output: &mut [f64],
) -> Result<OutputRange> {
    let available = shortest(&[open, high, low, close]);
    let Some(w) = window("BOP", start_idx, end_idx, bop_lookback(), available, output.len())? else {
        return Ok(OutputRange::EMPTY);
    };
    for (k, i) in (w.first..=end_idx).enumerate() {
        let range = high[i] - low[i];
        output[k] = if range > 0.0 {
            (close[i] - open[i]) / range
        } else {
            0.0
        };
    }
    Ok(OutputRange::new(w.first, w.count))
}

fn macd_from(opt: &OptInputs<'_>) -> Result<Macd> {
    Ok(Macd {
        fast_period: opt.period(0)?,
        slow_period: opt.period(1)?,
        signal_period: opt.period(2)?,
    })
}

fn mom_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(mom_lookback(opt.period(0)?))
}

fn macd_lookback_entry(opt: &OptInputs<'_>) -> Result<usize> {
    Ok(macd_from(opt)?.lookback())
}

fn bop_lookback_entry(_: &OptInputs<'_>) -> Result<usize> {
    Ok(bop_lookback())
}

fn mom_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let period = params.opt_inputs().period(0)?;
    let data = params.real_input(0)?;
    mom_into(data, period, start_idx, end_idx, params.real_output(0)?)
}

fn macd_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let macd = macd_from(params.opt_inputs())?;
    let data = params.real_input(0)?;
    macd.compute_into(data, start_idx, end_idx, params.real_outputs::<3>()?)
}

fn bop_entry(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let price: PriceSeries<'_> = params.price_input(0)?;
    let open = price.require(PriceFlags::OPEN)?;
    let high = price.require(PriceFlags::HIGH)?;
    let low = price.require(PriceFlags::LOW)?;
    let close = price.require(PriceFlags::CLOSE)?;
    bop_into(open, high, low, close, start_idx, end_idx, params.real_output(0)?)
}

/// Momentum.
pub static MOM: FuncDef = FuncDef {
    name: "MOM",
    group: FuncGroup::MomentumIndicators,
    hint: "Momentum",
    camel_case_name: "Mom",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[period_input("optInTimePeriod", "Time Period", 10, 1)],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: mom_lookback_entry,
    compute: mom_entry,
};

/// Moving average convergence/divergence.
pub static MACD: FuncDef = FuncDef {
    name: "MACD",
    group: FuncGroup::MomentumIndicators,
    hint: "Moving Average Convergence/Divergence",
    camel_case_name: "Macd",
    flags: FuncFlags::UNST_PERIOD,
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[
        period_input("optInFastPeriod", "Fast Period", 12, 2),
        period_input("optInSlowPeriod", "Slow Period", 26, 2),
        period_input("optInSignalPeriod", "Signal Period", 9, 1),
    ],
    outputs: &[
        OutputParameterInfo::real("outMACD", OutputFlags::LINE),
        OutputParameterInfo::real("outMACDSignal", OutputFlags::DASH_LINE),
        OutputParameterInfo::real("outMACDHist", OutputFlags::HISTO),
    ],
    lookback: macd_lookback_entry,
    compute: macd_entry,
};

/// Balance of power.
pub static BOP: FuncDef = FuncDef {
    name: "BOP",
    group: FuncGroup::MomentumIndicators,
    hint: "Balance Of Power",
    camel_case_name: "Bop",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::price(
        "inPriceOHLC",
        PriceFlags::OPEN
            .union(PriceFlags::HIGH)
            .union(PriceFlags::LOW)
            .union(PriceFlags::CLOSE),
    )],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: bop_lookback_entry,
    compute: bop_entry,
};

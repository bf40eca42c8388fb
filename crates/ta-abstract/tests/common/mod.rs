//! Shared test utilities for ta-abstract tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use ta_abstract::meta::{InputKind, OutputKind};
use ta_abstract::{FuncDef, ParamHolder, PriceSeries, Result};

/// Standard epsilon for high-precision comparisons.
#[allow(dead_code)]
pub const EPSILON: f64 = 1e-10;

/// Approximate equality check for floating-point values.
///
/// Two NaN values are considered equal for testing purposes.
#[allow(dead_code)]
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() < eps
}

/// Seeded OHLCV bars with `low <= open, close <= high` and positive prices.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Market {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub counts: Vec<i32>,
}

#[allow(dead_code)]
impl Market {
    /// Random walk of `len` bars, reproducible from `seed`.
    pub fn random(seed: u64, len: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut market = Self {
            open: Vec::with_capacity(len),
            high: Vec::with_capacity(len),
            low: Vec::with_capacity(len),
            close: Vec::with_capacity(len),
            volume: Vec::with_capacity(len),
            counts: Vec::with_capacity(len),
        };
        let mut last = 100.0_f64;
        for _ in 0..len {
            let open = last;
            let close = (open * (1.0 + rng.gen_range(-0.03..0.03))).max(1.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.02));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.02));
            market.open.push(open);
            market.high.push(high);
            market.low.push(low);
            market.close.push(close);
            market.volume.push(rng.gen_range(1_000.0..50_000.0));
            market.counts.push(rng.gen_range(-100..100));
            last = close;
        }
        market
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    /// Every price component.
    pub fn price(&self) -> PriceSeries<'_> {
        PriceSeries::ohlc(&self.open, &self.high, &self.low, &self.close).with_volume(&self.volume)
    }
}

/// Output buffers sized for one function.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Outputs {
    pub real: Vec<Vec<f64>>,
    pub integer: Vec<Vec<i32>>,
}

#[allow(dead_code)]
impl Outputs {
    pub fn for_def(def: &FuncDef, len: usize) -> Self {
        let real = def.outputs.iter().filter(|o| o.kind == OutputKind::Real).count();
        let integer = def.outputs.len() - real;
        Self {
            real: vec![vec![0.0; len]; real],
            integer: vec![vec![0; len]; integer],
        }
    }
}

/// Binds every input and output slot of `holder` from metadata alone.
///
/// Price slots get the full bundle, real slots the close series, integer
/// slots the seeded counts.
#[allow(dead_code)]
pub fn bind_everything<'a>(
    holder: &mut ParamHolder<'_, 'a>,
    market: &'a Market,
    outputs: &'a mut Outputs,
) -> Result<()> {
    let def = holder.func_def();
    for (index, input) in def.inputs.iter().enumerate() {
        match input.kind {
            InputKind::Price(_) => holder.set_input_price(index, market.price())?,
            InputKind::Real => holder.set_input_real(index, &market.close)?,
            InputKind::Integer => holder.set_input_integer(index, &market.counts)?,
        }
    }
    let mut real = outputs.real.iter_mut();
    let mut integer = outputs.integer.iter_mut();
    for (index, output) in def.outputs.iter().enumerate() {
        match output.kind {
            OutputKind::Real => {
                let buffer = real.next().expect("real output buffer");
                holder.set_output_real(index, buffer)?;
            }
            OutputKind::Integer => {
                let buffer = integer.next().expect("integer output buffer");
                holder.set_output_integer(index, buffer)?;
            }
        }
    }
    Ok(())
}

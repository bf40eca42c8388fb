//! Catalogue Walk
//!
//! Discovers every function at runtime and runs each one on synthetic
//! OHLCV data with its default optional inputs, without naming any
//! function in code.
//!
//! Run with: `cargo run --example catalogue_walk`

#![allow(clippy::cast_precision_loss)]

use ta_abstract::meta::{InputKind, OutputKind};
use ta_abstract::{PriceSeries, Registry, Result};

const LEN: usize = 200;

fn main() -> Result<()> {
    let close: Vec<f64> = (0..LEN)
        .map(|i| 100.0 + (i as f64 * 0.2).sin() * 5.0)
        .collect();
    let open: Vec<f64> = close.iter().map(|c| c - 0.3).collect();
    let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
    let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();
    let volume = vec![1_000.0; LEN];
    let counts: Vec<i32> = (0..LEN as i32).collect();
    let bundle = PriceSeries::ohlc(&open, &high, &low, &close).with_volume(&volume);

    let registry = Registry::global();
    for group in registry.groups() {
        println!("{group}");
        for name in registry.functions_in_group(group)? {
            let handle = registry.lookup(name)?;
            let def = registry.resolve(handle)?;

            let mut real_out: Vec<Vec<f64>> = Vec::new();
            let mut int_out: Vec<Vec<i32>> = Vec::new();
            for output in def.outputs {
                match output.kind {
                    OutputKind::Real => real_out.push(vec![0.0; LEN]),
                    OutputKind::Integer => int_out.push(vec![0; LEN]),
                }
            }

            let mut holder = registry.alloc(handle)?;
            for (index, input) in def.inputs.iter().enumerate() {
                match input.kind {
                    InputKind::Price(_) => holder.set_input_price(index, bundle)?,
                    InputKind::Real => holder.set_input_real(index, &close)?,
                    InputKind::Integer => holder.set_input_integer(index, &counts)?,
                }
            }
            let mut reals = real_out.iter_mut();
            let mut ints = int_out.iter_mut();
            for (index, output) in def.outputs.iter().enumerate() {
                match output.kind {
                    OutputKind::Real => {
                        if let Some(buf) = reals.next() {
                            holder.set_output_real(index, buf)?;
                        }
                    }
                    OutputKind::Integer => {
                        if let Some(buf) = ints.next() {
                            holder.set_output_integer(index, buf)?;
                        }
                    }
                }
            }

            let lookback = holder.lookback()?;
            let range = holder.call(0, LEN - 1)?;
            println!(
                "  {name:<10} lookback {lookback:>3}  beg_idx {:>3}  nb_element {:>3}",
                range.beg_idx, range.nb_element
            );
        }
    }
    Ok(())
}

//! Evaluation of one function over many series.
//!
//! [`BatchCaller`] drives the abstract calling convention once per series,
//! each with its own [`ParamHolder`](crate::ParamHolder). With the
//! `parallel` feature, batches at or above the threshold run on the rayon
//! thread pool:
//!
//! ```toml
//! [dependencies]
//! ta-abstract = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! # Example
//!
//! ```
//! use ta_abstract::batch::BatchCaller;
//! use ta_abstract::meta::OptInputValue;
//! use ta_abstract::Registry;
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let b = [5.0, 4.0, 3.0, 2.0, 1.0];
//!
//! let results = BatchCaller::new(Registry::global(), "SMA")
//!     .unwrap()
//!     .opt_input(0, OptInputValue::Integer(3))
//!     .process(&[&a, &b])
//!     .unwrap();
//!
//! assert_eq!(results[0].range.beg_idx, 2);
//! assert!((results[1].outputs[0][0] - 4.0).abs() < 1e-12);
//! ```

use tracing::debug;

use crate::error::{Error, Result};
use crate::handle::FuncHandle;
use crate::meta::{InputKind, OptInputValue, OutputKind};
use crate::plugin::{FuncDef, OutputRange};
use crate::registry::Registry;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default number of series from which the parallel path is taken.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Result of evaluating one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOutput {
    /// Index of the first produced value and number of values.
    pub range: OutputRange,
    /// One vector per output slot, each holding `range.nb_element` values.
    pub outputs: Vec<Vec<f64>>,
}

/// Evaluates one function over many single-real-input series.
#[derive(Debug, Clone)]
pub struct BatchCaller<'r> {
    registry: &'r Registry,
    handle: FuncHandle,
    def: &'static FuncDef,
    opt_values: Vec<(usize, OptInputValue)>,
    min_parallel_threshold: usize,
}

impl<'r> BatchCaller<'r> {
    /// Prepares a batch evaluation of the function called `name`.
    ///
    /// # Errors
    ///
    /// Returns the lookup errors of [`Registry::lookup`], and
    /// [`Error::BadParam`] when the function does not take exactly one real
    /// input or has a non-real output.
    pub fn new(registry: &'r Registry, name: &str) -> Result<Self> {
        let handle = registry.lookup(name)?;
        let def = registry.resolve(handle)?;
        if !matches!(def.inputs, [input] if input.kind == InputKind::Real) {
            return Err(Error::bad_param("batch evaluation needs exactly one real input"));
        }
        if def.outputs.iter().any(|o| o.kind != OutputKind::Real) {
            return Err(Error::bad_param("batch evaluation needs real outputs"));
        }
        Ok(Self {
            registry,
            handle,
            def,
            opt_values: Vec::new(),
            min_parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    /// Sets optional input `index` on every holder of the batch.
    ///
    /// The value is checked when the batch runs.
    #[must_use]
    pub fn opt_input(mut self, index: usize, value: OptInputValue) -> Self {
        self.opt_values.push((index, value));
        self
    }

    /// Sets the minimum number of series required to use parallel processing.
    #[must_use]
    pub const fn min_parallel_threshold(mut self, threshold: usize) -> Self {
        self.min_parallel_threshold = threshold;
        self
    }

    /// Evaluates every series over its full range.
    ///
    /// Empty series yield an empty result without calling the function.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by binding or calling on any series.
    #[cfg(feature = "parallel")]
    pub fn process(&self, series: &[&[f64]]) -> Result<Vec<SeriesOutput>> {
        let parallel = series.len() >= self.min_parallel_threshold;
        debug!(function = self.def.name, series = series.len(), parallel, "batch evaluation");
        if parallel {
            series.par_iter().map(|s| self.run_one(s)).collect()
        } else {
            series.iter().map(|s| self.run_one(s)).collect()
        }
    }

    /// Sequential version when the parallel feature is disabled.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by binding or calling on any series.
    #[cfg(not(feature = "parallel"))]
    pub fn process(&self, series: &[&[f64]]) -> Result<Vec<SeriesOutput>> {
        debug!(function = self.def.name, series = series.len(), "batch evaluation");
        series.iter().map(|s| self.run_one(s)).collect()
    }

    fn run_one(&self, data: &[f64]) -> Result<SeriesOutput> {
        let nb_output = self.def.outputs.len();
        if data.is_empty() {
            return Ok(SeriesOutput {
                range: OutputRange::EMPTY,
                outputs: vec![Vec::new(); nb_output],
            });
        }
        let mut outputs = vec![vec![0.0; data.len()]; nb_output];
        let range = {
            let mut holder = self.registry.alloc(self.handle)?;
            holder.set_input_real(0, data)?;
            for &(index, value) in &self.opt_values {
                match value {
                    OptInputValue::Integer(v) => holder.set_opt_input_integer(index, v)?,
                    OptInputValue::Real(v) => holder.set_opt_input_real(index, v)?,
                }
            }
            for (index, out) in outputs.iter_mut().enumerate() {
                holder.set_output_real(index, out)?;
            }
            holder.call(0, data.len() - 1)?
        };
        for out in &mut outputs {
            out.truncate(range.nb_element);
        }
        Ok(SeriesOutput { range, outputs })
    }
}

//! Lookback resolution and generic dispatch.
//!
//! Both operations read a [`ParamHolder`] and forward to the entry points of
//! its registration record. Dispatch validates the holder state and the index
//! range before the compute entry point runs; it allocates nothing.

use tracing::trace;

use crate::error::{Error, Result};
use crate::holder::ParamHolder;
use crate::plugin::{CallParams, OptInputs, OutputRange};

impl ParamHolder<'_, '_> {
    fn opt_view(&self) -> Result<OptInputs<'_>> {
        if self.opt_inputs.len() != self.def.opt_inputs.len() {
            return Err(Error::InvalidParamHolder);
        }
        Ok(OptInputs::new(self.def.opt_inputs, &self.opt_inputs))
    }

    /// Lookback for the current optional-input values.
    ///
    /// Callable at any point of the holder's life before release; binding
    /// state is irrelevant.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] when an optional value lies outside its declared
    ///   range or list.
    pub fn lookback(&self) -> Result<usize> {
        self.ensure_live()?;
        let opt = self.opt_view()?;
        (self.def.lookback)(&opt)
    }

    /// Length of the shortest bound input series.
    fn shortest_input(&self) -> Option<usize> {
        self.inputs.iter().filter_map(|binding| binding.available()).min()
    }

    /// Evaluates the function over `[start_idx, end_idx]`.
    ///
    /// Outputs are written from index 0 of every bound output buffer; the
    /// returned [`OutputRange`] tells which input index the first value
    /// belongs to and how many values were written.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    ///
    /// 1. [`Error::InvalidParamHolder`] after release.
    /// 2. [`Error::OutOfRangeEndIndex`] when `end_idx < start_idx`; the compute
    ///    entry point is not invoked.
    /// 3. [`Error::InputsNotFullyBound`] while an input slot is unbound.
    /// 4. [`Error::OutputsNotFullyBound`] while an output slot is unbound.
    /// 5. [`Error::OutOfRangeEndIndex`] when a bound input is too short to
    ///    cover `end_idx`.
    ///
    /// Errors raised by the function itself (for example
    /// [`Error::BufferTooSmall`] or [`Error::BadParam`]) are passed through.
    pub fn call(&mut self, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
        self.ensure_live()?;
        if end_idx < start_idx {
            return Err(Error::OutOfRangeEndIndex {
                start: start_idx,
                end: end_idx,
                available: self.shortest_input().unwrap_or(0),
            });
        }
        if !self.in_unbound.is_clear() {
            return Err(Error::InputsNotFullyBound {
                missing: self.in_unbound.count(),
            });
        }
        if !self.out_unbound.is_clear() {
            return Err(Error::OutputsNotFullyBound {
                missing: self.out_unbound.count(),
            });
        }
        let available = self
            .shortest_input()
            .ok_or(Error::internal(15, "fully bound holder without input data"))?;
        if end_idx >= available {
            return Err(Error::OutOfRangeEndIndex {
                start: start_idx,
                end: end_idx,
                available,
            });
        }

        let def = self.def;
        if self.opt_inputs.len() != def.opt_inputs.len() {
            return Err(Error::InvalidParamHolder);
        }
        trace!(function = def.name, start_idx, end_idx, "dispatching");
        let opt = OptInputs::new(def.opt_inputs, &self.opt_inputs);
        let mut params = CallParams::new(def.name, &self.inputs, opt, &mut self.outputs);
        let range = (def.compute)(&mut params, start_idx, end_idx)?;
        trace!(
            function = def.name,
            beg_idx = range.beg_idx,
            nb_element = range.nb_element,
            "dispatch finished"
        );
        Ok(range)
    }
}

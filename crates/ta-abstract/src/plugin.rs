//! Plugin calling convention.
//!
//! Every registered function supplies a [`FuncDef`]: its metadata plus two
//! entry points sharing one normalized signature regardless of how many
//! inputs, optional inputs and outputs the function declares.
//!
//! - [`LookbackFn`] receives the current optional-input values and returns the
//!   number of leading elements consumed before the first output.
//! - [`ComputeFn`] receives a [`CallParams`] view over the holder's bindings
//!   and an index range, writes into the bound outputs starting at index 0,
//!   and reports the produced [`OutputRange`].
//!
//! Compute entry points follow a fixed prologue: validate the range, advance
//! the start past the lookback, and return [`OutputRange::EMPTY`] when nothing
//! is left to evaluate.
//!
//! ```
//! use ta_abstract::plugin::{effective_start, OutputRange};
//!
//! // lookback 4, caller asks for [0, 9]: first output is for index 4
//! assert_eq!(effective_start(0, 9, 4), Some(4));
//! // the whole range is consumed by the lookback
//! assert_eq!(effective_start(0, 3, 4), None);
//! assert_eq!(OutputRange::EMPTY.nb_element, 0);
//! ```

use crate::error::{Error, Result};
use crate::holder::{InputBinding, OutputBinding};
use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OptInputParameterInfo, OptInputValue,
    OutputParameterInfo, PriceFlags,
};

/// Lookback entry point.
pub type LookbackFn = fn(&OptInputs<'_>) -> Result<usize>;

/// Compute entry point: `(params, start_idx, end_idx) -> output range`.
pub type ComputeFn = fn(&mut CallParams<'_, '_>, usize, usize) -> Result<OutputRange>;

/// Where the produced values landed.
///
/// `nb_element` values were written contiguously from index 0 of every output
/// buffer; element `k` corresponds to input index `beg_idx + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputRange {
    /// Input index of the first produced value.
    pub beg_idx: usize,
    /// Number of produced values.
    pub nb_element: usize,
}

impl OutputRange {
    /// Nothing produced.
    pub const EMPTY: Self = Self {
        beg_idx: 0,
        nb_element: 0,
    };

    /// Creates a range starting at `beg_idx` holding `nb_element` values.
    #[must_use]
    pub const fn new(beg_idx: usize, nb_element: usize) -> Self {
        Self {
            beg_idx,
            nb_element,
        }
    }

    /// Returns `true` when no value was produced.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nb_element == 0
    }
}

/// Registration record of one function.
#[derive(Debug, Clone, Copy)]
pub struct FuncDef {
    /// Function name; must start with an ASCII letter.
    pub name: &'static str,
    /// Group the function is listed under.
    pub group: FuncGroup,
    /// One-line description.
    pub hint: &'static str,
    /// Mixed-case name.
    pub camel_case_name: &'static str,
    /// Function-level flags.
    pub flags: FuncFlags,
    /// Required input slots, in call order.
    pub inputs: &'static [InputParameterInfo],
    /// Optional input slots, in call order.
    pub opt_inputs: &'static [OptInputParameterInfo],
    /// Output slots, in call order.
    pub outputs: &'static [OutputParameterInfo],
    /// Lookback entry point.
    pub lookback: LookbackFn,
    /// Compute entry point.
    pub compute: ComputeFn,
}

/// Price components bound to a price slot.
///
/// Components a function does not declare may be supplied; they are dropped
/// when the slot is bound.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceSeries<'a> {
    /// Open prices.
    pub open: Option<&'a [f64]>,
    /// High prices.
    pub high: Option<&'a [f64]>,
    /// Low prices.
    pub low: Option<&'a [f64]>,
    /// Close prices.
    pub close: Option<&'a [f64]>,
    /// Volume.
    pub volume: Option<&'a [f64]>,
    /// Open interest.
    pub open_interest: Option<&'a [f64]>,
}

impl<'a> PriceSeries<'a> {
    /// Open, high, low and close.
    #[must_use]
    pub const fn ohlc(open: &'a [f64], high: &'a [f64], low: &'a [f64], close: &'a [f64]) -> Self {
        Self {
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: None,
            open_interest: None,
        }
    }

    /// High, low and close.
    #[must_use]
    pub const fn hlc(high: &'a [f64], low: &'a [f64], close: &'a [f64]) -> Self {
        Self {
            open: None,
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: None,
            open_interest: None,
        }
    }

    /// Adds a volume series.
    #[must_use]
    pub const fn with_volume(mut self, volume: &'a [f64]) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Adds an open-interest series.
    #[must_use]
    pub const fn with_open_interest(mut self, open_interest: &'a [f64]) -> Self {
        self.open_interest = Some(open_interest);
        self
    }

    /// Returns the component selected by a single flag.
    #[must_use]
    pub fn component(&self, flag: PriceFlags) -> Option<&'a [f64]> {
        if flag == PriceFlags::OPEN {
            self.open
        } else if flag == PriceFlags::HIGH {
            self.high
        } else if flag == PriceFlags::LOW {
            self.low
        } else if flag == PriceFlags::CLOSE {
            self.close
        } else if flag == PriceFlags::VOLUME {
            self.volume
        } else if flag == PriceFlags::OPEN_INTEREST {
            self.open_interest
        } else {
            None
        }
    }

    /// Returns the component selected by `flag`, failing if it was not bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] when the component is missing; a
    /// bound price slot always holds every component its flags declare.
    pub fn require(&self, flag: PriceFlags) -> Result<&'a [f64]> {
        self.component(flag)
            .ok_or(Error::internal(30, "price component required by the function is not bound"))
    }

    /// Keeps only the components selected by `flags`.
    #[must_use]
    pub(crate) fn retain(&self, flags: PriceFlags) -> Self {
        let keep = |flag: PriceFlags| {
            if flags.contains(flag) {
                self.component(flag)
            } else {
                None
            }
        };
        Self {
            open: keep(PriceFlags::OPEN),
            high: keep(PriceFlags::HIGH),
            low: keep(PriceFlags::LOW),
            close: keep(PriceFlags::CLOSE),
            volume: keep(PriceFlags::VOLUME),
            open_interest: keep(PriceFlags::OPEN_INTEREST),
        }
    }

    /// Iterates over the stored components.
    pub fn iter(&self) -> impl Iterator<Item = &'a [f64]> {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.open_interest,
        ]
        .into_iter()
        .flatten()
    }
}

/// Read-only view over a holder's optional-input values.
#[derive(Debug, Clone, Copy)]
pub struct OptInputs<'h> {
    infos: &'static [OptInputParameterInfo],
    values: &'h [OptInputValue],
}

impl<'h> OptInputs<'h> {
    pub(crate) const fn new(
        infos: &'static [OptInputParameterInfo],
        values: &'h [OptInputValue],
    ) -> Self {
        Self { infos, values }
    }

    /// Number of optional inputs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the function declares no optional input.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of slot `index`, without domain validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadParam`] when `index` is out of range.
    pub fn value(&self, index: usize) -> Result<OptInputValue> {
        self.values
            .get(index)
            .copied()
            .ok_or(Error::bad_param("optional input index out of range"))
    }

    fn checked(&self, index: usize) -> Result<OptInputValue> {
        let value = self.value(index)?;
        let info = self
            .infos
            .get(index)
            .ok_or(Error::internal(31, "optional input without descriptor"))?;
        info.validate(value)?;
        Ok(value)
    }

    /// Integer value of slot `index`, validated against its declared domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadParam`] for an out-of-range index or value, and
    /// [`Error::InternalConsistency`] when the slot is not integer-kind.
    pub fn integer(&self, index: usize) -> Result<i32> {
        match self.checked(index)? {
            OptInputValue::Integer(v) => Ok(v),
            OptInputValue::Real(_) => Err(Error::internal(32, "integer read of a real optional input")),
        }
    }

    /// Real value of slot `index`, validated against its declared domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadParam`] for an out-of-range index or value, and
    /// [`Error::InternalConsistency`] when the slot is not real-kind.
    pub fn real(&self, index: usize) -> Result<f64> {
        match self.checked(index)? {
            OptInputValue::Real(v) => Ok(v),
            OptInputValue::Integer(_) => Err(Error::internal(32, "real read of an integer optional input")),
        }
    }

    /// Integer value of slot `index` as a period length.
    ///
    /// # Errors
    ///
    /// Same as [`OptInputs::integer`]; negative values are [`Error::BadParam`].
    pub fn period(&self, index: usize) -> Result<usize> {
        usize::try_from(self.integer(index)?).map_err(|_| Error::bad_param("period must not be negative"))
    }
}

/// View over a fully bound holder handed to a compute entry point.
#[derive(Debug)]
pub struct CallParams<'h, 'a> {
    name: &'static str,
    inputs: &'h [InputBinding<'a>],
    opt_inputs: OptInputs<'h>,
    outputs: &'h mut [OutputBinding<'a>],
}

impl<'h, 'a> CallParams<'h, 'a> {
    pub(crate) fn new(
        name: &'static str,
        inputs: &'h [InputBinding<'a>],
        opt_inputs: OptInputs<'h>,
        outputs: &'h mut [OutputBinding<'a>],
    ) -> Self {
        Self {
            name,
            inputs,
            opt_inputs,
            outputs,
        }
    }

    /// Name of the function being called.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Optional-input values.
    #[must_use]
    pub const fn opt_inputs(&self) -> &OptInputs<'h> {
        &self.opt_inputs
    }

    fn input(&self, index: usize) -> Result<&InputBinding<'a>> {
        self.inputs
            .get(index)
            .ok_or(Error::internal(33, "input index beyond declared inputs"))
    }

    /// Real series bound to input slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] if the slot holds another kind.
    pub fn real_input(&self, index: usize) -> Result<&'a [f64]> {
        match self.input(index)? {
            InputBinding::Real(data) => Ok(data),
            _ => Err(Error::internal(34, "input slot is not a bound real series")),
        }
    }

    /// Integer series bound to input slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] if the slot holds another kind.
    pub fn integer_input(&self, index: usize) -> Result<&'a [i32]> {
        match self.input(index)? {
            InputBinding::Integer(data) => Ok(data),
            _ => Err(Error::internal(34, "input slot is not a bound integer series")),
        }
    }

    /// Price bundle bound to input slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] if the slot holds another kind.
    pub fn price_input(&self, index: usize) -> Result<PriceSeries<'a>> {
        match self.input(index)? {
            InputBinding::Price(series) => Ok(*series),
            _ => Err(Error::internal(34, "input slot is not a bound price bundle")),
        }
    }

    /// Destination bound to real output slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] if the slot holds another kind.
    pub fn real_output(&mut self, index: usize) -> Result<&mut [f64]> {
        match self.outputs.get_mut(index) {
            Some(OutputBinding::Real(out)) => Ok(out),
            _ => Err(Error::internal(35, "output slot is not a bound real series")),
        }
    }

    /// Destination bound to integer output slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] if the slot holds another kind.
    pub fn integer_output(&mut self, index: usize) -> Result<&mut [i32]> {
        match self.outputs.get_mut(index) {
            Some(OutputBinding::Integer(out)) => Ok(out),
            _ => Err(Error::internal(35, "output slot is not a bound integer series")),
        }
    }

    /// All destinations of a function with exactly `N` real outputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] if the function does not declare
    /// exactly `N` outputs or one of them is not real-kind.
    pub fn real_outputs<const N: usize>(&mut self) -> Result<[&mut [f64]; N]> {
        let slots = <&mut [OutputBinding<'a>; N]>::try_from(&mut *self.outputs)
            .map_err(|_| Error::internal(36, "output count differs from the requested count"))?;
        if slots.iter().any(|slot| !matches!(slot, OutputBinding::Real(_))) {
            return Err(Error::internal(35, "output slot is not a bound real series"));
        }
        Ok(slots.each_mut().map(|slot| match slot {
            OutputBinding::Real(out) => &mut **out,
            _ => &mut [],
        }))
    }
}

/// Checks the index range of a compute call.
///
/// # Errors
///
/// Returns [`Error::OutOfRangeEndIndex`] when `end_idx < start_idx`.
pub fn validate_range(start_idx: usize, end_idx: usize) -> Result<()> {
    if end_idx < start_idx {
        return Err(Error::OutOfRangeEndIndex {
            start: start_idx,
            end: end_idx,
            available: 0,
        });
    }
    Ok(())
}

/// First index that can produce an output, or `None` if the lookback
/// consumes the whole `[start_idx, end_idx]` range.
#[must_use]
pub const fn effective_start(start_idx: usize, end_idx: usize, lookback: usize) -> Option<usize> {
    let start = if start_idx < lookback {
        lookback
    } else {
        start_idx
    };
    if start > end_idx {
        None
    } else {
        Some(start)
    }
}

/// Checks that `actual` elements are enough to hold `required` outputs.
///
/// # Errors
///
/// Returns [`Error::BufferTooSmall`] otherwise.
pub const fn ensure_output_len(function: &'static str, actual: usize, required: usize) -> Result<()> {
    if actual < required {
        Err(Error::BufferTooSmall {
            function,
            required,
            actual,
        })
    } else {
        Ok(())
    }
}

//! Param holders.
//!
//! A [`ParamHolder`] is the per-invocation object of the abstract calling
//! convention. It is allocated for one function handle, receives the caller's
//! buffers and optional values slot by slot, and is then handed to
//! [`ParamHolder::call`]. Two [`SlotMask`]s track which required input and
//! output slots are still unbound; optional inputs start at their declared
//! defaults and never participate in the masks.
//!
//! Holders borrow the registry for `'r` and the caller's buffers for `'a`, so
//! the compiler guarantees every bound slice outlives the holder.
//!
//! # Example
//!
//! ```
//! use ta_abstract::Registry;
//!
//! let registry = Registry::global();
//! let handle = registry.lookup("SMA").unwrap();
//!
//! let close = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let mut out = [0.0; 5];
//! let mut holder = registry.alloc(handle).unwrap();
//! holder.set_input_real(0, &close).unwrap();
//! holder.set_opt_input_integer(0, 3).unwrap();
//! holder.set_output_real(0, &mut out).unwrap();
//!
//! let range = holder.call(0, 4).unwrap();
//! assert_eq!((range.beg_idx, range.nb_element), (2, 3));
//! holder.release();
//! assert_eq!(&out[..3], &[2.0, 3.0, 4.0]);
//! ```

use tracing::trace;

use crate::error::{Error, Result};
use crate::handle::FuncHandle;
use crate::meta::{FuncInfo, InputKind, OptInputValue, OutputKind, SlotKind};
use crate::plugin::{FuncDef, PriceSeries};
use crate::registry::Registry;

/// Capacity of a [`SlotMask`]: the most input or output slots a function may
/// declare.
pub const MAX_SLOTS: usize = 32;

const PARAM_HOLDER_MAGIC: u64 = 0xA203_B203_0000_0000;

/// Bit set of slots that are still unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotMask(u32);

impl SlotMask {
    /// A mask with one set bit per slot for `len` slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalConsistency`] when `len` exceeds [`MAX_SLOTS`].
    pub fn with_len(len: usize) -> Result<Self> {
        match len {
            0 => Ok(Self(0)),
            MAX_SLOTS => Ok(Self(u32::MAX)),
            n if n < MAX_SLOTS => Ok(Self((1u32 << n) - 1)),
            _ => Err(Error::internal(11, "slot count exceeds the bitmap capacity")),
        }
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` once every slot is bound.
    #[must_use]
    pub const fn is_clear(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if slot `index` is still unbound.
    #[must_use]
    pub const fn contains(self, index: usize) -> bool {
        index < MAX_SLOTS && self.0 & (1 << index) != 0
    }

    /// Number of unbound slots.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    fn clear(&mut self, index: usize) {
        if index < MAX_SLOTS {
            self.0 &= !(1 << index);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum InputBinding<'a> {
    Unbound,
    Integer(&'a [i32]),
    Real(&'a [f64]),
    Price(PriceSeries<'a>),
}

impl InputBinding<'_> {
    /// Length of the shortest stored series.
    pub(crate) fn available(&self) -> Option<usize> {
        match self {
            Self::Unbound => None,
            Self::Integer(data) => Some(data.len()),
            Self::Real(data) => Some(data.len()),
            Self::Price(series) => series.iter().map(<[f64]>::len).min(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum OutputBinding<'a> {
    Unbound,
    Integer(&'a mut [i32]),
    Real(&'a mut [f64]),
}

/// Per-invocation parameter binding object.
///
/// See the [module documentation](self) for the lifecycle.
#[derive(Debug)]
pub struct ParamHolder<'r, 'a> {
    pub(crate) registry: &'r Registry,
    pub(crate) handle: FuncHandle,
    pub(crate) def: &'static FuncDef,
    tag: u64,
    released: bool,
    pub(crate) inputs: Vec<InputBinding<'a>>,
    pub(crate) opt_inputs: Vec<OptInputValue>,
    pub(crate) outputs: Vec<OutputBinding<'a>>,
    pub(crate) in_unbound: SlotMask,
    pub(crate) out_unbound: SlotMask,
}

fn reserve<T>(len: usize, what: &'static str) -> Result<Vec<T>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationError { what })?;
    Ok(slots)
}

impl<'r, 'a> ParamHolder<'r, 'a> {
    /// Allocates a holder for `handle`.
    ///
    /// Optional inputs are seeded with their declared defaults and every input
    /// and output slot starts unbound.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHandle`] when the handle does not belong to `registry`.
    /// - [`Error::InternalConsistency`] when the function declares no input.
    /// - [`Error::AllocationError`] when slot storage cannot be reserved.
    pub fn alloc(registry: &'r Registry, handle: FuncHandle) -> Result<Self> {
        let def = registry.resolve(handle)?;
        if def.inputs.is_empty() {
            return Err(Error::internal(10, "function declares no input"));
        }
        let in_unbound = SlotMask::with_len(def.inputs.len())?;
        let out_unbound = SlotMask::with_len(def.outputs.len())?;

        let mut inputs = reserve(def.inputs.len(), "param holder inputs")?;
        let mut opt_inputs = reserve(def.opt_inputs.len(), "param holder optional inputs")?;
        let mut outputs = reserve(def.outputs.len(), "param holder outputs")?;
        inputs.resize(def.inputs.len(), InputBinding::Unbound);
        opt_inputs.extend(def.opt_inputs.iter().map(|info| info.seed_value()));
        outputs.extend(def.outputs.iter().map(|_| OutputBinding::Unbound));

        trace!(function = def.name, "param holder allocated");
        Ok(Self {
            registry,
            handle,
            def,
            tag: PARAM_HOLDER_MAGIC ^ handle.tag(),
            released: false,
            inputs,
            opt_inputs,
            outputs,
            in_unbound,
            out_unbound,
        })
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if !self.released && self.tag == PARAM_HOLDER_MAGIC ^ self.handle.tag() {
            Ok(())
        } else {
            Err(Error::InvalidParamHolder)
        }
    }

    /// Handle the holder was allocated for.
    #[must_use]
    pub const fn handle(&self) -> FuncHandle {
        self.handle
    }

    /// Registration record of the bound function.
    #[must_use]
    pub const fn func_def(&self) -> &'static FuncDef {
        self.def
    }

    /// Information about the bound function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParamHolder`] after release.
    pub fn info(&self) -> Result<FuncInfo> {
        self.ensure_live()?;
        self.registry.info(self.handle)
    }

    /// Input slots still unbound.
    #[must_use]
    pub const fn unbound_inputs(&self) -> SlotMask {
        self.in_unbound
    }

    /// Output slots still unbound.
    #[must_use]
    pub const fn unbound_outputs(&self) -> SlotMask {
        self.out_unbound
    }

    /// Returns `true` once [`ParamHolder::release`] has run.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// Current value of optional input slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParamHolder`] after release and
    /// [`Error::BadParam`] when `index` is out of range.
    pub fn opt_input(&self, index: usize) -> Result<OptInputValue> {
        self.ensure_live()?;
        self.opt_inputs
            .get(index)
            .copied()
            .ok_or(Error::bad_param("optional input index out of range"))
    }

    fn input_kind(&self, index: usize) -> Result<InputKind> {
        self.def
            .inputs
            .get(index)
            .map(|info| info.kind)
            .ok_or(Error::bad_param("input index out of range"))
    }

    fn bind_input(&mut self, index: usize, binding: InputBinding<'a>) -> Result<()> {
        let slot = self
            .inputs
            .get_mut(index)
            .ok_or(Error::internal(12, "input binding storage shorter than declared"))?;
        *slot = binding;
        self.in_unbound.clear(index);
        Ok(())
    }

    /// Binds an integer series to input slot `index`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] for an empty series or an out-of-range index.
    /// - [`Error::WrongParameterType`] when the slot is not integer-kind.
    pub fn set_input_integer(&mut self, index: usize, data: &'a [i32]) -> Result<()> {
        self.ensure_live()?;
        if data.is_empty() {
            return Err(Error::bad_param("input series is empty"));
        }
        match self.input_kind(index)? {
            InputKind::Integer => self.bind_input(index, InputBinding::Integer(data)),
            kind => Err(Error::WrongParameterType {
                slot: SlotKind::Input,
                index,
                expected: kind.label(),
                actual: "integer",
            }),
        }
    }

    /// Binds a real series to input slot `index`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] for an empty series or an out-of-range index.
    /// - [`Error::WrongParameterType`] when the slot is not real-kind.
    pub fn set_input_real(&mut self, index: usize, data: &'a [f64]) -> Result<()> {
        self.ensure_live()?;
        if data.is_empty() {
            return Err(Error::bad_param("input series is empty"));
        }
        match self.input_kind(index)? {
            InputKind::Real => self.bind_input(index, InputBinding::Real(data)),
            kind => Err(Error::WrongParameterType {
                slot: SlotKind::Input,
                index,
                expected: kind.label(),
                actual: "real",
            }),
        }
    }

    /// Binds a price bundle to input slot `index`.
    ///
    /// Every component the slot declares must be present and non-empty.
    /// Components it does not declare are accepted and dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] for an out-of-range index or a missing component.
    /// - [`Error::WrongParameterType`] when the slot is not a price slot.
    pub fn set_input_price(&mut self, index: usize, series: PriceSeries<'a>) -> Result<()> {
        self.ensure_live()?;
        let flags = match self.input_kind(index)? {
            InputKind::Price(flags) => flags,
            kind => {
                return Err(Error::WrongParameterType {
                    slot: SlotKind::Input,
                    index,
                    expected: kind.label(),
                    actual: "price",
                })
            }
        };
        for flag in flags.iter() {
            match series.component(flag) {
                Some(data) if !data.is_empty() => {}
                _ => return Err(Error::bad_param("price component required by the slot is missing")),
            }
        }
        self.bind_input(index, InputBinding::Price(series.retain(flags)))
    }

    fn set_opt_input(&mut self, index: usize, value: OptInputValue) -> Result<()> {
        self.ensure_live()?;
        let info = self
            .def
            .opt_inputs
            .get(index)
            .ok_or(Error::bad_param("optional input index out of range"))?;
        if info.kind.is_integer() != matches!(value, OptInputValue::Integer(_)) {
            return Err(Error::WrongParameterType {
                slot: SlotKind::OptInput,
                index,
                expected: info.kind.label(),
                actual: value.label(),
            });
        }
        let slot = self
            .opt_inputs
            .get_mut(index)
            .ok_or(Error::internal(13, "optional input storage shorter than declared"))?;
        *slot = value;
        Ok(())
    }

    /// Sets integer optional input `index`, overwriting any previous value.
    ///
    /// The value is checked against its declared domain when the lookback is
    /// computed or the function is called.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] for an out-of-range index.
    /// - [`Error::WrongParameterType`] when the slot is real-kind.
    pub fn set_opt_input_integer(&mut self, index: usize, value: i32) -> Result<()> {
        self.set_opt_input(index, OptInputValue::Integer(value))
    }

    /// Sets real optional input `index`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] for an out-of-range index.
    /// - [`Error::WrongParameterType`] when the slot is integer-kind.
    pub fn set_opt_input_real(&mut self, index: usize, value: f64) -> Result<()> {
        self.set_opt_input(index, OptInputValue::Real(value))
    }

    fn bind_output(
        &mut self,
        index: usize,
        actual: OutputKind,
        binding: OutputBinding<'a>,
    ) -> Result<()> {
        let expected = self
            .def
            .outputs
            .get(index)
            .map(|info| info.kind)
            .ok_or(Error::bad_param("output index out of range"))?;
        if expected != actual {
            return Err(Error::WrongParameterType {
                slot: SlotKind::Output,
                index,
                expected: expected.label(),
                actual: actual.label(),
            });
        }
        let slot = self
            .outputs
            .get_mut(index)
            .ok_or(Error::internal(14, "output binding storage shorter than declared"))?;
        *slot = binding;
        self.out_unbound.clear(index);
        Ok(())
    }

    /// Binds an integer destination to output slot `index`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] for an empty buffer or an out-of-range index.
    /// - [`Error::WrongParameterType`] when the slot is not integer-kind.
    pub fn set_output_integer(&mut self, index: usize, out: &'a mut [i32]) -> Result<()> {
        self.ensure_live()?;
        if out.is_empty() {
            return Err(Error::bad_param("output buffer is empty"));
        }
        self.bind_output(index, OutputKind::Integer, OutputBinding::Integer(out))
    }

    /// Binds a real destination to output slot `index`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParamHolder`] after release.
    /// - [`Error::BadParam`] for an empty buffer or an out-of-range index.
    /// - [`Error::WrongParameterType`] when the slot is not real-kind.
    pub fn set_output_real(&mut self, index: usize, out: &'a mut [f64]) -> Result<()> {
        self.ensure_live()?;
        if out.is_empty() {
            return Err(Error::bad_param("output buffer is empty"));
        }
        self.bind_output(index, OutputKind::Real, OutputBinding::Real(out))
    }

    /// Releases the holder.
    ///
    /// Drops every binding and makes every later operation fail with
    /// [`Error::InvalidParamHolder`]. Releasing twice is harmless.
    pub fn release(&mut self) {
        if self.is_released() {
            return;
        }
        trace!(function = self.def.name, "param holder released");
        self.released = true;
        self.inputs.clear();
        self.opt_inputs.clear();
        self.outputs.clear();
    }
}

/// Releases `holder` if there is one.
pub fn release(holder: Option<&mut ParamHolder<'_, '_>>) {
    if let Some(holder) = holder {
        holder.release();
    }
}

impl Registry {
    /// Allocates a [`ParamHolder`] for `handle`.
    ///
    /// # Errors
    ///
    /// See [`ParamHolder::alloc`].
    pub fn alloc<'a>(&self, handle: FuncHandle) -> Result<ParamHolder<'_, 'a>> {
        ParamHolder::alloc(self, handle)
    }
}

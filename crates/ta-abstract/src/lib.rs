//! ta-abstract: runtime-introspectable technical analysis functions
//!
//! This crate puts a uniform calling convention in front of a catalogue of
//! indicator functions. A caller that knows nothing about a function at
//! compile time can find it by name, read the metadata of every parameter
//! slot, bind buffers and values slot by slot, and invoke it.
//!
//! # Overview
//!
//! - [`Registry`]: read-only catalogue, queryable by name and by group.
//! - [`FuncHandle`]: validated reference to one registered function.
//! - [`ParamHolder`]: per-call object binding inputs, optional inputs and
//!   outputs, tracking unbound required slots in a [`SlotMask`].
//! - [`ParamHolder::call`] / [`ParamHolder::lookback`]: dispatch through the
//!   function's registration record ([`FuncDef`]).
//! - [`tables`]: group and function name tables.
//! - [`functions`]: the built-in catalogue, usable directly through its
//!   typed kernels.
//!
//! # Quick Start
//!
//! ```
//! use ta_abstract::Registry;
//!
//! let registry = Registry::global();
//! let handle = registry.lookup("SMA").unwrap();
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let mut out = [0.0; 6];
//!
//! let mut holder = registry.alloc(handle).unwrap();
//! holder.set_input_real(0, &data).unwrap();
//! holder.set_opt_input_integer(0, 3).unwrap();
//! holder.set_output_real(0, &mut out).unwrap();
//!
//! assert_eq!(holder.lookback().unwrap(), 2);
//! let range = holder.call(0, 5).unwrap();
//! assert_eq!((range.beg_idx, range.nb_element), (2, 4));
//! drop(holder);
//! assert!((out[0] - 2.0).abs() < 1e-12);
//! ```
//!
//! # Error Handling
//!
//! Every fallible operation returns [`Result<T, Error>`]. Nothing in the
//! crate panics on caller input:
//!
//! ```
//! use ta_abstract::{Error, Registry};
//!
//! let registry = Registry::global();
//! assert!(matches!(registry.lookup("NOPE"), Err(Error::FunctionNotFound { .. })));
//!
//! let mut holder = registry.alloc(registry.lookup("SMA").unwrap()).unwrap();
//! assert!(matches!(holder.call(0, 0), Err(Error::InputsNotFullyBound { .. })));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::nursery)]
#![warn(clippy::needless_collect)]
#![warn(clippy::or_fun_call)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::useless_conversion)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod catalog;
mod dispatch;
pub mod error;
pub mod functions;
pub mod handle;
pub mod holder;
pub mod meta;
pub mod plugin;
pub mod prelude;
pub mod registry;
pub mod tables;

pub use catalog::FunctionDescription;
pub use error::{Error, Result};
pub use handle::FuncHandle;
pub use holder::{release, ParamHolder, SlotMask, MAX_SLOTS};
pub use meta::{FuncFlags, FuncGroup, FuncInfo, OptInputValue, PriceFlags};
pub use plugin::{CallParams, FuncDef, OptInputs, OutputRange, PriceSeries};
pub use registry::{Registry, RegistryBuilder};
pub use tables::{func_table_free, group_table_free, StringTable};

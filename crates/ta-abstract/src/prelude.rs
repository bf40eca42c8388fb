//! Commonly used types for convenient importing.
//!
//! # Usage
//!
//! ```
//! use ta_abstract::prelude::*;
//!
//! let registry = Registry::global();
//! let info: FuncInfo = registry.info(registry.lookup("CORREL").unwrap()).unwrap();
//! assert_eq!(info.group, FuncGroup::StatisticFunctions);
//! assert_eq!(info.nb_input, 2);
//! ```
//!
//! # Contents
//!
//! ## Error Handling
//! - [`Error`], [`Result`]
//!
//! ## Registry and Dispatch
//! - [`Registry`], [`RegistryBuilder`], [`FuncHandle`], [`ParamHolder`],
//!   [`SlotMask`], [`OutputRange`]
//!
//! ## Metadata
//! - [`FuncInfo`], [`FuncGroup`], [`FuncFlags`], [`PriceFlags`],
//!   [`OptInputValue`]
//!
//! ## Plugins
//! - [`FuncDef`], [`CallParams`], [`OptInputs`], [`PriceSeries`]

// Error types
pub use crate::error::{Error, Result};

// Registry and dispatch
pub use crate::handle::FuncHandle;
pub use crate::holder::{ParamHolder, SlotMask};
pub use crate::registry::{Registry, RegistryBuilder};

// Metadata
pub use crate::meta::{FuncFlags, FuncGroup, FuncInfo, OptInputValue, PriceFlags};

// Plugin-facing types
pub use crate::plugin::{CallParams, FuncDef, OptInputs, OutputRange, PriceSeries};

// Batch evaluation
pub use crate::batch::BatchCaller;

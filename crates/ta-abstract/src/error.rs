//! Error types for ta-abstract.
//!
//! Every public operation of the abstraction layer returns [`Result<T>`]. The
//! variants mirror the classic numeric return codes of the abstract calling
//! convention, which remain available through [`Error::ret_code`] for callers
//! that need to surface them across an FFI or logging boundary.
//!
//! Validation is eager and ordered: null/shape checks come before type checks,
//! which come before state checks. Tests may rely on that precedence.

use thiserror::Error;

use crate::meta::SlotKind;

/// Numeric code of a successful call.
pub const RET_SUCCESS: u32 = 0;

/// Base value for internal-consistency codes. The reported code is
/// `RET_INTERNAL_ERROR + id`.
pub const RET_INTERNAL_ERROR: u32 = 5000;

/// The main error type for ta-abstract operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A null, empty or out-of-range argument.
    #[error("bad parameter: {reason}")]
    BadParam {
        /// Description of the rejected argument.
        reason: &'static str,
    },

    /// Reserving storage for a holder or table failed.
    #[error("allocation failed while building {what}")]
    AllocationError {
        /// The object whose storage could not be reserved.
        what: &'static str,
    },

    /// The handle does not belong to this registry or carries a stale tag.
    #[error("invalid function handle")]
    InvalidHandle,

    /// The param holder was released or does not carry the expected tag.
    #[error("invalid param holder")]
    InvalidParamHolder,

    /// A bind call supplied data of a different kind than the slot declares.
    #[error("wrong parameter type for {slot} slot {index}: expected {expected}, got {actual}")]
    WrongParameterType {
        /// Which slot list the index refers to.
        slot: SlotKind,
        /// Slot index.
        index: usize,
        /// Kind declared by the function metadata.
        expected: &'static str,
        /// Kind supplied by the caller.
        actual: &'static str,
    },

    /// `call` was attempted while some required inputs were still unbound.
    #[error("inputs not fully bound: {missing} slot(s) still unbound")]
    InputsNotFullyBound {
        /// Number of unbound input slots.
        missing: u32,
    },

    /// `call` was attempted while some outputs were still unbound.
    #[error("outputs not fully bound: {missing} slot(s) still unbound")]
    OutputsNotFullyBound {
        /// Number of unbound output slots.
        missing: u32,
    },

    /// No registered function has this name.
    #[error("function not found: '{name}'")]
    FunctionNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The group name is not one of the known groups.
    #[error("group not found: '{group}'")]
    GroupNotFound {
        /// The group that was looked up.
        group: String,
    },

    /// A string table was released through the wrong release call or twice.
    #[error("invalid object: {what}")]
    InvalidObject {
        /// Description of the object.
        what: &'static str,
    },

    /// The start index lies outside the valid range.
    #[error("start index {start} out of range")]
    OutOfRangeStartIndex {
        /// The rejected start index.
        start: usize,
    },

    /// The end index is before the start index or beyond the bound data.
    #[error("end index {end} out of range (start {start}, available {available})")]
    OutOfRangeEndIndex {
        /// Requested start index.
        start: usize,
        /// The rejected end index.
        end: usize,
        /// Number of elements available in the shortest bound input.
        available: usize,
    },

    /// An output buffer cannot hold every produced value.
    #[error("output buffer too small for {function}: required {required} elements, got {actual}")]
    BufferTooSmall {
        /// Name of the function that produced the output.
        function: &'static str,
        /// Number of elements that would be written.
        required: usize,
        /// Length of the bound buffer.
        actual: usize,
    },

    /// The registry or a registration record contradicts itself.
    ///
    /// Never caused by caller misuse; see [`Error::is_defect`].
    #[error("internal consistency error #{id}: {context}")]
    InternalConsistency {
        /// Stable identifier of the failed check.
        id: u32,
        /// Description of the failed check.
        context: &'static str,
    },
}

impl Error {
    pub(crate) const fn bad_param(reason: &'static str) -> Self {
        Self::BadParam { reason }
    }

    pub(crate) const fn internal(id: u32, context: &'static str) -> Self {
        Self::InternalConsistency { id, context }
    }

    /// Returns the classic numeric return code for this error.
    ///
    /// ```
    /// use ta_abstract::Error;
    ///
    /// assert_eq!(Error::InvalidHandle.ret_code(), 6);
    /// assert_eq!(Error::InternalConsistency { id: 3, context: "x" }.ret_code(), 5003);
    /// ```
    #[must_use]
    pub const fn ret_code(&self) -> u32 {
        match self {
            Self::BadParam { .. } => 2,
            Self::AllocationError { .. } => 3,
            Self::GroupNotFound { .. } => 4,
            Self::FunctionNotFound { .. } => 5,
            Self::InvalidHandle => 6,
            Self::InvalidParamHolder => 7,
            Self::WrongParameterType { .. } => 8,
            Self::InputsNotFullyBound { .. } => 10,
            Self::OutputsNotFullyBound { .. } => 11,
            Self::OutOfRangeStartIndex { .. } => 12,
            Self::OutOfRangeEndIndex { .. } => 13,
            Self::InvalidObject { .. } => 15,
            // Buffer overruns are reported as bad parameters in the numeric scheme.
            Self::BufferTooSmall { .. } => 2,
            Self::InternalConsistency { id, .. } => RET_INTERNAL_ERROR + *id,
        }
    }

    /// Returns `true` if the error signals a malformed registry rather than
    /// caller misuse.
    #[must_use]
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::InternalConsistency { .. })
    }
}

/// Convenience type alias for Results using the ta-abstract Error type.
pub type Result<T> = std::result::Result<T, Error>;

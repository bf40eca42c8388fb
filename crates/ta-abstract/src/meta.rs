//! Function metadata.
//!
//! Immutable descriptors describing a registered function and each of its
//! parameter slots. Every type here is `'static`-friendly so that registration
//! records can be built as `static` items, and serializable so that the
//! catalogue can be exported for documentation and UI pickers.
//!
//! # Example
//!
//! ```
//! use ta_abstract::meta::{FuncGroup, InputKind, PriceFlags};
//!
//! assert_eq!(FuncGroup::from_name("Overlap Studies"), Some(FuncGroup::OverlapStudies));
//! let hlc = InputKind::Price(PriceFlags::HIGH | PriceFlags::LOW | PriceFlags::CLOSE);
//! assert_eq!(hlc.label(), "price");
//! ```

use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::handle::FuncHandle;

/// Number of function groups.
pub const GROUP_COUNT: usize = 10;

/// Category tag partitioning the catalogue for discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FuncGroup {
    /// Element-wise arithmetic and window extrema.
    MathOperators,
    /// Element-wise mathematical transforms.
    MathTransform,
    /// Indicators drawn over the price (moving averages, bands).
    OverlapStudies,
    /// Range and volatility measures.
    VolatilityIndicators,
    /// Oscillators and momentum measures.
    MomentumIndicators,
    /// Dominant-cycle analysis.
    CycleIndicators,
    /// Volume-weighted flow measures.
    VolumeIndicators,
    /// Candlestick pattern recognition.
    PatternRecognition,
    /// Rolling statistics.
    StatisticFunctions,
    /// Combinations of the OHLC prices.
    PriceTransform,
}

impl FuncGroup {
    /// All groups, in their fixed listing order.
    pub const ALL: [Self; GROUP_COUNT] = [
        Self::MathOperators,
        Self::MathTransform,
        Self::OverlapStudies,
        Self::VolatilityIndicators,
        Self::MomentumIndicators,
        Self::CycleIndicators,
        Self::VolumeIndicators,
        Self::PatternRecognition,
        Self::StatisticFunctions,
        Self::PriceTransform,
    ];

    /// Returns the display name of the group.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MathOperators => "Math Operators",
            Self::MathTransform => "Math Transform",
            Self::OverlapStudies => "Overlap Studies",
            Self::VolatilityIndicators => "Volatility Indicators",
            Self::MomentumIndicators => "Momentum Indicators",
            Self::CycleIndicators => "Cycle Indicators",
            Self::VolumeIndicators => "Volume Indicators",
            Self::PatternRecognition => "Pattern Recognition",
            Self::StatisticFunctions => "Statistic Functions",
            Self::PriceTransform => "Price Transform",
        }
    }

    /// Position of the group in [`FuncGroup::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks a group up by its exact display name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.name() == name)
    }
}

impl fmt::Display for FuncGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three slot lists a function declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SlotKind {
    /// Required input series.
    Input,
    /// Optional input value with a default.
    OptInput,
    /// Output series.
    Output,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::OptInput => "optional input",
            Self::Output => "output",
        })
    }
}

bitflags! {
    /// Function-level flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct FuncFlags: u32 {
        /// Output scales with the price and can be drawn over it.
        const OVERLAP     = 0x0100_0000;
        /// Output is related to volume.
        const VOLUME      = 0x0400_0000;
        /// Output depends on values before the lookback window (unstable period).
        const UNST_PERIOD = 0x0800_0000;
        /// Candlestick pattern recognition.
        const CANDLESTICK = 0x1000_0000;
    }
}

bitflags! {
    /// Components of a price bundle input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct PriceFlags: u32 {
        /// Open price.
        const OPEN          = 0x0001;
        /// High price.
        const HIGH          = 0x0002;
        /// Low price.
        const LOW           = 0x0004;
        /// Close price.
        const CLOSE         = 0x0008;
        /// Volume.
        const VOLUME        = 0x0010;
        /// Open interest.
        const OPEN_INTEREST = 0x0020;
    }
}

bitflags! {
    /// Presentation hints for optional inputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct OptInputFlags: u32 {
        /// Value is a percentage.
        const PERCENT  = 0x0010_0000;
        /// Value is in degrees.
        const DEGREE   = 0x0020_0000;
        /// Value is a currency amount.
        const CURRENCY = 0x0040_0000;
        /// Rarely changed, hidden by default in pickers.
        const ADVANCED = 0x0100_0000;
    }
}

bitflags! {
    /// Drawing hints for outputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct OutputFlags: u32 {
        /// Solid line.
        const LINE              = 0x0001;
        /// Dotted line.
        const DOT_LINE          = 0x0002;
        /// Dashed line.
        const DASH_LINE         = 0x0004;
        /// Dots.
        const DOT               = 0x0008;
        /// Histogram.
        const HISTO             = 0x0010;
        /// Pattern present (non-zero) or not.
        const PATTERN_BOOL      = 0x0020;
        /// Bullish (> 0) or bearish (< 0) pattern.
        const PATTERN_BULL_BEAR = 0x0040;
        /// Pattern strength in percent.
        const PATTERN_STRENGTH  = 0x0080;
        /// Output can be positive.
        const POSITIVE          = 0x0100;
        /// Output can be negative.
        const NEGATIVE          = 0x0200;
        /// Output can be zero.
        const ZERO              = 0x0400;
        /// Upper limit of a band.
        const UPPER_LIMIT       = 0x0800;
        /// Lower limit of a band.
        const LOWER_LIMIT       = 0x1000;
    }
}

/// Data kind of a required input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputKind {
    /// A bundle of price series selected by flags.
    Price(PriceFlags),
    /// A real-valued series.
    Real,
    /// An integer-valued series.
    Integer,
}

impl InputKind {
    /// Short lowercase label used in error messages and listings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Price(_) => "price",
            Self::Real => "real",
            Self::Integer => "integer",
        }
    }
}

/// Descriptor of one required input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputParameterInfo {
    /// Data kind of the slot.
    pub kind: InputKind,
    /// Parameter name, e.g. `inReal`.
    pub param_name: &'static str,
}

impl InputParameterInfo {
    /// A real series input.
    #[must_use]
    pub const fn real(param_name: &'static str) -> Self {
        Self {
            kind: InputKind::Real,
            param_name,
        }
    }

    /// An integer series input.
    #[must_use]
    pub const fn integer(param_name: &'static str) -> Self {
        Self {
            kind: InputKind::Integer,
            param_name,
        }
    }

    /// A price bundle input using the components in `flags`.
    #[must_use]
    pub const fn price(param_name: &'static str, flags: PriceFlags) -> Self {
        Self {
            kind: InputKind::Price(flags),
            param_name,
        }
    }
}

/// Valid range of an integer optional input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegerRange {
    /// Smallest accepted value.
    pub min: i32,
    /// Largest accepted value.
    pub max: i32,
    /// Suggested first value when scanning the parameter.
    pub suggested_start: i32,
    /// Suggested last value when scanning the parameter.
    pub suggested_end: i32,
    /// Suggested step when scanning the parameter.
    pub suggested_increment: i32,
}

/// Valid range of a real optional input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RealRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
    /// Number of significant decimals for display.
    pub precision: u32,
    /// Suggested first value when scanning the parameter.
    pub suggested_start: f64,
    /// Suggested last value when scanning the parameter.
    pub suggested_end: f64,
    /// Suggested step when scanning the parameter.
    pub suggested_increment: f64,
}

/// One entry of an enumerated integer optional input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegerListItem {
    /// Accepted value.
    pub value: i32,
    /// Display label.
    pub label: &'static str,
}

/// One entry of an enumerated real optional input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RealListItem {
    /// Accepted value.
    pub value: f64,
    /// Display label.
    pub label: &'static str,
}

/// Kind and domain of an optional input slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum OptInputKind {
    /// Real value within a range.
    RealRange(RealRange),
    /// Real value from an enumerated list.
    RealList(&'static [RealListItem]),
    /// Integer value within a range.
    IntegerRange(IntegerRange),
    /// Integer value from an enumerated list.
    IntegerList(&'static [IntegerListItem]),
}

impl OptInputKind {
    /// Returns `true` for the integer family (range or list).
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::IntegerRange(_) | Self::IntegerList(_))
    }

    /// Short lowercase label of the kind family.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        if self.is_integer() {
            "integer"
        } else {
            "real"
        }
    }
}

/// A concrete optional input value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum OptInputValue {
    /// Value of an integer-kind slot.
    Integer(i32),
    /// Value of a real-kind slot.
    Real(f64),
}

impl OptInputValue {
    /// Short lowercase label of the value kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
        }
    }
}

impl fmt::Display for OptInputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
        }
    }
}

/// Descriptor of one optional input slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptInputParameterInfo {
    /// Kind and domain of accepted values.
    pub kind: OptInputKind,
    /// Parameter name, e.g. `optInTimePeriod`.
    pub param_name: &'static str,
    /// Presentation flags.
    pub flags: OptInputFlags,
    /// Human readable name, e.g. `Time Period`.
    pub display_name: &'static str,
    /// Value used when the caller never sets the slot.
    pub default_value: f64,
    /// One-line description.
    pub hint: &'static str,
}

impl OptInputParameterInfo {
    /// The value a fresh holder is seeded with.
    ///
    /// Integer-kind slots truncate the declared default.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn seed_value(&self) -> OptInputValue {
        if self.kind.is_integer() {
            OptInputValue::Integer(self.default_value as i32)
        } else {
            OptInputValue::Real(self.default_value)
        }
    }

    /// Checks `value` against the declared range or list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadParam`] when the value is outside the declared domain,
    /// and [`Error::InternalConsistency`] when the value kind does not match the
    /// slot kind (the holder never stores such a value).
    pub fn validate(&self, value: OptInputValue) -> Result<()> {
        let accepted = match (self.kind, value) {
            (OptInputKind::IntegerRange(range), OptInputValue::Integer(v)) => {
                (range.min..=range.max).contains(&v)
            }
            (OptInputKind::IntegerList(items), OptInputValue::Integer(v)) => {
                items.iter().any(|item| item.value == v)
            }
            (OptInputKind::RealRange(range), OptInputValue::Real(v)) => {
                v >= range.min && v <= range.max
            }
            (OptInputKind::RealList(items), OptInputValue::Real(v)) => {
                items.iter().any(|item| item.value == v)
            }
            _ => return Err(Error::internal(20, "optional value kind differs from slot kind")),
        };
        if accepted {
            Ok(())
        } else {
            Err(Error::bad_param("optional input outside its declared domain"))
        }
    }
}

/// Data kind of an output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputKind {
    /// A real-valued series.
    Real,
    /// An integer-valued series.
    Integer,
}

impl OutputKind {
    /// Short lowercase label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Integer => "integer",
        }
    }
}

/// Descriptor of one output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputParameterInfo {
    /// Data kind of the slot.
    pub kind: OutputKind,
    /// Parameter name, e.g. `outReal`.
    pub param_name: &'static str,
    /// Drawing flags.
    pub flags: OutputFlags,
}

impl OutputParameterInfo {
    /// A real series output.
    #[must_use]
    pub const fn real(param_name: &'static str, flags: OutputFlags) -> Self {
        Self {
            kind: OutputKind::Real,
            param_name,
            flags,
        }
    }

    /// An integer series output.
    #[must_use]
    pub const fn integer(param_name: &'static str, flags: OutputFlags) -> Self {
        Self {
            kind: OutputKind::Integer,
            param_name,
            flags,
        }
    }
}

/// Per-function information returned by handle lookups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuncInfo {
    /// Function name, e.g. `CORREL`.
    pub name: &'static str,
    /// Group the function belongs to.
    pub group: FuncGroup,
    /// One-line description.
    pub hint: &'static str,
    /// Mixed-case name, e.g. `Correl`.
    pub camel_case_name: &'static str,
    /// Function-level flags.
    pub flags: FuncFlags,
    /// Number of required inputs.
    pub nb_input: usize,
    /// Number of optional inputs.
    pub nb_opt_input: usize,
    /// Number of outputs.
    pub nb_output: usize,
    /// Handle of the registry entry this info belongs to.
    #[serde(skip)]
    pub handle: FuncHandle,
}

//! Opaque function handles.
//!
//! A [`FuncHandle`] names one entry of a [`Registry`](crate::Registry). It is a
//! plain `Copy` value made of the entry's arena index and a validity tag. The
//! tag mixes the owning registry's identity into the index, so a handle coming
//! from another registry, or forged from raw parts, is rejected with
//! [`Error::InvalidHandle`](crate::Error::InvalidHandle) instead of resolving to
//! an unrelated entry.

use std::sync::atomic::{AtomicU32, Ordering};

/// Tag marker mixed into every function handle.
const FUNC_DEF_MAGIC: u64 = 0xA202_B202_0000_0000;

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque, validated reference to one registered function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncHandle {
    index: u32,
    tag: u64,
}

impl FuncHandle {
    /// Rebuilds a handle from its raw parts.
    ///
    /// Used by callers that persisted a handle as plain integers. Nothing is
    /// checked here; every registry operation validates the tag.
    #[must_use]
    pub const fn from_raw(index: u32, tag: u64) -> Self {
        Self { index, tag }
    }

    /// Arena index of the entry.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Validity tag.
    #[must_use]
    pub const fn tag(self) -> u64 {
        self.tag
    }

    pub(crate) const fn new(registry_id: u32, index: u32) -> Self {
        Self {
            index,
            tag: entry_tag(registry_id, index),
        }
    }
}

/// Tag an entry at `index` of registry `registry_id` carries.
pub(crate) const fn entry_tag(registry_id: u32, index: u32) -> u64 {
    FUNC_DEF_MAGIC ^ (((registry_id as u64) << 32) | index as u64)
}

/// Hands out a fresh registry identity.
pub(crate) fn next_registry_id() -> u32 {
    NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)
}

//! Introspection string tables.
//!
//! Group and function name listings built on demand. Each table is tagged
//! with the kind of listing it holds and must be released through the
//! matching call; releasing it through the other call, or twice, fails with
//! [`Error::InvalidObject`].
//!
//! ```
//! use ta_abstract::tables::{func_table_free, group_table_free};
//! use ta_abstract::Registry;
//!
//! let registry = Registry::global();
//! let mut groups = registry.group_table().unwrap();
//! assert_eq!(groups.get(2), Some("Overlap Studies"));
//!
//! let mut funcs = registry.func_table("Statistic Functions").unwrap();
//! assert!(funcs.iter().any(|name| name == "CORREL"));
//!
//! assert!(func_table_free(Some(&mut groups)).is_err());
//! group_table_free(Some(&mut groups)).unwrap();
//! func_table_free(Some(&mut funcs)).unwrap();
//! ```

use crate::error::{Error, Result};
use crate::registry::Registry;

const GROUP_TABLE_MAGIC: u32 = 0xA201_B201;
const FUNC_TABLE_MAGIC: u32 = 0xA202_B202;
const FREED_MAGIC: u32 = 0;

/// A read-only list of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    magic: u32,
    strings: Vec<&'static str>,
}

impl StringTable {
    fn build<I>(magic: u32, names: I, what: &'static str) -> Result<Self>
    where
        I: ExactSizeIterator<Item = &'static str>,
    {
        let mut strings = Vec::new();
        strings
            .try_reserve_exact(names.len())
            .map_err(|_| Error::AllocationError { what })?;
        strings.extend(names);
        Ok(Self { magic, strings })
    }

    /// Number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` for an empty or released table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Name at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'static str> {
        self.strings.get(index).copied()
    }

    /// Iterates over the names.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strings.iter().copied()
    }

    /// The names as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[&'static str] {
        &self.strings
    }

    fn free(&mut self, magic: u32, what: &'static str) -> Result<()> {
        if self.magic != magic {
            return Err(Error::InvalidObject { what });
        }
        self.magic = FREED_MAGIC;
        self.strings = Vec::new();
        Ok(())
    }
}

impl Registry {
    /// Table of every group name, in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationError`] if the table cannot be allocated.
    pub fn group_table(&self) -> Result<StringTable> {
        StringTable::build(GROUP_TABLE_MAGIC, self.groups().into_iter(), "group table")
    }

    /// Table of the function names in `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] for an unknown group and
    /// [`Error::AllocationError`] if the table cannot be allocated.
    pub fn func_table(&self, group: &str) -> Result<StringTable> {
        let names = self.functions_in_group(group)?;
        StringTable::build(FUNC_TABLE_MAGIC, names.into_iter(), "function table")
    }
}

/// Releases a table built by [`Registry::group_table`].
///
/// Passing `None` is a no-op.
///
/// # Errors
///
/// Returns [`Error::InvalidObject`] for a function table or a table that was
/// already released.
pub fn group_table_free(table: Option<&mut StringTable>) -> Result<()> {
    table.map_or(Ok(()), |table| table.free(GROUP_TABLE_MAGIC, "not a live group table"))
}

/// Releases a table built by [`Registry::func_table`].
///
/// Passing `None` is a no-op.
///
/// # Errors
///
/// Returns [`Error::InvalidObject`] for a group table or a table that was
/// already released.
pub fn func_table_free(table: Option<&mut StringTable>) -> Result<()> {
    table.map_or(Ok(()), |table| table.free(FUNC_TABLE_MAGIC, "not a live function table"))
}

//! Function registry.
//!
//! The registry is a read-only catalogue of [`FuncDef`] records. Entries live
//! in an arena and are indexed twice: by the lowercase first letter of their
//! name (26 buckets) and by [`FuncGroup`]. Both indexes keep registration
//! order, so enumeration is stable across runs.
//!
//! Registries are assembled with a [`RegistryBuilder`]. The built-in catalogue
//! is available process-wide through [`Registry::global`], built on first use.
//!
//! # Example
//!
//! ```
//! use ta_abstract::Registry;
//!
//! let registry = Registry::global();
//! let handle = registry.lookup("CORREL").unwrap();
//! let info = registry.info(handle).unwrap();
//! assert_eq!(info.name, "CORREL");
//! assert_eq!(info.group.name(), "Statistic Functions");
//! assert_eq!(info.nb_input, 2);
//! ```

use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::handle::{entry_tag, next_registry_id, FuncHandle};
use crate::holder::MAX_SLOTS;
use crate::meta::{
    FuncGroup, FuncInfo, InputParameterInfo, OptInputParameterInfo, OutputParameterInfo,
    GROUP_COUNT,
};
use crate::plugin::FuncDef;

/// Number of first-letter buckets.
const BUCKET_COUNT: usize = 26;

#[derive(Debug, Clone, Copy)]
struct Entry {
    tag: u64,
    def: &'static FuncDef,
}

/// Read-only catalogue of registered functions.
///
/// A registry is never mutated after [`RegistryBuilder::build`]; it is `Sync`
/// and may be queried from any number of threads.
#[derive(Debug)]
pub struct Registry {
    id: u32,
    entries: Vec<Entry>,
    buckets: [Vec<u32>; BUCKET_COUNT],
    groups: [Vec<u32>; GROUP_COUNT],
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Bucket of a name's first character, or `None` when it is not a letter.
fn bucket_of(first: char) -> Option<usize> {
    if first.is_ascii_alphabetic() {
        Some(usize::from(first.to_ascii_lowercase() as u8 - b'a'))
    } else {
        None
    }
}

impl Registry {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The process-wide registry holding the built-in catalogue.
    ///
    /// Built on first use; later calls return the same instance.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| RegistryBuilder::new().register_all(crate::functions::BUILTINS).build())
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no function is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a function up by its exact, case-sensitive name.
    ///
    /// # Errors
    ///
    /// - [`Error::FunctionNotFound`] when the name is empty, does not start
    ///   with a letter or matches no entry.
    /// - [`Error::InternalConsistency`] when a bucket refers to a malformed
    ///   entry.
    pub fn lookup(&self, name: &str) -> Result<FuncHandle> {
        let not_found = || Error::FunctionNotFound {
            name: name.to_string(),
        };
        let bucket = name.chars().next().and_then(bucket_of).ok_or_else(not_found)?;

        for &index in &self.buckets[bucket] {
            let entry = self
                .entries
                .get(index as usize)
                .ok_or(Error::internal(1, "bucket refers past the entry arena"))?;
            if entry.tag != entry_tag(self.id, index) {
                return Err(Error::internal(2, "bucket entry carries a foreign tag"));
            }
            if entry.def.name == name {
                return Ok(FuncHandle::new(self.id, index));
            }
        }
        Err(not_found())
    }

    /// Resolves a handle to its registration record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] when the handle does not belong to this
    /// registry.
    pub fn resolve(&self, handle: FuncHandle) -> Result<&'static FuncDef> {
        let index = handle.index();
        match self.entries.get(index as usize) {
            Some(entry) if entry.tag == handle.tag() && entry.tag == entry_tag(self.id, index) => {
                Ok(entry.def)
            }
            _ => Err(Error::InvalidHandle),
        }
    }

    /// Per-function information.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] for a foreign or forged handle.
    pub fn info(&self, handle: FuncHandle) -> Result<FuncInfo> {
        self.resolve(handle).map(|def| func_info(def, handle))
    }

    /// Descriptor of input slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] for a bad handle and
    /// [`Error::BadParam`] when `index` is out of range.
    pub fn input_info(&self, handle: FuncHandle, index: usize) -> Result<&'static InputParameterInfo> {
        self.resolve(handle)?
            .inputs
            .get(index)
            .ok_or(Error::bad_param("input index out of range"))
    }

    /// Descriptor of optional input slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] for a bad handle and
    /// [`Error::BadParam`] when `index` is out of range.
    pub fn opt_input_info(
        &self,
        handle: FuncHandle,
        index: usize,
    ) -> Result<&'static OptInputParameterInfo> {
        self.resolve(handle)?
            .opt_inputs
            .get(index)
            .ok_or(Error::bad_param("optional input index out of range"))
    }

    /// Descriptor of output slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] for a bad handle and
    /// [`Error::BadParam`] when `index` is out of range.
    pub fn output_info(&self, handle: FuncHandle, index: usize) -> Result<&'static OutputParameterInfo> {
        self.resolve(handle)?
            .outputs
            .get(index)
            .ok_or(Error::bad_param("output index out of range"))
    }

    /// Visits every function once, in bucket order then registration order.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&FuncInfo),
    {
        for info in self.iter() {
            visitor(&info);
        }
    }

    /// Iterates over every function in the same order as [`Registry::for_each`].
    pub fn iter(&self) -> impl Iterator<Item = FuncInfo> + '_ {
        self.buckets.iter().flatten().filter_map(move |&index| {
            let Some(entry) = self.entries.get(index as usize) else {
                warn!(registry = self.id, index, "bucket refers past the entry arena, skipped");
                return None;
            };
            Some(func_info(entry.def, FuncHandle::new(self.id, index)))
        })
    }

    /// The fixed group name list.
    #[must_use]
    pub fn groups(&self) -> [&'static str; GROUP_COUNT] {
        FuncGroup::ALL.map(FuncGroup::name)
    }

    /// Names of the functions in the group called `group`, in
    /// [`Registry::for_each`] order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] for an unknown group name.
    pub fn functions_in_group(&self, group: &str) -> Result<Vec<&'static str>> {
        let group = FuncGroup::from_name(group).ok_or_else(|| Error::GroupNotFound {
            group: group.to_string(),
        })?;
        Ok(self
            .iter()
            .filter(|info| info.group == group)
            .map(|info| info.name)
            .collect())
    }

    /// Names of the functions in `group`, in registration order.
    pub fn functions_in(&self, group: FuncGroup) -> impl Iterator<Item = &'static str> + '_ {
        self.groups[group.index()]
            .iter()
            .filter_map(|&index| self.entries.get(index as usize))
            .map(|entry| entry.def.name)
    }
}

fn func_info(def: &'static FuncDef, handle: FuncHandle) -> FuncInfo {
    FuncInfo {
        name: def.name,
        group: def.group,
        hint: def.hint,
        camel_case_name: def.camel_case_name,
        flags: def.flags,
        nb_input: def.inputs.len(),
        nb_opt_input: def.opt_inputs.len(),
        nb_output: def.outputs.len(),
        handle,
    }
}

/// Assembles a [`Registry`].
///
/// ```
/// use ta_abstract::functions::statistic::CORREL;
/// use ta_abstract::Registry;
///
/// let registry = Registry::builder().register(&CORREL).unwrap().build();
/// assert_eq!(registry.len(), 1);
/// assert!(Registry::builder()
///     .register(&CORREL)
///     .unwrap()
///     .register(&CORREL)
///     .is_err());
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: Vec<&'static FuncDef>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one registration record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadParam`] when the name is empty, does not start with
    /// an ASCII letter, is already registered, or when a slot list exceeds the
    /// holder's bitmap capacity.
    pub fn register(mut self, def: &'static FuncDef) -> Result<Self> {
        if let Err(err) = self.check(def) {
            warn!(function = def.name, error = %err, "registration rejected");
            return Err(err);
        }
        self.defs.push(def);
        Ok(self)
    }

    /// Adds every record that passes validation, logging the rejected ones.
    #[must_use]
    pub fn register_all(mut self, defs: &[&'static FuncDef]) -> Self {
        for &def in defs {
            match self.check(def) {
                Ok(()) => self.defs.push(def),
                Err(err) => warn!(function = def.name, error = %err, "registration rejected"),
            }
        }
        self
    }

    fn check(&self, def: &FuncDef) -> Result<()> {
        match def.name.chars().next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            Some(_) => return Err(Error::bad_param("function name must start with a letter")),
            None => return Err(Error::bad_param("function name is empty")),
        }
        if self.defs.iter().any(|known| known.name == def.name) {
            return Err(Error::bad_param("function name already registered"));
        }
        if def.inputs.len() > MAX_SLOTS || def.outputs.len() > MAX_SLOTS {
            return Err(Error::bad_param("slot count exceeds the bitmap capacity"));
        }
        Ok(())
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        self.build_with_id(next_registry_id())
    }

    pub(crate) fn build_with_id(self, id: u32) -> Registry {
        let mut entries = Vec::with_capacity(self.defs.len());
        let mut buckets: [Vec<u32>; BUCKET_COUNT] = Default::default();
        let mut groups: [Vec<u32>; GROUP_COUNT] = Default::default();

        for def in self.defs {
            // Names were checked on registration.
            let Some(bucket) = def.name.chars().next().and_then(bucket_of) else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation)]
            let index = entries.len() as u32;
            entries.push(Entry {
                tag: entry_tag(id, index),
                def,
            });
            buckets[bucket].push(index);
            groups[def.group.index()].push(index);
        }

        debug!(registry = id, functions = entries.len(), "registry built");
        Registry {
            id,
            entries,
            buckets,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{math_operators, overlap, statistic};

    fn small() -> Registry {
        Registry::builder()
            .register(&statistic::CORREL)
            .unwrap()
            .register(&overlap::SMA)
            .unwrap()
            .register(&math_operators::ADD)
            .unwrap()
            .register(&statistic::STDDEV)
            .unwrap()
            .build()
    }

    #[test]
    fn test_lookup_exact_name() {
        let registry = small();
        let handle = registry.lookup("SMA").unwrap();
        assert_eq!(registry.info(handle).unwrap().name, "SMA");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = small();
        assert!(matches!(
            registry.lookup("sma"),
            Err(Error::FunctionNotFound { .. })
        ));
    }

    #[test]
    fn test_lookup_empty_and_non_letter() {
        let registry = small();
        assert_eq!(
            registry.lookup(""),
            Err(Error::FunctionNotFound {
                name: String::new()
            })
        );
        assert!(matches!(
            registry.lookup("1SMA"),
            Err(Error::FunctionNotFound { .. })
        ));
        assert!(matches!(
            registry.lookup("_"),
            Err(Error::FunctionNotFound { .. })
        ));
    }

    #[test]
    fn test_iter_skips_index_past_arena() {
        let mut registry = small();
        registry.buckets[0].push(99);
        let names: Vec<_> = registry.iter().map(|info| info.name).collect();
        assert_eq!(names, vec!["ADD", "CORREL", "SMA", "STDDEV"]);
        assert!(registry.lookup("ABS").unwrap_err().is_defect());
    }

    #[test]
    fn test_for_each_order_is_bucket_then_registration() {
        let registry = small();
        let mut names = Vec::new();
        registry.for_each(|info| names.push(info.name));
        assert_eq!(names, vec!["ADD", "CORREL", "SMA", "STDDEV"]);
    }

    #[test]
    fn test_functions_in_group() {
        let registry = small();
        assert_eq!(
            registry.functions_in_group("Statistic Functions").unwrap(),
            vec!["CORREL", "STDDEV"]
        );
        assert!(registry
            .functions_in_group("Cycle Indicators")
            .unwrap()
            .is_empty());
        assert!(matches!(
            registry.functions_in_group("Nope"),
            Err(Error::GroupNotFound { .. })
        ));
    }

    #[test]
    fn test_functions_in_keeps_registration_order() {
        let registry = small();
        let names: Vec<_> = registry.functions_in(FuncGroup::StatisticFunctions).collect();
        assert_eq!(names, vec!["CORREL", "STDDEV"]);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let a = small();
        let b = small();
        let handle = a.lookup("SMA").unwrap();
        assert_eq!(b.info(handle), Err(Error::InvalidHandle));
        let forged = FuncHandle::from_raw(handle.index(), handle.tag() ^ 1);
        assert_eq!(a.info(forged), Err(Error::InvalidHandle));
        let past_end = FuncHandle::from_raw(99, handle.tag());
        assert_eq!(a.info(past_end), Err(Error::InvalidHandle));
    }

    #[test]
    fn test_slot_info_bounds() {
        let registry = small();
        let handle = registry.lookup("CORREL").unwrap();
        assert_eq!(registry.input_info(handle, 1).unwrap().param_name, "inReal1");
        assert!(matches!(
            registry.input_info(handle, 2),
            Err(Error::BadParam { .. })
        ));
        assert_eq!(
            registry.opt_input_info(handle, 0).unwrap().param_name,
            "optInTimePeriod"
        );
        assert!(registry.opt_input_info(handle, 1).is_err());
        assert_eq!(registry.output_info(handle, 0).unwrap().param_name, "outReal");
        assert!(registry.output_info(handle, 1).is_err());
    }

    #[test]
    fn test_builder_rejects_duplicates_and_bad_names() {
        let bad_name: &'static FuncDef = Box::leak(Box::new(FuncDef {
            name: "9LIVES",
            ..statistic::CORREL
        }));
        let empty_name: &'static FuncDef = Box::leak(Box::new(FuncDef {
            name: "",
            ..statistic::CORREL
        }));
        let builder = Registry::builder().register(&statistic::CORREL).unwrap();
        assert!(matches!(
            builder.register(&statistic::CORREL),
            Err(Error::BadParam { .. })
        ));
        assert!(Registry::builder().register(bad_name).is_err());
        assert!(Registry::builder().register(empty_name).is_err());
    }

    #[test]
    fn test_register_all_skips_rejected() {
        let registry = Registry::builder()
            .register_all(&[&overlap::SMA, &overlap::SMA, &overlap::EMA])
            .build();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_global_is_shared_and_complete() {
        let first = Registry::global();
        let second = Registry::global();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.len(), crate::functions::BUILTINS.len());
    }

    #[test]
    fn test_groups_fixed_list() {
        let groups = small().groups();
        assert_eq!(groups[0], "Math Operators");
        assert_eq!(groups[9], "Price Transform");
    }
}

//! Serializable description of the whole catalogue.
//!
//! [`Registry::describe`] flattens every registration record into plain data
//! for documentation generators and UI pickers. The CLI renders it as JSON.

use serde::Serialize;

use crate::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OptInputParameterInfo, OutputParameterInfo,
};
use crate::plugin::FuncDef;
use crate::registry::Registry;

/// Full description of one registered function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDescription {
    /// Function name, e.g. `BBANDS`.
    pub name: &'static str,
    /// Group the function belongs to.
    pub group: FuncGroup,
    /// Display name of the group.
    pub group_name: &'static str,
    /// One-line description.
    pub hint: &'static str,
    /// Mixed-case name.
    pub camel_case_name: &'static str,
    /// Function-level flags.
    pub flags: FuncFlags,
    /// Required inputs, in slot order.
    pub inputs: &'static [InputParameterInfo],
    /// Optional inputs, in slot order.
    pub opt_inputs: &'static [OptInputParameterInfo],
    /// Outputs, in slot order.
    pub outputs: &'static [OutputParameterInfo],
}

impl FunctionDescription {
    fn of(def: &'static FuncDef) -> Self {
        Self {
            name: def.name,
            group: def.group,
            group_name: def.group.name(),
            hint: def.hint,
            camel_case_name: def.camel_case_name,
            flags: def.flags,
            inputs: def.inputs,
            opt_inputs: def.opt_inputs,
            outputs: def.outputs,
        }
    }
}

impl Registry {
    /// Describes every registered function, in [`Registry::for_each`] order.
    #[must_use]
    pub fn describe(&self) -> Vec<FunctionDescription> {
        let mut out = Vec::with_capacity(self.len());
        for info in self.iter() {
            let Ok(def) = self.resolve(info.handle) else {
                continue;
            };
            out.push(FunctionDescription::of(def));
        }
        out
    }

    /// Describes the function called `name`.
    ///
    /// # Errors
    ///
    /// Returns the lookup errors of [`Registry::lookup`].
    pub fn describe_function(&self, name: &str) -> crate::Result<FunctionDescription> {
        let handle = self.lookup(name)?;
        let def = self.resolve(handle)?;
        Ok(FunctionDescription::of(def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_follows_iteration_order() {
        let registry = Registry::global();
        let names: Vec<_> = registry.describe().iter().map(|d| d.name).collect();
        let iterated: Vec<_> = registry.iter().map(|i| i.name).collect();
        assert_eq!(names, iterated);
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn test_describe_function_slots() {
        let bbands = Registry::global().describe_function("BBANDS").unwrap();
        assert_eq!(bbands.group, FuncGroup::OverlapStudies);
        assert_eq!(bbands.group_name, "Overlap Studies");
        assert_eq!(bbands.opt_inputs.len(), 4);
        assert_eq!(bbands.outputs[0].param_name, "outRealUpperBand");
    }
}

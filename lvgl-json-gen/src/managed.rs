//! Init-function detection: finds `lv_<x>_init(lv_<x>_t *)` initializers
//! that can be wrapped into allocate-and-register creators.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::model::FunctionRecord;

/// An init function paired with the type it initializes in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedType {
    pub init_fn: String,
    /// The managed C type, e.g. `lv_style_t`.
    pub type_name: String,
}

impl ManagedType {
    /// Name of the generated creator, e.g. `lv_style_create_managed`.
    pub fn creator_name(&self) -> String {
        let stem = self
            .type_name
            .strip_suffix("_t")
            .unwrap_or(&self.type_name);
        format!("{stem}_create_managed")
    }
}

/// The type `f` initializes, if `f` has the init shape: name ends in
/// `_init`, returns `void`, and takes a single `lv_<x>_t *` where the name
/// starts with `lv_<x>`.
pub fn init_subject(f: &FunctionRecord) -> Option<&str> {
    if !f.name.ends_with("_init") || !f.ret.is_void() || f.args.len() != 1 {
        return None;
    }
    let arg = &f.args[0];
    if arg.pointer_level != 1 || arg.is_array {
        return None;
    }
    let x = arg.base.strip_prefix("lv_")?.strip_suffix("_t")?;
    if x.is_empty() || !f.name.starts_with(&format!("lv_{x}")) {
        return None;
    }
    Some(&arg.base)
}

/// Scan the exported functions for init functions, one per managed type.
pub fn detect_managed(functions: &[FunctionRecord]) -> Vec<ManagedType> {
    let mut found = Vec::new();
    let mut claimed = HashSet::new();
    for f in functions {
        let Some(type_name) = init_subject(f) else {
            continue;
        };
        if !claimed.insert(type_name.to_string()) {
            warn!(
                name = %f.name,
                managed_type = type_name,
                "type already has an init function, skipping"
            );
            continue;
        }
        debug!(name = %f.name, managed_type = type_name, "detected init function");
        found.push(ManagedType {
            init_fn: f.name.clone(),
            type_name: type_name.to_string(),
        });
    }
    info!(count = found.len(), "init function detection complete");
    found
}

//! Type resolution: nested type records → `(base, pointer_level, is_array)`.
//!
//! Resolution never fails. Records that cannot be named degrade to an
//! `unknown*` base, which the export step treats as a reason to drop the
//! function.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::trace;

use crate::model::*;

/// Base name used before any record has named the type.
pub const UNKNOWN_BASE: &str = "unknown";

/// Resolve a type record against the typedef table.
///
/// Each typedef name is followed at most once per call, so cyclic typedefs
/// stop at the typedef that closes the cycle.
pub fn resolve_type(record: &TypeRecord, typedefs: &TypedefTable) -> ResolvedType {
    let mut visited = HashSet::new();
    let mut resolved = walk(record, typedefs, &mut visited);

    // A bare name that is itself a typedef gets one more pass through its
    // definition.
    if !visited.contains(&resolved.base)
        && let Some(target) = typedefs.get(&resolved.base)
    {
        trace!(name = %resolved.base, "re-entering resolver through typedef");
        visited.insert(resolved.base.clone());
        let inner = walk(target, typedefs, &mut visited);
        resolved = ResolvedType {
            base: inner.base,
            pointer_level: resolved.pointer_level + inner.pointer_level,
            is_array: resolved.is_array || inner.is_array,
        };
    }

    if let Some(stripped) = resolved.base.strip_prefix('_') {
        resolved.base = if stripped.is_empty() {
            UNKNOWN_BASE.to_string()
        } else {
            stripped.to_string()
        };
    }
    resolved
}

fn walk<'a>(
    record: &'a TypeRecord,
    typedefs: &'a TypedefTable,
    visited: &mut HashSet<String>,
) -> ResolvedType {
    let mut pointer_level = 0;
    let mut is_array = false;
    let mut current = record;

    let base = loop {
        match current.kind {
            Some(TypeKind::Pointer) => {
                pointer_level += 1;
                match current.inner.as_deref() {
                    Some(inner) => current = inner,
                    None => break unknown("pointer"),
                }
            }
            Some(TypeKind::Array) => {
                pointer_level += 1;
                is_array = true;
                break name_or_unknown(current, "array");
            }
            Some(TypeKind::RetType) => match current.inner.as_deref() {
                Some(inner) => current = inner,
                None => break unknown("ret_type"),
            },
            Some(TypeKind::Typedef) => {
                let Some(name) = current.name.as_deref().filter(|n| !n.is_empty()) else {
                    break unknown("typedef");
                };
                if !visited.insert(name.to_string()) {
                    trace!(typedef = name, "typedef cycle, stopping");
                    break name.to_string();
                }
                match typedefs.get(name).or(current.inner.as_deref()) {
                    Some(target) => current = target,
                    None => break name.to_string(),
                }
            }
            Some(TypeKind::FunctionPointer) => {
                // Callbacks travel as opaque pointers.
                pointer_level += 1;
                break "void".to_string();
            }
            Some(kind) if kind.is_leaf() => break name_or_unknown(current, kind.as_str()),
            _ => match current.inner.as_deref() {
                Some(inner) => current = inner,
                None => break name_or_unknown(current, UNKNOWN_BASE),
            },
        }
    };

    ResolvedType {
        base,
        pointer_level,
        is_array,
    }
}

/// The struct or union record `record` names by value, following typedefs.
///
/// Returns `None` for pointers, arrays, scalars, and cyclic typedefs.
pub fn by_value_aggregate<'a>(
    record: &'a TypeRecord,
    typedefs: &'a TypedefTable,
) -> Option<&'a TypeRecord> {
    let mut visited = HashSet::new();
    let mut current = record;
    loop {
        match current.kind {
            Some(TypeKind::Struct | TypeKind::Union) => return Some(current),
            Some(TypeKind::Typedef | TypeKind::LvglType) => {
                let name = current.name.as_deref()?;
                if !visited.insert(name) {
                    return None;
                }
                current = typedefs.get(name).or(current.inner.as_deref())?;
            }
            Some(TypeKind::RetType | TypeKind::Other) | None => {
                current = current.inner.as_deref()?;
            }
            _ => return None,
        }
    }
}

fn name_or_unknown(record: &TypeRecord, kind: &str) -> String {
    match record.name.as_deref() {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => unknown(kind),
    }
}

fn unknown(kind: &str) -> String {
    if kind == UNKNOWN_BASE {
        UNKNOWN_BASE.to_string()
    } else {
        format!("{UNKNOWN_BASE}_{kind}")
    }
}

/// Resolve a function's return and argument types into an exported record.
///
/// A lone `void` argument is normalized away. Fails when a type is missing
/// or resolves to an `unknown*` base.
pub fn resolve_function(decl: &FunctionDecl, typedefs: &TypedefTable) -> Result<FunctionRecord> {
    let ret_record = decl
        .return_type
        .as_ref()
        .context("function has no return type")?;
    let ret = resolve_type(ret_record, typedefs);
    if ret.is_unknown() {
        anyhow::bail!("return type resolved to `{}`", ret.base);
    }

    let mut args = Vec::with_capacity(decl.args.len());
    for (i, arg) in decl.args.iter().enumerate() {
        if arg.is_ellipsis() {
            continue;
        }
        let label = arg.name.clone().unwrap_or_else(|| format!("arg{i}"));
        let record = arg
            .ty
            .as_ref()
            .with_context(|| format!("argument `{label}` has no type"))?;
        let ty = resolve_type(record, typedefs);
        if ty.is_unknown() {
            anyhow::bail!("argument `{label}` resolved to `{}`", ty.base);
        }
        args.push(ty);
    }
    if args.len() == 1 && args[0].is_void() {
        args.clear();
    }

    Ok(FunctionRecord {
        name: decl.name.clone(),
        ret,
        args,
        is_variadic: decl.is_variadic(),
        decl: decl.clone(),
    })
}

//! Loading: API description JSON → [`ApiModel`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info, trace};

use crate::model::*;

/// Load the API description at `path`, logging the cause on failure.
///
/// Returns `None` for a missing file, malformed JSON, or a document whose
/// root is not an object. Partial models are never returned.
pub fn load_api(path: &Path) -> Option<ApiModel> {
    match read_api(path) {
        Ok(model) => Some(model),
        Err(e) => {
            error!(path = %path.display(), err = format!("{e:#}"), "failed to load API description");
            None
        }
    }
}

/// Read and parse the API description at `path`.
pub fn read_api(path: &Path) -> Result<ApiModel> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read API description {}", path.display()))?;
    let model = parse_api(&content)
        .with_context(|| format!("failed to parse API description {}", path.display()))?;
    info!(
        path = %path.display(),
        functions = model.functions.len(),
        enums = model.enums.len(),
        typedefs = model.typedefs.len(),
        structures = model.structures.len(),
        variables = model.variables.len(),
        "loaded API description"
    );
    Ok(model)
}

/// Parse an API description from a JSON string.
pub fn parse_api(content: &str) -> Result<ApiModel> {
    let raw: serde_json::Value = serde_json::from_str(content).context("malformed JSON")?;
    if !raw.is_object() {
        anyhow::bail!("root of the API description must be an object");
    }
    let desc = ApiDescription::deserialize(&raw).context("unexpected document shape")?;

    // First definition of a typedef name wins.
    let mut typedefs = TypedefTable::new();
    for td in desc.typedefs {
        if td.name.is_empty() {
            continue;
        }
        let Some(target) = td.ty else {
            trace!(name = %td.name, "typedef without target");
            continue;
        };
        typedefs.entry(td.name).or_insert(target);
    }

    Ok(ApiModel {
        functions: desc.functions,
        enums: desc.enums,
        typedefs,
        structures: desc.structures,
        variables: desc.variables,
        raw,
    })
}

//! lvgl-json-gen: LVGL API description → JSON interpreter in C.
//!
//! Reads the machine-readable LVGL API description, selects the functions
//! and enums worth driving from JSON, groups functions into shared call
//! signatures, and emits a self-contained C translation unit with an
//! object registry, managed creators, and signature-keyed dispatch tables.
//!
//! # Quick start
//!
//! Generate the C source from a config (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads config TOML, loads the API description, writes the .c file.
//! lvgl_json_gen::run(Path::new("lvgl-json-gen.toml"), None).unwrap();
//! ```
//!
//! Or get the generated text without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let generated = lvgl_json_gen::generate(Path::new("lvgl-json-gen.toml")).unwrap();
//! println!("{}", generated.source);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub mod config;
pub mod emit;
pub mod filter;
pub mod load;
pub mod managed;
pub mod model;
pub mod resolve;
pub mod signature;

use managed::ManagedType;
use model::{ApiModel, EnumRecord, FunctionRecord};
use signature::{SigTerm, Signature};

/// Everything the emitter needs: the exported surface and how it is
/// dispatched.
#[derive(Debug, Default)]
pub struct GenerationPlan {
    pub functions: Vec<FunctionRecord>,
    pub enums: Vec<EnumRecord>,
    /// Distinct dispatchable signatures, in first-seen order.
    pub signatures: Vec<Signature>,
    /// Callable entries (exported functions and managed creators).
    pub dispatch: Vec<DispatchEntry>,
    /// Exported functions with no dispatch arm.
    pub undispatched: Vec<String>,
    pub managed: Vec<ManagedType>,
}

/// A callable name bound to an index into [`GenerationPlan::signatures`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub name: String,
    pub signature: usize,
}

impl GenerationPlan {
    pub fn function(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// The dispatch signature of a callable name.
    pub fn signature_of(&self, name: &str) -> Option<&Signature> {
        self.dispatch
            .iter()
            .find(|d| d.name == name)
            .map(|d| &self.signatures[d.signature])
    }
}

/// Run the full pipeline: load config, load the API description, emit C,
/// and write the output file(s).
///
/// `config_path` is the path to a `lvgl-json-gen.toml` configuration file.
/// `output` optionally overrides the output file path from the config.
///
/// Returns the path the `.c` file was written to.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    write_outputs(&cfg, base_dir, output)
}

/// Generate from an already-loaded config and write the results.
///
/// Relative paths in `cfg` are resolved against `base_dir`.
pub fn write_outputs(cfg: &config::Config, base_dir: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let generated = generate_from_config(cfg, base_dir)?;

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => config::resolve_path(&cfg.output.file, base_dir),
    };
    std::fs::write(&output_path, &generated.source)
        .with_context(|| format!("writing output to {}", output_path.display()))?;
    info!(
        path = %output_path.display(),
        size = generated.source.len(),
        "wrote C source"
    );

    if let (Some(header), Some(header_path)) = (&generated.header, &cfg.output.header) {
        let header_path = config::resolve_path(header_path, base_dir);
        std::fs::write(&header_path, header)
            .with_context(|| format!("writing header to {}", header_path.display()))?;
        info!(path = %header_path.display(), size = header.len(), "wrote C header");
    }

    Ok(output_path)
}

/// Generated C text.
#[derive(Debug)]
pub struct Generated {
    pub source: String,
    /// Present when `[output].header` is configured.
    pub header: Option<String>,
    pub plan: GenerationPlan,
}

/// Parse a `lvgl-json-gen.toml` config file, load the referenced API
/// description, and return the generated C without writing to disk.
pub fn generate(config_path: &Path) -> Result<Generated> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Generate C from an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which paths in the config are
/// resolved (typically the parent directory of the TOML file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<Generated> {
    cfg.validate()?;
    let api_path = cfg
        .api_path(base_dir)
        .context("no API description configured (set [input].api or pass --api)")?;

    let model = load::load_api(&api_path).with_context(|| {
        format!(
            "could not load API description from {}",
            api_path.display()
        )
    })?;

    let plan = build_plan(&model, cfg);
    let opts = emit::EmitOptions::from_config(cfg);

    let mut source = Vec::new();
    emit::emit_source(&mut source, &plan, &opts).context("emitting C source")?;
    let source = String::from_utf8(source).context("generated source is not UTF-8")?;

    let header = match &opts.header {
        Some(_) => {
            let mut header = Vec::new();
            emit::emit_header(&mut header, &plan, &opts).context("emitting C header")?;
            Some(String::from_utf8(header).context("generated header is not UTF-8")?)
        }
        None => None,
    };

    Ok(Generated {
        source,
        header,
        plan,
    })
}

/// Filter, resolve, classify and detect: everything between loading the
/// API description and emitting C.
pub fn build_plan(model: &ApiModel, cfg: &config::Config) -> GenerationPlan {
    let functions = filter::select_functions(model, &cfg.function_rules());
    let enums = filter::select_enums(model, &cfg.enum_rules());
    let mut managed = managed::detect_managed(&functions);
    // A creator must not redefine a function the library already declares.
    managed.retain(|m| {
        let name = m.creator_name();
        let taken = model.functions.iter().any(|f| f.name == name);
        if taken {
            warn!(name = %name, "creator name collides with a declared function, skipping creator");
        }
        !taken
    });
    let classifier = signature::Classifier::new(model);

    let mut signatures = Vec::new();
    let mut index = HashMap::new();
    let mut dispatch = Vec::new();
    let mut undispatched = Vec::new();

    for f in &functions {
        let sig = classifier.classify(f);
        if !sig.is_dispatchable() {
            debug!(name = %f.name, signature = %sig, "no dispatch arm for signature");
            undispatched.push(f.name.clone());
            continue;
        }
        let signature = intern_signature(&mut signatures, &mut index, sig);
        dispatch.push(DispatchEntry {
            name: f.name.clone(),
            signature,
        });
    }

    // Managed creators are callable from JSON like any other function.
    for m in &managed {
        let name = m.creator_name();
        let sig = Signature::Computed(vec![
            SigTerm::StructPtr(m.type_name.clone()),
            SigTerm::ConstStr,
        ]);
        let signature = intern_signature(&mut signatures, &mut index, sig);
        dispatch.push(DispatchEntry { name, signature });
    }

    info!(
        functions = functions.len(),
        enums = enums.len(),
        signatures = signatures.len(),
        dispatch = dispatch.len(),
        undispatched = undispatched.len(),
        managed = managed.len(),
        "generation plan ready"
    );

    GenerationPlan {
        functions,
        enums,
        signatures,
        dispatch,
        undispatched,
        managed,
    }
}

fn intern_signature(
    signatures: &mut Vec<Signature>,
    index: &mut HashMap<Signature, usize>,
    sig: Signature,
) -> usize {
    if let Some(&i) = index.get(&sig) {
        return i;
    }
    let i = signatures.len();
    index.insert(sig.clone(), i);
    signatures.push(sig);
    i
}

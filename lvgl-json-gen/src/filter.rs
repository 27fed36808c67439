//! Filtering: decides which functions and enums make up the exported surface.

use std::collections::HashSet;

use tracing::{debug, error, info, trace, warn};

use crate::model::*;
use crate::resolve;

/// Ordered include/exclude rules for one entity class.
///
/// Precedence: explicit include name, explicit exclude name, exclude
/// prefix, include prefix. Anything left over is excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRules {
    pub names_in: Vec<String>,
    pub names_out: Vec<String>,
    pub prefixes_out: Vec<String>,
    pub prefixes_in: Vec<String>,
}

/// Subsystems the interpreter has no business driving from JSON.
const DEFAULT_FUNCTION_PREFIXES_OUT: &[&str] = &[
    "_lv_",
    "lv_anim_",
    "lv_timer_",
    "lv_indev_",
    "lv_display_",
    "lv_disp_",
    "lv_draw_",
    "lv_layer_",
    "lv_refr_",
    "lv_theme_",
    "lv_font_",
    "lv_image_decoder_",
    "lv_img_decoder_",
    "lv_image_cache_",
    "lv_image_header_cache_",
    "lv_cache_",
    "lv_obj_id_",
    "lv_log",
    "lv_mem_",
    "lv_malloc",
    "lv_calloc",
    "lv_realloc",
    "lv_free",
    "lv_fs_",
    "lv_tick_",
    "lv_thread_",
    "lv_mutex_",
    "lv_sem_",
    "lv_os_",
    "lv_async_",
    "lv_rb_",
    "lv_ll_",
    "lv_array_",
    "lv_circle_buf_",
    "lv_iter_",
    "lv_lru_",
    "lv_profiler_",
    "lv_sysmon_",
    "lv_tlsf_",
    "lv_snapshot_",
    "lv_init",
    "lv_deinit",
    "lv_is_initialized",
];

const DEFAULT_FUNCTION_PREFIXES_IN: &[&str] = &["lv_obj_set_", "lv_style_set_", "lv_"];

const DEFAULT_ENUM_PREFIXES_OUT: &[&str] = &["_LV_"];
const DEFAULT_ENUM_PREFIXES_IN: &[&str] = &["LV_"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl FilterRules {
    /// Built-in rules for functions.
    pub fn default_functions() -> Self {
        FilterRules {
            names_in: Vec::new(),
            names_out: Vec::new(),
            prefixes_out: owned(DEFAULT_FUNCTION_PREFIXES_OUT),
            prefixes_in: owned(DEFAULT_FUNCTION_PREFIXES_IN),
        }
    }

    /// Built-in rules for enumerations.
    pub fn default_enums() -> Self {
        FilterRules {
            names_in: Vec::new(),
            names_out: Vec::new(),
            prefixes_out: owned(DEFAULT_ENUM_PREFIXES_OUT),
            prefixes_in: owned(DEFAULT_ENUM_PREFIXES_IN),
        }
    }

    pub fn should_include(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if self.names_in.iter().any(|n| n == name) {
            return true;
        }
        if self.names_out.iter().any(|n| n == name) {
            return false;
        }
        if self.prefixes_out.iter().any(|p| name.starts_with(p.as_str())) {
            return false;
        }
        self.prefixes_in.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// Select the exported functions and resolve their types.
///
/// Variadic functions are dropped with a warning; functions whose types
/// cannot be resolved are dropped with an error. Later declarations that
/// repeat an earlier name are ignored.
pub fn select_functions(model: &ApiModel, rules: &FilterRules) -> Vec<FunctionRecord> {
    let mut selected = Vec::new();
    let mut seen = HashSet::new();
    for decl in &model.functions {
        if !rules.should_include(&decl.name) {
            trace!(name = %decl.name, "function filtered out");
            continue;
        }
        if !seen.insert(decl.name.as_str()) {
            trace!(name = %decl.name, "skipping duplicate function");
            continue;
        }
        if decl.is_variadic() {
            warn!(name = %decl.name, "skipping variadic function");
            continue;
        }
        match resolve::resolve_function(decl, &model.typedefs) {
            Ok(f) => {
                debug!(name = %f.name, args = f.args.len(), ret = %f.ret, "exported function");
                selected.push(f);
            }
            Err(e) => error!(name = %decl.name, err = format!("{e:#}"), "dropping function"),
        }
    }
    info!(
        exported = selected.len(),
        declared = model.functions.len(),
        "function selection complete"
    );
    selected
}

/// Select the exported enumerations and parse their member values.
pub fn select_enums(model: &ApiModel, rules: &FilterRules) -> Vec<EnumRecord> {
    let mut selected = Vec::new();
    for decl in &model.enums {
        let key = decl.filter_key();
        if !rules.should_include(key) {
            trace!(enum_key = key, "enum filtered out");
            continue;
        }
        let record = decl.to_record();
        debug!(enum_key = key, members = record.members.len(), "exported enum");
        selected.push(record);
    }
    info!(
        exported = selected.len(),
        declared = model.enums.len(),
        "enum selection complete"
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(names_in: &[&str], names_out: &[&str], out: &[&str], inc: &[&str]) -> FilterRules {
        FilterRules {
            names_in: owned(names_in),
            names_out: owned(names_out),
            prefixes_out: owned(out),
            prefixes_in: owned(inc),
        }
    }

    #[test]
    fn explicit_include_beats_exclude_prefix() {
        let r = rules(&["lv_x"], &[], &["lv_x"], &["lv_"]);
        assert!(r.should_include("lv_x"));
        assert!(!r.should_include("lv_xy"));
        assert!(r.should_include("lv_y"));
    }

    #[test]
    fn explicit_exclude_beats_include_prefix() {
        let r = rules(&[], &["lv_obj_del"], &[], &["lv_"]);
        assert!(!r.should_include("lv_obj_del"));
        assert!(r.should_include("lv_obj_delete"));
    }

    #[test]
    fn explicit_include_beats_explicit_exclude() {
        let r = rules(&["lv_a"], &["lv_a"], &[], &[]);
        assert!(r.should_include("lv_a"));
    }

    #[test]
    fn unmatched_and_empty_names_are_excluded() {
        let r = rules(&[""], &[], &[], &[""]);
        assert!(!r.should_include(""));
        let r = rules(&[], &[], &[], &["lv_"]);
        assert!(!r.should_include("gui_thing"));
    }

    #[test]
    fn default_function_rules() {
        let r = FilterRules::default_functions();
        assert!(r.should_include("lv_obj_set_width"));
        assert!(r.should_include("lv_label_create"));
        assert!(r.should_include("lv_style_init"));
        assert!(!r.should_include("lv_anim_init"));
        assert!(!r.should_include("lv_timer_create"));
        assert!(!r.should_include("lv_display_get_default"));
        assert!(!r.should_include("_lv_obj_private"));
        assert!(!r.should_include("memcpy"));
    }

    #[test]
    fn default_enum_rules() {
        let r = FilterRules::default_enums();
        assert!(r.should_include("LV_ALIGN_CENTER"));
        assert!(!r.should_include("_LV_STR_SYMBOL"));
        assert!(!r.should_include("lv_align_t"));
    }
}

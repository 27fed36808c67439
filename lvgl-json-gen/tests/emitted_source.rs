//! Generated C text for the sample API description.

use std::path::Path;
use std::sync::LazyLock;

use lvgl_json_gen::Generated;

static BASIC: LazyLock<Generated> = LazyLock::new(|| {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/basic.toml");
    lvgl_json_gen::generate(&path).expect("generate from basic.toml")
});

static HASH_MAP: LazyLock<Generated> = LazyLock::new(|| {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/hash_map.toml");
    lvgl_json_gen::generate(&path).expect("generate from hash_map.toml")
});

/// Names in the function table, in table order.
fn table_names(source: &str) -> Vec<&str> {
    let start = source
        .find("lvgl_json_function_table[] = {")
        .expect("function table present");
    let end = start + source[start..].find("};").expect("function table closed");
    source[start..end]
        .lines()
        .filter_map(|l| l.trim().strip_prefix("{ \""))
        .filter_map(|l| l.split('"').next())
        .collect()
}

#[test]
fn sections_appear_in_dependency_order() {
    let src = &BASIC.source;
    let order = [
        "#include \"lvgl.h\"",
        "} lvgl_json_value_t;",
        "#define LVGL_JSON_LOG_ERROR",
        "void lvgl_json_register_ptr(const char *name, void *ptr)",
        "lv_style_t *lv_style_create_managed(const char *name)",
        "lvgl_json_enum_table[] = {",
        "bool lvgl_json_lookup_enum(",
        "static inline void *lvgl_json_to_pointer(",
        "static bool lvgl_json_invoke_widget_create(",
        "lvgl_json_function_table[] = {",
        "bool lvgl_json_call(",
    ];
    let mut last = 0;
    for needle in order {
        let pos = src
            .find(needle)
            .unwrap_or_else(|| panic!("missing `{needle}`"));
        assert!(pos >= last, "`{needle}` out of order");
        last = pos;
    }
}

#[test]
fn function_table_is_sorted_and_complete() {
    let names = table_names(&BASIC.source);
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert_eq!(names.len(), BASIC.plan.dispatch.len());
    assert!(names.contains(&"lv_style_create_managed"));
    assert!(!names.contains(&"lv_color_to_32"));
}

#[test]
fn one_invoker_per_signature() {
    let src = &BASIC.source;
    let invokers = src.matches("static bool lvgl_json_invoke_").count();
    assert_eq!(invokers, BASIC.plan.signatures.len());
    assert_eq!(src.matches("lvgl_json_invoke_widget_create(void *fn").count(), 1);
}

#[test]
fn invokers_convert_each_term() {
    let src = &BASIC.source;
    assert!(src.contains("/* void (lv_obj_t *, FLOAT, FLOAT) */"));
    assert!(src.contains("lvgl_json_to_float(&args[1]), lvgl_json_to_float(&args[2])"));
    assert!(src.contains("lvgl_json_to_color(&args[1]), lvgl_json_to_int32(&args[2])"));
    assert!(src.contains("lvgl_json_to_string(&args[1])"));
    assert!(src.contains("ret->kind = LVGL_JSON_VALUE_BOOL;"));
    assert!(src.contains("typedef lv_obj_t * (*lvgl_json_fn_t)(void);"));
    assert!(src.contains("typedef void (*lvgl_json_fn_t)(void *, int32_t, size_t);"));
    assert!(src.contains("(size_t)lvgl_json_to_int64(&args[2])"));
    assert!(src.contains(
        "typedef lv_event_dsc_t * (*lvgl_json_fn_t)(lv_obj_t *, void *, int32_t, void *);"
    ));
}

#[test]
fn enum_table_lists_selected_members() {
    let src = &BASIC.source;
    assert!(src.contains("{ \"LV_ALIGN_CENTER\", 9 },"));
    assert!(src.contains("{ \"LV_STATE_ANY\", 65535 },"));
    assert!(src.contains("{ \"LV_PART_NEGATIVE\", -2 },"));
    assert!(!src.contains("LV_STATE_BOGUS"));
    assert!(!src.contains("_LV_STYLE_STATE_CMP_SAME"));
    assert!(src.contains("static const size_t lvgl_json_enum_count = 12;"));
}

#[test]
fn static_registry_uses_configured_capacity() {
    let src = &BASIC.source;
    assert!(src.contains("#define LVGL_JSON_REGISTRY_CAPACITY 64"));
    assert!(src.contains("static-array (capacity 64)"));
    assert!(!src.contains("LVGL_JSON_REGISTRY_BUCKETS"));
    assert!(BASIC.header.is_none());
}

#[test]
fn hash_map_registry_with_header() {
    let src = &HASH_MAP.source;
    assert!(src.contains("#define LVGL_JSON_REGISTRY_BUCKETS 256"));
    assert!(src.contains("LVGL_JSON_FREE(node->name);"));
    assert!(src.contains("#include \"lvgl_json_gen.h\""));
    assert!(!src.contains("} lvgl_json_value_t;"));

    let header = HASH_MAP.header.as_deref().expect("header configured");
    assert!(header.contains("#ifndef LVGL_JSON_GEN_H"));
    assert!(header.contains("} lvgl_json_value_t;"));
    assert!(header.contains("lv_anim_t *lv_anim_create_managed(const char *name);"));
    assert!(header.contains("void *lvgl_json_lookup_ptr(const char *name);"));
}

#[test]
fn generation_is_deterministic() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/basic.toml");
    let again = lvgl_json_gen::generate(&path).unwrap();
    assert_eq!(again.source, BASIC.source);
}

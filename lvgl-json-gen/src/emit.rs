//! Emitter: generation plan → C translation unit (and optional header).
//!
//! Output order: banner, includes, shared types, runtime macros, registry,
//! managed creators, enum table, value coercions, invokers, function table,
//! call entry point. Every definition precedes its first use, so the source
//! needs no forward declarations.

use std::io::{self, Write};

use tracing::debug;

use crate::GenerationPlan;
use crate::config::{Config, RegistryVariant};
use crate::managed::ManagedType;
use crate::model::EnumRecord;
use crate::signature::{SigTerm, Signature};

/// Knobs that shape the generated C.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Library header to `#include`.
    pub include: String,
    pub registry: RegistryVariant,
    /// Static-array registry capacity.
    pub capacity: usize,
    /// File name of the companion header, when one is generated.
    pub header: Option<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            include: "lvgl.h".to_string(),
            registry: RegistryVariant::StaticArray,
            capacity: 100,
            header: None,
        }
    }
}

impl EmitOptions {
    pub fn from_config(cfg: &Config) -> Self {
        EmitOptions {
            include: cfg.output.include.clone(),
            registry: cfg.registry.variant,
            capacity: cfg.registry.capacity,
            header: cfg
                .output
                .header
                .as_deref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
        }
    }
}

/// Emit the C translation unit.
pub fn emit_source<W: Write>(
    out: &mut W,
    plan: &GenerationPlan,
    opts: &EmitOptions,
) -> io::Result<()> {
    emit_banner(out, plan, opts)?;
    emit_includes(out, opts)?;
    match &opts.header {
        Some(header) => writeln!(out, "#include \"{header}\"\n")?,
        None => out.write_all(SHARED_TYPES.as_bytes())?,
    }
    out.write_all(RUNTIME_MACROS.as_bytes())?;
    emit_registry(out, opts)?;
    emit_creators(out, &plan.managed)?;
    emit_enum_table(out, &plan.enums)?;
    out.write_all(VALUE_COERCIONS.as_bytes())?;
    emit_invokers(out, &plan.signatures)?;
    emit_function_table(out, plan)?;
    out.write_all(CALL_ENTRY.as_bytes())?;
    Ok(())
}

/// Emit the companion header: shared types and external declarations.
pub fn emit_header<W: Write>(
    out: &mut W,
    plan: &GenerationPlan,
    opts: &EmitOptions,
) -> io::Result<()> {
    let guard = include_guard(opts.header.as_deref().unwrap_or("lvgl_json_gen.h"));
    writeln!(out, "/* Generated by lvgl-json-gen. Do not edit. */")?;
    writeln!(out, "#ifndef {guard}")?;
    writeln!(out, "#define {guard}\n")?;
    emit_includes(out, opts)?;
    writeln!(out, "#ifdef __cplusplus\nextern \"C\" {{\n#endif\n")?;
    out.write_all(SHARED_TYPES.as_bytes())?;
    out.write_all(PUBLIC_PROTOTYPES.as_bytes())?;
    for m in &plan.managed {
        writeln!(out, "{} *{}(const char *name);", m.type_name, m.creator_name())?;
    }
    writeln!(out, "\n#ifdef __cplusplus\n}}\n#endif\n")?;
    writeln!(out, "#endif /* {guard} */")?;
    Ok(())
}

fn include_guard(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

fn emit_banner<W: Write>(out: &mut W, plan: &GenerationPlan, opts: &EmitOptions) -> io::Result<()> {
    let members: usize = plan.enums.iter().map(|e| e.members.len()).sum();
    let registry = match opts.registry {
        RegistryVariant::StaticArray => format!("static-array (capacity {})", opts.capacity),
        RegistryVariant::HashMap => "hash-map".to_string(),
    };
    writeln!(out, "/*")?;
    writeln!(out, " * Generated by lvgl-json-gen. Do not edit.")?;
    writeln!(out, " *")?;
    writeln!(out, " *   exported functions:  {}", plan.functions.len())?;
    writeln!(out, " *   dispatch entries:    {}", plan.dispatch.len())?;
    writeln!(out, " *   call signatures:     {}", plan.signatures.len())?;
    writeln!(out, " *   enums:               {} ({members} members)", plan.enums.len())?;
    writeln!(out, " *   managed creators:    {}", plan.managed.len())?;
    writeln!(out, " *   registry:            {registry}")?;
    writeln!(out, " */\n")?;
    Ok(())
}

fn emit_includes<W: Write>(out: &mut W, opts: &EmitOptions) -> io::Result<()> {
    writeln!(out, "#include <stdbool.h>")?;
    writeln!(out, "#include <stddef.h>")?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out, "#include <stdlib.h>")?;
    writeln!(out, "#include <string.h>\n")?;
    writeln!(out, "#include \"{}\"\n", opts.include)?;
    Ok(())
}

const SHARED_TYPES: &str = r#"typedef enum {
    LVGL_JSON_VALUE_NONE = 0,
    LVGL_JSON_VALUE_INT,
    LVGL_JSON_VALUE_INT64,
    LVGL_JSON_VALUE_FLOAT,
    LVGL_JSON_VALUE_DOUBLE,
    LVGL_JSON_VALUE_BOOL,
    LVGL_JSON_VALUE_COLOR,
    LVGL_JSON_VALUE_STRING,
    LVGL_JSON_VALUE_POINTER
} lvgl_json_value_kind_t;

/* A JSON value normalized for a C call. */
typedef struct {
    lvgl_json_value_kind_t kind;
    union {
        int32_t i;
        int64_t i64;
        float f;
        double d;
        bool b;
        lv_color_t color;
        const char *s;
        void *p;
    } as;
} lvgl_json_value_t;

typedef bool (*lvgl_json_invoker_t)(void *fn, const lvgl_json_value_t *args, size_t argc,
                                    lvgl_json_value_t *ret);

typedef struct {
    const char *name;
    void *fn;
    lvgl_json_invoker_t invoke;
    size_t argc;
} lvgl_json_function_t;

typedef struct {
    const char *name;
    int32_t value;
} lvgl_json_enum_entry_t;

"#;

const PUBLIC_PROTOTYPES: &str = r#"void lvgl_json_register_ptr(const char *name, void *ptr);
void *lvgl_json_lookup_ptr(const char *name);
void lvgl_json_clear_registry(void);
bool lvgl_json_lookup_enum(const char *name, int32_t *out);
const lvgl_json_function_t *lvgl_json_find_function(const char *name);
bool lvgl_json_call(const char *name, const lvgl_json_value_t *args, size_t argc,
                    lvgl_json_value_t *ret);
"#;

const RUNTIME_MACROS: &str = r#"#ifndef LVGL_JSON_LOG_ERROR
#define LVGL_JSON_LOG_ERROR(...) LV_LOG_ERROR(__VA_ARGS__)
#endif
#ifndef LVGL_JSON_LOG_WARN
#define LVGL_JSON_LOG_WARN(...) LV_LOG_WARN(__VA_ARGS__)
#endif
#ifndef LVGL_JSON_LOG_INFO
#define LVGL_JSON_LOG_INFO(...) LV_LOG_INFO(__VA_ARGS__)
#endif
#ifndef LVGL_JSON_MALLOC
#define LVGL_JSON_MALLOC(size) lv_malloc(size)
#endif
#ifndef LVGL_JSON_FREE
#define LVGL_JSON_FREE(ptr) lv_free(ptr)
#endif

"#;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

fn emit_registry<W: Write>(out: &mut W, opts: &EmitOptions) -> io::Result<()> {
    match opts.registry {
        RegistryVariant::StaticArray => {
            writeln!(out, "/* Registry: static array, names borrowed from the caller. */")?;
            writeln!(out, "#ifndef LVGL_JSON_REGISTRY_CAPACITY")?;
            writeln!(out, "#define LVGL_JSON_REGISTRY_CAPACITY {}", opts.capacity)?;
            writeln!(out, "#endif\n")?;
            out.write_all(STATIC_REGISTRY.as_bytes())?;
        }
        RegistryVariant::HashMap => {
            writeln!(out, "/* Registry: chained hash map, names owned by the registry. */")?;
            out.write_all(HASH_REGISTRY.as_bytes())?;
        }
    }
    debug!(variant = ?opts.registry, "emitted registry");
    Ok(())
}

const STATIC_REGISTRY: &str = r#"typedef struct {
    const char *name;
    void *ptr;
} lvgl_json_registry_entry_t;

static lvgl_json_registry_entry_t lvgl_json_registry[LVGL_JSON_REGISTRY_CAPACITY];
static size_t lvgl_json_registry_count = 0;

void lvgl_json_register_ptr(const char *name, void *ptr)
{
    if (name == NULL || ptr == NULL) {
        return;
    }
    for (size_t i = 0; i < lvgl_json_registry_count; i++) {
        if (strcmp(lvgl_json_registry[i].name, name) == 0) {
            LVGL_JSON_LOG_WARN("registry: id '%s' already registered, updating pointer", name);
            lvgl_json_registry[i].ptr = ptr;
            return;
        }
    }
    if (lvgl_json_registry_count >= LVGL_JSON_REGISTRY_CAPACITY) {
        LVGL_JSON_LOG_ERROR("registry: full (capacity %d), cannot register id '%s'",
                            (int)LVGL_JSON_REGISTRY_CAPACITY, name);
        return;
    }
    lvgl_json_registry[lvgl_json_registry_count].name = name;
    lvgl_json_registry[lvgl_json_registry_count].ptr = ptr;
    lvgl_json_registry_count++;
    LVGL_JSON_LOG_INFO("registry: registered id '%s'", name);
}

void *lvgl_json_lookup_ptr(const char *name)
{
    if (name == NULL) {
        return NULL;
    }
    for (size_t i = 0; i < lvgl_json_registry_count; i++) {
        if (strcmp(lvgl_json_registry[i].name, name) == 0) {
            return lvgl_json_registry[i].ptr;
        }
    }
    return NULL;
}

void lvgl_json_clear_registry(void)
{
    for (size_t i = 0; i < lvgl_json_registry_count; i++) {
        lvgl_json_registry[i].name = NULL;
        lvgl_json_registry[i].ptr = NULL;
    }
    lvgl_json_registry_count = 0;
}

"#;

const HASH_REGISTRY: &str = r#"#define LVGL_JSON_REGISTRY_BUCKETS 256

typedef struct lvgl_json_registry_node {
    char *name;
    void *ptr;
    struct lvgl_json_registry_node *next;
} lvgl_json_registry_node_t;

static lvgl_json_registry_node_t *lvgl_json_registry[LVGL_JSON_REGISTRY_BUCKETS];

/* djb2 */
static uint32_t lvgl_json_registry_hash(const char *str)
{
    uint32_t hash = 5381;
    unsigned char c;
    while ((c = (unsigned char)*str++) != 0) {
        hash = ((hash << 5) + hash) + c;
    }
    return hash % LVGL_JSON_REGISTRY_BUCKETS;
}

static char *lvgl_json_strdup(const char *str)
{
    size_t len = strlen(str) + 1;
    char *copy = (char *)LVGL_JSON_MALLOC(len);
    if (copy != NULL) {
        memcpy(copy, str, len);
    }
    return copy;
}

void lvgl_json_register_ptr(const char *name, void *ptr)
{
    if (name == NULL || ptr == NULL) {
        return;
    }
    uint32_t bucket = lvgl_json_registry_hash(name);
    for (lvgl_json_registry_node_t *node = lvgl_json_registry[bucket]; node != NULL;
         node = node->next) {
        if (strcmp(node->name, name) == 0) {
            LVGL_JSON_LOG_WARN("registry: id '%s' already registered, updating pointer", name);
            node->ptr = ptr;
            return;
        }
    }
    lvgl_json_registry_node_t *node =
        (lvgl_json_registry_node_t *)LVGL_JSON_MALLOC(sizeof(lvgl_json_registry_node_t));
    if (node == NULL) {
        LVGL_JSON_LOG_ERROR("registry: out of memory, cannot register id '%s'", name);
        return;
    }
    node->name = lvgl_json_strdup(name);
    if (node->name == NULL) {
        LVGL_JSON_FREE(node);
        LVGL_JSON_LOG_ERROR("registry: out of memory, cannot register id '%s'", name);
        return;
    }
    node->ptr = ptr;
    node->next = lvgl_json_registry[bucket];
    lvgl_json_registry[bucket] = node;
    LVGL_JSON_LOG_INFO("registry: registered id '%s'", name);
}

void *lvgl_json_lookup_ptr(const char *name)
{
    if (name == NULL) {
        return NULL;
    }
    uint32_t bucket = lvgl_json_registry_hash(name);
    for (lvgl_json_registry_node_t *node = lvgl_json_registry[bucket]; node != NULL;
         node = node->next) {
        if (strcmp(node->name, name) == 0) {
            return node->ptr;
        }
    }
    return NULL;
}

void lvgl_json_clear_registry(void)
{
    for (size_t i = 0; i < LVGL_JSON_REGISTRY_BUCKETS; i++) {
        lvgl_json_registry_node_t *node = lvgl_json_registry[i];
        while (node != NULL) {
            lvgl_json_registry_node_t *next = node->next;
            LVGL_JSON_FREE(node->name);
            LVGL_JSON_FREE(node);
            node = next;
        }
        lvgl_json_registry[i] = NULL;
    }
}

"#;

// ---------------------------------------------------------------------------
// Managed creators
// ---------------------------------------------------------------------------

fn emit_creators<W: Write>(out: &mut W, managed: &[ManagedType]) -> io::Result<()> {
    if managed.is_empty() {
        return Ok(());
    }
    writeln!(out, "/* Managed creators: allocate, initialize, register. */\n")?;
    for m in managed {
        emit_creator(out, m)?;
    }
    Ok(())
}

fn emit_creator<W: Write>(out: &mut W, m: &ManagedType) -> io::Result<()> {
    let ty = &m.type_name;
    let creator = m.creator_name();
    writeln!(out, "{ty} *{creator}(const char *name)")?;
    writeln!(out, "{{")?;
    writeln!(out, "    if (name == NULL) {{")?;
    writeln!(out, "        LVGL_JSON_LOG_ERROR(\"{creator}: name is NULL\");")?;
    writeln!(out, "        return NULL;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    {ty} *obj = ({ty} *)LVGL_JSON_MALLOC(sizeof({ty}));")?;
    writeln!(out, "    if (obj == NULL) {{")?;
    writeln!(
        out,
        "        LVGL_JSON_LOG_ERROR(\"{creator}: out of memory for id '%s'\", name);"
    )?;
    writeln!(out, "        return NULL;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    {}(obj);", m.init_fn)?;
    writeln!(out, "    lvgl_json_register_ptr(name, obj);")?;
    writeln!(out, "    return obj;")?;
    writeln!(out, "}}\n")?;
    debug!(creator = %creator, init = %m.init_fn, "emitted managed creator");
    Ok(())
}

// ---------------------------------------------------------------------------
// Enum table
// ---------------------------------------------------------------------------

fn emit_enum_table<W: Write>(out: &mut W, enums: &[EnumRecord]) -> io::Result<()> {
    let count: usize = enums.iter().map(|e| e.members.len()).sum();
    writeln!(out, "/* Enum members, for enum names given as strings. */")?;
    writeln!(
        out,
        "static const lvgl_json_enum_entry_t lvgl_json_enum_table[] = {{"
    )?;
    for e in enums {
        if let Some(type_name) = &e.type_name {
            writeln!(out, "    /* {type_name} */")?;
        }
        for m in &e.members {
            writeln!(out, "    {{ \"{}\", {} }},", m.name, c_int32_literal(m.value))?;
        }
    }
    if count == 0 {
        writeln!(out, "    {{ NULL, 0 }},")?;
    }
    writeln!(out, "}};")?;
    writeln!(out, "static const size_t lvgl_json_enum_count = {count};\n")?;
    out.write_all(ENUM_LOOKUP.as_bytes())?;
    Ok(())
}

/// Enum values are stored as `int32_t`; wider values keep their low 32 bits.
fn c_int32_literal(value: i64) -> String {
    let v = value as i32;
    if v as i64 != value {
        debug!(value = value, truncated = v, "enum value does not fit int32_t");
    }
    if v == i32::MIN {
        "(-2147483647 - 1)".to_string()
    } else {
        v.to_string()
    }
}

const ENUM_LOOKUP: &str = r#"bool lvgl_json_lookup_enum(const char *name, int32_t *out)
{
    if (name == NULL) {
        return false;
    }
    for (size_t i = 0; i < lvgl_json_enum_count; i++) {
        if (strcmp(lvgl_json_enum_table[i].name, name) == 0) {
            if (out != NULL) {
                *out = lvgl_json_enum_table[i].value;
            }
            return true;
        }
    }
    return false;
}

"#;

// ---------------------------------------------------------------------------
// Value coercions
// ---------------------------------------------------------------------------

const VALUE_COERCIONS: &str = r#"static inline int64_t lvgl_json_to_int64(const lvgl_json_value_t *v)
{
    switch (v->kind) {
    case LVGL_JSON_VALUE_INT:
        return v->as.i;
    case LVGL_JSON_VALUE_INT64:
        return v->as.i64;
    case LVGL_JSON_VALUE_FLOAT:
        return (int64_t)v->as.f;
    case LVGL_JSON_VALUE_DOUBLE:
        return (int64_t)v->as.d;
    case LVGL_JSON_VALUE_BOOL:
        return v->as.b ? 1 : 0;
    case LVGL_JSON_VALUE_STRING: {
        int32_t value = 0;
        if (lvgl_json_lookup_enum(v->as.s, &value)) {
            return value;
        }
        LVGL_JSON_LOG_WARN("unknown enum name '%s', using 0", v->as.s != NULL ? v->as.s : "(null)");
        return 0;
    }
    default:
        return 0;
    }
}

static inline int32_t lvgl_json_to_int32(const lvgl_json_value_t *v)
{
    return (int32_t)lvgl_json_to_int64(v);
}

static inline double lvgl_json_to_double(const lvgl_json_value_t *v)
{
    switch (v->kind) {
    case LVGL_JSON_VALUE_FLOAT:
        return v->as.f;
    case LVGL_JSON_VALUE_DOUBLE:
        return v->as.d;
    default:
        return (double)lvgl_json_to_int64(v);
    }
}

static inline float lvgl_json_to_float(const lvgl_json_value_t *v)
{
    return (float)lvgl_json_to_double(v);
}

static inline bool lvgl_json_to_bool(const lvgl_json_value_t *v)
{
    switch (v->kind) {
    case LVGL_JSON_VALUE_BOOL:
        return v->as.b;
    case LVGL_JSON_VALUE_INT:
        return v->as.i != 0;
    case LVGL_JSON_VALUE_INT64:
        return v->as.i64 != 0;
    default:
        return false;
    }
}

static inline lv_color_t lvgl_json_to_color(const lvgl_json_value_t *v)
{
    switch (v->kind) {
    case LVGL_JSON_VALUE_COLOR:
        return v->as.color;
    case LVGL_JSON_VALUE_INT:
        return lv_color_hex((uint32_t)v->as.i);
    case LVGL_JSON_VALUE_INT64:
        return lv_color_hex((uint32_t)v->as.i64);
    case LVGL_JSON_VALUE_STRING:
        if (v->as.s != NULL) {
            const char *hex = v->as.s[0] == '#' ? v->as.s + 1 : v->as.s;
            return lv_color_hex((uint32_t)strtoul(hex, NULL, 16));
        }
        return lv_color_hex(0);
    default:
        return lv_color_hex(0);
    }
}

static inline const char *lvgl_json_to_string(const lvgl_json_value_t *v)
{
    return v->kind == LVGL_JSON_VALUE_STRING ? v->as.s : NULL;
}

/* Pointers may be given directly or as a registered id. */
static inline void *lvgl_json_to_pointer(const lvgl_json_value_t *v)
{
    switch (v->kind) {
    case LVGL_JSON_VALUE_POINTER:
        return v->as.p;
    case LVGL_JSON_VALUE_STRING: {
        void *ptr = lvgl_json_lookup_ptr(v->as.s);
        if (ptr == NULL) {
            LVGL_JSON_LOG_WARN("no object registered as '%s'", v->as.s != NULL ? v->as.s : "(null)");
        }
        return ptr;
    }
    default:
        return NULL;
    }
}

"#;

// ---------------------------------------------------------------------------
// Invokers
// ---------------------------------------------------------------------------

/// Name of the invoker for the signature at `index`.
pub fn invoker_name(index: usize, sig: &Signature) -> String {
    match sig {
        Signature::WidgetCreate => "lvgl_json_invoke_widget_create".to_string(),
        Signature::Computed(_) => format!("lvgl_json_invoke_{index}"),
    }
}

fn emit_invokers<W: Write>(out: &mut W, signatures: &[Signature]) -> io::Result<()> {
    writeln!(out, "/* Invokers, one per call signature. */\n")?;
    for (i, sig) in signatures.iter().enumerate() {
        emit_invoker(out, &invoker_name(i, sig), sig)?;
    }
    Ok(())
}

fn emit_invoker<W: Write>(out: &mut W, name: &str, sig: &Signature) -> io::Result<()> {
    let obj = SigTerm::StructPtr("lv_obj_t".to_string());
    let (ret, args) = match sig {
        Signature::WidgetCreate => (&obj, std::slice::from_ref(&obj)),
        Signature::Computed(terms) => match terms.split_first() {
            Some(split) => split,
            None => return Ok(()),
        },
    };

    let ret_c = c_type(ret);
    let params = if args.is_empty() {
        "void".to_string()
    } else {
        args.iter().map(c_type).collect::<Vec<_>>().join(", ")
    };
    let call_args = args
        .iter()
        .enumerate()
        .map(|(i, t)| unpack_arg(t, i))
        .collect::<Vec<_>>()
        .join(", ");

    writeln!(out, "/* {sig} */")?;
    writeln!(
        out,
        "static bool {name}(void *fn, const lvgl_json_value_t *args, size_t argc, lvgl_json_value_t *ret)"
    )?;
    writeln!(out, "{{")?;
    writeln!(out, "    typedef {ret_c} (*lvgl_json_fn_t)({params});")?;
    writeln!(out, "    if (argc != {}) {{", args.len())?;
    writeln!(out, "        return false;")?;
    writeln!(out, "    }}")?;
    if args.is_empty() {
        writeln!(out, "    (void)args;")?;
    } else {
        writeln!(out, "    if (args == NULL) {{")?;
        writeln!(out, "        return false;")?;
        writeln!(out, "    }}")?;
    }
    match result_slot(ret) {
        None => {
            writeln!(out, "    ((lvgl_json_fn_t)fn)({call_args});")?;
            writeln!(out, "    if (ret != NULL) {{")?;
            writeln!(out, "        ret->kind = LVGL_JSON_VALUE_NONE;")?;
            writeln!(out, "    }}")?;
        }
        Some((kind, field, store)) => {
            writeln!(out, "    {} result = ((lvgl_json_fn_t)fn)({call_args});", ret_c.trim_end())?;
            writeln!(out, "    if (ret != NULL) {{")?;
            writeln!(out, "        ret->kind = LVGL_JSON_VALUE_{kind};")?;
            writeln!(out, "        ret->as.{field} = {store};")?;
            writeln!(out, "    }}")?;
        }
    }
    writeln!(out, "    return true;")?;
    writeln!(out, "}}\n")?;
    Ok(())
}

fn c_type(term: &SigTerm) -> String {
    term.c_type().unwrap_or_else(|| "void *".to_string())
}

/// Expression converting `args[i]` to the C type of `term`.
fn unpack_arg(term: &SigTerm, i: usize) -> String {
    let v = format!("&args[{i}]");
    match term {
        SigTerm::Int => format!("lvgl_json_to_int32({v})"),
        SigTerm::Int64 => format!("lvgl_json_to_int64({v})"),
        SigTerm::Float => format!("lvgl_json_to_float({v})"),
        SigTerm::Double => format!("lvgl_json_to_double({v})"),
        SigTerm::Bool => format!("lvgl_json_to_bool({v})"),
        SigTerm::Color => format!("lvgl_json_to_color({v})"),
        SigTerm::ConstStr => format!("lvgl_json_to_string({v})"),
        SigTerm::Native(name) => format!("({name})lvgl_json_to_int64({v})"),
        SigTerm::StructPtr(name) => format!("({name} *)lvgl_json_to_pointer({v})"),
        SigTerm::Pointer | SigTerm::Void | SigTerm::Unknown => {
            format!("lvgl_json_to_pointer({v})")
        }
    }
}

/// `(value kind, union field, stored expression)` for a return term, or
/// `None` for `void`.
fn result_slot(term: &SigTerm) -> Option<(&'static str, &'static str, &'static str)> {
    let slot = match term {
        SigTerm::Void => return None,
        SigTerm::Int => ("INT", "i", "result"),
        SigTerm::Int64 => ("INT64", "i64", "result"),
        SigTerm::Float => ("FLOAT", "f", "result"),
        SigTerm::Double => ("DOUBLE", "d", "result"),
        SigTerm::Bool => ("BOOL", "b", "result"),
        SigTerm::Color => ("COLOR", "color", "result"),
        SigTerm::ConstStr => ("STRING", "s", "result"),
        SigTerm::Native(_) => ("INT64", "i64", "(int64_t)result"),
        SigTerm::StructPtr(_) | SigTerm::Pointer | SigTerm::Unknown => {
            ("POINTER", "p", "(void *)result")
        }
    };
    Some(slot)
}

// ---------------------------------------------------------------------------
// Function table and call entry
// ---------------------------------------------------------------------------

fn emit_function_table<W: Write>(out: &mut W, plan: &GenerationPlan) -> io::Result<()> {
    // Sorted for the binary search in lvgl_json_find_function.
    let mut entries: Vec<_> = plan.dispatch.iter().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    writeln!(out, "/* Callable functions, sorted by name. */")?;
    writeln!(
        out,
        "static const lvgl_json_function_t lvgl_json_function_table[] = {{"
    )?;
    for d in &entries {
        let sig = &plan.signatures[d.signature];
        writeln!(
            out,
            "    {{ \"{name}\", (void *){name}, {invoker}, {argc} }},",
            name = d.name,
            invoker = invoker_name(d.signature, sig),
            argc = sig.arity(),
        )?;
    }
    if entries.is_empty() {
        writeln!(out, "    {{ NULL, NULL, NULL, 0 }},")?;
    }
    writeln!(out, "}};")?;
    writeln!(
        out,
        "static const size_t lvgl_json_function_count = {};\n",
        entries.len()
    )?;
    debug!(entries = entries.len(), "emitted function table");
    Ok(())
}

const CALL_ENTRY: &str = r#"const lvgl_json_function_t *lvgl_json_find_function(const char *name)
{
    if (name == NULL) {
        return NULL;
    }
    size_t lo = 0;
    size_t hi = lvgl_json_function_count;
    while (lo < hi) {
        size_t mid = lo + (hi - lo) / 2;
        int cmp = strcmp(name, lvgl_json_function_table[mid].name);
        if (cmp == 0) {
            return &lvgl_json_function_table[mid];
        }
        if (cmp < 0) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    return NULL;
}

bool lvgl_json_call(const char *name, const lvgl_json_value_t *args, size_t argc,
                    lvgl_json_value_t *ret)
{
    const lvgl_json_function_t *entry = lvgl_json_find_function(name);
    if (entry == NULL) {
        LVGL_JSON_LOG_ERROR("call: unknown function '%s'", name != NULL ? name : "(null)");
        return false;
    }
    if (argc != entry->argc) {
        LVGL_JSON_LOG_ERROR("call: '%s' expects %d argument(s), got %d", name, (int)entry->argc,
                            (int)argc);
        return false;
    }
    return entry->invoke(entry->fn, args, argc, ret);
}
"#;

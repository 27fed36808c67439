//! API model: the records read from the LVGL API description and the
//! resolved shapes the filter, classifier and emitter work on.
//!
//! The `*Decl` types mirror the JSON description one-to-one and are what the
//! loader produces. The `*Record` types are built from them once a
//! declaration has been selected for export.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use tracing::warn;

/// Typedef name → target type record. Only consulted by the resolver.
pub type TypedefTable = HashMap<String, TypeRecord>;

/// The `json_type` discriminator carried by every type record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Pointer,
    Array,
    RetType,
    Typedef,
    PrimitiveType,
    StdlibType,
    LvglType,
    Enum,
    Struct,
    Union,
    ForwardDecl,
    FunctionPointer,
    /// Any discriminator the resolver has no dedicated rule for.
    #[serde(other)]
    Other,
}

impl TypeKind {
    /// Kinds that name a type directly and end resolution.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            TypeKind::PrimitiveType
                | TypeKind::StdlibType
                | TypeKind::LvglType
                | TypeKind::Enum
                | TypeKind::Struct
                | TypeKind::Union
                | TypeKind::ForwardDecl
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Pointer => "pointer",
            TypeKind::Array => "array",
            TypeKind::RetType => "ret_type",
            TypeKind::Typedef => "typedef",
            TypeKind::PrimitiveType => "primitive_type",
            TypeKind::StdlibType => "stdlib_type",
            TypeKind::LvglType => "lvgl_type",
            TypeKind::Enum => "enum",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::ForwardDecl => "forward_decl",
            TypeKind::FunctionPointer => "function_pointer",
            TypeKind::Other => "other",
        }
    }
}

/// A (possibly nested) type record from the API description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TypeRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "json_type", default)]
    pub kind: Option<TypeKind>,
    #[serde(rename = "type", default)]
    pub inner: Option<Box<TypeRecord>>,
}

impl TypeRecord {
    /// A record that names a type directly, e.g. `primitive_type int`.
    pub fn named(kind: TypeKind, name: &str) -> Self {
        TypeRecord {
            name: Some(name.to_string()),
            kind: Some(kind),
            inner: None,
        }
    }

    /// A record wrapping `inner`, e.g. `pointer` or `ret_type`.
    pub fn wrap(kind: TypeKind, inner: TypeRecord) -> Self {
        TypeRecord {
            name: None,
            kind: Some(kind),
            inner: Some(Box::new(inner)),
        }
    }

    pub fn pointer_to(inner: TypeRecord) -> Self {
        Self::wrap(TypeKind::Pointer, inner)
    }
}

// ---------------------------------------------------------------------------
// Raw declarations
// ---------------------------------------------------------------------------

/// Root of the API description document.
#[derive(Debug, Default, Deserialize)]
pub struct ApiDescription {
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
    #[serde(default)]
    pub typedefs: Vec<TypedefDecl>,
    #[serde(default)]
    pub structures: Vec<StructDecl>,
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
}

/// A C function declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FunctionDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub return_type: Option<TypeRecord>,
    #[serde(default)]
    pub args: Vec<ArgDecl>,
}

impl FunctionDecl {
    pub fn is_variadic(&self) -> bool {
        self.args.iter().any(ArgDecl::is_ellipsis)
    }
}

/// A single function argument.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArgDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRecord>,
}

impl ArgDecl {
    /// `...` shows up as an argument named `ellipsis`, either on the
    /// argument itself or on its untyped type record.
    pub fn is_ellipsis(&self) -> bool {
        self.name.as_deref() == Some("ellipsis")
            || self
                .ty
                .as_ref()
                .is_some_and(|t| t.kind.is_none() && t.name.as_deref() == Some("ellipsis"))
    }
}

/// A C enumeration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<EnumMemberDecl>,
}

/// A single enumerator. `value` is usually a string such as `"0x1F"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumMemberDecl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// A C typedef.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypedefDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRecord>,
}

/// A C struct definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// A single struct field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRecord>,
}

/// A global variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariableDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRecord>,
}

/// The loaded API, partitioned by declaration kind.
#[derive(Debug)]
pub struct ApiModel {
    pub functions: Vec<FunctionDecl>,
    pub enums: Vec<EnumDecl>,
    pub typedefs: TypedefTable,
    pub structures: Vec<StructDecl>,
    pub variables: Vec<VariableDecl>,
    /// The whole document as read, for consumers that need fields the
    /// typed model drops.
    pub raw: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Resolved model
// ---------------------------------------------------------------------------

/// A type reduced to `(base_name, pointer_level, is_array)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    pub base: String,
    pub pointer_level: u32,
    pub is_array: bool,
}

impl ResolvedType {
    pub fn new(base: &str, pointer_level: u32, is_array: bool) -> Self {
        ResolvedType {
            base: base.to_string(),
            pointer_level,
            is_array,
        }
    }

    /// `void` by value.
    pub fn is_void(&self) -> bool {
        self.base == "void" && self.pointer_level == 0
    }

    /// The resolver degraded this type to an `unknown*` placeholder.
    pub fn is_unknown(&self) -> bool {
        self.base.starts_with("unknown")
    }

    /// A single, non-array pointer to `base`.
    pub fn is_pointer_to(&self, base: &str) -> bool {
        self.pointer_level == 1 && !self.is_array && self.base == base
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        let stars = if self.is_array {
            self.pointer_level.saturating_sub(1)
        } else {
            self.pointer_level
        };
        if stars > 0 {
            write!(f, " {}", "*".repeat(stars as usize))?;
        }
        if self.is_array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// A function selected for export, with its types resolved.
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub name: String,
    pub ret: ResolvedType,
    pub args: Vec<ResolvedType>,
    pub is_variadic: bool,
    /// The declaration this record was built from.
    pub decl: FunctionDecl,
}

/// An enumeration selected for export, with member values parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumRecord {
    pub type_name: Option<String>,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

impl EnumDecl {
    /// The name filters are applied to: the enum's own type name, or the
    /// first member's name for anonymous enums.
    pub fn filter_key(&self) -> &str {
        match self.name.as_deref() {
            Some(n) if !n.is_empty() => n,
            _ => self.members.first().map(|m| m.name.as_str()).unwrap_or(""),
        }
    }

    /// Parse member values. Members whose value cannot be parsed are dropped;
    /// the enum itself is kept.
    pub fn to_record(&self) -> EnumRecord {
        let mut members = Vec::with_capacity(self.members.len());
        for m in &self.members {
            match m.value.as_ref().and_then(parse_enum_value) {
                Some(value) => members.push(EnumMember {
                    name: m.name.clone(),
                    value,
                }),
                None => warn!(
                    enum_name = self.filter_key(),
                    member = %m.name,
                    value = ?m.value,
                    "dropping enum member with unparsable value"
                ),
            }
        }
        EnumRecord {
            type_name: self.name.clone().filter(|n| !n.is_empty()),
            members,
        }
    }
}

/// Parse an enumerator value with auto-base: a leading `0x` selects hex,
/// anything else is decimal. JSON integers are taken as-is.
pub fn parse_enum_value(raw: &serde_json::Value) -> Option<i64> {
    match raw {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => parse_int_auto(s),
        _ => None,
    }
}

fn parse_int_auto(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enum_values_use_auto_base() {
        assert_eq!(parse_enum_value(&json!("0x1F")), Some(31));
        assert_eq!(parse_enum_value(&json!("42")), Some(42));
        assert_eq!(parse_enum_value(&json!("-3")), Some(-3));
        assert_eq!(parse_enum_value(&json!(7)), Some(7));
        assert_eq!(parse_enum_value(&json!("LV_OTHER | 1")), None);
        assert_eq!(parse_enum_value(&json!(null)), None);
    }

    #[test]
    fn unparsable_members_are_dropped_but_enum_kept() {
        let decl: EnumDecl = serde_json::from_value(json!({
            "name": null,
            "members": [
                {"name": "LV_A", "value": "0x0"},
                {"name": "LV_B", "value": "oops"},
                {"name": "LV_C", "value": "2"}
            ]
        }))
        .unwrap();
        assert_eq!(decl.filter_key(), "LV_A");
        let record = decl.to_record();
        assert_eq!(record.type_name, None);
        let names: Vec<&str> = record.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["LV_A", "LV_C"]);
    }

    #[test]
    fn ellipsis_argument_marks_variadic() {
        let decl: FunctionDecl = serde_json::from_value(json!({
            "name": "lv_label_set_text_fmt",
            "args": [
                {"name": "obj", "type": {"json_type": "pointer", "type": {"json_type": "lvgl_type", "name": "lv_obj_t"}}},
                {"name": "ellipsis"}
            ]
        }))
        .unwrap();
        assert!(decl.is_variadic());
    }

    #[test]
    fn unknown_kinds_deserialize_as_other() {
        let rec: TypeRecord =
            serde_json::from_value(json!({"json_type": "special_type", "name": "x"})).unwrap();
        assert_eq!(rec.kind, Some(TypeKind::Other));
    }

    #[test]
    fn resolved_type_display() {
        assert_eq!(ResolvedType::new("lv_obj_t", 1, false).to_string(), "lv_obj_t *");
        assert_eq!(ResolvedType::new("char", 1, true).to_string(), "char[]");
        assert_eq!(ResolvedType::new("int", 0, false).to_string(), "int");
    }
}

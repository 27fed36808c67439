//! Signature classification: groups exported functions into shared
//! dispatch arms.
//!
//! Every resolved type maps to a coarse [`SigTerm`]; a function's signature
//! is its return term followed by its argument terms. Functions with equal
//! signatures are called through the same generated invoker.

use std::collections::HashSet;
use std::fmt;

use crate::model::*;
use crate::resolve;

/// One position of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SigTerm {
    Void,
    /// Integers up to 32 bits, enums, and `_t` typedefs with no special rule.
    Int,
    Int64,
    Float,
    Double,
    Bool,
    /// `lv_color_t` by value.
    Color,
    /// `char *`.
    ConstStr,
    /// Integer whose width follows the platform (`size_t`, `long`, ...),
    /// passed under its own C name.
    Native(String),
    /// A single pointer to an `lv_*_t` type.
    StructPtr(String),
    /// Any other pointer or array shape.
    Pointer,
    /// Struct or union by value and anything else the generator has no arm for.
    Unknown,
}

const INT_TYPES: &[&str] = &[
    "char",
    "signed char",
    "unsigned char",
    "short",
    "short int",
    "unsigned short",
    "unsigned short int",
    "int",
    "signed",
    "signed int",
    "unsigned",
    "unsigned int",
    "int8_t",
    "uint8_t",
    "int16_t",
    "uint16_t",
    "int32_t",
    "uint32_t",
];

const NATIVE_INT_TYPES: &[&str] = &[
    "long",
    "long int",
    "signed long",
    "unsigned long",
    "unsigned long int",
    "size_t",
    "ssize_t",
    "ptrdiff_t",
    "intptr_t",
    "uintptr_t",
];

const INT64_TYPES: &[&str] = &[
    "int64_t",
    "uint64_t",
    "long long",
    "long long int",
    "unsigned long long",
    "unsigned long long int",
];

impl SigTerm {
    /// The C type the generated invoker uses at this position, or `None`
    /// when no arm can be generated.
    pub fn c_type(&self) -> Option<String> {
        let ty = match self {
            SigTerm::Void => "void",
            SigTerm::Int => "int32_t",
            SigTerm::Int64 => "int64_t",
            SigTerm::Float => "float",
            SigTerm::Double => "double",
            SigTerm::Bool => "bool",
            SigTerm::Color => "lv_color_t",
            SigTerm::ConstStr => "const char *",
            SigTerm::Native(name) => name.as_str(),
            SigTerm::StructPtr(name) => return Some(format!("{name} *")),
            SigTerm::Pointer => "void *",
            SigTerm::Unknown => return None,
        };
        Some(ty.to_string())
    }
}

impl fmt::Display for SigTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigTerm::Void => f.write_str("void"),
            SigTerm::Int => f.write_str("INT"),
            SigTerm::Int64 => f.write_str("INT64"),
            SigTerm::Float => f.write_str("FLOAT"),
            SigTerm::Double => f.write_str("DOUBLE"),
            SigTerm::Bool => f.write_str("BOOL"),
            SigTerm::Color => f.write_str("lv_color_t"),
            SigTerm::ConstStr => f.write_str("const char *"),
            SigTerm::Native(name) => f.write_str(name),
            SigTerm::StructPtr(name) => write!(f, "{name} *"),
            SigTerm::Pointer => f.write_str("POINTER"),
            SigTerm::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A dispatch key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    /// `lv_<x>_create(lv_obj_t *parent) -> lv_<x>_t *`, whatever the widget.
    WidgetCreate,
    /// Return term followed by argument terms.
    Computed(Vec<SigTerm>),
}

impl Signature {
    /// Whether the emitter can generate an invoker for this signature.
    pub fn is_dispatchable(&self) -> bool {
        match self {
            Signature::WidgetCreate => true,
            Signature::Computed(terms) => !terms.contains(&SigTerm::Unknown),
        }
    }

    /// Number of arguments the invoker expects.
    pub fn arity(&self) -> usize {
        match self {
            Signature::WidgetCreate => 1,
            Signature::Computed(terms) => terms.len().saturating_sub(1),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::WidgetCreate => f.write_str("WIDGET_CREATE"),
            Signature::Computed(terms) => {
                let Some((ret, args)) = terms.split_first() else {
                    return f.write_str("()");
                };
                write!(f, "{ret} (")?;
                for (i, t) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Whether `f` has the widget-creation shape.
pub fn is_widget_create(f: &FunctionRecord) -> bool {
    f.name.starts_with("lv_")
        && f.name.ends_with("_create")
        && f.ret.pointer_level == 1
        && !f.ret.is_array
        && is_lv_type_name(&f.ret.base)
        && f.args.len() == 1
        && f.args[0].is_pointer_to("lv_obj_t")
}

fn is_lv_type_name(name: &str) -> bool {
    name.len() > "lv__t".len() && name.starts_with("lv_") && name.ends_with("_t")
}

/// Maps resolved types to signature terms.
///
/// Knows the struct and union names from the API description so that
/// aggregates passed by value can be told apart from integer typedefs.
#[derive(Debug, Default)]
pub struct Classifier {
    structs: HashSet<String>,
}

impl Classifier {
    /// Aggregates come from the `structures` section and from typedefs
    /// whose target is a struct or union.
    pub fn new(model: &ApiModel) -> Self {
        let declared = model.structures.iter().filter_map(|s| s.name.as_deref());
        let aliased = model.typedefs.iter().flat_map(|(name, target)| {
            let leaf = resolve::by_value_aggregate(target, &model.typedefs);
            leaf.map(|leaf| [Some(name.as_str()), leaf.name.as_deref()])
                .into_iter()
                .flatten()
                .flatten()
        });
        Self::with_structs(declared.chain(aliased))
    }

    pub fn with_structs<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let structs = names
            .into_iter()
            .map(|n| n.strip_prefix('_').unwrap_or(n).to_string())
            .collect();
        Classifier { structs }
    }

    pub fn term(&self, ty: &ResolvedType) -> SigTerm {
        if ty.is_array || ty.pointer_level > 1 {
            return SigTerm::Pointer;
        }
        let base = ty.base.as_str();
        if ty.pointer_level == 1 {
            return if base == "char" {
                SigTerm::ConstStr
            } else if is_lv_type_name(base) {
                SigTerm::StructPtr(base.to_string())
            } else {
                SigTerm::Pointer
            };
        }
        match base {
            "void" => SigTerm::Void,
            "bool" | "_Bool" => SigTerm::Bool,
            "float" => SigTerm::Float,
            "double" => SigTerm::Double,
            "lv_color_t" => SigTerm::Color,
            b if INT64_TYPES.contains(&b) => SigTerm::Int64,
            b if NATIVE_INT_TYPES.contains(&b) => SigTerm::Native(b.to_string()),
            b if INT_TYPES.contains(&b) => SigTerm::Int,
            b if self.structs.contains(b) => SigTerm::Unknown,
            b if b.ends_with("_t") => SigTerm::Int,
            _ => SigTerm::Unknown,
        }
    }

    pub fn classify(&self, f: &FunctionRecord) -> Signature {
        if is_widget_create(f) {
            return Signature::WidgetCreate;
        }
        let mut terms = Vec::with_capacity(f.args.len() + 1);
        terms.push(self.term(&f.ret));
        terms.extend(f.args.iter().map(|a| self.term(a)));
        Signature::Computed(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: &str, ret: ResolvedType, args: Vec<ResolvedType>) -> FunctionRecord {
        FunctionRecord {
            name: name.to_string(),
            ret,
            args,
            is_variadic: false,
            decl: FunctionDecl::default(),
        }
    }

    fn obj_ptr() -> ResolvedType {
        ResolvedType::new("lv_obj_t", 1, false)
    }

    #[test]
    fn widget_creators_collapse() {
        let c = Classifier::default();
        let label = func("lv_label_create", obj_ptr(), vec![obj_ptr()]);
        let btn = func("lv_btn_create", obj_ptr(), vec![obj_ptr()]);
        assert_eq!(c.classify(&label), Signature::WidgetCreate);
        assert_eq!(c.classify(&btn), Signature::WidgetCreate);
    }

    #[test]
    fn near_miss_creators_are_computed() {
        let c = Classifier::default();
        let two_args = func(
            "lv_msgbox_create",
            obj_ptr(),
            vec![obj_ptr(), ResolvedType::new("char", 1, false)],
        );
        assert!(matches!(c.classify(&two_args), Signature::Computed(_)));
        let no_lv = func("gui_create", obj_ptr(), vec![obj_ptr()]);
        assert!(matches!(c.classify(&no_lv), Signature::Computed(_)));
        let int_ret = func(
            "lv_thing_create",
            ResolvedType::new("int", 0, false),
            vec![obj_ptr()],
        );
        assert!(matches!(c.classify(&int_ret), Signature::Computed(_)));
    }

    #[test]
    fn integer_like_setters_share_a_signature() {
        let c = Classifier::default();
        let width = func(
            "lv_obj_set_width",
            ResolvedType::new("void", 0, false),
            vec![obj_ptr(), ResolvedType::new("int32_t", 0, false)],
        );
        let align = func(
            "lv_obj_set_align",
            ResolvedType::new("void", 0, false),
            vec![obj_ptr(), ResolvedType::new("lv_align_t", 0, false)],
        );
        assert_eq!(c.classify(&width), c.classify(&align));
        assert_eq!(
            c.classify(&width).to_string(),
            "void (lv_obj_t *, INT)"
        );
    }

    #[test]
    fn term_alphabet() {
        let c = Classifier::with_structs(["_lv_area_t", "lv_color_t"]);
        let t = |b: &str, p: u32, a: bool| c.term(&ResolvedType::new(b, p, a));
        assert_eq!(t("void", 0, false), SigTerm::Void);
        assert_eq!(t("bool", 0, false), SigTerm::Bool);
        assert_eq!(t("float", 0, false), SigTerm::Float);
        assert_eq!(t("double", 0, false), SigTerm::Double);
        assert_eq!(t("uint8_t", 0, false), SigTerm::Int);
        assert_eq!(t("unsigned int", 0, false), SigTerm::Int);
        assert_eq!(t("uint64_t", 0, false), SigTerm::Int64);
        for native in ["size_t", "ssize_t", "intptr_t", "uintptr_t", "long", "unsigned long"] {
            assert_eq!(t(native, 0, false), SigTerm::Native(native.into()), "{native}");
        }
        assert_eq!(
            SigTerm::Native("size_t".into()).c_type().as_deref(),
            Some("size_t")
        );
        assert_eq!(t("lv_opa_t", 0, false), SigTerm::Int);
        assert_eq!(t("lv_color_t", 0, false), SigTerm::Color);
        assert_eq!(t("lv_area_t", 0, false), SigTerm::Unknown);
        assert_eq!(t("char", 1, false), SigTerm::ConstStr);
        assert_eq!(t("char", 1, true), SigTerm::Pointer);
        assert_eq!(
            t("lv_area_t", 1, false),
            SigTerm::StructPtr("lv_area_t".into())
        );
        assert_eq!(t("void", 1, false), SigTerm::Pointer);
        assert_eq!(t("lv_obj_t", 2, false), SigTerm::Pointer);
        assert_eq!(t("mystery", 0, false), SigTerm::Unknown);
    }

    #[test]
    fn unknown_terms_are_not_dispatchable() {
        let sig = Signature::Computed(vec![SigTerm::Unknown, SigTerm::Color]);
        assert!(!sig.is_dispatchable());
        assert_eq!(sig.arity(), 1);
        assert!(Signature::WidgetCreate.is_dispatchable());
    }

    #[test]
    fn unions_by_value_have_no_arm() {
        let model = crate::load::parse_api(
            r#"{"typedefs": [
                {"name": "lv_style_t", "type": {"json_type": "struct", "name": "lv_style_t"}},
                {"name": "lv_style_value_t", "type": {"json_type": "union", "name": "lv_style_value_t"}},
                {"name": "lv_area_t", "type": {"json_type": "struct", "name": "_lv_area_t"}},
                {"name": "lv_opa_t", "type": {"json_type": "stdlib_type", "name": "uint8_t"}}
            ]}"#,
        )
        .unwrap();
        let c = Classifier::new(&model);
        let t = |b: &str| c.term(&ResolvedType::new(b, 0, false));
        assert_eq!(t("lv_style_value_t"), SigTerm::Unknown);
        assert_eq!(t("lv_area_t"), SigTerm::Unknown);
        assert_eq!(t("lv_opa_t"), SigTerm::Int);

        let set_prop = func(
            "lv_style_set_prop",
            ResolvedType::new("void", 0, false),
            vec![
                ResolvedType::new("lv_style_t", 1, false),
                ResolvedType::new("lv_style_value_t", 0, false),
            ],
        );
        assert!(!c.classify(&set_prop).is_dispatchable());
    }
}

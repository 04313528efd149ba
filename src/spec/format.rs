use indexmap::IndexMap;

use crate::ast::Pos;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::utils::join_key_path;
use crate::value::Value;

use super::{PrimitiveType, Spec, SpecFields, FORMAT_CHILDREN, FORMAT_KEY, FORMAT_REQUIRED, FORMAT_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    String,
    Number,
    Bool,
    List,
    Object,
}

impl FormatKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(FormatKind::String),
            "number" => Some(FormatKind::Number),
            "bool" => Some(FormatKind::Bool),
            "list" => Some(FormatKind::List),
            "object" => Some(FormatKind::Object),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatKind::String => "string",
            FormatKind::Number => "number",
            FormatKind::Bool => "bool",
            FormatKind::List => "list",
            FormatKind::Object => "object",
        }
    }

    pub fn is_complex(self) -> bool {
        matches!(self, FormatKind::List | FormatKind::Object)
    }

    fn primitive(self) -> Option<PrimitiveType> {
        match self {
            FormatKind::String => Some(PrimitiveType::String),
            FormatKind::Number => Some(PrimitiveType::Number),
            FormatKind::Bool => Some(PrimitiveType::Bool),
            FormatKind::List | FormatKind::Object => None,
        }
    }
}

/// Which of the two format shapes a value has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatNode<'a> {
    Constraint(&'a IndexMap<String, Value>),
    KeyVal(&'a IndexMap<String, Value>),
}

impl<'a> FormatNode<'a> {
    pub fn classify(v: &'a Value) -> Option<Self> {
        let fields = v.as_object()?;
        if fields.contains_key(FORMAT_TYPE) && fields.contains_key(FORMAT_REQUIRED) {
            Some(FormatNode::Constraint(fields))
        } else if fields.values().all(is_constraint_node) {
            Some(FormatNode::KeyVal(fields))
        } else {
            None
        }
    }
}

pub fn is_constraint_node(v: &Value) -> bool {
    matches!(FormatNode::classify(v), Some(FormatNode::Constraint(_)))
}

pub fn is_key_val_node(v: &Value) -> bool {
    matches!(FormatNode::classify(v), Some(FormatNode::KeyVal(_)))
}

/// A well-typed constraint node.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintNode {
    pub kind: FormatKind,
    pub required: bool,
    pub key: bool,
    pub children: Option<Value>,
}

impl ConstraintNode {
    pub fn new(kind: FormatKind, required: bool, children: Option<Value>) -> Self {
        Self { kind, required, key: false, children }
    }

    /// `None` unless `v` is a constraint node whose attributes all have the right kind.
    pub fn from_value(v: &Value) -> Option<Self> {
        let Some(FormatNode::Constraint(fields)) = FormatNode::classify(v) else {
            return None;
        };
        let kind = FormatKind::parse(fields.get(FORMAT_TYPE)?.as_str()?)?;
        let required = fields.get(FORMAT_REQUIRED)?.as_bool()?;
        let key = match fields.get(FORMAT_KEY) {
            Some(k) => k.as_bool()?,
            None => false,
        };
        Some(Self {
            kind,
            required,
            key,
            children: fields.get(FORMAT_CHILDREN).cloned(),
        })
    }

    pub fn to_value(&self) -> Value {
        let mut fields = IndexMap::new();
        fields.insert(FORMAT_TYPE.to_string(), Value::string(self.kind.as_str()));
        fields.insert(FORMAT_REQUIRED.to_string(), Value::Bool(self.required));
        if let Some(children) = &self.children {
            fields.insert(FORMAT_CHILDREN.to_string(), children.clone());
        }
        if self.key {
            fields.insert(FORMAT_KEY.to_string(), Value::Bool(true));
        }
        Value::Object(fields)
    }
}

const SHAPE_SUMMARY: &str = "Invalid 'format' value";

fn shape_error(diags: &mut Diagnostics, path: &str, subject: Option<&Pos>) {
    diags.push(Diagnostic::error(
        SHAPE_SUMMARY,
        format!(
            "format value at key path '{}' is invalid. Available functions: object(), list(), req(), key(). \
             Available variables: string, number, bool.",
            path
        ),
        subject,
    ));
}

/// Check that `v` is a well-formed format. Every violation in the tree is reported.
///
/// `expect_key_val` says whether `v` should be a map of fields (the root of a
/// format) or a single constraint node. `key()` markers are only accepted when
/// `is_root_format` is set, and then only on the top-level fields.
pub fn validate_format_shape(
    v: &Value,
    path: &str,
    expect_key_val: bool,
    is_root_format: bool,
    subject: Option<&Pos>,
) -> Diagnostics {
    let mut diags = Diagnostics::new();
    validate_shape_at(v, path, expect_key_val, is_root_format, 0, subject, &mut diags);
    diags
}

fn validate_shape_at(
    v: &Value,
    path: &str,
    expect_key_val: bool,
    is_root_format: bool,
    depth: usize,
    subject: Option<&Pos>,
    diags: &mut Diagnostics,
) {
    if expect_key_val {
        match v.as_object() {
            Some(fields) if !is_constraint_node(v) => {
                for (name, field) in fields {
                    let field_path = join_key_path(path, name);
                    validate_shape_at(field, &field_path, false, is_root_format, depth, subject, diags);
                }
            }
            _ => shape_error(diags, path, subject),
        }
        return;
    }

    let Some(FormatNode::Constraint(fields)) = FormatNode::classify(v) else {
        shape_error(diags, path, subject);
        return;
    };

    let kind = fields.get(FORMAT_TYPE).and_then(Value::as_str).and_then(FormatKind::parse);
    let Some(kind) = kind else {
        diags.push(Diagnostic::error(
            SHAPE_SUMMARY,
            format!("unknown type at key path '{}'. Use string, number, bool, list() or object().", path),
            subject,
        ));
        return;
    };

    if fields.get(FORMAT_REQUIRED).and_then(Value::as_bool).is_none() {
        diags.push(Diagnostic::error(
            SHAPE_SUMMARY,
            format!("'{}' at key path '{}' must be a bool", FORMAT_REQUIRED, path),
            subject,
        ));
    }

    if let Some(key) = fields.get(FORMAT_KEY) {
        if key.as_bool().is_none() {
            diags.push(Diagnostic::error(
                SHAPE_SUMMARY,
                format!("'{}' at key path '{}' must be a bool", FORMAT_KEY, path),
                subject,
            ));
        } else if !is_root_format || depth > 0 {
            diags.push(Diagnostic::error(
                SHAPE_SUMMARY,
                "cannot use key() function outside of the base level of the root schema format",
                subject,
            ));
        }
    }

    let Some(children) = fields.get(FORMAT_CHILDREN) else {
        return;
    };

    if !kind.is_complex() {
        diags.push(Diagnostic::error(
            SHAPE_SUMMARY,
            format!("{} value at key path '{}' cannot have children", kind.as_str(), path),
            subject,
        ));
        return;
    }

    match ConstraintNode::from_value(children) {
        Some(child) if child.kind.is_complex() => {
            diags.push(Diagnostic::error(
                SHAPE_SUMMARY,
                format!("object() and list() cannot be nested directly at key path '{}'", path),
                subject,
            ));
        }
        _ if kind == FormatKind::Object && is_constraint_node(children) => {
            diags.push(Diagnostic::error(
                SHAPE_SUMMARY,
                format!("object() at key path '{}' needs a map of fields", path),
                subject,
            ));
        }
        _ => {
            let expect_key_val = !is_constraint_node(children);
            validate_shape_at(children, path, expect_key_val, is_root_format, depth + 1, subject, diags);
        }
    }
}

/// Compile a format value. Any part that is not a recognized format shape makes
/// the whole compile fail.
pub fn compile_spec(v: &Value) -> Option<Spec> {
    match FormatNode::classify(v)? {
        FormatNode::KeyVal(fields) => compile_fields(fields).map(Spec::Map),
        FormatNode::Constraint(_) => {
            let node = ConstraintNode::from_value(v)?;
            if let Some(ty) = node.kind.primitive() {
                return Some(Spec::Primitive {
                    ty,
                    required: node.required,
                    is_key: node.key,
                });
            }
            match node.kind {
                FormatKind::List => {
                    let inner = compile_spec(node.children.as_ref()?)?;
                    Some(Spec::List {
                        required: node.required,
                        inner: Box::new(inner),
                    })
                }
                _ => {
                    let fields = match &node.children {
                        None => SpecFields::new(),
                        Some(children) => match compile_spec(children)? {
                            Spec::Map(fields) => fields,
                            _ => return None,
                        },
                    };
                    Some(Spec::Object {
                        required: node.required,
                        fields,
                    })
                }
            }
        }
    }
}

fn compile_fields(fields: &IndexMap<String, Value>) -> Option<SpecFields> {
    fields
        .iter()
        .map(|(name, field)| compile_spec(field).map(|spec| (name.clone(), spec)))
        .collect()
}

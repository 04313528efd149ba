// Author: Dustin Pilgrim
// License: MIT

//! Schema `format` values and their compiled [`Spec`] form.
//!
//! A format is written with the same dynamic values it later validates. Every
//! field is described by a *constraint node*, an object such as
//! `{ type = "string", required = true }`, and a plain map of field name to
//! constraint node is a *key/val node*. [`validate_format_shape`] checks that
//! a value is built from those two shapes, [`compile_spec`] turns it into a
//! [`Spec`] tree and [`validate_value_against_spec`] checks data against it.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::value::Type;

mod format;
pub mod functions;
mod validate;

pub use format::{
    compile_spec, is_constraint_node, is_key_val_node, validate_format_shape, ConstraintNode, FormatKind,
    FormatNode,
};
pub use functions::schema_eval_context;
pub use validate::validate_value_against_spec;

pub const FORMAT_TYPE: &str = "type";
pub const FORMAT_REQUIRED: &str = "required";
pub const FORMAT_CHILDREN: &str = "children";
pub const FORMAT_KEY: &str = "key";

pub type SpecFields = IndexMap<String, Spec>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Number,
    Bool,
}

impl PrimitiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::String => FormatKind::String.as_str(),
            PrimitiveType::Number => FormatKind::Number.as_str(),
            PrimitiveType::Bool => FormatKind::Bool.as_str(),
        }
    }

    pub fn ty(self) -> Type {
        match self {
            PrimitiveType::String => Type::String,
            PrimitiveType::Number => Type::Number,
            PrimitiveType::Bool => Type::Bool,
        }
    }
}

/// Compiled format.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Primitive { ty: PrimitiveType, required: bool, is_key: bool },
    /// Elements are described by `inner`, either a primitive or a map of fields.
    List { required: bool, inner: Box<Spec> },
    Object { required: bool, fields: SpecFields },
    /// Root of a format and the children of object/list nodes. Never required, never a key.
    Map(SpecFields),
}

impl Spec {
    pub fn is_required(&self) -> bool {
        match self {
            Spec::Primitive { required, .. } | Spec::List { required, .. } | Spec::Object { required, .. } => {
                *required
            }
            Spec::Map(_) => false,
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, Spec::Primitive { is_key: true, .. })
    }

    pub fn ty(&self) -> Type {
        match self {
            Spec::Primitive { ty, .. } => ty.ty(),
            Spec::List { inner, .. } => Type::list(inner.ty()),
            Spec::Object { fields, .. } | Spec::Map(fields) => {
                Type::Object(fields.iter().map(|(k, v)| (k.clone(), v.ty())).collect())
            }
        }
    }

    /// Named fields below this spec. A list exposes the fields of its elements.
    pub fn children(&self) -> Option<&SpecFields> {
        match self {
            Spec::Primitive { .. } => None,
            Spec::List { inner, .. } => inner.children(),
            Spec::Object { fields, .. } | Spec::Map(fields) => Some(fields),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Spec::Primitive { .. } => true,
            Spec::List { inner, .. } => {
                matches!(**inner, Spec::Primitive { .. } | Spec::Map(_)) && inner.is_valid()
            }
            Spec::Object { fields, .. } | Spec::Map(fields) => fields
                .values()
                .all(|field| !matches!(field, Spec::Map(_)) && field.is_valid()),
        }
    }
}

impl Serialize for Spec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Spec::Primitive { ty, required, is_key } => {
                map.serialize_entry(FORMAT_TYPE, ty.as_str())?;
                map.serialize_entry(FORMAT_REQUIRED, required)?;
                map.serialize_entry(FORMAT_KEY, is_key)?;
            }
            Spec::List { required, inner } => {
                map.serialize_entry(FORMAT_TYPE, FormatKind::List.as_str())?;
                map.serialize_entry(FORMAT_REQUIRED, required)?;
                map.serialize_entry("inner", inner.as_ref())?;
            }
            Spec::Object { required, fields } => {
                map.serialize_entry(FORMAT_TYPE, FormatKind::Object.as_str())?;
                map.serialize_entry(FORMAT_REQUIRED, required)?;
                map.serialize_entry("fields", fields)?;
            }
            Spec::Map(fields) => {
                map.serialize_entry(FORMAT_TYPE, "map")?;
                map.serialize_entry("fields", fields)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecViolation {
    #[error("missing a required {type_name} value at '{path}' key")]
    MissingRequired { type_name: String, path: String },
}

/// Shallow merge of two field maps into a [`Spec::Map`]; `right` wins on overlap.
pub fn merge_map_specs(left: &SpecFields, right: &SpecFields) -> Spec {
    let mut merged = left.clone();
    for (name, spec) in right {
        merged.insert(name.clone(), spec.clone());
    }
    Spec::Map(merged)
}

#[cfg(test)]
mod tests;

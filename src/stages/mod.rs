// Author: Dustin Pilgrim
// License: MIT

//! The stages of a parse, run in order: variables, switchboard, providers, schemas.
//!
//! Every stage reports all the problems it finds among its sibling blocks and
//! returns no entities at all when any of them is an error.

use crate::ast::Attribute;
use crate::diagnostics::Diagnostics;
use crate::eval::EvalContext;
use crate::value::{Type, Value};

mod providers;
mod schemas;
mod switchboard;
mod variables;

pub use providers::resolve_providers;
pub use schemas::resolve_schemas;
pub use switchboard::{resolve_switchboard, SwitchboardMode, DEVELOPMENT_VERSION};
pub use variables::{resolve_variables, variable_type_context};

fn type_mismatch(diags: &mut Diagnostics, attr: &Attribute, expected: &Type) {
    diags.error(
        "Incorrect attribute value type",
        format!("Inappropriate value for attribute \"{}\": {} required.", attr.name, expected),
        Some(attr.expr.pos()),
    );
}

/// Evaluate `attr`, pushing any problem onto `diags`.
fn attribute_value(attr: &Attribute, ctx: &EvalContext, diags: &mut Diagnostics) -> Option<Value> {
    match attr.expr.value(ctx) {
        Ok(value) => Some(value),
        Err(d) => {
            diags.extend(d);
            None
        }
    }
}

fn string_attribute(attr: &Attribute, ctx: &EvalContext, diags: &mut Diagnostics) -> Option<String> {
    match attribute_value(attr, ctx, diags)? {
        Value::String(s) => Some(s),
        _ => {
            type_mismatch(diags, attr, &Type::String);
            None
        }
    }
}

/// A string attribute that also takes numbers and bools, converted to their string form.
fn string_convertible_attribute(attr: &Attribute, ctx: &EvalContext, diags: &mut Diagnostics) -> Option<String> {
    match attribute_value(attr, ctx, diags)? {
        Value::String(s) => Some(s),
        v @ (Value::Number(_) | Value::Bool(_)) => Some(v.to_string()),
        _ => {
            type_mismatch(diags, attr, &Type::String);
            None
        }
    }
}

/// A bool attribute. Null and anything that failed read as `None`; failures land in `diags`.
fn bool_attribute(attr: &Attribute, ctx: &EvalContext, diags: &mut Diagnostics) -> Option<bool> {
    match attribute_value(attr, ctx, diags)? {
        Value::Bool(b) => Some(b),
        Value::Null => None,
        _ => {
            type_mismatch(diags, attr, &Type::Bool);
            None
        }
    }
}

#[cfg(test)]
mod tests;

// Author: Dustin Pilgrim
// License: MIT

//! Symbols available while evaluating a schema's `format` expression.

use crate::eval::{EvalContext, Function};
use crate::value::Value;

use super::{is_constraint_node, ConstraintNode, FormatKind, FormatNode, FORMAT_KEY, FORMAT_REQUIRED};

const WRAP_ARGUMENT_ERROR: &str =
    "parameter must be a string/number/bool variable or an object literal where all key values are a variable or function";
const NESTED_WRAP_ERROR: &str = "object() and list() functions are not allowed";
const REQ_ARGUMENT_ERROR: &str = "provided value must be a format node";
const KEY_ARGUMENT_ERROR: &str = "first parameter is invalid. Use string or number variable only";

fn primitive_node(kind: FormatKind) -> Value {
    ConstraintNode::new(kind, false, None).to_value()
}

/// `list(x)` / `object(x)`: wrap a leaf node or a map of fields.
fn wrap(kind: FormatKind) -> Function {
    let description = match kind {
        FormatKind::List => "Describes a list whose elements match the given format",
        _ => "Describes a nested object with the given fields",
    };
    Function::new(&["schema"], description, move |args| {
        let child = &args[0];
        match FormatNode::classify(child) {
            None => Err(WRAP_ARGUMENT_ERROR.to_string()),
            Some(FormatNode::Constraint(_)) => match ConstraintNode::from_value(child) {
                Some(node) if node.kind.is_complex() => Err(NESTED_WRAP_ERROR.to_string()),
                Some(_) => Ok(ConstraintNode::new(kind, false, Some(child.clone())).to_value()),
                None => Err(WRAP_ARGUMENT_ERROR.to_string()),
            },
            Some(FormatNode::KeyVal(_)) => Ok(ConstraintNode::new(kind, false, Some(child.clone())).to_value()),
        }
    })
}

/// `req(x)`: the same node, marked required.
fn req() -> Function {
    Function::new(&["schema"], "Marks a schema element as required", |args| match &args[0] {
        Value::Object(fields) if is_constraint_node(&args[0]) => {
            let mut node = fields.clone();
            node.insert(FORMAT_REQUIRED.to_string(), Value::Bool(true));
            Ok(Value::Object(node))
        }
        _ => Err(REQ_ARGUMENT_ERROR.to_string()),
    })
}

/// `key(x)`: marks the discriminator field of a schema. Only strings and numbers qualify.
fn key() -> Function {
    Function::new(&["value_type"], "Identifies the field that selects a schema variant", |args| {
        let node = ConstraintNode::from_value(&args[0]).ok_or_else(|| KEY_ARGUMENT_ERROR.to_string())?;
        if !matches!(node.kind, FormatKind::String | FormatKind::Number) {
            return Err(KEY_ARGUMENT_ERROR.to_string());
        }
        let Value::Object(mut fields) = args[0].clone() else {
            return Err(KEY_ARGUMENT_ERROR.to_string());
        };
        fields.insert(FORMAT_KEY.to_string(), Value::Bool(true));
        Ok(Value::Object(fields))
    })
}

/// The schema symbols on their own.
pub fn schema_symbols() -> EvalContext {
    EvalContext::new()
        .with_variable(FormatKind::String.as_str(), primitive_node(FormatKind::String))
        .with_variable(FormatKind::Number.as_str(), primitive_node(FormatKind::Number))
        .with_variable(FormatKind::Bool.as_str(), primitive_node(FormatKind::Bool))
        .with_function(FormatKind::List.as_str(), wrap(FormatKind::List))
        .with_function(FormatKind::Object.as_str(), wrap(FormatKind::Object))
        .with_function("req", req())
        .with_function("key", key())
}

/// `parent` with the schema symbols layered on top.
pub fn schema_eval_context(parent: &EvalContext) -> EvalContext {
    parent.merged_with(&schema_symbols())
}

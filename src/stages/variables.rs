use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{Attribute, Block, Body, Pos};
use crate::config::Variable;
use crate::decode::BodySchema;
use crate::diagnostics::Diagnostics;
use crate::eval::{EvalContext, Function};
use crate::value::{Type, Value};

use super::{attribute_value, type_mismatch};

const VARIABLE_BLOCK: &str = "variable";

/// Symbols for a variable's `type` expression: `string`, `number`, `boolean` and `list(x)`.
pub fn variable_type_context() -> EvalContext {
    EvalContext::new()
        .with_variable("string", Value::string("string"))
        .with_variable("number", Value::string("number"))
        .with_variable("boolean", Value::string("boolean"))
        .with_function(
            "list",
            Function::new(&["a"], "Builds a list type for a variable", |args| match &args[0] {
                Value::String(inner) => Ok(Value::String(format!("list({})", inner))),
                _ => Err("a string type is required".to_string()),
            }),
        )
}

fn type_from_name(name: &str) -> Option<Type> {
    match name {
        "string" => Some(Type::String),
        "number" => Some(Type::Number),
        "boolean" => Some(Type::Bool),
        "list(string)" => Some(Type::list(Type::String)),
        "list(number)" => Some(Type::list(Type::Number)),
        "list(boolean)" => Some(Type::list(Type::Bool)),
        _ => None,
    }
}

/// Resolve every `variable "<name>"` block, preferring `overrides` over defaults.
pub fn resolve_variables(body: &Body, overrides: &IndexMap<String, Value>) -> Result<Vec<Variable>, Diagnostics> {
    debug!("resolving variables");
    let (content, _, mut diags) = body.partial_content(&BodySchema::new().block(VARIABLE_BLOCK, &["name"]));

    let mut seen: IndexMap<&str, &Pos> = IndexMap::new();
    let mut variables = Vec::new();
    for block in content.blocks_of(VARIABLE_BLOCK) {
        let name = block.labels[0].as_str();
        if let Some(first) = seen.get(name) {
            diags.error(
                "Duplicate variable",
                format!("A variable named \"{}\" was already declared at {}.", name, first),
                Some(&block.pos),
            );
            continue;
        }
        seen.insert(name, &block.pos);

        match resolve_variable(block, overrides.get(name)) {
            Ok(variable) => {
                debug!(variable = %variable.name, ty = %variable.ty, "variable resolved");
                variables.push(variable);
            }
            Err(d) => diags.extend(d),
        }
    }

    diags.into_result(variables)
}

fn resolve_variable(block: &Block, override_value: Option<&Value>) -> Result<Variable, Diagnostics> {
    let name = &block.labels[0];
    let schema = BodySchema::new().attribute("type", true).attribute("default", false);
    let (content, diags) = block.body.content(&schema);
    if diags.has_errors() {
        return Err(diags);
    }
    let Some(type_attr) = content.attribute("type") else {
        return Err(diags);
    };

    let ty = declared_type(type_attr)?;
    let default = match content.attribute("default") {
        Some(attr) => default_value(attr, &ty)?,
        None => Value::Null,
    };

    let value = match override_value {
        Some(value) if !value.is_null() => {
            if !ty.matches_exactly(value) {
                let mut diags = Diagnostics::new();
                diags.error(
                    "Incorrect override value type",
                    format!(
                        "Incorrect value for variable \"{}\": Expected '{}', Got '{}'",
                        name,
                        ty,
                        value.ty()
                    ),
                    Some(type_attr.expr.pos()),
                );
                return Err(diags);
            }
            value.clone()
        }
        _ if default.is_null() => {
            let mut diags = Diagnostics::new();
            diags.error(
                "No default or override value provided",
                format!("No default or override value provided for '{}'", name),
                Some(type_attr.expr.pos()),
            );
            return Err(diags);
        }
        _ => default,
    };

    Ok(Variable {
        name: name.clone(),
        ty,
        value,
    })
}

fn declared_type(attr: &Attribute) -> Result<Type, Diagnostics> {
    let mut diags = Diagnostics::new();
    if attr.expr.variables().is_empty() {
        diags.error(
            "Incorrect attribute value type",
            "Inappropriate value for attribute \"type\": variable required (hint: don't use a primitive)",
            Some(attr.expr.pos()),
        );
        return Err(diags);
    }

    let value = attribute_value(attr, &variable_type_context(), &mut diags);
    let ty = value.as_ref().and_then(Value::as_str).and_then(type_from_name);
    match (value, ty) {
        (_, Some(ty)) => Ok(ty),
        (None, None) => Err(diags),
        (Some(value), None) => {
            diags.error(
                "Unsupported variable type",
                format!(
                    "{} is not a variable type. Use string, number, boolean or list() of one of them.",
                    value
                ),
                Some(attr.expr.pos()),
            );
            Err(diags)
        }
    }
}

/// The `default` attribute, evaluated without any symbols in scope.
fn default_value(attr: &Attribute, ty: &Type) -> Result<Value, Diagnostics> {
    let mut diags = Diagnostics::new();
    let Some(value) = attribute_value(attr, &EvalContext::new(), &mut diags) else {
        return Err(diags);
    };
    if !ty.conforms(&value) {
        type_mismatch(&mut diags, attr, ty);
        return Err(diags);
    }
    Ok(value)
}

use crate::utils::join_key_path;
use crate::value::{Value, NULL};

use super::{Spec, SpecFields, SpecViolation};

/// Check `value` against `spec`, reporting each missing required value.
///
/// Nothing below a missing value is reported. Absent attributes read as null.
/// Elements of a list of objects are themselves required.
pub fn validate_value_against_spec(value: &Value, spec: &Spec, path: &str) -> Vec<SpecViolation> {
    let mut violations = Vec::new();
    validate_into(value, spec, path, &mut violations);
    violations
}

fn missing(type_name: String, path: &str, out: &mut Vec<SpecViolation>) {
    out.push(SpecViolation::MissingRequired {
        type_name,
        path: path.to_string(),
    });
}

fn validate_into(value: &Value, spec: &Spec, path: &str, out: &mut Vec<SpecViolation>) {
    if value.is_null() && (spec.is_required() || spec.is_key()) {
        missing(spec.ty().friendly_name(), path, out);
        return;
    }

    match spec {
        Spec::Primitive { .. } => {}
        Spec::Object { fields, .. } | Spec::Map(fields) => validate_fields(value, fields, path, out),
        Spec::List { inner, .. } => {
            let Spec::Map(fields) = inner.as_ref() else {
                return;
            };
            for (index, element) in value.elements().iter().enumerate() {
                let element_path = format!("{}[{}]", path, index);
                if element.is_null() {
                    missing(inner.ty().friendly_name(), &element_path, out);
                    continue;
                }
                validate_fields(element, fields, &element_path, out);
            }
        }
    }
}

fn validate_fields(value: &Value, fields: &SpecFields, path: &str, out: &mut Vec<SpecViolation>) {
    for (name, field) in fields {
        let field_value = value.get_attr(name).unwrap_or(&NULL);
        validate_into(field_value, field, &join_key_path(path, name), out);
    }
}

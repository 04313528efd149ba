use indexmap::IndexMap;

use crate::ast::{Expr, Pos};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::value::{Type, Value};

use super::EvalContext;

fn fail(summary: &str, detail: String, pos: &Pos) -> Diagnostics {
    Diagnostics::from(Diagnostic::error(summary, detail, Some(pos)))
}

impl Expr {
    /// Evaluate against `ctx`. Problems in sibling items are all reported.
    pub fn value(&self, ctx: &EvalContext) -> Result<Value, Diagnostics> {
        match self {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Tuple { items, .. } => {
                let mut diags = Diagnostics::new();
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item.value(ctx) {
                        Ok(v) => values.push(v),
                        Err(d) => diags.extend(d),
                    }
                }
                diags.into_result(Value::List(values))
            }
            Expr::Object { items, .. } => {
                let mut diags = Diagnostics::new();
                let mut fields = IndexMap::with_capacity(items.len());
                for (key, item) in items {
                    match item.value(ctx) {
                        Ok(v) => {
                            fields.insert(key.clone(), v);
                        }
                        Err(d) => diags.extend(d),
                    }
                }
                diags.into_result(Value::Object(fields))
            }
            Expr::Traversal { root, attrs, pos } => traverse(ctx, root, attrs, pos),
            Expr::Call { name, args, pos } => call(ctx, name, args, pos),
        }
    }
}

fn traverse(ctx: &EvalContext, root: &str, attrs: &[String], pos: &Pos) -> Result<Value, Diagnostics> {
    let Some(mut current) = ctx.variables.get(root) else {
        let detail = format!("There is no variable named \"{}\".", root);
        return Err(fail("Unknown variable", detail, pos));
    };

    for attr in attrs {
        current = match current {
            Value::Unknown(_) => return Ok(Value::Unknown(Type::Dynamic)),
            Value::Object(fields) => match fields.get(attr) {
                Some(v) => v,
                None => {
                    let detail = format!("This object does not have an attribute named \"{}\".", attr);
                    return Err(fail("Unsupported attribute", detail, pos));
                }
            },
            Value::Null => {
                let detail = format!("This value is null, so it has no attribute named \"{}\".", attr);
                return Err(fail("Attempt to get attribute from null value", detail, pos));
            }
            other => {
                let detail = format!("Can't access attributes on a {} value.", other.ty());
                return Err(fail("Unsupported attribute", detail, pos));
            }
        };
    }

    Ok(current.clone())
}

fn call(ctx: &EvalContext, name: &str, args: &[Expr], pos: &Pos) -> Result<Value, Diagnostics> {
    let Some(function) = ctx.functions.get(name) else {
        let detail = format!("There is no function named \"{}\".", name);
        return Err(fail("Call to unknown function", detail, pos));
    };

    if args.len() != function.params.len() {
        let detail = format!(
            "Function \"{}\" expects {} argument(s), got {}.",
            name,
            function.params.len(),
            args.len()
        );
        return Err(fail("Wrong number of function arguments", detail, pos));
    }

    let mut diags = Diagnostics::new();
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg.value(ctx) {
            Ok(v) => values.push(v),
            Err(d) => diags.extend(d),
        }
    }
    if diags.has_errors() {
        return Err(diags);
    }

    function.call(&values).map_err(|message| {
        let subject = args.first().map_or(pos, Expr::pos);
        let detail = format!("Invalid value for \"{}\" parameter: {}.", function.params.join(", "), message);
        fail("Invalid function argument", detail, subject)
    })
}

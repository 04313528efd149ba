#[cfg(test)]
use super::*;
#[cfg(test)]
use crate::eval::EvalContext;
#[cfg(test)]
use crate::parser::Parser;
#[cfg(test)]
use crate::value::Value;

fn format_value(input: &str) -> Value {
    let mut parser = Parser::new("schema.hcl", input).expect("Failed to create parser");
    let expr = parser.parse_expression().expect("Failed to parse format");
    expr.value(&schema_eval_context(&EvalContext::new()))
        .expect("Failed to evaluate format")
}

fn primitive(ty: PrimitiveType, required: bool) -> Spec {
    Spec::Primitive { ty, required, is_key: false }
}

fn fields(entries: Vec<(&str, Spec)>) -> SpecFields {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn messages(violations: &[SpecViolation]) -> Vec<String> {
    violations.iter().map(ToString::to_string).collect()
}

#[test]
fn test_schema_symbols_produce_constraint_nodes() {
    let string = format_value("string");
    assert!(is_constraint_node(&string));
    assert!(!is_key_val_node(&string));
    assert_eq!(
        ConstraintNode::from_value(&string),
        Some(ConstraintNode::new(FormatKind::String, false, None))
    );

    let root = format_value("{ a = string, b = list(number) }");
    assert!(is_key_val_node(&root));
    assert!(!is_constraint_node(&root));

    assert!(!is_constraint_node(&Value::string("string")));
    assert!(!is_key_val_node(&Value::object([("a", Value::Number(1.0))])));
}

#[test]
fn test_root_format_with_key_compiles() {
    let format = format_value("{ name = req(key(string)), size = number }");

    let diags = validate_format_shape(&format, "", true, true, None);
    assert!(!diags.has_errors(), "unexpected diagnostics: {}", diags);

    let spec = compile_spec(&format).expect("Failed to compile format");
    assert_eq!(
        spec,
        Spec::Map(fields(vec![
            ("name", Spec::Primitive { ty: PrimitiveType::String, required: true, is_key: true }),
            ("size", primitive(PrimitiveType::Number, false)),
        ]))
    );
    assert!(spec.is_valid());

    let data = Value::object([("name", Value::Null), ("size", Value::Number(1.0))]);
    let violations = validate_value_against_spec(&data, &spec, "");
    assert_eq!(messages(&violations), vec!["missing a required string value at 'name' key"]);
}

#[test]
fn test_req_preserves_children() {
    let format = format_value("{ tags = req(list(string)), owner = req(object({ id = number })) }");
    let spec = compile_spec(&format).expect("Failed to compile format");

    assert_eq!(
        spec,
        Spec::Map(fields(vec![
            (
                "tags",
                Spec::List { required: true, inner: Box::new(primitive(PrimitiveType::String, false)) }
            ),
            (
                "owner",
                Spec::Object {
                    required: true,
                    fields: fields(vec![("id", primitive(PrimitiveType::Number, false))]),
                }
            ),
        ]))
    );
    assert!(spec.is_valid());
}

#[test]
fn test_key_outside_root_level_is_rejected() {
    let format = format_value("{ id = key(string) }");
    assert!(!validate_format_shape(&format, "", true, true, None).has_errors());

    // variant formats are never root formats
    let diags = validate_format_shape(&format, "", true, false, None);
    assert_eq!(diags.errors().count(), 1);
    assert!(diags.iter().any(|d| d.detail.contains("outside of the base level")));

    let nested = format_value("{ owner = object({ id = key(string) }) }");
    assert_eq!(validate_format_shape(&nested, "", true, true, None).errors().count(), 1);

    let in_list = format_value("{ ids = list(key(number)) }");
    assert_eq!(validate_format_shape(&in_list, "", true, true, None).errors().count(), 1);
}

#[test]
fn test_shape_errors_accumulate() {
    let format = Value::object([
        ("a", Value::string("string")),
        ("b", Value::Number(3.0)),
        ("c", ConstraintNode::new(FormatKind::String, false, None).to_value()),
    ]);

    let diags = validate_format_shape(&format, "", true, true, None);
    assert_eq!(diags.errors().count(), 2);
    let details: Vec<&str> = diags.iter().map(|d| d.detail.as_str()).collect();
    assert!(details[0].contains("key path 'a'"));
    assert!(details[1].contains("key path 'b'"));
}

#[test]
fn test_malformed_constraint_nodes() {
    let string = ConstraintNode::new(FormatKind::String, false, None).to_value();

    let primitive_with_children = ConstraintNode::new(FormatKind::Number, false, Some(string.clone()));
    let object_of_primitive = ConstraintNode::new(FormatKind::Object, false, Some(string.clone()));
    let list_of_list = ConstraintNode::new(
        FormatKind::List,
        false,
        Some(ConstraintNode::new(FormatKind::List, false, Some(string.clone())).to_value()),
    );
    let unknown_type = Value::object([("type", Value::string("date")), ("required", Value::Bool(false))]);
    let bad_required = Value::object([("type", Value::string("string")), ("required", Value::string("yes"))]);

    for node in [
        primitive_with_children.to_value(),
        object_of_primitive.to_value(),
        list_of_list.to_value(),
        unknown_type,
        bad_required,
    ] {
        let format = Value::object([("field", node.clone())]);
        let diags = validate_format_shape(&format, "", true, true, None);
        assert_eq!(diags.errors().count(), 1, "expected one diagnostic for {}", node);
    }

    // a lone constraint node where a map of fields belongs
    assert!(validate_format_shape(&string, "", true, true, None).has_errors());
}

#[test]
fn test_compile_rejects_non_format_values() {
    assert_eq!(compile_spec(&Value::string("invalid")), None);
    assert_eq!(compile_spec(&Value::object([("a", Value::Number(1.0))])), None);

    let unknown_type = Value::object([("type", Value::string("date")), ("required", Value::Bool(false))]);
    assert_eq!(compile_spec(&Value::object([("field", unknown_type)])), None);
}

#[test]
fn test_object_without_children_has_no_fields() {
    let node = ConstraintNode::new(FormatKind::Object, true, None).to_value();
    let spec = compile_spec(&node).expect("Failed to compile node");
    assert_eq!(spec, Spec::Object { required: true, fields: SpecFields::new() });
}

#[test]
fn test_schema_function_argument_errors() {
    let ctx = schema_eval_context(&EvalContext::new());
    for input in [
        "list(list(string))",
        "object(object({ a = string }))",
        "list(\"string\")",
        "req(\"string\")",
        "key(bool)",
        "key(list(string))",
        "req({ a = string })",
    ] {
        let mut parser = Parser::new("schema.hcl", input).expect("Failed to create parser");
        let expr = parser.parse_expression().expect("Failed to parse");
        let diags = expr.value(&ctx).expect_err(input);
        assert_eq!(
            diags.iter().next().map(|d| d.summary.as_str()),
            Some("Invalid function argument"),
            "{}",
            input
        );
    }
}

#[test]
fn test_schema_context_keeps_parent_symbols() {
    let parent = EvalContext::new().with_variable("region", Value::string("eu"));
    let ctx = schema_eval_context(&parent);
    assert_eq!(ctx.variables.get("region"), Some(&Value::string("eu")));
    assert!(ctx.variables.contains_key("string"));
    assert!(ctx.functions.contains_key("req"));
}

#[test]
fn test_missing_required_and_key_fields() {
    let spec = Spec::Map(fields(vec![
        ("key1", Spec::Primitive { ty: PrimitiveType::String, required: false, is_key: true }),
        ("key2", primitive(PrimitiveType::String, true)),
        ("otherKey", Spec::Primitive { ty: PrimitiveType::String, required: false, is_key: true }),
    ]));
    let value = Value::object([("otherKey", Value::string("value1"))]);

    let violations = validate_value_against_spec(&value, &spec, "");
    assert_eq!(
        messages(&violations),
        vec![
            "missing a required string value at 'key1' key",
            "missing a required string value at 'key2' key",
        ]
    );
}

#[test]
fn test_nested_value_missing() {
    let spec = Spec::Map(fields(vec![(
        "nested",
        Spec::Object {
            required: true,
            fields: fields(vec![
                ("key1", primitive(PrimitiveType::String, true)),
                ("key2", primitive(PrimitiveType::String, true)),
            ]),
        },
    )]));
    let value = Value::object([("nested", Value::object([("key1", Value::string("hello"))]))]);

    let violations = validate_value_against_spec(&value, &spec, "");
    assert_eq!(messages(&violations), vec!["missing a required string value at 'nested.key2' key"]);

    // nothing is reported below a missing object
    let violations = validate_value_against_spec(&Value::Object(Default::default()), &spec, "");
    assert_eq!(messages(&violations), vec!["missing a required object value at 'nested' key"]);
}

#[test]
fn test_list_of_objects_reports_each_element() {
    let spec = Spec::Map(fields(vec![(
        "list",
        Spec::List {
            required: true,
            inner: Box::new(Spec::Map(fields(vec![
                ("key1", primitive(PrimitiveType::String, true)),
                ("key2", primitive(PrimitiveType::String, true)),
            ]))),
        },
    )]));

    let element = |k1: Option<&str>, k2: Option<&str>, k3: Option<&str>| {
        let v = |s: Option<&str>| s.map_or(Value::Null, Value::string);
        Value::object([("key1", v(k1)), ("key2", v(k2)), ("key3", v(k3))])
    };
    let value = Value::object([(
        "list",
        Value::List(vec![
            element(Some("hello"), None, None),
            element(Some("hello"), Some("hola"), None),
            element(None, Some("hello"), None),
            element(None, None, Some("hello")),
        ]),
    )]);

    let violations = validate_value_against_spec(&value, &spec, "");
    assert_eq!(
        messages(&violations),
        vec![
            "missing a required string value at 'list[0].key2' key",
            "missing a required string value at 'list[2].key1' key",
            "missing a required string value at 'list[3].key1' key",
            "missing a required string value at 'list[3].key2' key",
        ]
    );

    // validating twice gives the same answer
    assert_eq!(validate_value_against_spec(&value, &spec, ""), violations);
}

#[test]
fn test_complete_value_has_no_violations() {
    let format = format_value(
        "{ id = req(key(string)), tags = list(string), owner = req(object({ name = req(string), age = number })) }",
    );
    let spec = compile_spec(&format).expect("Failed to compile format");

    let value = Value::object([
        ("id", Value::string("abc")),
        ("owner", Value::object([("name", Value::string("joe"))])),
    ]);
    assert!(validate_value_against_spec(&value, &spec, "").is_empty());
}

#[test]
fn test_merge_map_specs_right_wins() {
    let left = fields(vec![
        ("a", primitive(PrimitiveType::String, false)),
        ("b", primitive(PrimitiveType::Number, false)),
    ]);
    let right = fields(vec![
        ("b", primitive(PrimitiveType::Bool, true)),
        ("c", primitive(PrimitiveType::String, true)),
    ]);

    let merged = merge_map_specs(&left, &right);
    let Spec::Map(merged_fields) = &merged else {
        panic!("Expected a map spec");
    };
    assert_eq!(merged_fields.len(), 3);
    assert_eq!(merged_fields["a"], left["a"]);
    assert_eq!(merged_fields["b"], right["b"]);
    assert_eq!(merged_fields["c"], right["c"]);
    assert_eq!(left.len(), 2);
}

#[test]
fn test_validity_of_hand_built_specs() {
    let nested_list = Spec::List {
        required: false,
        inner: Box::new(Spec::List { required: false, inner: Box::new(primitive(PrimitiveType::String, false)) }),
    };
    assert!(!nested_list.is_valid());

    let map_field = Spec::Map(fields(vec![("inner", Spec::Map(SpecFields::new()))]));
    assert!(!map_field.is_valid());

    assert_eq!(
        Spec::List { required: false, inner: Box::new(primitive(PrimitiveType::Number, false)) }
            .ty()
            .friendly_name(),
        "list of number"
    );
}

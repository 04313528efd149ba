// Author: Dustin Pilgrim
// License: MIT

//! Schema-driven access to a block body.

use indexmap::IndexMap;

use crate::ast::{Attribute, Block, Body, Pos};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::eval::EvalContext;
use crate::spec::{validate_value_against_spec, Spec};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    pub name: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockHeaderSchema {
    pub kind: String,
    pub label_names: Vec<String>,
}

/// Attributes and block kinds a body may contain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodySchema {
    pub attributes: Vec<AttributeSchema>,
    pub blocks: Vec<BlockHeaderSchema>,
}

impl BodySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &str, required: bool) -> Self {
        self.attributes.push(AttributeSchema { name: name.to_string(), required });
        self
    }

    pub fn block(mut self, kind: &str, label_names: &[&str]) -> Self {
        self.blocks.push(BlockHeaderSchema {
            kind: kind.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        });
        self
    }
}

/// The parts of a body matched by a [`BodySchema`].
#[derive(Debug, Clone)]
pub struct BodyContent<'a> {
    pub attributes: IndexMap<String, &'a Attribute>,
    pub blocks: Vec<&'a Block>,
    /// Where to point diagnostics about things that are missing.
    pub missing_item: Pos,
}

impl<'a> BodyContent<'a> {
    pub fn attribute(&self, name: &str) -> Option<&'a Attribute> {
        self.attributes.get(name).copied()
    }

    pub fn blocks_of(&self, kind: &'a str) -> impl Iterator<Item = &'a Block> + '_ {
        self.blocks.iter().copied().filter(move |b| b.kind == kind)
    }
}

impl Body {
    /// Strict decode: anything the schema does not name is an error.
    pub fn content(&self, schema: &BodySchema) -> (BodyContent<'_>, Diagnostics) {
        let (content, remain, mut diags) = self.partial_content(schema);

        for attr in remain.attributes.values() {
            diags.error(
                "Unsupported argument",
                format!("An argument named \"{}\" is not expected here.", attr.name),
                Some(&attr.pos),
            );
        }
        for block in &remain.blocks {
            diags.error(
                "Unsupported block type",
                format!("Blocks of type \"{}\" are not expected here.", block.kind),
                Some(&block.pos),
            );
        }

        (content, diags)
    }

    /// Lenient decode: whatever the schema does not name comes back as the remaining body.
    pub fn partial_content(&self, schema: &BodySchema) -> (BodyContent<'_>, Body, Diagnostics) {
        let mut diags = Diagnostics::new();
        let mut content = BodyContent {
            attributes: IndexMap::new(),
            blocks: Vec::new(),
            missing_item: self.pos.clone(),
        };
        let mut remain = Body { pos: self.pos.clone(), ..Body::default() };

        for attr_schema in &schema.attributes {
            match self.attributes.get(&attr_schema.name) {
                Some(attr) => {
                    content.attributes.insert(attr.name.clone(), attr);
                }
                None if attr_schema.required => diags.error(
                    "Missing required argument",
                    format!("The argument \"{}\" is required, but no definition was found.", attr_schema.name),
                    Some(&self.pos),
                ),
                None => {}
            }
        }
        for (name, attr) in &self.attributes {
            if !content.attributes.contains_key(name) {
                remain.attributes.insert(name.clone(), attr.clone());
            }
        }

        for block in &self.blocks {
            let Some(header) = schema.blocks.iter().find(|h| h.kind == block.kind) else {
                remain.blocks.push(block.clone());
                continue;
            };
            if let Some(diag) = check_labels(block, header) {
                diags.push(diag);
                continue;
            }
            content.blocks.push(block);
        }

        (content, remain, diags)
    }
}

fn check_labels(block: &Block, header: &BlockHeaderSchema) -> Option<Diagnostic> {
    let expected = header.label_names.len();
    let names = header.label_names.join(", ");
    if block.labels.len() < expected {
        let missing = &header.label_names[block.labels.len()];
        return Some(Diagnostic::error(
            format!("Missing {} for {}", missing, block.kind),
            format!("All {} blocks must have {} labels ({}).", block.kind, expected, names),
            Some(&block.pos),
        ));
    }
    if block.labels.len() > expected {
        let detail = if expected == 0 {
            format!("No labels are expected for {} blocks.", block.kind)
        } else {
            format!("Only {} labels ({}) are expected for {} blocks.", expected, names, block.kind)
        };
        return Some(Diagnostic::error(
            format!("Extraneous label for {}", block.kind),
            detail,
            Some(&block.pos),
        ));
    }
    None
}

/// Decode the attributes of `body` into an object shaped by `spec`.
///
/// Each field of `spec` becomes one attribute. Values must conform to the
/// field's type and satisfy its required markers; attributes the spec does
/// not name and nested blocks are errors. Absent optional fields decode to null.
pub fn decode_body(body: &Body, spec: &Spec, ctx: &EvalContext) -> Result<Value, Diagnostics> {
    let mut diags = Diagnostics::new();
    let Some(fields) = spec.children() else {
        diags.error(
            "Invalid decode specification",
            format!("A block body can only be decoded with an object spec, not {}.", spec.ty()),
            Some(&body.pos),
        );
        return Err(diags);
    };

    let schema = fields.iter().fold(BodySchema::new(), |schema, (name, field)| {
        schema.attribute(name, field.is_required() || field.is_key())
    });
    let (content, content_diags) = body.content(&schema);
    diags.extend(content_diags);

    let mut out = IndexMap::with_capacity(fields.len());
    for (name, field) in fields {
        let Some(attr) = content.attribute(name) else {
            out.insert(name.clone(), Value::Null);
            continue;
        };

        let value = match attr.expr.value(ctx) {
            Ok(value) => value,
            Err(d) => {
                diags.extend(d);
                continue;
            }
        };

        let expected = field.ty();
        if !expected.conforms(&value) {
            diags.error(
                "Incorrect attribute value type",
                format!("Inappropriate value for attribute \"{}\": {} required.", name, expected),
                Some(attr.expr.pos()),
            );
            continue;
        }

        // An optional field left null has nothing below it to check.
        if !value.is_null() || field.is_required() || field.is_key() {
            for violation in validate_value_against_spec(&value, field, name) {
                diags.error("Missing required value", violation.to_string(), Some(attr.expr.pos()));
            }
        }
        out.insert(name.clone(), value);
    }

    diags.into_result(Value::Object(out))
}

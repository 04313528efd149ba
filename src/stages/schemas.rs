use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{Attribute, Block, Body, Pos};
use crate::config::{Schema, Variant};
use crate::decode::BodySchema;
use crate::diagnostics::Diagnostics;
use crate::eval::EvalContext;
use crate::spec::{compile_spec, schema_eval_context, validate_format_shape, Spec};

use super::{attribute_value, bool_attribute, string_convertible_attribute};

const SCHEMA_BLOCK: &str = "schema";
const VARIANT_BLOCK: &str = "variant";

/// Resolve every `schema "<name>"` block and its variants.
///
/// `format` attributes are evaluated with the schema functions layered over `ctx`.
/// Only the schema's own format may mark a top-level field with `key()`.
pub fn resolve_schemas(body: &Body, ctx: &EvalContext) -> Result<Vec<Schema>, Diagnostics> {
    debug!("resolving schema blocks");
    let schema_ctx = schema_eval_context(ctx);
    let (content, _, mut diags) = body.partial_content(&BodySchema::new().block(SCHEMA_BLOCK, &["name"]));

    let mut seen: IndexMap<&str, &Pos> = IndexMap::new();
    let mut schemas = Vec::new();
    for block in content.blocks_of(SCHEMA_BLOCK) {
        let name = block.labels[0].as_str();
        if let Some(first) = seen.get(name) {
            diags.error(
                "Duplicate schema",
                format!("A schema named \"{}\" was already declared at {}.", name, first),
                Some(&block.pos),
            );
            continue;
        }
        seen.insert(name, &block.pos);

        if let Some(schema) = resolve_schema(block, ctx, &schema_ctx, &mut diags) {
            debug!(schema = %schema.name, variants = schema.variants.len(), "schema resolved");
            schemas.push(schema);
        }
    }

    diags.into_result(schemas)
}

fn resolve_schema(
    block: &Block,
    ctx: &EvalContext,
    schema_ctx: &EvalContext,
    diags: &mut Diagnostics,
) -> Option<Schema> {
    let body_schema = BodySchema::new()
        .attribute("format", true)
        .attribute("is_list", false)
        .block(VARIANT_BLOCK, &["name"]);
    let (content, content_diags) = block.body.content(&body_schema);
    let failed = content_diags.has_errors();
    diags.extend(content_diags);
    if failed {
        return None;
    }

    let is_list = content
        .attribute("is_list")
        .and_then(|attr| bool_attribute(attr, ctx, diags))
        .unwrap_or(false);
    let format = content
        .attribute("format")
        .and_then(|attr| format_spec(attr, schema_ctx, true, diags));

    let mut variants = Vec::new();
    let mut seen: IndexMap<&str, &Pos> = IndexMap::new();
    for variant_block in content.blocks_of(VARIANT_BLOCK) {
        let name = variant_block.labels[0].as_str();
        if let Some(first) = seen.get(name) {
            diags.error(
                "Duplicate variant",
                format!(
                    "Schema \"{}\" already declares a variant named \"{}\" at {}.",
                    block.labels[0], name, first
                ),
                Some(&variant_block.pos),
            );
            continue;
        }
        seen.insert(name, &variant_block.pos);

        if let Some(variant) = resolve_variant(variant_block, ctx, schema_ctx, diags) {
            variants.push(variant);
        }
    }

    Some(Schema {
        name: block.labels[0].clone(),
        is_list,
        format: format?,
        variants,
    })
}

fn resolve_variant(
    block: &Block,
    ctx: &EvalContext,
    schema_ctx: &EvalContext,
    diags: &mut Diagnostics,
) -> Option<Variant> {
    let (content, content_diags) = block
        .body
        .content(&BodySchema::new().attribute("key", true).attribute("format", true));
    let failed = content_diags.has_errors();
    diags.extend(content_diags);
    if failed {
        return None;
    }

    let key = content.attribute("key").and_then(|attr| string_convertible_attribute(attr, ctx, diags));
    let format = content
        .attribute("format")
        .and_then(|attr| format_spec(attr, schema_ctx, false, diags));

    Some(Variant {
        name: block.labels[0].clone(),
        key: key?,
        format: format?,
    })
}

/// Evaluate, shape-check and compile a `format` attribute.
fn format_spec(attr: &Attribute, schema_ctx: &EvalContext, is_root: bool, diags: &mut Diagnostics) -> Option<Spec> {
    let value = attribute_value(attr, schema_ctx, diags)?;

    let shape = validate_format_shape(&value, "", true, is_root, Some(attr.expr.pos()));
    if shape.has_errors() {
        diags.extend(shape);
        return None;
    }

    let spec = compile_spec(&value);
    if spec.is_none() {
        diags.error(
            "Invalid 'format' value",
            "The format could not be compiled. Available functions: object(), list(), req(), key(). Available variables: string, number, bool.",
            Some(attr.expr.pos()),
        );
    }
    spec
}

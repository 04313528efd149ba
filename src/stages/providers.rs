use tracing::debug;

use crate::ast::{Block, Body};
use crate::config::Provider;
use crate::decode::{decode_body, BodySchema};
use crate::diagnostics::Diagnostics;
use crate::eval::EvalContext;
use crate::plugin::PluginRegistry;
use crate::spec::{compile_spec, validate_format_shape};

use super::string_attribute;

const PROVIDER_BLOCK: &str = "provider";
const REQUIRED_PROVIDER_ATTR: &str = "required_provider";

/// Resolve every `provider "<name>"` block against the init schema of its plugin.
pub fn resolve_providers(
    body: &Body,
    ctx: &EvalContext,
    registry: &mut PluginRegistry<'_>,
) -> Result<Vec<Provider>, Diagnostics> {
    debug!("resolving provider blocks");
    let (content, _, mut diags) = body.partial_content(&BodySchema::new().block(PROVIDER_BLOCK, &["name"]));

    let mut providers = Vec::new();
    for block in content.blocks_of(PROVIDER_BLOCK) {
        match resolve_provider(block, ctx, registry) {
            Ok(provider) => {
                debug!(provider = %provider.block_name, plugin = %provider.provider_name, "provider resolved");
                providers.push(provider);
            }
            Err(d) => diags.extend(d),
        }
    }

    diags.into_result(providers)
}

fn resolve_provider(block: &Block, ctx: &EvalContext, registry: &mut PluginRegistry<'_>) -> Result<Provider, Diagnostics> {
    let block_name = block.labels[0].clone();
    let (content, remain, mut diags) = block
        .body
        .partial_content(&BodySchema::new().attribute(REQUIRED_PROVIDER_ATTR, false));

    let provider_name = match content.attribute(REQUIRED_PROVIDER_ATTR) {
        Some(attr) => match string_attribute(attr, ctx, &mut diags) {
            Some(name) => name,
            None => return Err(diags),
        },
        None => block_name.clone(),
    };

    let plugin = match registry.provider_instance(&provider_name) {
        Ok(plugin) => plugin,
        Err(err) => {
            diags.error("Could not get plugin provider instance", err.to_string(), Some(&block.pos));
            return Err(diags);
        }
    };
    let init_schema = match plugin.init_schema() {
        Ok(schema) => schema,
        Err(err) => {
            diags.error("Could not get schema for provider plugin", err.to_string(), Some(&block.pos));
            return Err(diags);
        }
    };

    let shape = validate_format_shape(&init_schema, "", true, false, Some(&block.pos));
    if shape.has_errors() {
        diags.extend(shape);
        return Err(diags);
    }
    let Some(spec) = compile_spec(&init_schema) else {
        diags.error(
            "Invalid provider init schema",
            format!("The init schema of plugin \"{}\" could not be compiled.", provider_name),
            Some(&block.pos),
        );
        return Err(diags);
    };

    let init_payload = match decode_body(&remain, &spec, ctx) {
        Ok(value) => value,
        Err(d) => {
            diags.extend(d);
            return Err(diags);
        }
    };

    diags.into_result(Provider {
        block_name,
        provider_name,
        init_payload,
    })
}

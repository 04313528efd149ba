use indexmap::IndexMap;
use tracing::{debug, info};

use crate::ast::{Attribute, Block, Body, Pos};
use crate::config::{RequiredProvider, SwitchboardBlock};
use crate::decode::BodySchema;
use crate::diagnostics::Diagnostics;
use crate::eval::EvalContext;
use crate::package::{Downloader, Package};
use crate::value::Value;
use crate::version::{Constraints, Version};

use super::{attribute_value, string_attribute};

/// Running version that accepts any declared constraint.
pub const DEVELOPMENT_VERSION: &str = "development";

const SWITCHBOARD_BLOCK: &str = "switchboard";
const REQUIRED_PROVIDER_BLOCK: &str = "required_provider";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchboardMode {
    /// Every required provider must already be in the package cache.
    Validate,
    /// Create the package cache and download whatever is missing from it.
    Init,
}

/// Resolve the single `switchboard` block: the version constraint and the required providers.
pub fn resolve_switchboard(
    body: &Body,
    ctx: &EvalContext,
    running_version: &str,
    mode: SwitchboardMode,
    downloader: &dyn Downloader,
) -> Result<SwitchboardBlock, Diagnostics> {
    debug!(?mode, "resolving switchboard block");
    if mode == SwitchboardMode::Init {
        if let Err(err) = downloader.ensure_package_root() {
            let mut diags = Diagnostics::new();
            diags.error(
                "Could not create package directory",
                format!("Could not create the package cache. Reason: {}", err),
                None,
            );
            return Err(diags);
        }
    }

    let block = single_switchboard_block(body)?;
    let schema = BodySchema::new()
        .attribute("version", true)
        .block(REQUIRED_PROVIDER_BLOCK, &["name"]);
    let (content, diags) = block.body.content(&schema);
    if diags.has_errors() {
        return Err(diags);
    }
    let Some(version_attr) = content.attribute("version") else {
        return Err(diags);
    };

    let version = check_version(version_attr, running_version, ctx)?;
    let required = required_providers(content.blocks_of(REQUIRED_PROVIDER_BLOCK), ctx)?;

    match mode {
        SwitchboardMode::Validate => verify_packages(&required, downloader, version_attr)?,
        SwitchboardMode::Init => download_missing(&required, downloader, version_attr)?,
    }

    Ok(SwitchboardBlock {
        version,
        required_providers: required.into_iter().map(|(provider, _)| provider).collect(),
    })
}

fn single_switchboard_block(body: &Body) -> Result<&Block, Diagnostics> {
    let (content, _, mut diags) = body.partial_content(&BodySchema::new().block(SWITCHBOARD_BLOCK, &[]));
    let blocks: Vec<&Block> = content.blocks_of(SWITCHBOARD_BLOCK).collect();

    match blocks.as_slice() {
        [] if !diags.has_errors() => diags.error(
            "Missing switchboard block",
            "A switchboard block with a version constraint is required.",
            Some(&content.missing_item),
        ),
        [] => {}
        [first, rest @ ..] => {
            for extra in rest {
                diags.error(
                    "Duplicate switchboard block",
                    format!("Only one switchboard block is allowed; the first was defined at {}.", first.pos),
                    Some(&extra.pos),
                );
            }
            if !diags.has_errors() {
                return Ok(*first);
            }
        }
    }
    Err(diags)
}

/// The declared version constraint, checked against the running version.
fn check_version(attr: &Attribute, running_version: &str, ctx: &EvalContext) -> Result<String, Diagnostics> {
    let mut diags = Diagnostics::new();
    let declared = match attribute_value(attr, ctx, &mut diags) {
        Some(Value::String(s)) => s,
        Some(other) => {
            diags.error(
                "Invalid type provided for version",
                format!("Invalid version provided. Expected string. Got {}", other.ty()),
                Some(attr.expr.pos()),
            );
            return Err(diags);
        }
        None => return Err(diags),
    };

    if running_version == DEVELOPMENT_VERSION {
        debug!(constraint = %declared, "development build, skipping version check");
        return Ok(declared);
    }

    let current = match Version::parse(running_version) {
        Ok(v) => v,
        Err(err) => {
            diags.error(
                "Invalid version of CLI",
                format!(
                    "Invalid version of CLI provided. If you are in development, set it to a valid semver value. Error: {}",
                    err
                ),
                Some(attr.expr.pos()),
            );
            return Err(diags);
        }
    };
    let constraints = match Constraints::parse(&declared) {
        Ok(c) => c,
        Err(err) => {
            diags.error(
                "Invalid value provided for version",
                format!("{}. Use a constraint such as \"~> 1.2\" or \">= 1.0, < 2.0\".", err),
                Some(attr.expr.pos()),
            );
            return Err(diags);
        }
    };

    if !constraints.check(&current) {
        diags.error(
            "Switchboard version does not match expected version",
            format!(
                "Expected version to match constraint '{}'. Current version of Switchboard is {}",
                declared, running_version
            ),
            Some(attr.expr.pos()),
        );
        return Err(diags);
    }
    Ok(declared)
}

fn required_providers<'a>(
    blocks: impl Iterator<Item = &'a Block>,
    ctx: &EvalContext,
) -> Result<Vec<(RequiredProvider, &'a Pos)>, Diagnostics> {
    let mut diags = Diagnostics::new();
    let mut seen: IndexMap<&str, &Pos> = IndexMap::new();
    let mut out = Vec::new();

    for block in blocks {
        let name = block.labels[0].as_str();
        if let Some(first) = seen.get(name) {
            diags.error(
                "Duplicate required provider",
                format!("A required provider named \"{}\" was already declared at {}.", name, first),
                Some(&block.pos),
            );
            continue;
        }
        seen.insert(name, &block.pos);

        let schema = BodySchema::new().attribute("source", true).attribute("version", true);
        let (content, block_diags) = block.body.content(&schema);
        let failed = block_diags.has_errors();
        diags.extend(block_diags);
        if failed {
            continue;
        }

        let source = content.attribute("source").and_then(|a| string_attribute(a, ctx, &mut diags));
        let version = content.attribute("version").and_then(|a| string_attribute(a, ctx, &mut diags));
        if let (Some(source), Some(version)) = (source, version) {
            debug!(provider = %name, %source, %version, "required provider resolved");
            out.push((
                RequiredProvider {
                    name: name.to_string(),
                    source,
                    version,
                },
                &block.pos,
            ));
        }
    }

    diags.into_result(out)
}

fn verify_packages(
    required: &[(RequiredProvider, &Pos)],
    downloader: &dyn Downloader,
    version_attr: &Attribute,
) -> Result<(), Diagnostics> {
    let mut diags = Diagnostics::new();
    let downloaded = match downloader.downloaded_providers() {
        Ok(packages) => packages,
        Err(err) => {
            diags.error(
                "Could not find downloaded packages",
                format!("Packages could not be found. Run `switchboard init`. Reason: {}", err),
                Some(version_attr.expr.pos()),
            );
            return Err(diags);
        }
    };

    for (provider, pos) in required {
        if !downloaded.contains(&Package::of(provider)) {
            diags.error(
                "Plugin package missing",
                format!(
                    "plugin '{}', version '{}' is missing. Run `switchboard init` to download missing packages",
                    provider.name, provider.version
                ),
                Some(pos),
            );
        }
    }
    diags.into_result(())
}

fn download_missing(
    required: &[(RequiredProvider, &Pos)],
    downloader: &dyn Downloader,
    version_attr: &Attribute,
) -> Result<(), Diagnostics> {
    let mut diags = Diagnostics::new();
    let downloaded = downloader.downloaded_providers().unwrap_or_else(|err| {
        diags.error(
            "Could not list downloaded providers",
            format!("Could not get the list of downloaded providers. Reason: {}", err),
            Some(version_attr.expr.pos()),
        );
        Vec::new()
    });

    for (provider, pos) in required {
        if downloaded.contains(&Package::of(provider)) {
            debug!(provider = %provider.name, "package already cached");
            continue;
        }
        match downloader.download_provider(&provider.source, &provider.version) {
            Ok(()) => info!(provider = %provider.name, "downloaded {}@{}", provider.source, provider.version),
            Err(err) => diags.error(
                "Unable to download required provider",
                format!("Provider: {}@{}, Reason: {}", provider.source, provider.version, err),
                Some(pos),
            ),
        }
    }
    diags.into_result(())
}

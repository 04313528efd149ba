#[cfg(test)]
use super::*;
use std::cell::RefCell;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::Body;
use crate::loader::load_str;
use crate::package::{DownloadError, Downloader, Package};
use crate::plugin::{BuiltinLauncher, PluginRegistry, StaticProvider};
use crate::spec::{ConstraintNode, FormatKind, PrimitiveType, Spec};
use crate::config::RequiredProvider;

fn body(input: &str) -> Body {
    load_str("main.hcl", input).expect("Failed to load configuration").body
}

fn summaries(diags: &Diagnostics) -> Vec<String> {
    diags.iter().map(|d| d.summary.clone()).collect()
}

fn overrides(entries: &[(&str, Value)]) -> IndexMap<String, Value> {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// In-memory package cache.
#[derive(Default)]
struct MockDownloader {
    cached: Vec<Package>,
    unlistable: bool,
    broken_root: bool,
    failing_sources: Vec<String>,
    downloads: RefCell<Vec<(String, String)>>,
}

impl Downloader for MockDownloader {
    fn ensure_package_root(&self) -> Result<(), DownloadError> {
        if self.broken_root {
            return Err(DownloadError::Disabled);
        }
        Ok(())
    }

    fn downloaded_providers(&self) -> Result<Vec<Package>, DownloadError> {
        if self.unlistable {
            return Err(DownloadError::Disabled);
        }
        Ok(self.cached.clone())
    }

    fn download_provider(&self, source: &str, version: &str) -> Result<(), DownloadError> {
        if self.failing_sources.iter().any(|s| s == source) {
            return Err(DownloadError::Fetch {
                url: source.to_string(),
                message: "404 Not Found".into(),
            });
        }
        self.downloads.borrow_mut().push((source.to_string(), version.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------- variables

#[test]
fn test_variable_resolved_from_override() {
    let body = body("variable \"service_user\" {\n  type = string\n}\n");
    let vars = resolve_variables(&body, &overrides(&[("service_user", Value::string("joe"))]))
        .expect("Failed to resolve variables");

    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].name, "service_user");
    assert_eq!(vars[0].ty, Type::String);
    assert_eq!(vars[0].value, Value::string("joe"));
}

#[test]
fn test_variable_without_default_or_override() {
    let body = body("variable \"service_user\" {\n  type = string\n}\n");
    let diags = resolve_variables(&body, &IndexMap::new()).expect_err("Expected missing value error");

    assert_eq!(summaries(&diags), vec!["No default or override value provided"]);
    assert!(diags.iter().all(|d| d.subject.is_some()));
}

#[test]
fn test_variable_default_and_override_precedence() {
    let input = r#"
variable "region" {
  type    = string
  default = "us-east-1"
}

variable "ports" {
  type    = list(number)
  default = [80, 443]
}

variable "debug" {
  type    = boolean
  default = false
}
"#;
    let body = body(input);
    let vars = resolve_variables(&body, &overrides(&[("debug", Value::Bool(true))]))
        .expect("Failed to resolve variables");

    assert_eq!(vars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(), vec!["region", "ports", "debug"]);
    assert_eq!(vars[0].value, Value::string("us-east-1"));
    assert_eq!(vars[1].ty, Type::list(Type::Number));
    assert_eq!(vars[1].value, Value::List(vec![Value::Number(80.0), Value::Number(443.0)]));
    assert_eq!(vars[2].value, Value::Bool(true));
}

#[test]
fn test_variable_type_must_use_symbols() {
    let body = body("variable \"name\" {\n  type    = \"string\"\n  default = \"x\"\n}\n");
    let diags = resolve_variables(&body, &IndexMap::new()).expect_err("Expected type error");

    assert_eq!(summaries(&diags), vec!["Incorrect attribute value type"]);
    assert!(diags.iter().next().is_some_and(|d| d.detail.contains("variable required")));
}

#[test]
fn test_variable_unsupported_type() {
    let body = body("variable \"nested\" {\n  type    = list(list(string))\n  default = []\n}\n");
    let diags = resolve_variables(&body, &IndexMap::new()).expect_err("Expected unsupported type");
    assert_eq!(summaries(&diags), vec!["Unsupported variable type"]);
}

#[test]
fn test_variable_type_mismatches() {
    let input = r#"
variable "count" {
  type    = number
  default = "three"
}

variable "name" {
  type = string
}
"#;
    let body = body(input);
    let diags = resolve_variables(&body, &overrides(&[("name", Value::Number(1.0))]))
        .expect_err("Expected type errors");

    assert_eq!(
        summaries(&diags),
        vec!["Incorrect attribute value type", "Incorrect override value type"]
    );
    assert!(diags.iter().nth(1).is_some_and(|d| d.detail.contains("Expected 'string', Got 'number'")));
}

#[test]
fn test_duplicate_variable() {
    let input = "variable \"a\" {\n  type = string\n  default = \"x\"\n}\nvariable \"a\" {\n  type = string\n  default = \"y\"\n}\n";
    let diags = resolve_variables(&body(input), &IndexMap::new()).expect_err("Expected duplicate error");
    assert_eq!(summaries(&diags), vec!["Duplicate variable"]);
}

#[test]
fn test_variable_rejects_unknown_attribute() {
    let input = "variable \"a\" {\n  type = string\n  default = \"x\"\n  description = \"nope\"\n}\n";
    let diags = resolve_variables(&body(input), &IndexMap::new()).expect_err("Expected unsupported argument");
    assert_eq!(summaries(&diags), vec!["Unsupported argument"]);
}

// ---------------------------------------------------------------- switchboard

const SWITCHBOARD: &str = r#"
switchboard {
  version = "~> 1.0"

  required_provider "aws" {
    source  = "github.com/switchboard-org/provider-aws"
    version = "1.2.0"
  }

  required_provider "gcp" {
    source  = "github.com/switchboard-org/provider-gcp"
    version = gcp_version
  }
}
"#;

fn switchboard_ctx() -> EvalContext {
    EvalContext::new().with_variable("gcp_version", Value::string("0.3.1"))
}

fn cached_all() -> MockDownloader {
    MockDownloader {
        cached: vec![Package::new("provider-aws", "1.2.0"), Package::new("provider-gcp", "0.3.1")],
        ..MockDownloader::default()
    }
}

#[test]
fn test_switchboard_resolves_required_providers() {
    let downloader = cached_all();
    let block = resolve_switchboard(&body(SWITCHBOARD), &switchboard_ctx(), "1.4.0", SwitchboardMode::Validate, &downloader)
        .expect("Failed to resolve switchboard block");

    assert_eq!(block.version, "~> 1.0");
    assert_eq!(
        block.required_providers,
        vec![
            RequiredProvider {
                name: "aws".into(),
                source: "github.com/switchboard-org/provider-aws".into(),
                version: "1.2.0".into(),
            },
            RequiredProvider {
                name: "gcp".into(),
                source: "github.com/switchboard-org/provider-gcp".into(),
                version: "0.3.1".into(),
            },
        ]
    );
}

#[test]
fn test_switchboard_version_mismatch_is_single_diagnostic() {
    let downloader = MockDownloader::default();
    let diags = resolve_switchboard(&body(SWITCHBOARD), &switchboard_ctx(), "2.0.0", SwitchboardMode::Validate, &downloader)
        .expect_err("2.0.0 does not satisfy ~> 1.0");

    assert_eq!(diags.len(), 1);
    assert_eq!(summaries(&diags), vec!["Switchboard version does not match expected version"]);
}

#[test]
fn test_switchboard_development_version_skips_check() {
    let downloader = cached_all();
    let input = SWITCHBOARD.replace("~> 1.0", ">= 99.0");
    let block = resolve_switchboard(&body(&input), &switchboard_ctx(), DEVELOPMENT_VERSION, SwitchboardMode::Validate, &downloader)
        .expect("development builds accept any constraint");
    assert_eq!(block.version, ">= 99.0");
}

#[test]
fn test_switchboard_invalid_versions() {
    let downloader = cached_all();
    let diags = resolve_switchboard(&body(SWITCHBOARD), &switchboard_ctx(), "not-a-version", SwitchboardMode::Validate, &downloader)
        .expect_err("running version is malformed");
    assert_eq!(summaries(&diags), vec!["Invalid version of CLI"]);

    let input = SWITCHBOARD.replace("\"~> 1.0\"", "1");
    let diags = resolve_switchboard(&body(&input), &switchboard_ctx(), "1.0.0", SwitchboardMode::Validate, &downloader)
        .expect_err("version must be a string");
    assert_eq!(summaries(&diags), vec!["Invalid type provided for version"]);

    let input = SWITCHBOARD.replace("~> 1.0", "about one");
    let diags = resolve_switchboard(&body(&input), &switchboard_ctx(), "1.0.0", SwitchboardMode::Validate, &downloader)
        .expect_err("constraint is malformed");
    assert_eq!(summaries(&diags), vec!["Invalid value provided for version"]);
}

#[test]
fn test_switchboard_reports_every_missing_package() {
    let downloader = MockDownloader::default();
    let diags = resolve_switchboard(&body(SWITCHBOARD), &switchboard_ctx(), "1.0.0", SwitchboardMode::Validate, &downloader)
        .expect_err("nothing is cached");

    assert_eq!(summaries(&diags), vec!["Plugin package missing", "Plugin package missing"]);
    assert!(diags.iter().next().is_some_and(|d| d.detail.contains("plugin 'aws', version '1.2.0' is missing")));
}

#[test]
fn test_switchboard_required_provider_errors_accumulate() {
    let input = r#"
switchboard {
  version = "~> 1.0"

  required_provider "aws" {
    source  = "github.com/switchboard-org/provider-aws"
    version = 1
  }

  required_provider "gcp" {
    source  = "github.com/switchboard-org/provider-gcp"
    version = unknown_version
  }
}
"#;
    let downloader = MockDownloader::default();
    let diags = resolve_switchboard(&body(input), &EvalContext::new(), "1.0.0", SwitchboardMode::Validate, &downloader)
        .expect_err("both required providers are broken");

    assert_eq!(summaries(&diags), vec!["Incorrect attribute value type", "Unknown variable"]);
}

#[test]
fn test_switchboard_block_count() {
    let downloader = MockDownloader::default();
    let diags = resolve_switchboard(&body("variable \"a\" {\n  type = string\n}\n"), &EvalContext::new(), "1.0.0", SwitchboardMode::Validate, &downloader)
        .expect_err("no switchboard block");
    assert_eq!(summaries(&diags), vec!["Missing switchboard block"]);

    let input = "switchboard {\n  version = \"~> 1.0\"\n}\nswitchboard {\n  version = \"~> 1.0\"\n}\n";
    let diags = resolve_switchboard(&body(input), &EvalContext::new(), "1.0.0", SwitchboardMode::Validate, &downloader)
        .expect_err("two switchboard blocks");
    assert_eq!(summaries(&diags), vec!["Duplicate switchboard block"]);
}

#[test]
fn test_switchboard_init_downloads_missing_packages() {
    let downloader = MockDownloader {
        cached: vec![Package::new("provider-aws", "1.2.0")],
        ..MockDownloader::default()
    };
    resolve_switchboard(&body(SWITCHBOARD), &switchboard_ctx(), "1.0.0", SwitchboardMode::Init, &downloader)
        .expect("init should succeed");

    assert_eq!(
        downloader.downloads.borrow().clone(),
        vec![("github.com/switchboard-org/provider-gcp".to_string(), "0.3.1".to_string())]
    );
}

#[test]
fn test_switchboard_init_keeps_going_after_failed_download() {
    let downloader = MockDownloader {
        failing_sources: vec!["github.com/switchboard-org/provider-aws".into()],
        ..MockDownloader::default()
    };
    let diags = resolve_switchboard(&body(SWITCHBOARD), &switchboard_ctx(), "1.0.0", SwitchboardMode::Init, &downloader)
        .expect_err("aws download fails");

    assert_eq!(summaries(&diags), vec!["Unable to download required provider"]);
    assert_eq!(downloader.downloads.borrow().len(), 1);
}

#[test]
fn test_switchboard_init_fails_without_package_root() {
    let downloader = MockDownloader {
        broken_root: true,
        ..MockDownloader::default()
    };
    let diags = resolve_switchboard(&body(SWITCHBOARD), &switchboard_ctx(), "1.0.0", SwitchboardMode::Init, &downloader)
        .expect_err("package root cannot be created");

    assert_eq!(summaries(&diags), vec!["Could not create package directory"]);
    assert!(downloader.downloads.borrow().is_empty());
}

// ---------------------------------------------------------------- providers

fn aws_schema() -> Value {
    Value::object([
        ("region", ConstraintNode::new(FormatKind::String, true, None).to_value()),
        ("retries", ConstraintNode::new(FormatKind::Number, false, None).to_value()),
    ])
}

fn aws_launcher() -> BuiltinLauncher {
    BuiltinLauncher::new().register("provider-aws", Arc::new(StaticProvider::new(aws_schema())))
}

fn aws_required(name: &str) -> RequiredProvider {
    RequiredProvider {
        name: name.into(),
        source: "github.com/switchboard-org/provider-aws".into(),
        version: "1.2.0".into(),
    }
}

#[test]
fn test_provider_payload_decoded_with_plugin_schema() {
    let launcher = aws_launcher();
    let mut registry = PluginRegistry::new(&launcher);
    registry.load_plugin(&aws_required("aws")).expect("Failed to load plugin");

    let ctx = EvalContext::new().with_variable("region", Value::string("eu-west-1"));
    let providers = resolve_providers(&body("provider \"aws\" {\n  region = region\n}\n"), &ctx, &mut registry)
        .expect("Failed to resolve providers");

    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].block_name, "aws");
    assert_eq!(providers[0].provider_name, "aws");
    assert_eq!(
        providers[0].init_payload,
        Value::object([("region", Value::string("eu-west-1")), ("retries", Value::Null)])
    );
}

#[test]
fn test_provider_remapped_to_required_provider() {
    let launcher = aws_launcher();
    let mut registry = PluginRegistry::new(&launcher);
    registry.load_plugin(&aws_required("aws")).expect("Failed to load plugin");

    let input = "provider \"aws_west\" {\n  required_provider = \"aws\"\n  region = \"us-west-2\"\n  retries = 3\n}\n";
    let providers = resolve_providers(&body(input), &EvalContext::new(), &mut registry)
        .expect("Failed to resolve providers");

    assert_eq!(providers[0].block_name, "aws_west");
    assert_eq!(providers[0].provider_name, "aws");
    assert_eq!(providers[0].init_payload.get_attr("retries"), Some(&Value::Number(3.0)));
}

#[test]
fn test_provider_failures_accumulate_per_block() {
    let launcher = aws_launcher();
    let mut registry = PluginRegistry::new(&launcher);
    registry.load_plugin(&aws_required("aws")).expect("Failed to load plugin");

    let input = r#"
provider "gcp" {
  project = "demo"
}

provider "aws" {
  retries = "many"
  zone    = "a"
}
"#;
    let diags = resolve_providers(&body(input), &EvalContext::new(), &mut registry)
        .expect_err("both providers are broken");

    assert_eq!(
        summaries(&diags),
        vec![
            "Could not get plugin provider instance",
            "Missing required argument",
            "Unsupported argument",
            "Incorrect attribute value type",
        ]
    );
}

// ---------------------------------------------------------------- schemas

#[test]
fn test_schema_with_key_and_variants() {
    let input = r#"
schema "customer" {
  is_list = true
  format = {
    name = req(key(string))
    size = number
  }

  variant "business" {
    key    = "business"
    format = {
      tax_id = req(string)
      tags   = list(string)
    }
  }
}
"#;
    let schemas = resolve_schemas(&body(input), &EvalContext::new()).expect("Failed to resolve schemas");
    assert_eq!(schemas.len(), 1);

    let schema = &schemas[0];
    assert_eq!(schema.name, "customer");
    assert!(schema.is_list);
    let fields = schema.format.children().expect("root format has fields");
    assert_eq!(
        fields.get("name"),
        Some(&Spec::Primitive { ty: PrimitiveType::String, required: true, is_key: true })
    );
    assert_eq!(
        fields.get("size"),
        Some(&Spec::Primitive { ty: PrimitiveType::Number, required: false, is_key: false })
    );

    let variant = schema.variant("business").expect("business variant");
    assert_eq!(variant.key, "business");
    assert!(variant.format.children().is_some_and(|f| f.contains_key("tax_id")));
}

#[test]
fn test_schema_variant_with_numeric_key() {
    let input = r#"
schema "order" {
  format = {
    code = req(key(number))
  }

  variant "one" {
    key    = 1
    format = {
      amount = number
    }
  }

  variant "flagged" {
    key    = true
    format = {
      reason = string
    }
  }
}
"#;
    let schemas = resolve_schemas(&body(input), &EvalContext::new()).expect("Failed to resolve schemas");
    let schema = &schemas[0];
    assert_eq!(schema.variant("one").map(|v| v.key.as_str()), Some("1"));
    assert_eq!(schema.variant("flagged").map(|v| v.key.as_str()), Some("true"));

    let diags = resolve_schemas(
        &body("schema \"s\" {\n  format = { a = key(string) }\n  variant \"v\" {\n    key = [1]\n    format = { b = string }\n  }\n}\n"),
        &EvalContext::new(),
    )
    .expect_err("list keys are rejected");
    assert_eq!(summaries(&diags), vec!["Incorrect attribute value type"]);
}

#[test]
fn test_schema_is_list_defaults_to_false() {
    let schemas = resolve_schemas(&body("schema \"s\" {\n  format = { a = string }\n}\n"), &EvalContext::new())
        .expect("Failed to resolve schemas");
    assert!(!schemas[0].is_list);
}

#[test]
fn test_schema_errors_accumulate_across_blocks() {
    let input = r#"
schema "first" {
  format = {
    name = string
  }

  variant "v" {
    key    = "v"
    format = {
      id = key(string)
    }
  }
}

schema "second" {
  format = {
    bad = "string"
  }
}
"#;
    let diags = resolve_schemas(&body(input), &EvalContext::new()).expect_err("both schemas are broken");

    assert_eq!(summaries(&diags), vec!["Invalid 'format' value", "Invalid 'format' value"]);
    assert!(diags
        .iter()
        .next()
        .is_some_and(|d| d.detail.contains("cannot use key() function outside of the base level")));
}

#[test]
fn test_schema_format_sees_variables() {
    let ctx = EvalContext::new().with_variable("flag", Value::Bool(true));
    let schemas = resolve_schemas(&body("schema \"s\" {\n  is_list = flag\n  format = { a = string }\n}\n"), &ctx)
        .expect("Failed to resolve schemas");
    assert!(schemas[0].is_list);
}

#[test]
fn test_duplicate_schema() {
    let input = "schema \"s\" {\n  format = { a = string }\n}\nschema \"s\" {\n  format = { b = string }\n}\n";
    let diags = resolve_schemas(&body(input), &EvalContext::new()).expect_err("duplicate schema");
    assert_eq!(summaries(&diags), vec!["Duplicate schema"]);
}

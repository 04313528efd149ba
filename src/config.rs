// Author: Dustin Pilgrim
// License: MIT

//! Resolved configuration produced by a successful parse.

use indexmap::IndexMap;
use serde::Serialize;

use crate::eval::EvalContext;
use crate::spec::Spec;
use crate::value::{Type, Value};

/// Name under which resolved schemas are exposed to expressions.
pub const SCHEMAS_SYMBOL: &str = "schemas";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredProvider {
    pub name: String,
    pub source: String,
    pub version: String,
}

impl RequiredProvider {
    /// Cache identity of the provider package.
    pub fn package_name(&self) -> &str {
        crate::utils::package_name(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SwitchboardBlock {
    pub version: String,
    pub required_providers: Vec<RequiredProvider>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provider {
    pub block_name: String,
    /// Required provider this block configures; the block name unless remapped.
    pub provider_name: String,
    pub init_payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub name: String,
    pub key: String,
    pub format: Spec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub name: String,
    pub is_list: bool,
    pub format: Spec,
    pub variants: Vec<Variant>,
}

impl Schema {
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RootConfig {
    pub variables: Vec<Variable>,
    pub switchboard: SwitchboardBlock,
    pub providers: Vec<Provider>,
    pub schemas: Vec<Schema>,
}

impl RootConfig {
    /// Context for evaluating expressions against what has been resolved so far:
    /// every variable by name, plus `schemas` (schema name to index) once schemas exist.
    pub fn eval_context(&self) -> EvalContext {
        let mut ctx = EvalContext::new();
        for variable in &self.variables {
            ctx.variables.insert(variable.name.clone(), variable.value.clone());
        }
        if !self.schemas.is_empty() {
            let indexes: IndexMap<String, Value> = self
                .schemas
                .iter()
                .enumerate()
                .map(|(i, schema)| (schema.name.clone(), Value::Number(i as f64)))
                .collect();
            ctx.variables.insert(SCHEMAS_SYMBOL.to_string(), Value::Object(indexes));
        }
        ctx
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn provider(&self, block_name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.block_name == block_name)
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }
}

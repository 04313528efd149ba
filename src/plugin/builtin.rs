use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::RequiredProvider;
use crate::value::Value;

use super::{PluginClient, PluginError, PluginLauncher, ProviderPlugin};

/// Serves providers that live in this process, keyed by package name.
#[derive(Default)]
pub struct BuiltinLauncher {
    providers: IndexMap<String, Arc<dyn ProviderPlugin>>,
}

impl BuiltinLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, package_name: impl Into<String>, provider: Arc<dyn ProviderPlugin>) -> Self {
        self.providers.insert(package_name.into(), provider);
        self
    }
}

impl PluginLauncher for BuiltinLauncher {
    fn launch(&self, provider: &RequiredProvider) -> Result<Box<dyn PluginClient>, PluginError> {
        let package = provider.package_name();
        let instance = self.providers.get(package).ok_or_else(|| PluginError::Launch {
            name: provider.name.clone(),
            message: format!(
                "no plugin registered for package '{}' ({}@{})",
                package, provider.source, provider.version
            ),
        })?;
        Ok(Box::new(BuiltinClient {
            name: provider.name.clone(),
            provider: Some(Arc::clone(instance)),
        }))
    }
}

struct BuiltinClient {
    name: String,
    provider: Option<Arc<dyn ProviderPlugin>>,
}

impl PluginClient for BuiltinClient {
    fn dispense(&mut self) -> Result<Arc<dyn ProviderPlugin>, PluginError> {
        self.provider.clone().ok_or_else(|| PluginError::Dispense {
            name: self.name.clone(),
            message: "plugin has been killed".into(),
        })
    }

    fn kill(&mut self) {
        self.provider = None;
    }
}

/// Provider whose only behavior is a fixed init schema.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticProvider {
    schema: Value,
}

impl StaticProvider {
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }
}

impl ProviderPlugin for StaticProvider {
    fn init_schema(&self) -> Result<Value, PluginError> {
        Ok(self.schema.clone())
    }
}

// Author: Dustin Pilgrim
// License: MIT

//! Provider plugins and the registry that keeps them alive for one parse.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::config::RequiredProvider;
use crate::value::Value;

mod builtin;

pub use builtin::{BuiltinLauncher, StaticProvider};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("plugin '{0}' is already loaded")]
    AlreadyLoaded(String),
    #[error("plugin '{0}' is not available")]
    NotAvailable(String),
    #[error("plugin '{0}' is not loaded")]
    NotLoaded(String),
    #[error("could not start plugin '{name}': {message}")]
    Launch { name: String, message: String },
    #[error("plugin '{name}' did not hand out a provider: {message}")]
    Dispense { name: String, message: String },
    #[error("{0}")]
    Provider(String),
}

/// What a running provider plugin can do for the configuration engine.
pub trait ProviderPlugin: Send + Sync {
    /// Key/val format describing the attributes of a `provider` block.
    fn init_schema(&self) -> Result<Value, PluginError>;
}

/// Handle on one started plugin.
pub trait PluginClient {
    fn dispense(&mut self) -> Result<Arc<dyn ProviderPlugin>, PluginError>;
    fn kill(&mut self);
}

/// Starts the plugin that serves a required provider.
pub trait PluginLauncher {
    fn launch(&self, provider: &RequiredProvider) -> Result<Box<dyn PluginClient>, PluginError>;
}

struct LoadedPlugin {
    provider: RequiredProvider,
    client: Box<dyn PluginClient>,
}

/// Plugins started for one parse, keyed by required provider name.
///
/// Every plugin still loaded when the registry is dropped gets killed.
pub struct PluginRegistry<'a> {
    launcher: &'a dyn PluginLauncher,
    plugins: Vec<LoadedPlugin>,
    instances: IndexMap<String, Arc<dyn ProviderPlugin>>,
}

impl<'a> PluginRegistry<'a> {
    pub fn new(launcher: &'a dyn PluginLauncher) -> Self {
        Self {
            launcher,
            plugins: Vec::new(),
            instances: IndexMap::new(),
        }
    }

    pub fn load_plugin(&mut self, provider: &RequiredProvider) -> Result<(), PluginError> {
        if self.plugins.iter().any(|p| p.provider.name == provider.name) {
            return Err(PluginError::AlreadyLoaded(provider.name.clone()));
        }
        let client = self.launcher.launch(provider)?;
        debug!(plugin = %provider.name, source = %provider.source, version = %provider.version, "plugin loaded");
        self.plugins.push(LoadedPlugin {
            provider: provider.clone(),
            client,
        });
        Ok(())
    }

    pub fn plugin_client(&mut self, name: &str) -> Result<&mut dyn PluginClient, PluginError> {
        let plugin = self
            .plugins
            .iter_mut()
            .find(|p| p.provider.name == name)
            .ok_or_else(|| PluginError::NotAvailable(name.to_string()))?;
        Ok(plugin.client.as_mut())
    }

    /// Provider capability of a loaded plugin. Dispensed once per name.
    pub fn provider_instance(&mut self, name: &str) -> Result<Arc<dyn ProviderPlugin>, PluginError> {
        if let Some(existing) = self.instances.get(name) {
            return Ok(Arc::clone(existing));
        }
        let provider = self.plugin_client(name)?.dispense()?;
        self.instances.insert(name.to_string(), Arc::clone(&provider));
        Ok(provider)
    }

    pub fn kill_plugin(&mut self, name: &str) -> Result<(), PluginError> {
        let index = self
            .plugins
            .iter()
            .position(|p| p.provider.name == name)
            .ok_or_else(|| PluginError::NotLoaded(name.to_string()))?;
        let mut plugin = self.plugins.remove(index);
        plugin.client.kill();
        self.instances.shift_remove(name);
        debug!(plugin = %name, "plugin killed");
        Ok(())
    }

    pub fn kill_all(&mut self) {
        for mut plugin in self.plugins.drain(..) {
            plugin.client.kill();
            debug!(plugin = %plugin.provider.name, "plugin killed");
        }
        self.instances.clear();
    }

    /// `name (source@version)` for every loaded plugin.
    pub fn loaded_plugins(&self) -> Vec<String> {
        self.plugins
            .iter()
            .map(|p| format!("{} ({}@{})", p.provider.name, p.provider.source, p.provider.version))
            .collect()
    }
}

impl Drop for PluginRegistry<'_> {
    fn drop(&mut self) {
        self.kill_all();
    }
}

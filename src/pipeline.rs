// Author: Dustin Pilgrim
// License: MIT

//! Runs the stages over a configuration directory.
//!
//! Each stage only starts when the one before it produced no errors, and a
//! failed run returns the diagnostics of the stage that failed and nothing else.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::ast::{Body, Document};
use crate::config::{Provider, RootConfig, SwitchboardBlock};
use crate::diagnostics::Diagnostics;
use crate::eval::EvalContext;
use crate::loader::{load_dir, load_overrides};
use crate::package::{Downloader, PackageCache};
use crate::plugin::{BuiltinLauncher, PluginLauncher, PluginRegistry};
use crate::stages::{resolve_providers, resolve_schemas, resolve_switchboard, resolve_variables, SwitchboardMode};
use crate::value::Value;

pub struct Pipeline {
    working_dir: PathBuf,
    var_file: PathBuf,
    version: String,
    downloader: Box<dyn Downloader>,
    launcher: Box<dyn PluginLauncher>,
}

impl Pipeline {
    /// Pipeline over `working_dir`, with its package cache under
    /// `working_dir/.switchboard/packages` and only in-process plugins.
    pub fn new(working_dir: impl Into<PathBuf>, var_file: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        let working_dir = working_dir.into();
        let downloader = Box::new(PackageCache::new(&working_dir));
        Self {
            working_dir,
            var_file: var_file.into(),
            version: version.into(),
            downloader,
            launcher: Box::new(BuiltinLauncher::new()),
        }
    }

    pub fn with_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
        self.downloader = Box::new(downloader);
        self
    }

    pub fn with_launcher(mut self, launcher: impl PluginLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn var_file(&self) -> &Path {
        &self.var_file
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Load the working directory and resolve it completely.
    pub fn parse(&self) -> Result<RootConfig, Diagnostics> {
        let (document, overrides) = self.load()?;
        self.parse_document(&document, &overrides)
    }

    /// Load the working directory and fetch every required provider that is not cached yet.
    pub fn init(&self) -> Result<SwitchboardBlock, Diagnostics> {
        let (document, overrides) = self.load()?;
        self.init_document(&document, &overrides)
    }

    pub fn parse_document(
        &self,
        document: &Document,
        overrides: &IndexMap<String, Value>,
    ) -> Result<RootConfig, Diagnostics> {
        let body = &document.body;
        let mut config = RootConfig {
            variables: resolve_variables(body, overrides)?,
            ..RootConfig::default()
        };

        let ctx = config.eval_context();
        config.switchboard = resolve_switchboard(
            body,
            &ctx,
            &self.version,
            SwitchboardMode::Validate,
            self.downloader.as_ref(),
        )?;
        config.providers = self.providers(body, &config.switchboard, &ctx)?;
        config.schemas = resolve_schemas(body, &config.eval_context())?;

        info!(
            variables = config.variables.len(),
            providers = config.providers.len(),
            schemas = config.schemas.len(),
            "configuration parsed"
        );
        Ok(config)
    }

    pub fn init_document(
        &self,
        document: &Document,
        overrides: &IndexMap<String, Value>,
    ) -> Result<SwitchboardBlock, Diagnostics> {
        let body = &document.body;
        let config = RootConfig {
            variables: resolve_variables(body, overrides)?,
            ..RootConfig::default()
        };
        let switchboard = resolve_switchboard(
            body,
            &config.eval_context(),
            &self.version,
            SwitchboardMode::Init,
            self.downloader.as_ref(),
        )?;

        info!(providers = switchboard.required_providers.len(), "initialization complete");
        Ok(switchboard)
    }

    fn load(&self) -> Result<(Document, IndexMap<String, Value>), Diagnostics> {
        debug!(dir = %self.working_dir.display(), var_file = %self.var_file.display(), "loading configuration");
        let document = load_dir(&self.working_dir)?;
        let overrides = load_overrides(&self.var_file)?;
        Ok((document, overrides))
    }

    /// Start a plugin per required provider, resolve the provider blocks, then kill every plugin.
    /// Plugins that fail to start are reported together with the provider diagnostics.
    fn providers(
        &self,
        body: &Body,
        switchboard: &SwitchboardBlock,
        ctx: &EvalContext,
    ) -> Result<Vec<Provider>, Diagnostics> {
        let mut registry = PluginRegistry::new(self.launcher.as_ref());
        let mut diags = Diagnostics::new();
        for required in &switchboard.required_providers {
            if let Err(err) = registry.load_plugin(required) {
                diags.error("Could not load plugin", err.to_string(), None);
            }
        }
        debug!(plugins = ?registry.loaded_plugins(), "plugins loaded");

        let resolved = resolve_providers(body, ctx, &mut registry);
        registry.kill_all();

        match resolved {
            Ok(providers) => diags.into_result(providers),
            Err(provider_diags) => {
                diags.extend(provider_diags);
                Err(diags)
            }
        }
    }
}

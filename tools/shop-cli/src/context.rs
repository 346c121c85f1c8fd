//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use shop_cache::Cache;
use shop_commerce::cart::{CartStore, CollectingNotifier};
use shop_commerce::catalog::{InMemoryCatalog, ProductCatalog, StockChecker};
use shop_data::HttpCatalog;

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the config was loaded from, if anywhere.
    pub config_path: Option<PathBuf>,
    /// Fixture used instead of the API.
    pub offline: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, offline: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        let offline = offline.map(|p| resolve(&cwd, p));

        Ok(Self {
            config,
            config_path,
            offline,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Directory the cart is persisted in.
    pub fn storage_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.storage.dir)
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve(&self.cwd, path)
    }

    /// Build the cart store, rehydrating the persisted cart.
    pub fn open_store(&self) -> Result<(CartStore, Arc<CollectingNotifier>)> {
        let dir = self.storage_dir();
        let cache = Cache::open_dir(&dir)
            .with_context(|| format!("Failed to open cart storage at {}", dir.display()))?;

        let (catalog, stock): (Arc<dyn ProductCatalog>, Arc<dyn StockChecker>) =
            match &self.offline {
                Some(path) => {
                    let json = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
                    let catalog = Arc::new(
                        InMemoryCatalog::from_json(&json)
                            .with_context(|| format!("Failed to parse fixture: {}", path.display()))?,
                    );
                    self.output
                        .debug(&format!("Using offline fixture {}", path.display()));
                    (catalog.clone(), catalog)
                }
                None => {
                    let catalog = Arc::new(
                        HttpCatalog::connect(&self.config.api.base_url, self.config.fetch_policy())
                            .context("Failed to create API client")?,
                    );
                    self.output
                        .debug(&format!("Using API at {}", self.config.api.base_url));
                    (catalog.clone(), catalog)
                }
            };

        let notices = Arc::new(CollectingNotifier::new());
        let store = CartStore::with_config(self.config.store_config(), cache, catalog, stock)
            .with_notifier(notices.clone());
        Ok((store, notices))
    }
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        cwd.join(path)
    }
}

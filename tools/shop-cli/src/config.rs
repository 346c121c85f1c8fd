//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shop_commerce::cart::{StoreConfig, DEFAULT_MAX_COMMIT_RETRIES, DEFAULT_NAMESPACE};
use shop_commerce::Currency;
use shop_data::{BackoffStrategy, FetchPolicy, RetryPolicy, TimeoutConfig};

/// File names searched for, in order, from the working directory upwards.
pub const CONFIG_NAMES: [&str; 3] = ["shop.toml", ".shop.toml", "shop.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Storefront API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the cart is persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Cart behaviour.
    #[serde(default)]
    pub cart: CartConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Fetch policy for the API client.
    pub fn fetch_policy(&self) -> FetchPolicy {
        let timeout = self.api.timeout_ms.map(TimeoutConfig::from_millis);
        let retry = match self.api.max_retries {
            0 => RetryPolicy::none(),
            n => RetryPolicy::new(n).with_backoff(BackoffStrategy::default()),
        };
        FetchPolicy::new(timeout, retry)
    }

    /// Settings for the cart store.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            notify_success: self.cart.notify_success,
            max_commit_retries: self.cart.max_commit_retries,
            ..StoreConfig::with_namespace(&self.storage.namespace)
        }
    }
}

/// Storefront API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL serving `/products/{id}` and `/stock/{id}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in milliseconds. Unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Retries for server errors, timeouts and connection failures.
    #[serde(default)]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:3333".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
            max_retries: 0,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted cart, relative to the working directory.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Namespace of the storage key (`<namespace>:cart`).
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_dir() -> String {
    ".shop".to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            namespace: default_namespace(),
        }
    }
}

/// Cart behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Print a confirmation after each successful change.
    #[serde(default)]
    pub notify_success: bool,

    /// Re-plans allowed when a concurrent change wins.
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,

    /// Currency prices are displayed in.
    #[serde(default)]
    pub currency: Currency,
}

fn default_max_commit_retries() -> u32 {
    DEFAULT_MAX_COMMIT_RETRIES
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            notify_success: false,
            max_commit_retries: default_max_commit_retries(),
            currency: Currency::default(),
        }
    }
}

/// Generate a default shop.toml config file.
pub fn generate_default_config() -> String {
    r#"# Storefront cart configuration

[api]
base_url = "http://localhost:3333"
# timeout_ms = 2000
max_retries = 0

[storage]
dir = ".shop"
namespace = "storefront"

[cart]
notify_success = true
max_commit_retries = 3
currency = "USD"
"#
    .to_string()
}

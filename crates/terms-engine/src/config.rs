use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Engine configuration, loaded from YAML.
///
/// Every field has a default so a partial (or absent) file still yields a
/// working engine.
#[derive(Debug, Clone, Deserialize)]
pub struct TermsConfig {
    /// Time-to-live for every cached resolution result, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Permission whose explicit grant exempts a user from the gate. Absent
    /// means nobody is exempt.
    #[serde(default)]
    pub exempt_permission: Option<String>,
    /// Slug consulted when a caller asks for "the" terms without naming one.
    #[serde(default = "default_slug")]
    pub default_slug: String,
    /// Whether acceptance writes persist the caller-supplied IP address.
    #[serde(default = "default_true")]
    pub store_ip_address: bool,
}

impl Default for TermsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            exempt_permission: None,
            default_slug: default_slug(),
            store_ip_address: default_true(),
        }
    }
}

impl TermsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// Default-value functions used by serde
// ---------------------------------------------------------------------------

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_slug() -> String {
    "site-terms".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load configuration from a YAML file.
///
/// If the file does not exist a default configuration is returned and a
/// warning is emitted, so the engine can start before any config has been
/// written.
pub fn load(path: &Path) -> anyhow::Result<TermsConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "configuration file not found; using defaults"
        );
        return Ok(TermsConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

    let config: TermsConfig = serde_yml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;

    Ok(config)
}

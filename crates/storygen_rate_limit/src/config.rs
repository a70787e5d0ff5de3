//! Configuration loading.
//!
//! Sources, lowest precedence first:
//! - Bundled defaults (include_str! from storygen.toml)
//! - `~/.config/storygen/storygen.toml`
//! - `./storygen.toml`
//! - An explicit file passed by the caller
//! - `STORYGEN__SECTION__KEY` environment variables

use crate::{ImagenSettings, ServerSettings, StorageSettings, StorySettings, Tier};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use storygen_error::{ConfigError, StorygenError, StorygenResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../storygen.toml");

/// Model-specific rate limit overrides.
///
/// ```toml
/// [providers.gemini.tiers.free.models."gemini-2.5-pro"]
/// rpm = 5
/// rpd = 100
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ModelTierConfig {
    /// Requests per minute limit (overrides tier default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,

    /// Tokens per minute limit (overrides tier default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpm: Option<u64>,

    /// Requests per day limit (overrides tier default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpd: Option<u32>,

    /// Maximum concurrent requests (overrides tier default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
}

/// Configuration for a specific API tier.
///
/// ```toml
/// [providers.imagen.tiers.standard]
/// name = "Standard"
/// rpm = 20
/// max_concurrent = 2
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TierConfig {
    /// Name of the tier
    pub name: String,

    /// Requests per minute limit
    #[serde(default)]
    pub rpm: Option<u32>,

    /// Tokens per minute limit
    #[serde(default)]
    pub tpm: Option<u64>,

    /// Requests per day limit
    #[serde(default)]
    pub rpd: Option<u32>,

    /// Maximum concurrent requests
    #[serde(default)]
    pub max_concurrent: Option<u32>,

    /// Model-specific rate limit overrides
    #[serde(default)]
    pub models: HashMap<String, ModelTierConfig>,
}

impl Tier for TierConfig {
    fn rpm(&self) -> Option<u32> {
        self.rpm
    }

    fn tpm(&self) -> Option<u64> {
        self.tpm
    }

    fn rpd(&self) -> Option<u32> {
        self.rpd
    }

    fn max_concurrent(&self) -> Option<u32> {
        self.max_concurrent
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TierConfig {
    /// A tier with no limits at all.
    pub fn unlimited() -> Self {
        Self {
            name: "Unlimited".to_string(),
            rpm: None,
            tpm: None,
            rpd: None,
            max_concurrent: None,
            models: HashMap::new(),
        }
    }

    /// Get a tier configuration with model-specific overrides applied.
    pub fn for_model(&self, model_name: &str) -> TierConfig {
        match self.models.get(model_name) {
            Some(model_config) => TierConfig {
                name: self.name.clone(),
                rpm: model_config.rpm.or(self.rpm),
                tpm: model_config.tpm.or(self.tpm),
                rpd: model_config.rpd.or(self.rpd),
                max_concurrent: model_config.max_concurrent.or(self.max_concurrent),
                models: HashMap::new(),
            },
            None => self.clone(),
        }
    }
}

/// Configuration for a specific provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Name of the default tier for this provider
    pub default_tier: String,

    /// Map of tier name to tier configuration
    pub tiers: HashMap<String, TierConfig>,
}

/// Top-level storygen configuration.
///
/// # Example
///
/// ```no_run
/// use storygen_rate_limit::StorygenConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = StorygenConfig::load(None)?;
/// let tier = config.get_tier("gemini", None).unwrap();
/// println!("Gemini RPM: {:?}", tier.rpm);
/// println!("Story model: {}", config.story.model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct StorygenConfig {
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Story model settings
    #[serde(default)]
    pub story: StorySettings,

    /// Image model settings
    #[serde(default)]
    pub imagen: ImagenSettings,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Web server settings
    #[serde(default)]
    pub server: ServerSettings,
}

fn config_error(context: &str, e: impl std::fmt::Display) -> StorygenError {
    StorygenError::from(ConfigError::new(format!("{}: {}", context, e)))
}

impl StorygenConfig {
    /// Load configuration from a single file, without defaults or overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> StorygenResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                config_error(
                    &format!("Failed to read configuration from {}", path.as_ref().display()),
                    e,
                )
            })?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))
    }

    /// Parse configuration from TOML text layered over the bundled defaults.
    pub fn from_toml_str(toml: &str) -> StorygenResult<Self> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| config_error("Failed to build configuration", e))?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))
    }

    /// Load configuration with every source layered in precedence order.
    ///
    /// Missing user files are skipped. Credential fallbacks from the
    /// environment are applied last (see [`StorygenConfig::apply_env_fallbacks`]).
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> StorygenResult<Self> {
        debug!("Loading configuration: env > explicit > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/storygen/storygen.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("storygen").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("STORYGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Self = builder
            .build()
            .map_err(|e| config_error("Failed to build configuration", e))?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))?;

        config.apply_env_fallbacks();
        Ok(config)
    }

    /// Fill unset credentials and locations from conventional variables.
    ///
    /// - `imagen.project`: `GOOGLE_CLOUD_PROJECT`, then `GOOGLE_CLOUD_PROJECT_ID`
    /// - `imagen.access_token`: `GOOGLE_OAUTH_ACCESS_TOKEN`
    /// - `storage.bucket`: `GCS_BUCKET_NAME`
    /// - `server.static_dir`: `STATIC_FILES_DIR`
    pub fn apply_env_fallbacks(&mut self) {
        self.apply_fallbacks(|name| std::env::var(name).ok());
    }

    /// Same as [`StorygenConfig::apply_env_fallbacks`] with a custom lookup.
    pub fn apply_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if self.imagen.project.is_none() {
            self.imagen.project =
                lookup("GOOGLE_CLOUD_PROJECT").or_else(|| lookup("GOOGLE_CLOUD_PROJECT_ID"));
        }
        if self.imagen.access_token.is_none() {
            self.imagen.access_token = lookup("GOOGLE_OAUTH_ACCESS_TOKEN");
        }
        if self.storage.bucket.is_none() {
            self.storage.bucket = lookup("GCS_BUCKET_NAME");
        }
        if self.server.static_dir.is_none() {
            self.server.static_dir = lookup("STATIC_FILES_DIR");
        }
    }

    /// Get tier configuration for a provider.
    ///
    /// Uses the provider's default tier when `tier_name` is `None`.
    #[instrument(skip(self))]
    pub fn get_tier(&self, provider: &str, tier_name: Option<&str>) -> Option<TierConfig> {
        let provider_config = self.providers.get(provider)?;
        let tier = tier_name.unwrap_or(&provider_config.default_tier);

        debug!(provider, tier, "Looking up tier configuration");

        provider_config.tiers.get(tier).cloned()
    }
}

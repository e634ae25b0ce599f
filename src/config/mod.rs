/// Cloud config loading for the DigitalOcean provider
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use ::config::{Config, File, FileFormat};

use crate::error::{Error, Result};

/// Environment variable holding the API key when no config file is used
pub const API_KEY_ENV: &str = "DO_API_KEY";
/// Environment variable holding the region when no config file is used
pub const REGION_ENV: &str = "DO_REGION_NAME";

/// Section holding the provider settings; names match case-insensitively
const GLOBAL_SECTION: &str = "global";

/// Provider configuration read from the `[Global]` section
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// DigitalOcean personal access token
    pub api_key: String,

    /// DigitalOcean region slug (e.g., "nyc1")
    pub region: String,
}

/// Errors raised while parsing a cloud config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] ::config::ConfigError),

    #[error("invalid section {0:?}")]
    UnknownSection(String),

    #[error("invalid variable {section}.{name}")]
    UnknownVariable { section: String, name: String },
}

/// Read the provider configuration from an optional config stream.
///
/// A missing stream is reported as [`Error::ConfigMissing`] so callers can
/// tell the operator to pass `--cloud-config`; syntax problems come back as
/// [`Error::Config`].
pub fn read_config<R: Read>(config: Option<R>) -> Result<ProviderConfig> {
    let Some(mut reader) = config else {
        return Err(Error::ConfigMissing);
    };

    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    Ok(ProviderConfig::parse(&text)?)
}

impl ProviderConfig {
    /// Parse gcfg text into a configuration.
    ///
    /// Only the `[Global]` section with `apikey` and `region` is accepted.
    /// Variables left out stay empty.
    pub fn parse(text: &str) -> std::result::Result<Self, ConfigError> {
        let sections: HashMap<String, HashMap<String, String>> = Config::builder()
            .add_source(File::from_str(text, FileFormat::Ini))
            .build()?
            .try_deserialize()?;

        let mut config = Self {
            api_key: String::new(),
            region: String::new(),
        };

        for (section, variables) in sections {
            if !section.eq_ignore_ascii_case(GLOBAL_SECTION) {
                return Err(ConfigError::UnknownSection(section));
            }

            for (name, value) in variables {
                match name.to_ascii_lowercase().as_str() {
                    "apikey" => config.api_key = value,
                    "region" => config.region = value,
                    _ => {
                        return Err(ConfigError::UnknownVariable {
                            section: GLOBAL_SECTION.to_string(),
                            name,
                        })
                    }
                }
            }
        }

        Ok(config)
    }

    /// Build a configuration from `DO_API_KEY` and `DO_REGION_NAME`.
    ///
    /// Returns `None` unless both variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok()?;
        let region = std::env::var(REGION_ENV).ok()?;

        if api_key.is_empty() || region.is_empty() {
            return None;
        }

        Some(Self { api_key, region })
    }

    /// Render the configuration as a gcfg file
    pub fn to_gcfg(&self) -> String {
        format!(
            "[Global]\napikey = {}\nregion = {}\n",
            self.api_key, self.region
        )
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        Self {
            api_key: "<digitalocean-api-token>".to_string(),
            region: "nyc1".to_string(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

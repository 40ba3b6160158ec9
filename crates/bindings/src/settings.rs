//! Engine settings.
//!
//! Loaded from an optional `config/storefront.toml`, overlaid by
//! `STOREFRONT__<SECTION>__<KEY>` environment variables. Every field has a
//! default, so an empty environment yields a working configuration.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use storefront_observability::LogSettings;

pub const DEFAULT_CONFIG_FILE: &str = "config/storefront.toml";
const ENV_PREFIX: &str = "STOREFRONT";

/// URL key generation policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlugSettings {
    /// Base slug when a display name slugifies to nothing.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Joins code suffixes and collision counters.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// First counter tried on a collision (`blue-shirt-2`).
    #[serde(default = "default_first_collision_suffix")]
    pub first_collision_suffix: u32,
    /// Append the product's default code to its slug.
    #[serde(default = "default_append_default_code")]
    pub append_default_code: bool,
}

fn default_placeholder() -> String {
    "product".to_string()
}

fn default_separator() -> String {
    "-".to_string()
}

fn default_first_collision_suffix() -> u32 {
    2
}

fn default_append_default_code() -> bool {
    true
}

impl Default for SlugSettings {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            separator: default_separator(),
            first_collision_suffix: default_first_collision_suffix(),
            append_default_code: default_append_default_code(),
        }
    }
}

/// Top-level storefront settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorefrontSettings {
    #[serde(default)]
    pub slug: SlugSettings,
    #[serde(default)]
    pub log: LogSettings,
}

impl StorefrontSettings {
    /// Load from [`DEFAULT_CONFIG_FILE`] (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Install the process-wide subscriber described by the `log` section.
    pub fn init_logging(&self) -> anyhow::Result<()> {
        storefront_observability::init_with(&self.log)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::load_layered(path, environment())
    }

    fn load_layered(path: &str, env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()?;

        let loaded: StorefrontSettings = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let placeholder = crate::slug::slugify(&self.slug.placeholder);
        if placeholder.is_empty() {
            return Err(ConfigError::Message(format!(
                "slug.placeholder {:?} does not produce a usable slug",
                self.slug.placeholder
            )));
        }
        if self.slug.separator.is_empty()
            || self.slug.separator.chars().any(|c| c.is_alphanumeric() || c.is_whitespace())
        {
            return Err(ConfigError::Message(format!(
                "slug.separator {:?} must be non-empty punctuation",
                self.slug.separator
            )));
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_policy() {
        let settings = StorefrontSettings::default();
        assert_eq!(settings.slug.placeholder, "product");
        assert_eq!(settings.slug.separator, "-");
        assert_eq!(settings.slug.first_collision_suffix, 2);
        assert!(settings.slug.append_default_code);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = StorefrontSettings::load_from("does/not/exist.toml").unwrap();
        assert_eq!(settings.slug, SlugSettings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = std::env::temp_dir().join(format!("storefront-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("storefront.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[slug]\nplaceholder = \"item\"\nfirst_collision_suffix = 1").unwrap();

        let settings = StorefrontSettings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.slug.placeholder, "item");
        assert_eq!(settings.slug.first_collision_suffix, 1);
        assert_eq!(settings.slug.separator, "-");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn environment_overrides_file_values() {
        let dir = std::env::temp_dir().join(format!("storefront-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("storefront.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[slug]\nplaceholder = \"item\"").unwrap();

        let vars = config::Map::from([
            ("STOREFRONT__SLUG__PLACEHOLDER".to_string(), "article".to_string()),
            ("STOREFRONT__LOG__FILTER".to_string(), "debug".to_string()),
            ("UNRELATED__SLUG__PLACEHOLDER".to_string(), "ignored".to_string()),
        ]);
        let settings =
            StorefrontSettings::load_layered(path.to_str().unwrap(), environment().source(Some(vars))).unwrap();
        assert_eq!(settings.slug.placeholder, "article");
        assert_eq!(settings.log.filter, "debug");
        assert_eq!(settings.slug.separator, "-");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn blank_placeholder_is_rejected() {
        let mut settings = StorefrontSettings::default();
        settings.slug.placeholder = "!!!".to_string();
        assert!(settings.validate().is_err());
    }
}

//! Configuration types for `lvgl-json-gen.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::filter::FilterRules;

/// Root configuration. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Overrides for the built-in function filter.
    #[serde(default)]
    pub functions: RuleSetConfig,
    /// Overrides for the built-in enum filter.
    #[serde(default)]
    pub enums: RuleSetConfig,
}

/// Where the API description comes from.
#[derive(Debug, Default, Deserialize)]
pub struct InputConfig {
    /// Path to the API description JSON (relative to the TOML file).
    #[serde(default)]
    pub api: Option<PathBuf>,
}

/// Output file settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Generated translation unit (e.g. `lvgl_json_gen.c`).
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
    /// Optional companion header with the public declarations.
    #[serde(default)]
    pub header: Option<PathBuf>,
    /// Library header the generated code includes.
    #[serde(default = "default_include")]
    pub include: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            file: default_output_file(),
            header: None,
            include: default_include(),
        }
    }
}

fn default_output_file() -> PathBuf {
    PathBuf::from("lvgl_json_gen.c")
}

fn default_include() -> String {
    "lvgl.h".to_string()
}

/// Storage strategy of the generated name → pointer registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryVariant {
    /// Fixed-capacity array, no heap use, names borrowed from the caller.
    #[default]
    StaticArray,
    /// 256-bucket chained hash map, names copied on insert.
    HashMap,
}

/// Registry settings.
#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub variant: RegistryVariant,
    /// Entry limit of the static-array variant.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            variant: RegistryVariant::default(),
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    100
}

/// Filter overrides. A list left out keeps the built-in default.
#[derive(Debug, Default, Deserialize)]
pub struct RuleSetConfig {
    #[serde(default)]
    pub names_in: Option<Vec<String>>,
    #[serde(default)]
    pub names_out: Option<Vec<String>>,
    #[serde(default)]
    pub prefixes_out: Option<Vec<String>>,
    #[serde(default)]
    pub prefixes_in: Option<Vec<String>>,
}

impl RuleSetConfig {
    /// Layer these overrides on top of `defaults`.
    pub fn apply(&self, defaults: FilterRules) -> FilterRules {
        FilterRules {
            names_in: self.names_in.clone().unwrap_or(defaults.names_in),
            names_out: self.names_out.clone().unwrap_or(defaults.names_out),
            prefixes_out: self.prefixes_out.clone().unwrap_or(defaults.prefixes_out),
            prefixes_in: self.prefixes_in.clone().unwrap_or(defaults.prefixes_in),
        }
    }
}

impl Config {
    pub fn function_rules(&self) -> FilterRules {
        self.functions.apply(FilterRules::default_functions())
    }

    pub fn enum_rules(&self) -> FilterRules {
        self.enums.apply(FilterRules::default_enums())
    }

    /// The API description path, resolved against `base_dir`.
    pub fn api_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.input.api.as_deref().map(|p| resolve_path(p, base_dir))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registry.capacity == 0 {
            anyhow::bail!("registry capacity must be a positive integer");
        }
        Ok(())
    }
}

/// Resolve a config-relative path. Absolute paths are returned as-is.
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Load and parse a `lvgl-json-gen.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.registry.variant, RegistryVariant::StaticArray);
        assert_eq!(cfg.registry.capacity, 100);
        assert_eq!(cfg.output.file, PathBuf::from("lvgl_json_gen.c"));
        assert_eq!(cfg.output.include, "lvgl.h");
        assert_eq!(cfg.function_rules(), FilterRules::default_functions());
        assert_eq!(cfg.enum_rules(), FilterRules::default_enums());
    }

    #[test]
    fn partial_rule_overrides_keep_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [registry]
            variant = "hash-map"

            [functions]
            names_in = ["lv_anim_init"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.registry.variant, RegistryVariant::HashMap);
        let rules = cfg.function_rules();
        assert_eq!(rules.names_in, vec!["lv_anim_init".to_string()]);
        assert_eq!(
            rules.prefixes_out,
            FilterRules::default_functions().prefixes_out
        );
        assert!(rules.should_include("lv_anim_init"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg: Config = toml::from_str("[registry]\ncapacity = 0\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn api_path_is_relative_to_base_dir() {
        let cfg: Config = toml::from_str("[input]\napi = \"api.json\"\n").unwrap();
        assert_eq!(
            cfg.api_path(Path::new("/cfg")),
            Some(PathBuf::from("/cfg/api.json"))
        );
    }
}

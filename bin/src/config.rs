//! Editor configuration: the standard editors, extended from a `procform.yaml` file.
//!
//! ```yaml
//! editors:
//!   org.example.Colour: string
//! aliases:
//!   org.example.Temperature: java.lang.Double
//! ```

use std::{collections::BTreeMap, fs::File, path::Path, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use taskform::editors::{EditorSpec, EditorTemplate, Editors, standard_registry};

use crate::distpaths;

/// CLI arguments relating to [Config].
#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Path to a YAML file registering extra editors. By default, a procform.yaml file next to
    /// this program is used if there is one.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Creates the editor registry: the standard editors and those of the configuration file.
    pub fn load_editors(&self) -> Result<Editors> {
        let path = self.config.clone().or_else(distpaths::config_file);
        match path {
            Some(path) => {
                log::info!("Loading editor configuration from {path:?}.");
                load_config(&path)?.editors()
            }
            None => Ok(standard_registry()),
        }
    }
}

/// Problem within an otherwise well formed configuration.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("editor for type {type_id:?} names unknown template {template:?}")]
    UnknownTemplate { type_id: String, template: String },
    #[error("alias {type_id:?} refers to type {target:?}, which has no editor")]
    UnknownAliasTarget { type_id: String, target: String },
}

/// Loads the configuration from the file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let file = File::open(path).with_context(|| format!("opening configuration file {path:?}"))?;
    let config: YamlConfig = serde_yaml_ng::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parsing configuration file {path:?}"))?;
    Ok(config.prepare())
}

/// Editor configuration, read and prepared from a `procform.yaml`.
#[derive(Debug, Default, PartialEq)]
pub struct Config {
    /// Template name by type id.
    pub editors: BTreeMap<String, String>,
    /// Existing type id by aliasing type id.
    pub aliases: BTreeMap<String, String>,
}

impl Config {
    /// Creates the standard registry, then registers the configured editors and aliases, in
    /// that order.
    pub fn editors(&self) -> Result<Editors> {
        let mut registry = standard_registry();
        for (type_id, template) in &self.editors {
            let parsed =
                EditorTemplate::from_str(template).map_err(|_| ConfigError::UnknownTemplate {
                    type_id: type_id.clone(),
                    template: template.clone(),
                })?;
            log::debug!("Registering {parsed} editor for type {type_id:?}.");
            registry.register(type_id.clone(), EditorSpec::from(parsed));
        }
        for (type_id, target) in &self.aliases {
            registry
                .alias(type_id.clone(), target)
                .map_err(|_| ConfigError::UnknownAliasTarget {
                    type_id: type_id.clone(),
                    target: target.clone(),
                })?;
        }
        Ok(registry)
    }
}

/// Top level configuration, read from a `procform.yaml`.
#[derive(Deserialize, Debug)]
struct YamlConfig {
    #[serde(default)]
    editors: BTreeMap<String, String>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl YamlConfig {
    /// Creates a `Config` from self.
    fn prepare(self) -> Config {
        Config {
            editors: self.editors,
            aliases: self.aliases,
        }
    }
}

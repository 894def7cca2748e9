//! Marker type definitions, read from a TOML document.
//!
//! Every top-level table is one marker type:
//!
//! ```toml
//! [plot]
//! keyword = "[plot]"
//! id = "plots"
//! label = "Plots"
//! icon = "house"
//! ```
//!
//! Bad entries are reported and skipped, the rest still load. Nothing in here
//! is fatal to the host.

use std::path::Path;

use getset::Getters;
use serde::Deserialize;
use thiserror::Error;

use crate::prelude::*;
use crate::settings::ensure_parent_dir;

pub const DEFAULT_CONFIG: &str = include_str!("../assets/default.toml");

const FIELDS: [&str; 4] = ["keyword", "id", "label", "icon"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("section [{section}] is invalid: {reason}")]
    InvalidSection { section: String, reason: String },
    #[error("section [{section}] is missing field(s) {}", .fields.join(", "))]
    MissingFields {
        section: String,
        fields: Vec<&'static str>,
    },
    #[error("section [{section}] has an empty keyword")]
    EmptyKeyword { section: String },
    #[error("section [{section}] reuses keyword {keyword:?} already claimed by [{claimed_by}]")]
    DuplicateKeyword {
        section: String,
        keyword: String,
        claimed_by: String,
    },
}

/// One configured kind of sign marker.
#[derive(Clone, Debug, Eq, Getters, PartialEq)]
#[getset(get = "pub")]
pub struct MarkerTypeDefinition {
    section: String,
    keyword: String,
    id: String,
    label: String,
    icon: String,
}

impl MarkerTypeDefinition {
    pub fn new<S: Into<String>>(section: S, keyword: S, id: S, label: S, icon: S) -> Self {
        MarkerTypeDefinition {
            section: section.into(),
            keyword: keyword.into(),
            id: id.into(),
            label: label.into(),
            icon: icon.into(),
        }
    }
}

/// Result of reading a config: whatever loaded, plus what didn't
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub definitions: Vec<MarkerTypeDefinition>,
    pub errors: Vec<ConfigError>,
}

impl LoadedConfig {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawDefinition {
    keyword: Option<String>,
    id: Option<String>,
    label: Option<String>,
    icon: Option<String>,
}

impl RawDefinition {
    fn into_definition(self, section: &str) -> Result<MarkerTypeDefinition, ConfigError> {
        let RawDefinition {
            keyword,
            id,
            label,
            icon,
        } = self;
        match (keyword, id, label, icon) {
            (Some(keyword), Some(id), Some(label), Some(icon)) => {
                if keyword.is_empty() {
                    return Err(ConfigError::EmptyKeyword {
                        section: section.to_string(),
                    });
                }
                Ok(MarkerTypeDefinition {
                    section: section.to_string(),
                    keyword,
                    id,
                    label,
                    icon,
                })
            },
            (keyword, id, label, icon) => {
                let present = [keyword.is_some(), id.is_some(), label.is_some(), icon.is_some()];
                let fields = FIELDS
                    .iter()
                    .zip(present)
                    .filter(|(_, present)| !present)
                    .map(|(field, _)| *field)
                    .collect();
                Err(ConfigError::MissingFields {
                    section: section.to_string(),
                    fields,
                })
            },
        }
    }
}

/// Parses a config document.
///
/// Only a document that isn't TOML at all is an `Err`; problems with single
/// sections end up in [LoadedConfig::errors].
pub fn parse_marker_types(document: &str) -> Result<LoadedConfig, ConfigError> {
    let root: toml::Table = toml::from_str(document)?;
    let mut loaded = LoadedConfig::default();
    let mut keyword_owners: HashMap<String, String> = HashMap::new();

    for (section, value) in root {
        let raw = match value {
            toml::Value::Table(_) => value.try_into::<RawDefinition>().map_err(|e| {
                ConfigError::InvalidSection {
                    section: section.clone(),
                    reason: e.message().to_string(),
                }
            }),
            other => Err(ConfigError::InvalidSection {
                section: section.clone(),
                reason: format!("expected a table, found {}", other.type_str()),
            }),
        };
        let definition = raw.and_then(|raw| raw.into_definition(&section));
        let definition = definition.and_then(|definition| {
            match keyword_owners.get(definition.keyword()) {
                Some(claimed_by) => Err(ConfigError::DuplicateKeyword {
                    section: section.clone(),
                    keyword: definition.keyword().clone(),
                    claimed_by: claimed_by.clone(),
                }),
                None => Ok(definition),
            }
        });
        match definition {
            Ok(definition) => {
                keyword_owners.insert(definition.keyword().clone(), section.clone());
                loaded.definitions.push(definition);
            },
            Err(e) => loaded.errors.push(e),
        }
    }
    Ok(loaded)
}

/// Writes the bundled default config to `path` if nothing is there yet.
///
/// Returns whether a file was written.
pub fn install_default_config(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    ensure_parent_dir(path)?;
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(true)
}

/// Loads marker type definitions from `path`, installing the default config first
/// if the file is missing.
///
/// Never fails: every problem is logged and reported in [LoadedConfig::errors],
/// and an unreadable file gives zero definitions.
pub fn load_marker_types(path: &Path) -> LoadedConfig {
    match install_default_config(path) {
        Ok(true) => log::info!("Created a default config file at {path:?} since none was found"),
        Ok(false) => {},
        Err(e) => log::error!("Could not find a config file and could not create a default: {e}"),
    }

    let loaded = std::fs::read_to_string(path)
        .map_err(ConfigError::from)
        .and_then(|document| parse_marker_types(&document));
    let loaded = match loaded {
        Ok(loaded) => loaded,
        Err(e) => LoadedConfig {
            definitions: Vec::new(),
            errors: vec![e],
        },
    };

    for definition in loaded.definitions.iter() {
        log::debug!(
            "Read marker type [{}] with id {}",
            definition.section(),
            definition.id()
        );
    }
    for error in loaded.errors.iter() {
        log::error!("Error loading marker types from {path:?}: {error}");
    }
    log::info!(
        "Finished loading config: {} marker type(s), {} error(s)",
        loaded.definitions.len(),
        loaded.errors.len()
    );
    loaded
}

//! The legacy GAPIC YAML configuration (`ConfigProto`), restricted to the
//! sections that are cross-checked against the descriptor annotations.

use crate::error::{Result, ValidatorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Prefix of the schema line that legacy config files start with.
const TYPE_LINE_PREFIX: &str = "type:";

/// Root of a legacy GAPIC configuration document
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigProto {
    pub interfaces: Vec<InterfaceConfig>,
    /// Collections shared across interfaces
    pub collections: Vec<CollectionConfig>,
    #[serde(alias = "resourceNameGeneration")]
    pub resource_name_generation: Vec<ResourceNameGeneration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Fully-qualified service name
    pub name: String,
    pub collections: Vec<CollectionConfig>,
    pub methods: Vec<MethodConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectionConfig {
    #[serde(alias = "entityName")]
    pub entity_name: String,
    #[serde(alias = "namePattern")]
    pub name_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MethodConfig {
    /// Simple method name, without the service
    pub name: String,
    pub flattening: Option<FlatteningConfig>,
    #[serde(alias = "longRunning")]
    pub long_running: Option<LongRunningConfig>,
    #[serde(alias = "requiredFields")]
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FlatteningConfig {
    pub groups: Vec<FlatteningGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FlatteningGroup {
    pub parameters: Vec<String>,
}

impl FlatteningGroup {
    /// The parameters joined the way a `method_signature` entry spells them.
    pub fn signature(&self) -> String {
        self.parameters.join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LongRunningConfig {
    #[serde(alias = "returnType")]
    pub return_type: String,
    #[serde(alias = "metadataType")]
    pub metadata_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceNameGeneration {
    #[serde(alias = "messageName")]
    pub message_name: String,
    /// Field name to collection entity name
    #[serde(alias = "fieldEntityMap")]
    pub field_entity_map: BTreeMap<String, String>,
}

impl ConfigProto {
    /// Parses the YAML text of a legacy config, discarding the leading
    /// `type: com.google.api.codegen.ConfigProto` line if there is one.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let body = strip_type_line(text);
        if body.trim().is_empty() {
            debug!("Legacy config is empty");
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(body)?)
    }

    /// Reads and parses the legacy config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "Loading legacy GAPIC config");
        let text =
            fs::read_to_string(path).map_err(|e| ValidatorError::legacy_config(path, e))?;
        let config = Self::from_yaml_str(&text).map_err(|e| match e {
            ValidatorError::Yaml(e) => ValidatorError::legacy_config(path, e),
            other => other,
        })?;

        debug!(
            interfaces = config.interfaces.len(),
            collections = config.collections.len(),
            resource_name_generation = config.resource_name_generation.len(),
            "Legacy GAPIC config loaded"
        );
        Ok(config)
    }

    /// Looks up a collection by entity name, top-level collections first.
    pub fn collection_for_entity(&self, entity_name: &str) -> Option<&CollectionConfig> {
        self.collections
            .iter()
            .chain(self.interfaces.iter().flat_map(|i| i.collections.iter()))
            .find(|collection| collection.entity_name == entity_name)
    }

    /// Every collection in the document, top-level first, without duplicates.
    pub fn all_collections(&self) -> Vec<&CollectionConfig> {
        let mut collections: Vec<&CollectionConfig> = Vec::new();
        let candidates = self
            .collections
            .iter()
            .chain(self.interfaces.iter().flat_map(|i| i.collections.iter()));
        for collection in candidates {
            if !collections.contains(&collection) {
                collections.push(collection);
            }
        }
        collections
    }
}

fn strip_type_line(text: &str) -> &str {
    let trimmed = text.trim_start_matches('\u{feff}');
    if !trimmed.starts_with(TYPE_LINE_PREFIX) {
        return trimmed;
    }
    match trimmed.split_once('\n') {
        Some((_, rest)) => rest,
        None => "",
    }
}

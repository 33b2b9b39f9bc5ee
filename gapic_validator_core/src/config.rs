use crate::error::{Result, ValidatorError};
use crate::gapic_config::ConfigProto;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Parameter key naming the legacy GAPIC config file.
pub const GAPIC_YAML_KEY: &str = "gapic-yaml";

/// Options passed to the plugin through the request's parameter string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PluginOptions {
    /// Path to the legacy GAPIC config; enables the comparator when set.
    pub gapic_yaml: Option<PathBuf>,
}

impl PluginOptions {
    /// Parses a comma-separated list of `key=value` pairs.
    pub fn parse(parameter: &str) -> Result<Self> {
        let mut options = Self::default();

        for segment in parameter.split(',').map(str::trim) {
            if segment.is_empty() {
                continue;
            }

            let Some((key, value)) = segment.split_once('=') else {
                warn!(parameter = segment, "Ignoring plugin parameter without a value");
                continue;
            };

            match key.trim() {
                GAPIC_YAML_KEY => {
                    let value = value.trim();
                    if value.is_empty() {
                        return Err(ValidatorError::invalid_parameter(key.trim(), value));
                    }
                    debug!(path = %value, "Using legacy GAPIC config");
                    options.gapic_yaml = Some(PathBuf::from(value));
                }
                other => warn!(key = other, "Ignoring unknown plugin parameter"),
            }
        }

        Ok(options)
    }

    /// Loads the legacy config if one was configured.
    pub fn load_gapic_config(&self) -> Result<Option<ConfigProto>> {
        self.gapic_yaml
            .as_deref()
            .map(ConfigProto::load)
            .transpose()
    }
}

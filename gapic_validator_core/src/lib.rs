// GAPIC validator - checks GAPIC annotations in protobuf descriptors and
// cross-checks them against legacy GAPIC YAML configs

// Descriptor access
pub mod annotations;
pub mod names;
pub mod resolver;

// Checks
pub mod compare;
pub mod diagnostics;
pub mod validator;

// Configuration and plugin plumbing
pub mod config;
pub mod error;
pub mod gapic_config;
pub mod plugin;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used items for convenience
pub use compare::Comparator;
pub use config::PluginOptions;
pub use diagnostics::{Diagnostics, Violation};
pub use error::{Result, ValidatorError};
pub use gapic_config::ConfigProto;
pub use plugin::{CodeGeneratorRequest, encode_response, handle, validate};
pub use resolver::{DescriptorSet, ResourceSource};
pub use validator::Validator;

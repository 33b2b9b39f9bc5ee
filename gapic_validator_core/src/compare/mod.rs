//! Cross-checks a legacy GAPIC config against the descriptor annotations.
//!
//! The comparator runs three independent passes (services and methods,
//! collections, resource name generation) and records every mismatch in the
//! same [`Diagnostics`] the validator writes to.

mod methods;
mod references;
mod resources;

use crate::diagnostics::Diagnostics;
use crate::gapic_config::ConfigProto;
use crate::resolver::DescriptorSet;

pub struct Comparator<'a> {
    descriptors: &'a DescriptorSet,
    config: &'a ConfigProto,
}

impl<'a> Comparator<'a> {
    pub fn new(descriptors: &'a DescriptorSet, config: &'a ConfigProto) -> Self {
        Self {
            descriptors,
            config,
        }
    }

    pub fn run(&self, diagnostics: &mut Diagnostics) {
        tracing::info!("Starting legacy config comparison");
        let before = diagnostics.len();

        tracing::debug!(
            interfaces = self.config.interfaces.len(),
            "Comparing interfaces and methods"
        );
        self.compare_services(diagnostics);

        tracing::debug!("Comparing collections");
        self.compare_resources(diagnostics);

        tracing::debug!(
            items = self.config.resource_name_generation.len(),
            "Comparing resource name generation"
        );
        self.compare_resource_references(diagnostics);

        tracing::info!(
            violations = diagnostics.len() - before,
            "Legacy config comparison completed"
        );
    }
}

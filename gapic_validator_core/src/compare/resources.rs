use super::Comparator;
use crate::annotations::{FileAnnotations, MessageAnnotations};
use crate::diagnostics::{Diagnostics, Violation};
use crate::gapic_config::CollectionConfig;
use crate::names::{is_well_known_kind, is_well_known_pattern, snake_to_camel, type_kind};
use crate::resolver::all_messages;

impl Comparator<'_> {
    /// Every configured collection must be backed by a resource carrying its
    /// name pattern.
    pub(super) fn compare_resources(&self, diagnostics: &mut Diagnostics) {
        for collection in self.config.all_collections() {
            let entity = snake_to_camel(&collection.entity_name);
            if is_well_known_pattern(&collection.name_pattern) || is_well_known_kind(&entity) {
                tracing::trace!(entity = %entity, "Skipping well-known collection");
                continue;
            }

            if !self.find_collection_resource(collection, &entity, diagnostics) {
                diagnostics.add(Violation::CollectionWithoutResource {
                    entity: collection.entity_name.clone(),
                    pattern: collection.name_pattern.clone(),
                });
            }
        }
    }

    /// Searches the files in order for the resource matching `collection`,
    /// reporting a missing pattern on the first one whose kind matches.
    ///
    /// Returns whether a matching resource was found. A message listing the
    /// pattern under a different kind counts as a match.
    fn find_collection_resource(
        &self,
        collection: &CollectionConfig,
        entity: &str,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let pattern = &collection.name_pattern;

        for file in self.descriptors.files() {
            for definition in file.resource_definitions() {
                if type_kind(&definition.r#type) != entity {
                    continue;
                }
                if !definition.has_pattern(pattern) {
                    diagnostics.add(Violation::ResourcePatternMissing {
                        resource_type: definition.r#type.clone(),
                        owner: file.name().to_string(),
                        pattern: pattern.clone(),
                    });
                }
                return true;
            }

            for message in all_messages(file) {
                let Some(resource) = message.resource() else {
                    continue;
                };
                if resource.has_pattern(pattern) {
                    return true;
                }
                if type_kind(&resource.r#type) == entity {
                    diagnostics.add(Violation::ResourcePatternMissing {
                        resource_type: resource.r#type.clone(),
                        owner: message.full_name().to_string(),
                        pattern: pattern.clone(),
                    });
                    return true;
                }
            }
        }

        false
    }
}

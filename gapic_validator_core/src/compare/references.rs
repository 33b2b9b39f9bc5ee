use super::Comparator;
use crate::annotations::{FieldAnnotations, MessageAnnotations};
use crate::diagnostics::{Diagnostics, Violation};
use crate::gapic_config::ResourceNameGeneration;
use crate::names::{
    ANY_RESOURCE_TYPE, IAM_PACKAGE_PREFIX, is_well_known_type, snake_to_camel, type_kind,
};
use prost_reflect::{FieldDescriptor, MessageDescriptor};

/// The resource a `field_entity_map` field points at.
enum FieldResource {
    Type(String),
    ChildType(String),
}

impl Comparator<'_> {
    /// Every `resource_name_generation` field must reference a resource whose
    /// kind matches its configured entity.
    pub(super) fn compare_resource_references(&self, diagnostics: &mut Diagnostics) {
        for generation in &self.config.resource_name_generation {
            if generation.message_name.starts_with(IAM_PACKAGE_PREFIX) {
                continue;
            }

            let Some(message) = self
                .descriptors
                .resolve_message_by_local_name(&generation.message_name)
            else {
                diagnostics.add(Violation::ResourceNameMessageNotFound {
                    message: generation.message_name.clone(),
                });
                continue;
            };

            self.compare_generation(&message, generation, diagnostics);
        }
    }

    fn compare_generation(
        &self,
        message: &MessageDescriptor,
        generation: &ResourceNameGeneration,
        diagnostics: &mut Diagnostics,
    ) {
        for (field_name, entity) in &generation.field_entity_map {
            // nested fields are checked on the message that declares them
            if field_name.contains('.') {
                continue;
            }

            let Some(field) = message.get_field_by_name(field_name) else {
                diagnostics.add(Violation::ResourceNameFieldNotFound {
                    field: field_name.clone(),
                    message: message.full_name().to_string(),
                });
                continue;
            };

            match field_resource(message, &field) {
                Some(FieldResource::Type(resource_type)) => {
                    compare_kind(&field, &resource_type, entity, diagnostics)
                }
                Some(FieldResource::ChildType(child_type)) => {
                    self.compare_child_type(message, &field, &child_type, entity, diagnostics)
                }
                None => diagnostics.add(Violation::MissingResourceReference {
                    field: field.full_name().to_string(),
                    entity: entity.clone(),
                }),
            }
        }
    }

    /// The child resource's patterns must extend the parent collection's.
    fn compare_child_type(
        &self,
        message: &MessageDescriptor,
        field: &FieldDescriptor,
        child_type: &str,
        entity: &str,
        diagnostics: &mut Diagnostics,
    ) {
        if is_well_known_type(child_type) || child_type == ANY_RESOURCE_TYPE {
            return;
        }

        let Some(child) = self
            .descriptors
            .resolve_resource_type(child_type, &message.parent_file())
        else {
            diagnostics.add(Violation::ChildTypeNotResolvable {
                child_type: child_type.to_string(),
                field: field.full_name().to_string(),
            });
            return;
        };

        let Some(collection) = self.config.collection_for_entity(entity) else {
            diagnostics.add(Violation::EntityNotInCollections {
                entity: entity.to_string(),
            });
            return;
        };

        let patterns = child.patterns();
        if patterns.is_empty() {
            return;
        }
        if !patterns
            .iter()
            .any(|pattern| pattern.starts_with(&collection.name_pattern))
        {
            diagnostics.add(Violation::ChildTypeNotChild {
                field: field.full_name().to_string(),
                child_type: child_type.to_string(),
                entity: entity.to_string(),
            });
        }
    }
}

/// The field's `resource_reference`, falling back to the owning message's
/// `resource` type.
fn field_resource(message: &MessageDescriptor, field: &FieldDescriptor) -> Option<FieldResource> {
    if let Some(reference) = field.resource_reference() {
        return Some(if reference.r#type.is_empty() {
            FieldResource::ChildType(reference.child_type)
        } else {
            FieldResource::Type(reference.r#type)
        });
    }

    message
        .resource()
        .map(|resource| FieldResource::Type(resource.r#type))
}

fn compare_kind(
    field: &FieldDescriptor,
    resource_type: &str,
    entity: &str,
    diagnostics: &mut Diagnostics,
) {
    if is_well_known_type(resource_type) || resource_type == ANY_RESOURCE_TYPE {
        return;
    }

    if type_kind(resource_type) != snake_to_camel(entity) {
        diagnostics.add(Violation::ResourceKindMismatch {
            field: field.full_name().to_string(),
            resource_type: resource_type.to_string(),
            entity: entity.to_string(),
        });
    }
}

//! Structural checks over the GAPIC annotations of the files to generate.
//!
//! The walk is file → resource definitions → services → methods, then file →
//! messages → fields. Every check is independent: a violation is recorded
//! and the walk moves on, so one pass reports everything it finds.

use crate::annotations::{
    FieldAnnotations, FileAnnotations, MessageAnnotations, MethodAnnotations, OperationInfo,
    ResourceDescriptor, ResourceReference, ServiceAnnotations,
};
use crate::diagnostics::{Diagnostics, Violation};
use crate::names::{
    ANY_RESOURCE_TYPE, LONG_RUNNING_OPERATION, MAX_RESOURCE_TYPE_KIND_LEN, is_well_known_type,
    split_resource_type,
};
use crate::resolver::{DescriptorSet, all_messages};
use once_cell::sync::Lazy;
use prost_reflect::{
    Cardinality, FieldDescriptor, FileDescriptor, Kind, MessageDescriptor, MethodDescriptor,
    ServiceDescriptor,
};
use regex::Regex;
use tracing::{debug, trace};

static RESOURCE_TYPE_KIND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][a-zA-Z0-9]+").expect("Invalid resource type kind regex")
});

/// Whether `kind` starts with an upper-case letter followed by at least one
/// alphanumeric character. Trailing characters are not checked.
pub fn is_valid_type_kind(kind: &str) -> bool {
    RESOURCE_TYPE_KIND_RE.is_match(kind)
}

pub struct Validator<'a> {
    descriptors: &'a DescriptorSet,
}

impl<'a> Validator<'a> {
    pub fn new(descriptors: &'a DescriptorSet) -> Self {
        Self { descriptors }
    }

    /// Validates every annotation reachable from `file`.
    pub fn validate_file(&self, file: &FileDescriptor, diagnostics: &mut Diagnostics) {
        debug!(file = file.name(), "Validating file");
        let before = diagnostics.len();

        for definition in file.resource_definitions() {
            let owner = definition.r#type.clone();
            self.validate_resource_descriptor(&definition, &owner, diagnostics);
        }

        for service in file.services() {
            self.validate_service(&service, diagnostics);
        }

        for message in all_messages(file) {
            self.validate_message(&message, diagnostics);
        }

        debug!(
            file = file.name(),
            violations = diagnostics.len() - before,
            "Finished validating file"
        );
    }

    fn validate_service(&self, service: &ServiceDescriptor, diagnostics: &mut Diagnostics) {
        let name = service.full_name();
        trace!(service = name, "Validating service");

        match service.default_host() {
            None => diagnostics.add(Violation::MissingDefaultHost {
                service: name.to_string(),
            }),
            Some(host) if host.is_empty() => diagnostics.add(Violation::EmptyDefaultHost {
                service: name.to_string(),
            }),
            Some(_) => {}
        }

        for method in service.methods() {
            self.validate_method(&method, diagnostics);
        }
    }

    fn validate_method(&self, method: &MethodDescriptor, diagnostics: &mut Diagnostics) {
        trace!(method = method.full_name(), "Validating method");

        if method.output().full_name() == LONG_RUNNING_OPERATION {
            match method.operation_info() {
                Some(info) => self.validate_operation_info(method, &info, diagnostics),
                None => diagnostics.add(Violation::MissingOperationInfo {
                    method: method.full_name().to_string(),
                }),
            }
        }

        if let Some(signatures) = method.method_signatures() {
            for signature in &signatures {
                self.validate_method_signature(method, signature, diagnostics);
            }
        }
    }

    fn validate_operation_info(
        &self,
        method: &MethodDescriptor,
        info: &OperationInfo,
        diagnostics: &mut Diagnostics,
    ) {
        let name = method.full_name().to_string();
        let context = method.parent_service().parent_file();

        if info.response_type.is_empty() {
            diagnostics.add(Violation::MissingLroResponseType {
                method: name.clone(),
            });
        } else if self
            .descriptors
            .resolve_message(&info.response_type, &context)
            .is_none()
        {
            diagnostics.add(Violation::UnresolvableLroResponseType {
                value: info.response_type.clone(),
                method: name.clone(),
            });
        }

        if info.metadata_type.is_empty() {
            diagnostics.add(Violation::MissingLroMetadataType { method: name });
        } else if self
            .descriptors
            .resolve_message(&info.metadata_type, &context)
            .is_none()
        {
            diagnostics.add(Violation::UnresolvableLroMetadataType {
                value: info.metadata_type.clone(),
                method: name,
            });
        }
    }

    /// Checks one comma-joined `method_signature` entry.
    fn validate_method_signature(
        &self,
        method: &MethodDescriptor,
        signature: &str,
        diagnostics: &mut Diagnostics,
    ) {
        let input = method.input();
        let mut seen_optional = false;

        for path in signature.split(',').map(str::trim) {
            let field = match walk_field_path(&input, path) {
                FieldPath::Found(field) => field,
                FieldPath::Missing => {
                    diagnostics.add(Violation::SignatureFieldMissing {
                        field: path.to_string(),
                        method: method.full_name().to_string(),
                        signature: signature.to_string(),
                        input: input.full_name().to_string(),
                    });
                    continue;
                }
                FieldPath::RepeatedComponent => {
                    diagnostics.add(Violation::SignatureComponentRepeated {
                        method: method.full_name().to_string(),
                        field: path.to_string(),
                    });
                    continue;
                }
            };

            if !field.has_required_behavior() {
                seen_optional = true;
            } else if seen_optional {
                diagnostics.add(Violation::RequiredAfterOptional {
                    method: method.full_name().to_string(),
                    signature: signature.to_string(),
                    field: path.to_string(),
                });
            }
        }
    }

    fn validate_message(&self, message: &MessageDescriptor, diagnostics: &mut Diagnostics) {
        trace!(message = message.full_name(), "Validating message");

        if let Some(resource) = message.resource() {
            self.validate_resource_descriptor(&resource, message.full_name(), diagnostics);

            let name_field = resource.name_field_or_default();
            if message.get_field_by_name(name_field).is_none() {
                diagnostics.add(Violation::ResourceMissingNameField {
                    message: message.full_name().to_string(),
                    name_field: name_field.to_string(),
                });
            }
        }

        for field in message.fields() {
            if let Some(reference) = field.resource_reference() {
                self.validate_resource_reference(&field, &reference, diagnostics);
            }
        }
    }

    /// Pattern presence and type format of a resource owned by `owner`.
    fn validate_resource_descriptor(
        &self,
        resource: &ResourceDescriptor,
        owner: &str,
        diagnostics: &mut Diagnostics,
    ) {
        if resource.pattern.is_empty() {
            diagnostics.add(Violation::ResourceMissingPattern {
                owner: owner.to_string(),
            });
        }

        if resource.r#type.is_empty() {
            diagnostics.add(Violation::ResourceMissingType {
                owner: owner.to_string(),
            });
            return;
        }

        let Some((_, kind)) = split_resource_type(&resource.r#type) else {
            diagnostics.add(Violation::ResourceInvalidTypeFormat {
                owner: owner.to_string(),
            });
            return;
        };

        validate_type_kind(kind, owner, diagnostics);
    }

    fn validate_resource_reference(
        &self,
        field: &FieldDescriptor,
        reference: &ResourceReference,
        diagnostics: &mut Diagnostics,
    ) {
        let resource_type = reference.effective_type();
        if is_well_known_type(resource_type) || resource_type == ANY_RESOURCE_TYPE {
            return;
        }

        if split_resource_type(resource_type).is_none() {
            diagnostics.add(Violation::ReferenceInvalidTypeFormat {
                field: field.full_name().to_string(),
            });
            return;
        }

        let context = field.parent_message().parent_file();
        if self
            .descriptors
            .resolve_resource_type(resource_type, &context)
            .is_none()
        {
            diagnostics.add(Violation::ReferenceNotResolvable {
                field: field.full_name().to_string(),
                resource_type: resource_type.to_string(),
            });
        }
    }
}

fn validate_type_kind(kind: &str, owner: &str, diagnostics: &mut Diagnostics) {
    if !is_valid_type_kind(kind) {
        diagnostics.add(Violation::ResourceTypeKindInvalid {
            kind: kind.to_string(),
            owner: owner.to_string(),
        });
    }

    if kind.chars().count() > MAX_RESOURCE_TYPE_KIND_LEN {
        diagnostics.add(Violation::ResourceTypeKindTooLong {
            owner: owner.to_string(),
            max: MAX_RESOURCE_TYPE_KIND_LEN,
        });
    }
}

enum FieldPath {
    Found(FieldDescriptor),
    Missing,
    /// A repeated field appears before the last component.
    RepeatedComponent,
}

/// Follows a dotted field path through `input`'s message graph.
fn walk_field_path(input: &MessageDescriptor, path: &str) -> FieldPath {
    let components: Vec<&str> = path.split('.').collect();
    let mut current = input.clone();

    for (index, component) in components.iter().enumerate() {
        let Some(field) = current.get_field_by_name(component) else {
            return FieldPath::Missing;
        };

        let last = index == components.len() - 1;
        if last {
            return FieldPath::Found(field);
        }

        if field.cardinality() == Cardinality::Repeated {
            return FieldPath::RepeatedComponent;
        }

        match field.kind() {
            Kind::Message(message) => current = message,
            _ => return FieldPath::Missing,
        }
    }

    FieldPath::Missing
}

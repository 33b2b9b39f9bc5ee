//! Annotation violations and the collector shared by the validator and the
//! comparator.

use std::fmt::{self, Display, Formatter};
use thiserror::Error;
use tracing::debug;

/// Separator between violations in the combined message.
pub const SEPARATOR: &str = "; ";

/// A single annotation rule violation, rendered as a human-readable message
/// naming the offending entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    // default_host
    #[error("service {service:?} is missing option google.api.default_host")]
    MissingDefaultHost { service: String },

    #[error("service {service:?} google.api.default_host is empty")]
    EmptyDefaultHost { service: String },

    // operation_info
    #[error(
        "rpc {method:?} returns google.longrunning.Operation but is missing option google.longrunning.operation_info"
    )]
    MissingOperationInfo { method: String },

    #[error(
        "rpc {method:?} has google.longrunning.operation_info but is missing option google.longrunning.operation_info.response_type"
    )]
    MissingLroResponseType { method: String },

    #[error(
        "rpc {method:?} has google.longrunning.operation_info but is missing option google.longrunning.operation_info.metadata_type"
    )]
    MissingLroMetadataType { method: String },

    #[error(
        "unable to resolve google.longrunning.operation_info.response_type value {value:?} in rpc {method:?}"
    )]
    UnresolvableLroResponseType { value: String, method: String },

    #[error(
        "unable to resolve google.longrunning.operation_info.metadata_type value {value:?} in rpc {method:?}"
    )]
    UnresolvableLroMetadataType { value: String, method: String },

    // method_signature
    #[error(
        "field {field:?} listed in rpc {method:?} method signature entry ({signature:?}) does not exist in {input:?}"
    )]
    SignatureFieldMissing {
        field: String,
        method: String,
        signature: String,
        input: String,
    },

    #[error(
        "rpc {method:?} method signature entry ({signature:?}) lists required field {field:?} after an optional field"
    )]
    RequiredAfterOptional {
        method: String,
        signature: String,
        field: String,
    },

    #[error(
        "rpc {method:?} method signature entry field {field:?} cannot be a field within a repeated field"
    )]
    SignatureComponentRepeated { method: String, field: String },

    // resource
    #[error("resource for {owner:?} missing field google.api.resource.type")]
    ResourceMissingType { owner: String },

    #[error("resource.(child_)type for {owner:?} must be {{service_name}}/{{resource_type_kind}}")]
    ResourceInvalidTypeFormat { owner: String },

    #[error(
        "resource_type_kind {kind:?} in {owner:?} has invalid format, must match regexp [A-Z][a-zA-Z0-9]+"
    )]
    ResourceTypeKindInvalid { kind: String, owner: String },

    #[error("resource_type_kind in {owner:?} must not be longer than {max} characters")]
    ResourceTypeKindTooLong { owner: String, max: usize },

    #[error("resource {owner:?} missing pattern definition")]
    ResourceMissingPattern { owner: String },

    #[error("resource message {message:?} missing a name field {name_field:?}")]
    ResourceMissingNameField { message: String, name_field: String },

    // resource_reference
    #[error(
        "resource_reference.(child_)type for field {field:?} must be {{service_name}}/{{resource_type_kind}}"
    )]
    ReferenceInvalidTypeFormat { field: String },

    #[error(
        "unable to resolve resource reference for field {field:?}: value {resource_type:?} is not a valid resource"
    )]
    ReferenceNotResolvable { field: String, resource_type: String },

    // legacy config: interfaces and methods
    #[error("Interface {interface:?} does not exist")]
    InterfaceNotFound { interface: String },

    #[error("Method {method:?} does not exist")]
    MethodNotFound { method: String },

    #[error("Method {method:?} missing method_signature(s) for flattening(s)")]
    MissingSignaturesForFlattening { method: String },

    #[error("Method {method:?} missing method_signature for flattening {flattening:?}")]
    MissingSignatureForFlattening { method: String, flattening: String },

    #[error("Method {method:?} missing longrunning.operation_info")]
    MissingOperationInfoForLongRunning { method: String },

    #[error("Method {method:?} operation_info.response_type {proto:?} does not match {config:?}")]
    LroResponseTypeMismatch {
        method: String,
        proto: String,
        config: String,
    },

    #[error("Method {method:?} operation_info.metadata_type {proto:?} does not match {config:?}")]
    LroMetadataTypeMismatch {
        method: String,
        proto: String,
        config: String,
    },

    #[error("Field {field:?} in method {method:?} required_fields does not exist in {input:?}")]
    RequiredFieldNotFound {
        field: String,
        method: String,
        input: String,
    },

    #[error("Field {field:?} is missing field_behavior = REQUIRED per required_fields config")]
    RequiredFieldMissingBehavior { field: String },

    #[error("Field {field:?} is not annotated as REQUIRED per required_fields config")]
    RequiredFieldNotRequired { field: String },

    // legacy config: collections
    #[error("resource definition for {resource_type:?} in {owner:?} does not have pattern {pattern:?}")]
    ResourcePatternMissing {
        resource_type: String,
        owner: String,
        pattern: String,
    },

    #[error("No corresponding resource definition for {entity:?}: {pattern:?}")]
    CollectionWithoutResource { entity: String, pattern: String },

    // legacy config: resource_name_generation
    #[error("Message {message:?} in resource_name_generation item does not exist")]
    ResourceNameMessageNotFound { message: String },

    #[error("Field {field:?} does not exist on message {message:?} per resource_name_generation item")]
    ResourceNameFieldNotFound { field: String, message: String },

    #[error("Field {field:?} missing resource_reference to {entity:?}")]
    MissingResourceReference { field: String, entity: String },

    #[error("child_type {child_type:?} on {field:?} is not a defined resource")]
    ChildTypeNotResolvable { child_type: String, field: String },

    #[error("entity_name {entity:?} is not defined in any available collection")]
    EntityNotInCollections { entity: String },

    #[error("Field {field:?} child_type {child_type:?} isn't a proper child of {entity:?} in GAPIC config")]
    ChildTypeNotChild {
        field: String,
        child_type: String,
        entity: String,
    },

    #[error("Field {field:?} resource_type_kind {resource_type:?} doesn't match {entity:?} in config")]
    ResourceKindMismatch {
        field: String,
        resource_type: String,
        entity: String,
    },
}

/// Append-only collector of violations for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    violations: Vec<Violation>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: Violation) {
        debug!(%violation, "Recorded violation");
        self.violations.push(violation);
    }

    /// Appends every violation of `other`, keeping its order.
    pub fn merge(&mut self, other: Diagnostics) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// The combined message, or `None` when nothing was recorded.
    pub fn message(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                f.write_str(SEPARATOR)?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

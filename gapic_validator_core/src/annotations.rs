//! Typed access to the GAPIC annotations attached to descriptor options.
//!
//! Extension values are read through [`prost_reflect`], which keeps custom
//! options intact when a descriptor pool is decoded from raw bytes. Callers
//! never look extensions up by name themselves: every annotation kind has a
//! typed accessor on the trait matching the descriptor it can be attached to.
//!
//! | Trait                  | Descriptor          | Annotations                               |
//! |------------------------|---------------------|-------------------------------------------|
//! | [`ServiceAnnotations`] | `ServiceDescriptor` | `default_host`                            |
//! | [`MethodAnnotations`]  | `MethodDescriptor`  | `operation_info`, `method_signature`      |
//! | [`MessageAnnotations`] | `MessageDescriptor` | `resource`                                |
//! | [`FieldAnnotations`]   | `FieldDescriptor`   | `field_behavior`, `resource_reference`    |
//! | [`FileAnnotations`]    | `FileDescriptor`    | `resource_definition`                     |

use prost_reflect::{
    DescriptorPool, DynamicMessage, FieldDescriptor, FileDescriptor, MessageDescriptor,
    MethodDescriptor, ServiceDescriptor, Value,
};
use tracing::{trace, warn};

pub const DEFAULT_HOST: &str = "google.api.default_host";
pub const METHOD_SIGNATURE: &str = "google.api.method_signature";
pub const FIELD_BEHAVIOR: &str = "google.api.field_behavior";
pub const RESOURCE: &str = "google.api.resource";
pub const RESOURCE_REFERENCE: &str = "google.api.resource_reference";
pub const RESOURCE_DEFINITION: &str = "google.api.resource_definition";
pub const OPERATION_INFO: &str = "google.longrunning.operation_info";

/// `google.api.ResourceDescriptor`, restricted to the fields the validator reads.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceDescriptor {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(string, repeated, tag = "2")]
    pub pattern: Vec<String>,
    #[prost(string, tag = "3")]
    pub name_field: String,
}

impl ResourceDescriptor {
    /// The field holding the resource name, `name` unless overridden.
    pub fn name_field_or_default(&self) -> &str {
        if self.name_field.is_empty() {
            "name"
        } else {
            &self.name_field
        }
    }

    pub fn has_pattern(&self, pattern: &str) -> bool {
        self.pattern.iter().any(|p| p == pattern)
    }
}

/// `google.api.ResourceReference`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceReference {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(string, tag = "2")]
    pub child_type: String,
}

impl ResourceReference {
    /// `type` if set, otherwise `child_type`.
    pub fn effective_type(&self) -> &str {
        if self.r#type.is_empty() {
            &self.child_type
        } else {
            &self.r#type
        }
    }
}

/// `google.longrunning.OperationInfo`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OperationInfo {
    #[prost(string, tag = "1")]
    pub response_type: String,
    #[prost(string, tag = "2")]
    pub metadata_type: String,
}

/// `google.api.FieldBehavior`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FieldBehavior {
    Unspecified = 0,
    Optional = 1,
    Required = 2,
    OutputOnly = 3,
    InputOnly = 4,
    Immutable = 5,
    UnorderedList = 6,
    NonEmptyDefault = 7,
    Identifier = 8,
}

/// A descriptor whose options may carry GAPIC extensions.
pub trait AnnotationSource {
    /// The raw options message, with extensions resolved against the pool.
    fn raw_options(&self) -> DynamicMessage;

    /// The pool the descriptor (and the extension definitions) belong to.
    fn pool(&self) -> &DescriptorPool;

    /// The value of the extension named `name`, if the pool defines it and
    /// the descriptor's options set it.
    fn extension(&self, name: &str) -> Option<Value> {
        let Some(extension) = self.pool().get_extension_by_name(name) else {
            trace!(extension = name, "extension not defined in descriptor pool");
            return None;
        };

        let options = self.raw_options();
        if !options.has_extension(&extension) {
            return None;
        }

        Some(options.get_extension(&extension).into_owned())
    }
}

macro_rules! impl_annotation_source {
    ($($descriptor:ty),* $(,)?) => {
        $(
            impl AnnotationSource for $descriptor {
                fn raw_options(&self) -> DynamicMessage {
                    self.options()
                }

                fn pool(&self) -> &DescriptorPool {
                    self.parent_pool()
                }
            }
        )*
    };
}

impl_annotation_source!(
    FileDescriptor,
    ServiceDescriptor,
    MethodDescriptor,
    MessageDescriptor,
    FieldDescriptor,
);

fn decode_message<T: prost::Message + Default>(value: &Value, extension: &str) -> Option<T> {
    let message = value.as_message()?;
    match message.transcode_to::<T>() {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(extension, error = %e, "Failed to decode annotation payload");
            None
        }
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_list()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

pub trait ServiceAnnotations: AnnotationSource {
    /// `google.api.default_host`; `Some("")` when set to the empty string.
    fn default_host(&self) -> Option<String> {
        self.extension(DEFAULT_HOST)?.as_str().map(str::to_owned)
    }
}

pub trait MethodAnnotations: AnnotationSource {
    fn operation_info(&self) -> Option<OperationInfo> {
        decode_message(&self.extension(OPERATION_INFO)?, OPERATION_INFO)
    }

    /// `google.api.method_signature` entries, `None` when the option is absent.
    fn method_signatures(&self) -> Option<Vec<String>> {
        self.extension(METHOD_SIGNATURE)
            .map(|value| string_list(&value))
    }
}

pub trait MessageAnnotations: AnnotationSource {
    fn resource(&self) -> Option<ResourceDescriptor> {
        decode_message(&self.extension(RESOURCE)?, RESOURCE)
    }
}

pub trait FieldAnnotations: AnnotationSource {
    /// `google.api.field_behavior`, `None` when the option is absent.
    fn field_behavior(&self) -> Option<Vec<FieldBehavior>> {
        let value = self.extension(FIELD_BEHAVIOR)?;
        let behaviors = value
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_enum_number)
            .filter_map(|number| FieldBehavior::try_from(number).ok())
            .collect();
        Some(behaviors)
    }

    fn has_required_behavior(&self) -> bool {
        self.field_behavior()
            .is_some_and(|behaviors| behaviors.contains(&FieldBehavior::Required))
    }

    fn resource_reference(&self) -> Option<ResourceReference> {
        decode_message(&self.extension(RESOURCE_REFERENCE)?, RESOURCE_REFERENCE)
    }
}

pub trait FileAnnotations: AnnotationSource {
    fn resource_definitions(&self) -> Vec<ResourceDescriptor> {
        let Some(value) = self.extension(RESOURCE_DEFINITION) else {
            return Vec::new();
        };
        value
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(|item| decode_message(item, RESOURCE_DEFINITION))
            .collect()
    }
}

impl ServiceAnnotations for ServiceDescriptor {}
impl MethodAnnotations for MethodDescriptor {}
impl MessageAnnotations for MessageDescriptor {}
impl FieldAnnotations for FieldDescriptor {}
impl FileAnnotations for FileDescriptor {}

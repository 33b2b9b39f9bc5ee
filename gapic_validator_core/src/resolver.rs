//! Descriptor resolution over the full set of files supplied to a run.
//!
//! The set keeps its files sorted by name so that every "first match wins"
//! search walks the same order on every run.

use crate::annotations::{FileAnnotations, MessageAnnotations, ResourceDescriptor};
use crate::error::Result;
use crate::names::{local_name, type_kind};
use prost::Message;
use prost_reflect::{DescriptorPool, FileDescriptor, MessageDescriptor, ServiceDescriptor};
use tracing::{debug, trace};

/// `google.protobuf.FileDescriptorSet` with the files left encoded, so that
/// option extensions are preserved until the pool interprets them.
#[derive(Clone, PartialEq, ::prost::Message)]
struct RawFileDescriptorSet {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub file: Vec<Vec<u8>>,
}

/// Where a resource definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// A message annotated with `google.api.resource`.
    Backed(MessageDescriptor),
    /// A file-level `google.api.resource_definition` with no backing message.
    Declared {
        resource_type: String,
        patterns: Vec<String>,
        file: String,
    },
}

impl ResourceSource {
    /// Whether the resolved entity has a field called `name`.
    ///
    /// Declared resources only carry the implied `name` field.
    pub fn has_field(&self, name: &str) -> bool {
        match self {
            ResourceSource::Backed(message) => message.get_field_by_name(name).is_some(),
            ResourceSource::Declared { .. } => name == "name",
        }
    }

    /// The resource patterns, empty for a message without `google.api.resource`.
    pub fn patterns(&self) -> Vec<String> {
        match self {
            ResourceSource::Backed(message) => message
                .resource()
                .map(|resource| resource.pattern)
                .unwrap_or_default(),
            ResourceSource::Declared { patterns, .. } => patterns.clone(),
        }
    }

    /// Fully-qualified message name, or the resource type for declared resources.
    pub fn display_name(&self) -> String {
        match self {
            ResourceSource::Backed(message) => message.full_name().to_string(),
            ResourceSource::Declared { resource_type, .. } => resource_type.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct IndexedResource {
    file: String,
    resource_type: String,
    source: ResourceSource,
}

/// The immutable descriptor graph for one run.
#[derive(Debug, Clone)]
pub struct DescriptorSet {
    pool: DescriptorPool,
    files: Vec<FileDescriptor>,
    /// Message-backed resources, in file order.
    backed: Vec<IndexedResource>,
    /// File-level resource definitions, in file order.
    declared: Vec<IndexedResource>,
}

impl DescriptorSet {
    pub fn new(pool: DescriptorPool) -> Self {
        let mut files: Vec<FileDescriptor> = pool.files().collect();
        files.sort_by(|a, b| a.name().cmp(b.name()));

        let mut backed = Vec::new();
        let mut declared = Vec::new();
        for file in &files {
            for message in all_messages(file) {
                if let Some(resource) = message.resource() {
                    backed.push(IndexedResource {
                        file: file.name().to_string(),
                        resource_type: resource.r#type,
                        source: ResourceSource::Backed(message),
                    });
                }
            }

            for definition in file.resource_definitions() {
                declared.push(IndexedResource {
                    file: file.name().to_string(),
                    resource_type: definition.r#type.clone(),
                    source: declared_source(definition, file),
                });
            }
        }

        debug!(
            files = files.len(),
            resources = backed.len(),
            resource_definitions = declared.len(),
            "Built descriptor set"
        );

        Self {
            pool,
            files,
            backed,
            declared,
        }
    }

    /// Builds the set from serialized `FileDescriptorProto`s.
    pub fn decode(proto_files: &[Vec<u8>]) -> Result<Self> {
        let raw = RawFileDescriptorSet {
            file: proto_files.to_vec(),
        };
        let pool = DescriptorPool::decode(raw.encode_to_vec().as_slice())?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// All files, sorted by name.
    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<FileDescriptor> {
        self.pool.get_file_by_name(name)
    }

    /// Resolves a (possibly unqualified) message name referenced from `context`.
    ///
    /// Tries, in order: the name as local to `context`'s package when it is
    /// unqualified; an exact fully-qualified match anywhere in the set; a
    /// file-level resource definition whose kind equals the local name.
    pub fn resolve_message(&self, name: &str, context: &FileDescriptor) -> Option<ResourceSource> {
        if name.is_empty() {
            return None;
        }
        let name = name.trim_start_matches('.');

        if !name.contains('.') {
            let qualified = qualify(context.package_name(), name);
            trace!(type_name = name, qualified = %qualified, "Resolving message in context package");
            if let Some(message) = self.pool.get_message_by_name(&qualified) {
                return Some(ResourceSource::Backed(message));
            }
        }

        if let Some(message) = self.pool.get_message_by_name(name) {
            return Some(ResourceSource::Backed(message));
        }

        let local = local_name(name);
        trace!(type_name = name, "Falling back to resource definitions");
        self.in_search_order(&self.declared, context)
            .find(|entry| type_kind(&entry.resource_type) == local)
            .map(|entry| entry.source.clone())
    }

    /// Resolves a `{service}/{Kind}` resource type referenced from `context`.
    ///
    /// `context` is searched first, then the other files in name order.
    /// Within a file, messages annotated with `google.api.resource` win over
    /// file-level definitions.
    pub fn resolve_resource_type(
        &self,
        resource_type: &str,
        context: &FileDescriptor,
    ) -> Option<ResourceSource> {
        if resource_type.is_empty() {
            return None;
        }
        trace!(resource_type, context = context.name(), "Resolving resource type");

        let in_file = |file: &str| {
            self.backed
                .iter()
                .chain(&self.declared)
                .find(|entry| entry.file == file && entry.resource_type == resource_type)
        };

        in_file(context.name())
            .or_else(|| {
                self.files
                    .iter()
                    .filter(|file| file.name() != context.name())
                    .find_map(|file| in_file(file.name()))
            })
            .map(|entry| entry.source.clone())
    }

    /// Finds a service by fully-qualified name.
    pub fn resolve_service(&self, name: &str) -> Option<ServiceDescriptor> {
        self.files
            .iter()
            .flat_map(|file| file.services())
            .find(|service| service.full_name() == name)
    }

    /// Finds a message by its name relative to a file's package, trying the
    /// files in order, then as a fully-qualified name.
    pub fn resolve_message_by_local_name(&self, name: &str) -> Option<MessageDescriptor> {
        self.files
            .iter()
            .find_map(|file| {
                self.pool
                    .get_message_by_name(&qualify(file.package_name(), name))
            })
            .or_else(|| self.pool.get_message_by_name(name))
    }

    fn in_search_order<'s>(
        &'s self,
        entries: &'s [IndexedResource],
        context: &'s FileDescriptor,
    ) -> impl Iterator<Item = &'s IndexedResource> + 's {
        let local = entries.iter().filter(move |e| e.file == context.name());
        let remote = entries.iter().filter(move |e| e.file != context.name());
        local.chain(remote)
    }
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

fn declared_source(definition: ResourceDescriptor, file: &FileDescriptor) -> ResourceSource {
    ResourceSource::Declared {
        resource_type: definition.r#type,
        patterns: definition.pattern,
        file: file.name().to_string(),
    }
}

/// Every message of `file`, nested ones included, skipping map entries.
pub fn all_messages(file: &FileDescriptor) -> Vec<MessageDescriptor> {
    let mut messages = Vec::new();
    let mut stack: Vec<MessageDescriptor> = file.messages().collect();
    stack.reverse();
    while let Some(message) = stack.pop() {
        let mut children: Vec<MessageDescriptor> = message
            .child_messages()
            .filter(|child| !child.is_map_entry())
            .collect();
        children.reverse();
        messages.push(message);
        stack.extend(children);
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::compile;
    use pretty_assertions::assert_eq;

    const SHELF: &str = r#"
        syntax = "proto3";
        package library.v1;

        import "google/api/resource.proto";

        option (google.api.resource_definition) = {
            type: "library.example.com/Archive"
            pattern: "archives/{archive}"
        };

        message Shelf {
            option (google.api.resource) = {
                type: "library.example.com/Shelf"
                pattern: "shelves/{shelf}"
            };
            string name = 1;

            message Label {
                string key = 1;
            }
            map<string, string> tags = 2;
        }
    "#;

    const BOOK: &str = r#"
        syntax = "proto3";
        package library.v1;

        import "google/api/resource.proto";
        import "shelf.proto";

        message Book {
            option (google.api.resource) = {
                type: "library.example.com/Book"
                pattern: "shelves/{shelf}/books/{book}"
            };
            string name = 1;
        }
    "#;

    const REMOTE: &str = r#"
        syntax = "proto3";
        package remote.v1;

        import "google/api/resource.proto";

        option (google.api.resource_definition) = {
            type: "library.example.com/Book"
            pattern: "remote/{book}"
        };

        message Imported {}
    "#;

    fn library() -> DescriptorSet {
        compile(&[("shelf.proto", SHELF), ("book.proto", BOOK), ("remote.proto", REMOTE)])
    }

    // ==================== DescriptorSet Tests ====================

    #[test]
    fn test_files_are_sorted() {
        let set = library();
        let names: Vec<&str> = set.files().iter().map(|f| f.name()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_all_messages_includes_nested_but_not_map_entries() {
        let set = library();
        let file = set.file("shelf.proto").unwrap();
        let names: Vec<String> = all_messages(&file)
            .iter()
            .map(|m| m.full_name().to_string())
            .collect();
        assert_eq!(names, vec!["library.v1.Shelf", "library.v1.Shelf.Label"]);
    }

    // ==================== resolve_message Tests ====================

    #[test]
    fn test_resolve_unqualified_message_in_context_package() {
        let set = library();
        let context = set.file("book.proto").unwrap();
        let resolved = set.resolve_message("Shelf", &context).unwrap();
        assert_eq!(resolved.display_name(), "library.v1.Shelf");
    }

    #[test]
    fn test_resolve_qualified_message_from_other_file() {
        let set = library();
        let context = set.file("book.proto").unwrap();
        let resolved = set.resolve_message("remote.v1.Imported", &context).unwrap();
        assert_eq!(resolved.display_name(), "remote.v1.Imported");
    }

    #[test]
    fn test_resolve_message_falls_back_to_resource_definition() {
        let set = library();
        let context = set.file("book.proto").unwrap();
        let resolved = set.resolve_message("Archive", &context).unwrap();

        assert!(matches!(resolved, ResourceSource::Declared { .. }));
        assert!(resolved.has_field("name"));
        assert!(!resolved.has_field("title"));
        assert_eq!(resolved.patterns(), vec!["archives/{archive}"]);
    }

    #[test]
    fn test_resolve_message_not_found() {
        let set = library();
        let context = set.file("book.proto").unwrap();
        assert!(set.resolve_message("Missing", &context).is_none());
        assert!(set.resolve_message("other.v1.Missing", &context).is_none());
        assert!(set.resolve_message("", &context).is_none());
    }

    // ==================== resolve_resource_type Tests ====================

    #[test]
    fn test_resolve_resource_type_prefers_context_file() {
        let set = library();

        let context = set.file("remote.proto").unwrap();
        let resolved = set
            .resolve_resource_type("library.example.com/Book", &context)
            .unwrap();
        assert_eq!(
            resolved,
            ResourceSource::Declared {
                resource_type: "library.example.com/Book".to_string(),
                patterns: vec!["remote/{book}".to_string()],
                file: "remote.proto".to_string(),
            }
        );

        let context = set.file("book.proto").unwrap();
        let resolved = set
            .resolve_resource_type("library.example.com/Book", &context)
            .unwrap();
        assert_eq!(resolved.display_name(), "library.v1.Book");
        assert_eq!(resolved.patterns(), vec!["shelves/{shelf}/books/{book}"]);
    }

    #[test]
    fn test_resolve_resource_type_walks_remaining_files_in_order() {
        // book.proto sorts before remote.proto, so its message wins
        let set = library();
        let context = set.file("shelf.proto").unwrap();
        let resolved = set
            .resolve_resource_type("library.example.com/Book", &context)
            .unwrap();
        assert_eq!(resolved.display_name(), "library.v1.Book");
    }

    #[test]
    fn test_context_definition_wins_over_remote_message() {
        let remote = r#"
            syntax = "proto3";
            package a.v1;

            import "google/api/resource.proto";

            message Shelf {
                option (google.api.resource) = {
                    type: "lib.example.com/Shelf"
                    pattern: "other/{shelf}"
                };
                string name = 1;
            }
        "#;
        let local = r#"
            syntax = "proto3";
            package b.v1;

            import "google/api/resource.proto";

            option (google.api.resource_definition) = {
                type: "lib.example.com/Shelf"
                pattern: "shelves/{shelf}"
            };
        "#;
        let set = compile(&[("a.proto", remote), ("b.proto", local)]);
        let context = set.file("b.proto").unwrap();
        let resolved = set
            .resolve_resource_type("lib.example.com/Shelf", &context)
            .unwrap();

        assert!(matches!(resolved, ResourceSource::Declared { .. }));
        assert_eq!(resolved.patterns(), vec!["shelves/{shelf}"]);
    }

    #[test]
    fn test_resolve_resource_type_from_definition() {
        let set = library();
        let context = set.file("book.proto").unwrap();
        let resolved = set
            .resolve_resource_type("library.example.com/Archive", &context)
            .unwrap();
        assert_eq!(
            resolved,
            ResourceSource::Declared {
                resource_type: "library.example.com/Archive".to_string(),
                patterns: vec!["archives/{archive}".to_string()],
                file: "shelf.proto".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_resource_type_not_found() {
        let set = library();
        let context = set.file("book.proto").unwrap();
        assert!(
            set.resolve_resource_type("library.example.com/Missing", &context)
                .is_none()
        );
    }

    // ==================== Service and Local Name Tests ====================

    #[test]
    fn test_resolve_message_by_local_name() {
        let set = library();
        let message = set.resolve_message_by_local_name("Imported").unwrap();
        assert_eq!(message.full_name(), "remote.v1.Imported");
        assert!(set.resolve_message_by_local_name("Nope").is_none());
    }

    #[test]
    fn test_resolve_service_missing() {
        let set = library();
        assert!(set.resolve_service("library.v1.Library").is_none());
    }
}

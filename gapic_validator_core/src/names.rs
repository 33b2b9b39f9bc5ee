//! Name helpers shared by the validator and the comparator, plus the ambient
//! resources and methods that are exempt from local resolution.

use convert_case::{Case, Casing};

/// Fully-qualified name of the long-running operation handle type.
pub const LONG_RUNNING_OPERATION: &str = "google.longrunning.Operation";

/// Maximum length of the kind component of a resource type.
pub const MAX_RESOURCE_TYPE_KIND_LEN: usize = 100;

/// Resource types provided by the platform rather than any single API.
pub const WELL_KNOWN_TYPES: [&str; 5] = [
    "cloudresourcemanager.googleapis.com/Project",
    "cloudresourcemanager.googleapis.com/Organization",
    "cloudresourcemanager.googleapis.com/Folder",
    "locations.googleapis.com/Location",
    "cloudbilling.googleapis.com/BillingAccount",
];

/// Name patterns of the well-known resource types.
pub const WELL_KNOWN_PATTERNS: [&str; 5] = [
    "projects/{project}",
    "organizations/{organization}",
    "folders/{folder}",
    "projects/{project}/locations/{location}",
    "billingAccounts/{billing_account_id}",
];

/// Kinds of the well-known resource types.
pub const WELL_KNOWN_KINDS: [&str; 5] = [
    "Project",
    "Organization",
    "Folder",
    "Location",
    "BillingAccount",
];

/// Standard IAM mixin methods.
pub const IAM_METHODS: [&str; 3] = ["GetIamPolicy", "SetIamPolicy", "TestIamPermissions"];

/// Package prefix of the IAM mixin messages.
pub const IAM_PACKAGE_PREFIX: &str = "google.iam.v1";

/// Wildcard accepted by `resource_reference.type`.
pub const ANY_RESOURCE_TYPE: &str = "*";

pub fn is_well_known_type(resource_type: &str) -> bool {
    WELL_KNOWN_TYPES.contains(&resource_type)
}

pub fn is_well_known_pattern(pattern: &str) -> bool {
    WELL_KNOWN_PATTERNS.contains(&pattern)
}

pub fn is_well_known_kind(kind: &str) -> bool {
    WELL_KNOWN_KINDS.contains(&kind)
}

pub fn is_iam_method(name: &str) -> bool {
    IAM_METHODS.contains(&name)
}

/// Converts `snake_case` and `SNAKE_CASE` to `CamelCase`.
///
/// Only underscores separate words; every word keeps its first character
/// upper-cased and the remainder lower-cased.
pub fn snake_to_camel(name: &str) -> String {
    name.from_case(Case::Snake).to_case(Case::Pascal)
}

/// The local (unqualified) component of a dotted name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, local)| local)
}

/// The component of a resource type after its first `/`.
pub fn type_kind(resource_type: &str) -> &str {
    resource_type
        .split_once('/')
        .map_or(resource_type, |(_, kind)| kind)
}

/// Splits a resource type into `(service_name, kind)` if it has exactly one `/`.
pub fn split_resource_type(resource_type: &str) -> Option<(&str, &str)> {
    let (service, kind) = resource_type.split_once('/')?;
    if kind.contains('/') {
        return None;
    }
    Some((service, kind))
}

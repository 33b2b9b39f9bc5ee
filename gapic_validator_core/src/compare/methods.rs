use super::Comparator;
use crate::annotations::{FieldAnnotations, FieldBehavior, MethodAnnotations};
use crate::diagnostics::{Diagnostics, Violation};
use crate::gapic_config::{FlatteningConfig, LongRunningConfig, MethodConfig};
use crate::names::{is_iam_method, local_name};
use prost_reflect::MethodDescriptor;

impl Comparator<'_> {
    /// Resolves every configured interface and method and compares the
    /// method-level settings with their annotations.
    pub(super) fn compare_services(&self, diagnostics: &mut Diagnostics) {
        for interface in &self.config.interfaces {
            let Some(service) = self.descriptors.resolve_service(&interface.name) else {
                diagnostics.add(Violation::InterfaceNotFound {
                    interface: interface.name.clone(),
                });
                continue;
            };

            for method_config in &interface.methods {
                let Some(method) = service
                    .methods()
                    .find(|method| method.name() == method_config.name)
                else {
                    diagnostics.add(Violation::MethodNotFound {
                        method: format!("{}.{}", interface.name, method_config.name),
                    });
                    continue;
                };

                self.compare_method(&method, method_config, diagnostics);
            }
        }
    }

    fn compare_method(
        &self,
        method: &MethodDescriptor,
        config: &MethodConfig,
        diagnostics: &mut Diagnostics,
    ) {
        if is_iam_method(&config.name) {
            tracing::trace!(method = method.full_name(), "Skipping IAM method");
            return;
        }

        if let Some(flattening) = &config.flattening {
            compare_flattening(method, flattening, diagnostics);
        }

        if let Some(long_running) = &config.long_running {
            compare_long_running(method, long_running, diagnostics);
        }

        compare_required_fields(method, &config.required_fields, diagnostics);
    }
}

/// Every flattening group must appear verbatim among the method signatures.
fn compare_flattening(
    method: &MethodDescriptor,
    flattening: &FlatteningConfig,
    diagnostics: &mut Diagnostics,
) {
    let Some(signatures) = method.method_signatures() else {
        diagnostics.add(Violation::MissingSignaturesForFlattening {
            method: method.full_name().to_string(),
        });
        return;
    };

    for group in &flattening.groups {
        let joined = group.signature();
        if !signatures.contains(&joined) {
            diagnostics.add(Violation::MissingSignatureForFlattening {
                method: method.full_name().to_string(),
                flattening: joined,
            });
        }
    }
}

/// Response and metadata types are compared by local name only.
fn compare_long_running(
    method: &MethodDescriptor,
    long_running: &LongRunningConfig,
    diagnostics: &mut Diagnostics,
) {
    let Some(info) = method.operation_info() else {
        diagnostics.add(Violation::MissingOperationInfoForLongRunning {
            method: method.full_name().to_string(),
        });
        return;
    };

    let proto_response = local_name(&info.response_type);
    let config_response = local_name(&long_running.return_type);
    if proto_response != config_response {
        diagnostics.add(Violation::LroResponseTypeMismatch {
            method: method.full_name().to_string(),
            proto: proto_response.to_string(),
            config: config_response.to_string(),
        });
    }

    let proto_metadata = local_name(&info.metadata_type);
    let config_metadata = local_name(&long_running.metadata_type);
    if proto_metadata != config_metadata {
        diagnostics.add(Violation::LroMetadataTypeMismatch {
            method: method.full_name().to_string(),
            proto: proto_metadata.to_string(),
            config: config_metadata.to_string(),
        });
    }
}

fn compare_required_fields(
    method: &MethodDescriptor,
    required_fields: &[String],
    diagnostics: &mut Diagnostics,
) {
    let input = method.input();

    for name in required_fields {
        let Some(field) = input.get_field_by_name(name) else {
            diagnostics.add(Violation::RequiredFieldNotFound {
                field: name.clone(),
                method: method.full_name().to_string(),
                input: input.full_name().to_string(),
            });
            continue;
        };

        match field.field_behavior() {
            None => diagnostics.add(Violation::RequiredFieldMissingBehavior {
                field: field.full_name().to_string(),
            }),
            Some(behaviors) if !behaviors.contains(&FieldBehavior::Required) => {
                diagnostics.add(Violation::RequiredFieldNotRequired {
                    field: field.full_name().to_string(),
                })
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compare::tests::compare;
    use crate::diagnostics::Violation;
    use pretty_assertions::assert_eq;

    fn methods_config(methods: &str) -> String {
        format!(
            "interfaces:\n- name: google.example.library.v1.LibraryService\n  methods:\n{methods}"
        )
    }

    // ==================== Interface and Method Resolution Tests ====================

    #[test]
    fn test_missing_interface_skips_methods() {
        let config = r#"
interfaces:
- name: google.example.library.v1.Archive
  methods:
  - name: GetArchive
"#;
        let diagnostics = compare(config);
        assert_eq!(
            diagnostics.violations(),
            &[Violation::InterfaceNotFound {
                interface: "google.example.library.v1.Archive".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_method() {
        let diagnostics = compare(&methods_config("  - name: DeleteBook\n"));
        assert_eq!(
            diagnostics.to_string(),
            "Method \"google.example.library.v1.LibraryService.DeleteBook\" does not exist"
        );
    }

    #[test]
    fn test_iam_methods_are_skipped() {
        let config = methods_config(
            "  - name: GetIamPolicy\n    flattening:\n      groups:\n      - parameters: [resource]\n",
        );
        assert!(compare(&config).is_empty());
    }

    // ==================== Flattening Tests ====================

    #[test]
    fn test_flattening_without_any_signature() {
        let config = methods_config(
            "  - name: ListBooks\n    flattening:\n      groups:\n      - parameters: [parent]\n",
        );
        assert_eq!(
            compare(&config).violations(),
            &[Violation::MissingSignaturesForFlattening {
                method: "google.example.library.v1.LibraryService.ListBooks".to_string()
            }]
        );
    }

    #[test]
    fn test_flattening_group_not_in_signatures() {
        let config = methods_config(
            "  - name: CreateBook\n    flattening:\n      groups:\n      - parameters: [parent, book]\n      - parameters: [book]\n",
        );
        assert_eq!(
            compare(&config).violations(),
            &[Violation::MissingSignatureForFlattening {
                method: "google.example.library.v1.LibraryService.CreateBook".to_string(),
                flattening: "book".to_string(),
            }]
        );
    }

    // ==================== Long Running Tests ====================

    #[test]
    fn test_long_running_without_operation_info() {
        let config = methods_config(
            "  - name: CreateBook\n    long_running:\n      return_type: Book\n      metadata_type: Book\n",
        );
        assert_eq!(
            compare(&config).violations(),
            &[Violation::MissingOperationInfoForLongRunning {
                method: "google.example.library.v1.LibraryService.CreateBook".to_string()
            }]
        );
    }

    #[test]
    fn test_long_running_type_mismatch() {
        let config = methods_config(
            "  - name: ExportBooks\n    long_running:\n      return_type: other.v1.ExportBooksResponse\n      metadata_type: OperationMetadata\n",
        );
        assert_eq!(
            compare(&config).violations(),
            &[Violation::LroMetadataTypeMismatch {
                method: "google.example.library.v1.LibraryService.ExportBooks".to_string(),
                proto: "ExportBooksMetadata".to_string(),
                config: "OperationMetadata".to_string(),
            }]
        );
    }

    // ==================== Required Fields Tests ====================

    #[test]
    fn test_required_fields() {
        let config = methods_config(
            "  - name: CreateBook\n    required_fields: [parent, request_id, etag, missing]\n",
        );
        assert_eq!(
            compare(&config).violations(),
            &[
                Violation::RequiredFieldNotRequired {
                    field: "google.example.library.v1.CreateBookRequest.request_id".to_string()
                },
                Violation::RequiredFieldMissingBehavior {
                    field: "google.example.library.v1.CreateBookRequest.etag".to_string()
                },
                Violation::RequiredFieldNotFound {
                    field: "missing".to_string(),
                    method: "google.example.library.v1.LibraryService.CreateBook".to_string(),
                    input: "google.example.library.v1.CreateBookRequest".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_stages_run_independently() {
        let config = methods_config(
            "  - name: ListBooks\n    flattening:\n      groups:\n      - parameters: [parent]\n    long_running:\n      return_type: A\n      metadata_type: B\n    required_fields: [parent]\n",
        );
        let diagnostics = compare(&config);
        assert_eq!(diagnostics.len(), 3);
        assert!(matches!(
            diagnostics.violations(),
            [
                Violation::MissingSignaturesForFlattening { .. },
                Violation::MissingOperationInfoForLongRunning { .. },
                Violation::RequiredFieldMissingBehavior { .. },
            ]
        ));
    }
}

//! protoc plugin request handling: decode, validate, respond.

use crate::compare::Comparator;
use crate::config::PluginOptions;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, ValidatorError};
use crate::resolver::DescriptorSet;
use crate::validator::Validator;
use prost::Message;
use prost_types::compiler::CodeGeneratorResponse;
use prost_types::compiler::code_generator_response::Feature;
use tracing::{debug, info};

/// `google.protobuf.compiler.CodeGeneratorRequest` with each
/// `FileDescriptorProto` left encoded so custom options survive decoding.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CodeGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    pub file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    pub parameter: Option<String>,
    #[prost(bytes = "vec", repeated, tag = "15")]
    pub proto_file: Vec<Vec<u8>>,
}

/// Runs the comparator (when a legacy config is configured) and the
/// validator over the files to generate, collecting every violation.
pub fn validate(request: &CodeGeneratorRequest) -> Result<Diagnostics> {
    let descriptors = DescriptorSet::decode(&request.proto_file)?;
    let options = PluginOptions::parse(request.parameter.as_deref().unwrap_or_default())?;
    let gapic_config = options.load_gapic_config()?;

    let mut diagnostics = Diagnostics::new();
    if let Some(config) = &gapic_config {
        Comparator::new(&descriptors, config).run(&mut diagnostics);
    }

    let validator = Validator::new(&descriptors);
    let mut annotations = Diagnostics::new();
    for name in &request.file_to_generate {
        let file = descriptors
            .file(name)
            .ok_or_else(|| ValidatorError::file_not_found(name))?;
        validator.validate_file(&file, &mut annotations);
    }
    debug!(
        legacy_config = diagnostics.len(),
        annotations = annotations.len(),
        "Validation passes finished"
    );

    // legacy config findings come first
    diagnostics.merge(annotations);
    Ok(diagnostics)
}

/// Handles a serialized request and produces the response to return to protoc.
///
/// Violations are reported in the response's `error` field; only processing
/// failures are returned as `Err`.
pub fn handle(request: &[u8]) -> Result<CodeGeneratorResponse> {
    let request = CodeGeneratorRequest::decode(request)?;
    info!(
        files_to_generate = request.file_to_generate.len(),
        proto_files = request.proto_file.len(),
        "Handling CodeGeneratorRequest"
    );

    let diagnostics = validate(&request)?;
    if diagnostics.is_empty() {
        info!("No annotation violations found");
    } else {
        info!(violations = diagnostics.len(), "Annotation violations found");
    }

    Ok(CodeGeneratorResponse {
        error: diagnostics.message(),
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    })
}

/// Serializes a response for the caller.
pub fn encode_response(response: &CodeGeneratorResponse) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(response.encoded_len());
    response.encode(&mut buf)?;
    debug!(bytes = buf.len(), "Encoded CodeGeneratorResponse");
    Ok(buf)
}

//! Compiles inline `.proto` sources for unit tests.

use crate::resolver::DescriptorSet;
use prost::Message;
use protox::Compiler;
use protox::file::{ChainFileResolver, File, FileResolver, GoogleFileResolver, IncludeFileResolver};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Clone, PartialEq, ::prost::Message)]
struct EncodedFiles {
    #[prost(bytes = "vec", repeated, tag = "1")]
    file: Vec<Vec<u8>>,
}

/// Serves test sources from memory.
struct InMemoryResolver {
    sources: HashMap<String, String>,
}

impl FileResolver for InMemoryResolver {
    fn resolve_path(&self, path: &Path) -> Option<String> {
        let name = path.to_str()?;
        self.sources.contains_key(name).then(|| name.to_owned())
    }

    fn open_file(&self, name: &str) -> Result<File, protox::Error> {
        match self.sources.get(name) {
            Some(source) => File::from_source(name, source),
            None => Err(protox::Error::file_not_found(name)),
        }
    }
}

fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

/// Compiles `sources` (name, text) and returns every resulting
/// `FileDescriptorProto`, imports included, encoded with options intact.
pub(crate) fn encoded_files(sources: &[(&str, &str)]) -> Vec<Vec<u8>> {
    let mut resolver = ChainFileResolver::new();
    resolver.add(InMemoryResolver {
        sources: sources
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect(),
    });
    resolver.add(IncludeFileResolver::new(testdata()));
    resolver.add(GoogleFileResolver::new());

    let mut compiler = Compiler::with_file_resolver(resolver);
    compiler.include_imports(true);
    compiler
        .open_files(sources.iter().map(|(name, _)| *name))
        .unwrap_or_else(|e| panic!("failed to compile test sources: {e:?}"));

    EncodedFiles::decode(compiler.encode_file_descriptor_set().as_slice())
        .expect("protox produced an invalid FileDescriptorSet")
        .file
}

/// Compiles `sources` into a [`DescriptorSet`] through the same decoding
/// path a plugin request takes.
pub(crate) fn compile(sources: &[(&str, &str)]) -> DescriptorSet {
    DescriptorSet::decode(&encoded_files(sources)).expect("failed to build descriptor set")
}

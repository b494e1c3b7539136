//! Binary analyzers: turn one artifact file into a symbol graph.
//!
//! [`BinaryAnalyzer`] is the seam for real metadata readers. The bundled
//! [`ManifestAnalyzer`] reads a JSON symbol manifest published next to the
//! binary (`Foo.dll.symbols.json`); a binary without one is not a managed
//! artifact as far as this analyzer is concerned.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pkgscope_core::{
    MemberKind, MemberNode, MethodKind, Modifiers, Parameter, SymbolGraph, SymbolGraphBuilder,
    TypeKind, TypeNode, Visibility,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// What an analyzer extracts from one binary.
#[derive(Debug, Clone)]
pub struct AnalyzedArtifact {
    pub graph: SymbolGraph,
    /// Version embedded in the binary, when it declares one.
    pub binary_version: Option<String>,
    /// Names of other artifacts this one references.
    pub referenced_artifacts: Vec<String>,
}

/// Reads type and member metadata from an artifact file.
#[async_trait]
pub trait BinaryAnalyzer: Send + Sync {
    /// Analyze `path`. `docs` is the companion documentation file, if any.
    ///
    /// Returns `Ok(None)` when the file is not a managed artifact.
    async fn analyze(&self, path: &Path, docs: Option<&Path>) -> Result<Option<AnalyzedArtifact>>;
}

/// Companion documentation file (`Foo.xml` next to `Foo.dll`), if present.
pub async fn doc_comments_path(artifact: &Path) -> Option<PathBuf> {
    let docs = artifact.with_extension("xml");
    match tokio::fs::metadata(&docs).await {
        Ok(meta) if meta.is_file() => Some(docs),
        _ => None,
    }
}

/// Sidecar location for `artifact`.
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_owned();
    name.push(".symbols.json");
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Manifest format
// ---------------------------------------------------------------------------

/// Top-level symbol manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolManifest {
    #[serde(default)]
    pub binary_version: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeEntry {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub kind: TypeKind,
    #[serde(default = "public")]
    pub visibility: Visibility,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberEntry {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub method_kind: MethodKind,
    #[serde(default = "public")]
    pub visibility: Visibility,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Return type for methods, value type otherwise.
    #[serde(default, alias = "type")]
    pub return_type: Option<String>,
}

fn public() -> Visibility {
    Visibility::Public
}

impl SymbolManifest {
    pub fn parse(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Build the symbol graph described by this manifest.
    pub fn into_artifact(self) -> AnalyzedArtifact {
        let mut builder = SymbolGraphBuilder::new();
        for entry in self.types {
            let mut node = TypeNode::new(entry.namespace, entry.name, entry.kind)
                .with_visibility(entry.visibility)
                .with_modifiers(entry.modifiers)
                .with_interfaces(entry.interfaces);
            if let Some(display) = entry.display_name {
                node = node.with_display_name(display);
            }
            if let Some(base) = entry.base_type {
                node = node.with_base(base);
            }
            let owner = builder.add_type(node);
            for m in entry.members {
                let mut member = MemberNode::new(m.name, m.kind)
                    .with_method_kind(m.method_kind)
                    .with_visibility(m.visibility)
                    .with_modifiers(m.modifiers)
                    .with_parameters(m.parameters);
                if let Some(ret) = m.return_type {
                    member = member.with_return_type(ret);
                }
                builder.add_member(owner, member);
            }
        }
        AnalyzedArtifact {
            graph: builder.build(),
            binary_version: self.binary_version,
            referenced_artifacts: self.references,
        }
    }
}

/// Analyzer backed by `<artifact>.symbols.json` sidecar manifests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestAnalyzer;

#[async_trait]
impl BinaryAnalyzer for ManifestAnalyzer {
    async fn analyze(&self, path: &Path, docs: Option<&Path>) -> Result<Option<AnalyzedArtifact>> {
        let sidecar = sidecar_path(path);
        let text = match tokio::fs::read_to_string(&sidecar).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(artifact = %path.display(), "no symbol manifest");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let manifest = SymbolManifest::parse(&text).map_err(|e| AnalysisError::AnalyzerFailed {
            path: sidecar.clone(),
            detail: e.to_string(),
        })?;
        debug!(
            artifact = %path.display(),
            types = manifest.types.len(),
            docs = docs.is_some(),
            "read symbol manifest"
        );
        Ok(Some(manifest.into_artifact()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MANIFEST: &str = r#"{
        "binary_version": "13.0.0.0",
        "references": ["netstandard"],
        "types": [
            {
                "namespace": "Newtonsoft.Json",
                "name": "JsonConverter",
                "kind": "class",
                "modifiers": { "abstract": true },
                "members": [
                    { "name": "CanConvert", "kind": "method", "return_type": "bool",
                      "modifiers": { "abstract": true },
                      "parameters": [{ "name": "objectType", "type": "System.Type" }] },
                    { "name": "get_CanRead", "kind": "method", "method_kind": "property_accessor", "return_type": "bool" },
                    { "name": "CanRead", "kind": "property", "type": "bool" }
                ]
            },
            {
                "namespace": "Newtonsoft.Json",
                "name": "JsonConverter`1",
                "display_name": "JsonConverter<T>",
                "kind": "class",
                "base_type": "Newtonsoft.Json.JsonConverter"
            },
            {
                "namespace": "Newtonsoft.Json.Utilities",
                "name": "MiscellaneousUtils",
                "kind": "class",
                "visibility": "internal",
                "modifiers": { "static": true }
            }
        ]
    }"#;

    #[test]
    fn manifest_builds_graph() {
        let artifact = SymbolManifest::parse(MANIFEST).unwrap().into_artifact();
        assert_eq!(artifact.binary_version.as_deref(), Some("13.0.0.0"));
        assert_eq!(artifact.referenced_artifacts, vec!["netstandard"]);

        let graph = &artifact.graph;
        assert_eq!(graph.type_count(), 3);
        assert_eq!(graph.member_count(), 3);

        let generic = graph.type_by_full_name("Newtonsoft.Json.JsonConverter`1").unwrap();
        assert_eq!(graph.type_node(generic).unwrap().display_name, "JsonConverter<T>");
        let base = graph.base_of(generic).unwrap();
        assert_eq!(graph.type_node(base).unwrap().name, "JsonConverter");

        let converter = graph.type_node(base).unwrap();
        let first = graph.member(converter.members()[0]).unwrap();
        assert_eq!(first.parameters[0].type_name, "System.Type");
        assert!(first.modifiers.is_abstract);
        let accessor = graph.member(converter.members()[1]).unwrap();
        assert!(!accessor.is_ordinary_method());
        let prop = graph.member(converter.members()[2]).unwrap();
        assert_eq!(prop.return_type.as_deref(), Some("bool"));

        let utils = graph.type_by_full_name("Newtonsoft.Json.Utilities.MiscellaneousUtils").unwrap();
        let utils = graph.type_node(utils).unwrap();
        assert_eq!(utils.visibility, Visibility::Internal);
        assert!(utils.is_static_class());
    }

    #[tokio::test]
    async fn missing_sidecar_is_not_analyzable() {
        let dir = tempfile::tempdir().unwrap();
        let dll = dir.path().join("Native.dll");
        fs::write(&dll, b"MZ").unwrap();
        assert!(ManifestAnalyzer.analyze(&dll, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_sidecar_and_docs() {
        let dir = tempfile::tempdir().unwrap();
        let dll = dir.path().join("Newtonsoft.Json.dll");
        fs::write(&dll, b"MZ").unwrap();
        fs::write(sidecar_path(&dll), MANIFEST).unwrap();
        assert_eq!(doc_comments_path(&dll).await, None);
        fs::create_dir(dir.path().join("Newtonsoft.Json.xml")).unwrap();
        assert_eq!(doc_comments_path(&dll).await, None);
        fs::remove_dir(dir.path().join("Newtonsoft.Json.xml")).unwrap();
        fs::write(dir.path().join("Newtonsoft.Json.xml"), "<doc/>").unwrap();
        let docs = doc_comments_path(&dll).await.unwrap();

        let artifact = ManifestAnalyzer.analyze(&dll, Some(&docs)).await.unwrap().unwrap();
        assert_eq!(artifact.graph.type_count(), 3);
    }

    #[tokio::test]
    async fn malformed_sidecar_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dll = dir.path().join("Broken.dll");
        fs::write(sidecar_path(&dll), "{ not json").unwrap();
        let err = ManifestAnalyzer.analyze(&dll, None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::AnalyzerFailed { .. }));
    }
}

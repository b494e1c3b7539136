//! The immutable product of analyzing one artifact.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::symbols::{SymbolGraph, TypeKind};

/// Where an analyzed artifact came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    pub package_id: String,
    /// Concrete package version the artifact was taken from.
    pub package_version: String,
    /// Platform tag of the group the artifact was located in.
    pub platform: Option<String>,
    /// Artifact file name, e.g. `Newtonsoft.Json.dll`.
    pub file_name: String,
    /// Version string embedded in the binary itself.
    pub binary_version: Option<String>,
}

impl ArtifactIdentity {
    /// True when both identities name the same file of the same package build.
    /// The binary version is ignored.
    pub fn same_artifact(&self, other: &ArtifactIdentity) -> bool {
        self.package_id.eq_ignore_ascii_case(&other.package_id)
            && self.package_version.eq_ignore_ascii_case(&other.package_version)
            && self.file_name.eq_ignore_ascii_case(&other.file_name)
            && match (&self.platform, &other.platform) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Type counts by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    pub all: usize,
    pub public: usize,
    pub classes: usize,
    pub static_classes: usize,
    pub interfaces: usize,
    pub enums: usize,
    pub structs: usize,
    pub delegates: usize,
}

impl TypeCounts {
    pub fn of(graph: &SymbolGraph) -> Self {
        let mut counts = TypeCounts::default();
        for (_, t) in graph.types() {
            counts.all += 1;
            if t.visibility.is_public() {
                counts.public += 1;
            }
            match t.kind {
                TypeKind::Class if t.is_static_class() => counts.static_classes += 1,
                TypeKind::Class => counts.classes += 1,
                TypeKind::Interface => counts.interfaces += 1,
                TypeKind::Enum => counts.enums += 1,
                TypeKind::Struct => counts.structs += 1,
                TypeKind::Delegate => counts.delegates += 1,
            }
        }
        counts
    }
}

/// Result of analyzing one concrete artifact file.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub identity: ArtifactIdentity,
    /// The artifact is a compile-time reference stub.
    pub reference_only: bool,
    pub graph: SymbolGraph,
    pub counts: TypeCounts,
    /// Distinct namespaces, sorted.
    pub namespaces: Vec<String>,
    /// Number of types declared in each namespace.
    pub namespace_type_counts: BTreeMap<String, usize>,
    /// Names of artifacts this one references.
    pub referenced_artifacts: Vec<String>,
}

impl AnalysisResult {
    pub fn new(
        identity: ArtifactIdentity,
        reference_only: bool,
        graph: SymbolGraph,
        referenced_artifacts: Vec<String>,
    ) -> Self {
        let counts = TypeCounts::of(&graph);
        let mut namespace_type_counts = BTreeMap::new();
        for (_, t) in graph.types() {
            *namespace_type_counts.entry(t.namespace.clone()).or_insert(0) += 1;
        }
        let namespaces = namespace_type_counts.keys().cloned().collect();
        AnalysisResult {
            identity,
            reference_only,
            graph,
            counts,
            namespaces,
            namespace_type_counts,
            referenced_artifacts,
        }
    }
}

//! Tool-call arguments.
//!
//! A call is `{"tool": "<name>", "args": {...}}`. Optional fields may be
//! omitted; blank strings count as omitted.

use pkgscope_analysis::ArtifactRequest;
use serde::{Deserialize, Serialize};

/// Default and ceiling for search results.
pub const DEFAULT_SEARCH_RESULTS: usize = 20;
pub const MAX_SEARCH_RESULTS: usize = 100;

/// Default and ceiling for listing limits.
pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 500;

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPackagesArgs {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl SearchPackagesArgs {
    pub fn effective_max_results(&self) -> usize {
        self.max_results
            .unwrap_or(DEFAULT_SEARCH_RESULTS)
            .clamp(1, MAX_SEARCH_RESULTS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageArgs {
    pub package_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionArgs {
    pub package_id: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Identifies one artifact, loosely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactArgs {
    pub package_id: String,
    #[serde(default)]
    pub artifact_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl ArtifactArgs {
    pub fn to_request(&self) -> ArtifactRequest {
        ArtifactRequest {
            package_id: self.package_id.clone(),
            artifact_name: self.artifact_name.clone(),
            version: self.version.clone(),
            platform: self.platform.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeAllArgs {
    pub package_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTypeMembersArgs {
    #[serde(flatten)]
    pub artifact: ArtifactArgs,
    pub type_name: String,
    #[serde(default)]
    pub include_inherited: bool,
    #[serde(default = "yes")]
    pub public_only: bool,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTypesArgs {
    #[serde(flatten)]
    pub artifact: ArtifactArgs,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "yes")]
    pub public_only: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchTypesArgs {
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }
}

/// One tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "kebab-case")]
pub enum ToolCall {
    SearchPackages(SearchPackagesArgs),
    GetPackageDetails(PackageArgs),
    ListPackageArtifacts(PackageVersionArgs),
    AnalyzeArtifact(ArtifactArgs),
    AnalyzeAllArtifacts(AnalyzeAllArgs),
    ListTypeMembers(ListTypeMembersArgs),
    SearchTypes(SearchTypesArgs),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::SearchPackages(_) => "search-packages",
            ToolCall::GetPackageDetails(_) => "get-package-details",
            ToolCall::ListPackageArtifacts(_) => "list-package-artifacts",
            ToolCall::AnalyzeArtifact(_) => "analyze-artifact",
            ToolCall::AnalyzeAllArtifacts(_) => "analyze-all-artifacts",
            ToolCall::ListTypeMembers(_) => "list-type-members",
            ToolCall::SearchTypes(_) => "search-types",
        }
    }
}

//! The tool-call surface.
//!
//! Every tool returns a text report. Failures never escape: they are
//! rendered as messages so a caller always gets something to show.

use std::sync::Arc;

use pkgscope_analysis::{
    find_type, list_members, list_types, AnalysisError, AnalysisService, MemberFilter, MemberQuery,
    Result, TypeFilter, TypeQuery,
};
use pkgscope_core::AnalysisResult;
use pkgscope_registry::sort_descending;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::args::{
    AnalyzeAllArgs, ArtifactArgs, ListTypeMembersArgs, PackageArgs, PackageVersionArgs,
    SearchPackagesArgs, SearchTypesArgs, ToolCall,
};
use crate::format;

pub struct Toolbox {
    service: Arc<AnalysisService>,
    analyze_on_miss: bool,
}

impl Toolbox {
    pub fn new(service: Arc<AnalysisService>) -> Self {
        Toolbox {
            service,
            analyze_on_miss: false,
        }
    }

    /// Let symbol queries analyze an artifact that is not cached yet instead
    /// of reporting a cache miss. Useful for one-shot invocations.
    pub fn analyze_on_miss(mut self, enabled: bool) -> Self {
        self.analyze_on_miss = enabled;
        self
    }

    pub fn service(&self) -> &AnalysisService {
        &self.service
    }

    /// Run one tool call and render its outcome.
    pub async fn call(&self, call: &ToolCall, cancel: &CancellationToken) -> String {
        let outcome = match call {
            ToolCall::SearchPackages(a) => self.search_packages(a, cancel).await,
            ToolCall::GetPackageDetails(a) => self.get_package_details(a, cancel).await,
            ToolCall::ListPackageArtifacts(a) => self.list_package_artifacts(a, cancel).await,
            ToolCall::AnalyzeArtifact(a) => self.analyze_artifact(a, cancel).await,
            ToolCall::AnalyzeAllArtifacts(a) => self.analyze_all_artifacts(a, cancel).await,
            ToolCall::ListTypeMembers(a) => self.list_type_members(a, cancel).await,
            ToolCall::SearchTypes(a) => self.search_types(a, cancel).await,
        };
        outcome.unwrap_or_else(|e| {
            debug!(tool = call.name(), error = %e, "tool failed");
            format::error(&e)
        })
    }

    pub async fn search_packages(&self, args: &SearchPackagesArgs, cancel: &CancellationToken) -> Result<String> {
        let results = self
            .service
            .search(&args.query, args.effective_max_results(), cancel)
            .await?;
        Ok(format::package_search(&args.query, &results))
    }

    pub async fn get_package_details(&self, args: &PackageArgs, cancel: &CancellationToken) -> Result<String> {
        let mut versions = self.service.versions(&args.package_id, cancel).await?;
        sort_descending(&mut versions);
        Ok(format::package_details(&versions))
    }

    pub async fn list_package_artifacts(
        &self,
        args: &PackageVersionArgs,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let resolved = self
            .service
            .resolve_package(&args.package_id, args.version.as_deref(), cancel)
            .await?;
        Ok(format::package_artifacts(&resolved.package))
    }

    pub async fn analyze_artifact(&self, args: &ArtifactArgs, cancel: &CancellationToken) -> Result<String> {
        let result = self.service.resolve_and_analyze(&args.to_request(), cancel).await?;
        Ok(format::analysis(&result))
    }

    pub async fn analyze_all_artifacts(&self, args: &AnalyzeAllArgs, cancel: &CancellationToken) -> Result<String> {
        let batch = self
            .service
            .analyze_all(
                &args.package_id,
                args.version.as_deref(),
                args.platform.as_deref(),
                cancel,
            )
            .await?;
        Ok(format::batch(&batch))
    }

    async fn analysis_for(&self, args: &ArtifactArgs, cancel: &CancellationToken) -> Result<Arc<AnalysisResult>> {
        let cached = self.service.cached_analysis(
            &args.package_id,
            args.artifact_name.as_deref(),
            args.version.as_deref(),
            args.platform.as_deref(),
        );
        match cached {
            Err(AnalysisError::CacheMiss { .. }) if self.analyze_on_miss => {
                self.service.resolve_and_analyze(&args.to_request(), cancel).await
            }
            other => other,
        }
    }

    pub async fn list_type_members(
        &self,
        args: &ListTypeMembersArgs,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let kind: MemberFilter = args.kind.as_deref().unwrap_or("").parse()?;
        let result = self.analysis_for(&args.artifact, cancel).await?;
        let graph = &result.graph;
        let (ty, _) = find_type(graph, &args.type_name).ok_or_else(|| AnalysisError::TypeNotFound {
            name: args.type_name.trim().to_string(),
            artifact: result.identity.file_name.clone(),
        })?;
        let query = MemberQuery {
            include_inherited: args.include_inherited,
            public_only: args.public_only,
            pattern: args.pattern.clone(),
            kind,
        };
        let listing = list_members(graph, ty, &query)?;
        let mut out = format::member_listing(graph, ty, args.include_inherited, &listing);
        if result.reference_only {
            out.push_str("\nNote: members come from a reference-only artifact.\n");
        }
        Ok(out)
    }

    pub async fn search_types(&self, args: &SearchTypesArgs, cancel: &CancellationToken) -> Result<String> {
        let kind: TypeFilter = args.kind.as_deref().unwrap_or("").parse()?;
        let result = self.analysis_for(&args.artifact, cancel).await?;
        let query = TypeQuery {
            pattern: args.pattern.clone(),
            kind,
            public_only: args.public_only,
            limit: args.effective_limit(),
        };
        let listing = list_types(&result.graph, &query)?;
        Ok(format::type_listing(&result, args.pattern.as_deref(), &listing))
    }
}

//! Artifact analysis and symbol queries for pkgscope.
//!
//! - **Analyzers**: the [`BinaryAnalyzer`] seam and the sidecar-backed
//!   [`ManifestAnalyzer`]
//! - **Analysis cache**: keyed results with a latest alias and a
//!   per-package index
//! - **Invoker**: [`AnalysisService`] drives version selection, download,
//!   artifact location and analysis, once per cache key
//! - **Queries**: type lookup and filtered type/member listings

pub mod analyzer;
pub mod cache;
pub mod error;
pub mod invoker;
pub mod query;
pub mod wildcard;

pub use analyzer::{AnalyzedArtifact, BinaryAnalyzer, ManifestAnalyzer, SymbolManifest};
pub use cache::{AnalysisCache, CacheTtl};
pub use error::{AnalysisError, Result};
pub use invoker::{
    AnalysisService, ArtifactOutcome, ArtifactRequest, BatchAnalysis, ResolvedPackage, Timeouts,
};
pub use query::{
    find_type, flatten_members, list_members, list_types, MemberFilter, MemberListing,
    MemberQuery, TypeFilter, TypeListing, TypeQuery,
};
pub use wildcard::{Wildcard, MAX_PATTERN_LENGTH};

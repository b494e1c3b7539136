//! Tool-call surface for pkgscope.
//!
//! [`Toolbox`] runs the seven tools (package search and details, artifact
//! listing, analysis, batch analysis, member listing, type search) against
//! one shared [`pkgscope_analysis::AnalysisService`] and renders text
//! reports. [`ToolCall`] is the serialized form of a call.

pub mod args;
pub mod format;
pub mod toolbox;

pub use args::{
    AnalyzeAllArgs, ArtifactArgs, ListTypeMembersArgs, PackageArgs, PackageVersionArgs,
    SearchPackagesArgs, SearchTypesArgs, ToolCall,
};
pub use toolbox::Toolbox;

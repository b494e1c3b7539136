//! Core data model for pkgscope.
//!
//! Holds the pieces every other crate agrees on: the symbol graph an analyzer
//! produces for one artifact, the immutable [`AnalysisResult`] wrapping it,
//! the composite [`ArtifactKey`] analysis results are cached under, and the
//! [`ExpiringMap`] the caches are built from.

pub mod analysis;
pub mod error;
pub mod expiry;
pub mod key;
pub mod symbols;

pub use analysis::{AnalysisResult, ArtifactIdentity, TypeCounts};
pub use error::ErrorKind;
pub use expiry::{Clock, ExpiringMap, ManualClock, SystemClock};
pub use key::{is_binary_file, normalize_artifact_name, ArtifactKey, LATEST};
pub use symbols::{
    MemberId, MemberKind, MemberNode, MethodKind, Modifiers, Parameter, SymbolGraph,
    SymbolGraphBuilder, TypeId, TypeKind, TypeNode, Visibility,
};

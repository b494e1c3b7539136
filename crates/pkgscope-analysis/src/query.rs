//! Symbol queries over an analyzed artifact.
//!
//! Type lookup tries progressively looser name forms. Type and member
//! listings are filter pipelines: visibility, then kind, then name pattern,
//! then ordering.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use pkgscope_core::{MemberId, MemberKind, MemberNode, SymbolGraph, TypeId, TypeKind, TypeNode};

use crate::error::{AnalysisError, Result};
use crate::wildcard::Wildcard;

/// Find a type by fully-qualified name, then display name, then simple name.
/// Each form is an exact, case-sensitive comparison.
pub fn find_type<'g>(graph: &'g SymbolGraph, name: &str) -> Option<(TypeId, &'g TypeNode)> {
    let name = name.trim();
    if let Some(id) = graph.type_by_full_name(name) {
        return graph.type_node(id).map(|t| (id, t));
    }
    graph
        .types()
        .find(|(_, t)| t.display_name == name)
        .or_else(|| graph.types().find(|(_, t)| t.name == name))
}

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Kind filter for type listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    Any,
    /// Non-static classes.
    Class,
    Interface,
    Enum,
    Struct,
}

impl TypeFilter {
    pub fn accepts(self, t: &TypeNode) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Class => t.kind == TypeKind::Class && !t.is_static_class(),
            TypeFilter::Interface => t.kind == TypeKind::Interface,
            TypeFilter::Enum => t.kind == TypeKind::Enum,
            TypeFilter::Struct => t.kind == TypeKind::Struct,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" | "all" => Ok(TypeFilter::Any),
            "class" => Ok(TypeFilter::Class),
            "interface" => Ok(TypeFilter::Interface),
            "enum" => Ok(TypeFilter::Enum),
            "struct" => Ok(TypeFilter::Struct),
            other => Err(AnalysisError::InvalidArgument {
                name: "kind",
                detail: format!("unknown type kind '{other}' (expected class, interface, enum, struct or any)"),
            }),
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeFilter::Any => "any",
            TypeFilter::Class => "class",
            TypeFilter::Interface => "interface",
            TypeFilter::Enum => "enum",
            TypeFilter::Struct => "struct",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TypeQuery {
    pub pattern: Option<String>,
    pub kind: TypeFilter,
    pub public_only: bool,
    pub limit: usize,
}

impl Default for TypeQuery {
    fn default() -> Self {
        TypeQuery {
            pattern: None,
            kind: TypeFilter::Any,
            public_only: true,
            limit: 100,
        }
    }
}

/// Matching types, truncated, and how many matched before truncation.
#[derive(Debug)]
pub struct TypeListing<'g> {
    pub types: Vec<(TypeId, &'g TypeNode)>,
    pub total: usize,
}

pub fn list_types<'g>(graph: &'g SymbolGraph, query: &TypeQuery) -> Result<TypeListing<'g>> {
    let pattern = Wildcard::parse_optional(query.pattern.as_deref())?;
    let mut types: Vec<_> = graph
        .types()
        .filter(|(_, t)| !query.public_only || t.visibility.is_public())
        .filter(|(_, t)| query.kind.accepts(t))
        .filter(|(_, t)| pattern.as_ref().map_or(true, |p| p.is_match(&t.full_name)))
        .collect();
    let total = types.len();
    types.sort_by(|(_, a), (_, b)| by_name(&a.name, &b.name));
    types.truncate(query.limit);
    Ok(TypeListing { types, total })
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Kind filter for member listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberFilter {
    #[default]
    Any,
    Only(MemberKind),
}

impl MemberFilter {
    pub fn accepts(self, m: &MemberNode) -> bool {
        match self {
            MemberFilter::Any => true,
            MemberFilter::Only(kind) => m.kind == kind,
        }
    }
}

impl FromStr for MemberFilter {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.trim().to_lowercase().as_str() {
            "" | "any" | "all" => return Ok(MemberFilter::Any),
            "method" | "methods" => MemberKind::Method,
            "constructor" | "constructors" | "ctor" => MemberKind::Constructor,
            "property" | "properties" => MemberKind::Property,
            "field" | "fields" => MemberKind::Field,
            "event" | "events" => MemberKind::Event,
            other => {
                return Err(AnalysisError::InvalidArgument {
                    name: "kind",
                    detail: format!("unknown member kind '{other}'"),
                })
            }
        };
        Ok(MemberFilter::Only(kind))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    pub include_inherited: bool,
    pub public_only: bool,
    pub pattern: Option<String>,
    pub kind: MemberFilter,
}

/// Members of one type, grouped by kind and ordered for display.
#[derive(Debug, Default)]
pub struct MemberListing<'g> {
    pub constructors: Vec<&'g MemberNode>,
    pub methods: Vec<&'g MemberNode>,
    pub properties: Vec<&'g MemberNode>,
    pub fields: Vec<&'g MemberNode>,
    pub events: Vec<&'g MemberNode>,
}

impl MemberListing<'_> {
    pub fn len(&self) -> usize {
        self.constructors.len()
            + self.methods.len()
            + self.properties.len()
            + self.fields.len()
            + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Members declared on `ty`, followed (when `include_inherited`) by those of
/// each base type up the chain. Base-type constructors are not inherited.
/// A base chain that loops back on itself is cut at the first repeat.
pub fn flatten_members(graph: &SymbolGraph, ty: TypeId, include_inherited: bool) -> IndexSet<MemberId> {
    let mut members = IndexSet::new();
    let mut seen = HashSet::new();
    let mut current = Some(ty);
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        let Some(node) = graph.type_node(id) else {
            break;
        };
        for &m in node.members() {
            let inherited_ctor = id != ty
                && graph
                    .member(m)
                    .map_or(false, |m| m.kind == MemberKind::Constructor);
            if !inherited_ctor {
                members.insert(m);
            }
        }
        if !include_inherited {
            break;
        }
        current = graph.base_of(id);
    }
    members
}

/// The name a member is matched by. Constructors answer to the simple name
/// of their declaring type, without generic arity.
fn match_name<'g>(graph: &'g SymbolGraph, m: &'g MemberNode) -> &'g str {
    if m.kind != MemberKind::Constructor {
        return &m.name;
    }
    graph
        .type_node(m.declaring_type)
        .and_then(|t| t.name.split('`').next())
        .unwrap_or(&m.name)
}

pub fn list_members<'g>(graph: &'g SymbolGraph, ty: TypeId, query: &MemberQuery) -> Result<MemberListing<'g>> {
    let pattern = Wildcard::parse_optional(query.pattern.as_deref())?;
    let mut listing = MemberListing::default();

    let selected = flatten_members(graph, ty, query.include_inherited)
        .into_iter()
        .filter_map(|id| graph.member(id))
        .filter(|m| !query.public_only || m.visibility.is_public())
        .filter(|m| query.kind.accepts(m))
        .filter(|m| pattern.as_ref().map_or(true, |p| p.is_match(match_name(graph, m))));

    for m in selected {
        match m.kind {
            MemberKind::Constructor => listing.constructors.push(m),
            MemberKind::Method if m.is_ordinary_method() => listing.methods.push(m),
            MemberKind::Method => {}
            MemberKind::Property => listing.properties.push(m),
            MemberKind::Field => listing.fields.push(m),
            MemberKind::Event => listing.events.push(m),
        }
    }

    listing.constructors.sort_by_key(|m| m.parameters.len());
    listing.properties.sort_by(|a, b| by_name(&a.name, &b.name));
    listing.fields.sort_by(|a, b| by_name(&a.name, &b.name));
    listing.events.sort_by(|a, b| by_name(&a.name, &b.name));
    Ok(listing)
}

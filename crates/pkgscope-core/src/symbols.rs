//! Symbol graph produced by analyzing one artifact.
//!
//! The graph is an arena: types and members live in flat vectors and refer to
//! each other by [`TypeId`] / [`MemberId`]. Base types are recorded by their
//! fully-qualified name and resolved against the arena on demand, so a base
//! type defined in another artifact simply resolves to nothing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a type within a [`SymbolGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

/// Index of a member within a [`SymbolGraph`].
///
/// Member identity is arena identity: an override and the base declaration it
/// overrides are distinct members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub usize);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Declared accessibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    ProtectedInternal,
    PrivateProtected,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::ProtectedInternal => "protected internal",
            Visibility::PrivateProtected => "private protected",
            Visibility::Private => "private",
        }
    }
}

/// Category of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Struct,
    Delegate,
}

impl TypeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Struct => "struct",
            TypeKind::Delegate => "delegate",
        }
    }
}

/// Category of a member declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Constructor,
    Property,
    Field,
    Event,
}

/// Sub-kind of a method. Only [`MethodKind::Ordinary`] methods are listed as
/// methods; accessors and operators belong to their owning construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Ordinary,
    PropertyAccessor,
    EventAccessor,
    Operator,
    Conversion,
    Destructor,
}

/// Declaration modifiers shared by types and members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(rename = "override")]
    pub is_override: bool,
    #[serde(rename = "sealed")]
    pub is_sealed: bool,
}

impl Modifiers {
    pub const STATIC: Modifiers = Modifiers {
        is_static: true,
        is_abstract: false,
        is_virtual: false,
        is_override: false,
        is_sealed: false,
    };

    pub const VIRTUAL: Modifiers = Modifiers {
        is_static: false,
        is_abstract: false,
        is_virtual: true,
        is_override: false,
        is_sealed: false,
    };

    pub const OVERRIDE: Modifiers = Modifiers {
        is_static: false,
        is_abstract: false,
        is_virtual: false,
        is_override: true,
        is_sealed: false,
    };

    /// Keywords in declaration order, e.g. `["static"]` or `["sealed", "override"]`.
    pub fn keywords(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.is_static {
            out.push("static");
        }
        if self.is_abstract {
            out.push("abstract");
        }
        if self.is_sealed {
            out.push("sealed");
        }
        if self.is_virtual {
            out.push("virtual");
        }
        if self.is_override {
            out.push("override");
        }
        out
    }
}

/// A method or constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A type declaration.
#[derive(Debug, Clone)]
pub struct TypeNode {
    /// Simple name, e.g. `JsonConvert`.
    pub name: String,
    /// Containing namespace; empty for the global namespace.
    pub namespace: String,
    /// Fully-qualified name, e.g. `Newtonsoft.Json.JsonConvert`.
    pub full_name: String,
    /// Minimally-qualified display name, e.g. `JsonConverter<T>` or `Outer.Inner`.
    pub display_name: String,
    pub kind: TypeKind,
    pub visibility: Visibility,
    pub modifiers: Modifiers,
    /// Fully-qualified name of the base type, if any.
    pub base_type: Option<String>,
    pub interfaces: Vec<String>,
    members: Vec<MemberId>,
}

impl TypeNode {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        let full_name = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{namespace}.{name}")
        };
        TypeNode {
            display_name: name.clone(),
            name,
            namespace,
            full_name,
            kind,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            base_type: None,
            interfaces: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_base(mut self, base_full_name: impl Into<String>) -> Self {
        self.base_type = Some(base_full_name.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<String>) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// A class declared `static` (abstract + sealed at the binary level).
    pub fn is_static_class(&self) -> bool {
        self.kind == TypeKind::Class && self.modifiers.is_static
    }

    /// Members declared directly on this type, in declaration order.
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }
}

/// A member declaration.
#[derive(Debug, Clone)]
pub struct MemberNode {
    pub name: String,
    pub kind: MemberKind,
    pub method_kind: MethodKind,
    pub visibility: Visibility,
    pub modifiers: Modifiers,
    pub parameters: Vec<Parameter>,
    /// Return type for methods, value type for properties/fields/events.
    pub return_type: Option<String>,
    /// The type that declares this member; set when added to a graph.
    pub declaring_type: TypeId,
}

impl MemberNode {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        MemberNode {
            name: name.into(),
            kind,
            method_kind: MethodKind::Ordinary,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            parameters: Vec::new(),
            return_type: None,
            declaring_type: TypeId(0),
        }
    }

    pub fn method(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        MemberNode::new(name, MemberKind::Method).with_return_type(return_type)
    }

    pub fn constructor(parameters: Vec<Parameter>) -> Self {
        MemberNode::new(".ctor", MemberKind::Constructor).with_parameters(parameters)
    }

    pub fn property(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        MemberNode::new(name, MemberKind::Property).with_return_type(type_name)
    }

    pub fn field(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        MemberNode::new(name, MemberKind::Field).with_return_type(type_name)
    }

    pub fn event(name: impl Into<String>, handler_type: impl Into<String>) -> Self {
        MemberNode::new(name, MemberKind::Event).with_return_type(handler_type)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_method_kind(mut self, method_kind: MethodKind) -> Self {
        self.method_kind = method_kind;
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    /// True for methods that are neither accessors nor operators.
    pub fn is_ordinary_method(&self) -> bool {
        self.kind == MemberKind::Method && self.method_kind == MethodKind::Ordinary
    }
}

/// An immutable symbol graph for one artifact.
#[derive(Debug, Clone, Default)]
pub struct SymbolGraph {
    types: Vec<TypeNode>,
    members: Vec<MemberNode>,
    by_full_name: HashMap<String, TypeId>,
}

impl SymbolGraph {
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// All types with their ids, in declaration order.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> + '_ {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    pub fn type_node(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(id.0)
    }

    pub fn member(&self, id: MemberId) -> Option<&MemberNode> {
        self.members.get(id.0)
    }

    pub fn type_by_full_name(&self, full_name: &str) -> Option<TypeId> {
        self.by_full_name.get(full_name).copied()
    }

    /// The base type of `id`, when it is defined in this graph.
    pub fn base_of(&self, id: TypeId) -> Option<TypeId> {
        let base = self.type_node(id)?.base_type.as_deref()?;
        self.type_by_full_name(base)
    }
}

/// Incremental constructor for a [`SymbolGraph`].
#[derive(Debug, Default)]
pub struct SymbolGraphBuilder {
    graph: SymbolGraph,
}

impl SymbolGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type. A later type with the same full name shadows the earlier
    /// one in name lookups but both stay in the arena.
    pub fn add_type(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.graph.types.len());
        self.graph.by_full_name.insert(node.full_name.clone(), id);
        self.graph.types.push(node);
        id
    }

    /// Add a member declared on `owner`. Returns `None` if `owner` is unknown.
    pub fn add_member(&mut self, owner: TypeId, mut member: MemberNode) -> Option<MemberId> {
        let id = MemberId(self.graph.members.len());
        let owner_node = self.graph.types.get_mut(owner.0)?;
        owner_node.members.push(id);
        member.declaring_type = owner;
        self.graph.members.push(member);
        Some(id)
    }

    pub fn build(self) -> SymbolGraph {
        self.graph
    }
}

//! Resolve Error Definitions
//!
//! This module defines all error types that can occur while building a
//! namespace's symbol tables.

use crate::error::CompileError;
use crate::span::Position;
use std::fmt;

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Namespace resolution error
#[derive(Debug)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub pos: Option<Position>,
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, pos: Option<Position>) -> Self {
        Self { kind, pos }
    }

    // ============ Error Constructors ============

    pub fn missing_namespace_decl() -> Self {
        Self::new(ResolveErrorKind::MissingNamespaceDecl, None)
    }

    pub fn namespace_mismatch(expected: &str, found: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::NamespaceMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            },
            Some(pos),
        )
    }

    pub fn invalid_namespace_name(name: &str) -> Self {
        Self::new(
            ResolveErrorKind::InvalidNamespaceName {
                name: name.to_string(),
            },
            None,
        )
    }

    pub fn unknown_type(name: String, pos: Position) -> Self {
        Self::new(ResolveErrorKind::UnknownType { name }, Some(pos))
    }

    pub fn unknown_import(short: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::UnknownImport {
                short: short.to_string(),
            },
            Some(pos),
        )
    }

    pub fn duplicate_import(short: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::DuplicateImport {
                short: short.to_string(),
            },
            Some(pos),
        )
    }

    pub fn import_failed(namespace: &str, source: CompileError, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::ImportFailed {
                namespace: namespace.to_string(),
                source: Box::new(source),
            },
            Some(pos),
        )
    }

    pub fn import_collision(name: &str, namespace: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::ImportCollision {
                name: name.to_string(),
                namespace: namespace.to_string(),
            },
            Some(pos),
        )
    }

    pub fn name_collision(name: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::NameCollision {
                name: name.to_string(),
            },
            Some(pos),
        )
    }

    pub fn reserved_type_name(name: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::ReservedTypeName {
                name: name.to_string(),
            },
            Some(pos),
        )
    }

    pub fn duplicate_member(owner: &str, name: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::DuplicateMember {
                owner: owner.to_string(),
                name: name.to_string(),
            },
            Some(pos),
        )
    }

    pub fn duplicate_signature(name: &str, signature: String, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::DuplicateSignature {
                name: name.to_string(),
                signature,
            },
            Some(pos),
        )
    }

    pub fn less_accessible_base(name: &str, base: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::LessAccessibleBase {
                name: name.to_string(),
                base: base.to_string(),
            },
            Some(pos),
        )
    }

    pub fn not_an_interface(name: String, pos: Position) -> Self {
        Self::new(ResolveErrorKind::NotAnInterface { name }, Some(pos))
    }

    pub fn inheritance_cycle(name: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::InheritanceCycle {
                name: name.to_string(),
            },
            Some(pos),
        )
    }

    pub fn missing_interface_method(ty: &str, interface: &str, method: String, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::MissingInterfaceMethod {
                ty: ty.to_string(),
                interface: interface.to_string(),
                method,
            },
            Some(pos),
        )
    }

    pub fn missing_interface_property(ty: &str, interface: &str, property: &str, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::MissingInterfaceProperty {
                ty: ty.to_string(),
                interface: interface.to_string(),
                property: property.to_string(),
            },
            Some(pos),
        )
    }

    pub fn wrong_type_params(name: &str, expected: usize, found: usize, pos: Position) -> Self {
        Self::new(
            ResolveErrorKind::WrongTypeParams {
                name: name.to_string(),
                expected,
                found,
            },
            Some(pos),
        )
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{pos}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ResolveErrorKind::ImportFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// The kind of resolve error
#[derive(Debug)]
pub enum ResolveErrorKind {
    /// Source unit has no `ns` line
    MissingNamespaceDecl,

    /// Declared namespace differs from the one being compiled
    NamespaceMismatch { expected: String, found: String },

    /// Namespace components must be lowercase words
    InvalidNamespaceName { name: String },

    UnknownType { name: String },

    /// `Name/short` where `short` is not an import
    UnknownImport { short: String },

    /// Two imports share a short name
    DuplicateImport { short: String },

    /// The imported namespace failed to compile
    ImportFailed {
        namespace: String,
        source: Box<CompileError>,
    },

    /// Two imports donate the same unqualified name
    ImportCollision { name: String, namespace: String },

    /// A declaration reuses a name already in the namespace
    NameCollision { name: String },

    /// A user type shadows a builtin
    ReservedTypeName { name: String },

    DuplicateMember { owner: String, name: String },

    /// Two overloads with identical parameter types
    DuplicateSignature { name: String, signature: String },

    /// A supertype that should be an interface is not one
    NotAnInterface { name: String },

    InheritanceCycle { name: String },

    /// A public type derives from a non-public one
    LessAccessibleBase { name: String, base: String },

    MissingInterfaceMethod {
        ty: String,
        interface: String,
        method: String,
    },

    MissingInterfaceProperty {
        ty: String,
        interface: String,
        property: String,
    },

    WrongTypeParams {
        name: String,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveErrorKind::MissingNamespaceDecl => write!(f, "missing namespace declaration"),
            ResolveErrorKind::NamespaceMismatch { expected, found } => {
                write!(f, "expected namespace {expected}, but file declares {found}")
            }
            ResolveErrorKind::InvalidNamespaceName { name } => {
                write!(f, "invalid namespace name {name:?}")
            }
            ResolveErrorKind::UnknownType { name } => write!(f, "unknown type {name}"),
            ResolveErrorKind::UnknownImport { short } => {
                write!(f, "no import named {short}")
            }
            ResolveErrorKind::DuplicateImport { short } => {
                write!(f, "import short name {short} is already used")
            }
            ResolveErrorKind::ImportFailed { namespace, source } => {
                write!(f, "while importing {namespace}: {source}")
            }
            ResolveErrorKind::ImportCollision { name, namespace } => {
                write!(f, "name {name} imported from {namespace} is already used")
            }
            ResolveErrorKind::NameCollision { name } => {
                write!(f, "name {name} is already used")
            }
            ResolveErrorKind::ReservedTypeName { name } => {
                write!(f, "{name} is a builtin type name")
            }
            ResolveErrorKind::DuplicateMember { owner, name } => {
                write!(f, "{owner} already has a member named {name}")
            }
            ResolveErrorKind::DuplicateSignature { name, signature } => {
                write!(f, "{name} is already defined with parameter types ({signature})")
            }
            ResolveErrorKind::NotAnInterface { name } => {
                write!(f, "unknown parent or implements unknown interface: {name}")
            }
            ResolveErrorKind::InheritanceCycle { name } => {
                write!(f, "{name} inherits from itself")
            }
            ResolveErrorKind::LessAccessibleBase { name, base } => {
                write!(f, "public type {name} cannot derive from non-public {base}")
            }
            ResolveErrorKind::MissingInterfaceMethod { ty, interface, method } => {
                write!(f, "{ty} does not implement method {method} of interface {interface}")
            }
            ResolveErrorKind::MissingInterfaceProperty {
                ty,
                interface,
                property,
            } => write!(f, "{ty} does not implement property {property} of interface {interface}"),
            ResolveErrorKind::WrongTypeParams {
                name,
                expected,
                found,
            } => write!(f, "{name} takes {expected} type parameter(s), found {found}"),
        }
    }
}

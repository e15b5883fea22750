//! Namespace Resolution for bflang
//!
//! Turns the parsed declarations of one namespace into resolved symbol
//! tables, compiling imported namespaces on demand through a
//! [`NamespaceLoader`].
//!
//! # Architecture
//!
//! Resolution runs in fixed steps so that every name exists before
//! anything refers to it:
//! 1. **Imports**: load each imported namespace and merge what it declares
//! 2. **Type names**: register every class, struct and interface
//! 3. **Bodies**: interfaces, classes, functions, globals, then structs
//! 4. **Conformance**: every class and struct provides its interfaces
//!
//! All resolved entities live in one [`Registry`] arena and are referred to
//! by copyable ids, so type equality is identity.

mod context;
mod error;
mod overload;
mod resolve;
mod subtype;
mod ty;

pub use context::{
    cs_namespace_name, CallableInfo, CallableKind, ClassInfo, GlobalInfo, InterfaceInfo,
    MemberInfo, MemberKind, MemberTable, Namespace, Registry, StructInfo, FUNCS_CLASS,
    GLOBALS_CLASS,
};
pub use error::{ResolveError, ResolveErrorKind, ResolveResult};
pub use resolve::{is_namespace_name, resolve, NamespaceLoader, RECEIVER};
pub use ty::{
    Builtin, CallableId, ClassId, GlobalId, InterfaceId, NamespaceId, StructId, Type,
    ARRAY_TYPE_NAME,
};

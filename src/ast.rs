//! Abstract Syntax Tree definitions
//!
//! The parser turns atoms into these declarative nodes. One [`TopDefs`]
//! collects every declaration of a namespace across all of its files.

use crate::span::{Located, Position};
use std::fmt;

/// All declarations of one namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopDefs {
    pub namespace: Option<NamespaceDecl>,
    pub imports: Vec<ImportDef>,
    pub globals: Vec<GlobalDef>,
    pub funcs: Vec<FuncDef>,
    pub classes: Vec<ClassDef>,
    pub structs: Vec<StructDef>,
    pub interfaces: Vec<InterfaceDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDef {
    pub namespace: String,
    pub short_name: String,
    pub pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessLevel {
    #[default]
    Public,
    Protected,
    Private,
}

impl AccessLevel {
    pub fn keyword(self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Protected => "protected",
            AccessLevel::Private => "private",
        }
    }
}

/// `(@ name args...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub args: Vec<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDef {
    pub name: String,
    pub ty: TypeAtom,
    pub value: Option<Expr>,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

/// A name/type parameter pair
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeAtom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<TypeAtom>,
    pub body: Vec<Stmt>,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeAtom,
    pub access: AccessLevel,
    pub is_static: bool,
    pub value: Option<Expr>,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

/// Accessor bodies of a manual property
#[derive(Debug, Clone, PartialEq)]
pub struct Accessors {
    pub get: Vec<Stmt>,
    pub set: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeAtom,
    pub access: AccessLevel,
    pub is_static: bool,
    /// `None` for an auto property
    pub accessors: Option<Accessors>,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub access: AccessLevel,
    pub is_static: bool,
    pub params: Vec<Param>,
    pub ret: Option<TypeAtom>,
    pub body: Vec<Stmt>,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDef {
    pub access: AccessLevel,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

/// Members shared by classes and structs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Members {
    pub fields: Vec<FieldDef>,
    pub properties: Vec<PropertyDef>,
    pub constructors: Vec<ConstructorDef>,
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub access: AccessLevel,
    /// Parent class first (if any), then interfaces
    pub supertypes: Vec<TypeAtom>,
    pub members: Members,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub access: AccessLevel,
    pub interfaces: Vec<TypeAtom>,
    pub members: Members,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMethod {
    pub name: String,
    pub params: Vec<TypeAtom>,
    pub ret: Option<TypeAtom>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceProperty {
    pub name: String,
    pub ty: TypeAtom,
    pub get: bool,
    pub set: bool,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDef {
    pub name: String,
    pub access: AccessLevel,
    pub parents: Vec<TypeAtom>,
    pub methods: Vec<InterfaceMethod>,
    pub properties: Vec<InterfaceProperty>,
    pub annotations: Vec<Annotation>,
    pub pos: Position,
}

/// An unresolved type reference as written
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeAtom {
    pub name: String,
    /// Short name of the import that qualifies it (`Widget/ui`)
    pub namespace: Option<String>,
    pub params: Vec<TypeAtom>,
    pub pos: Position,
}

impl TypeAtom {
    pub fn new(name: impl Into<String>, pos: Position) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            params: Vec::new(),
            pos,
        }
    }
}

impl fmt::Display for TypeAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            f.write_str("<")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{p}")?;
            }
            f.write_str(">")?;
        }
        if let Some(ns) = &self.namespace {
            write!(f, "/{ns}")?;
        }
        Ok(())
    }
}

// ============ Statements ============

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    If(IfStmt),
    For(ForStmt),
    Switch(SwitchStmt),
    Try(TryStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Break(Position),
    Continue(Position),
    Var(VarStmt),
    Assign(AssignStmt),
    Call(CallExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub elifs: Vec<(Expr, Vec<Stmt>)>,
    pub else_body: Option<Vec<Stmt>>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub value: Expr,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Vec<Stmt>>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub ty: TypeAtom,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub value: Expr,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarStmt {
    pub name: String,
    pub ty: Option<TypeAtom>,
    pub value: Option<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    pub pos: Position,
}

// ============ Expressions ============

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var(VarExpr),
    Number(NumberLit),
    Str(StrLit),
    Index(IndexExpr),
    Call(CallExpr),
    TypeCall(TypeCallExpr),
    /// A type in value position; only meaningful as an indexing target
    TypeRef(TypeAtom),
}

impl Located for Expr {
    fn pos(&self) -> Position {
        match self {
            Expr::Var(e) => e.pos,
            Expr::Number(e) => e.pos,
            Expr::Str(e) => e.pos,
            Expr::Index(e) => e.pos,
            Expr::Call(e) => e.pos,
            Expr::TypeCall(e) => e.pos,
            Expr::TypeRef(t) => t.pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarExpr {
    pub name: String,
    pub namespace: Option<String>,
    pub pos: Position,
}

/// A number literal split at the decimal point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLit {
    pub negative: bool,
    pub integer: String,
    pub fraction: Option<String>,
    pub pos: Position,
}

impl fmt::Display for NumberLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.integer)?;
        if let Some(frac) = &self.fraction {
            write!(f, ".{frac}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    /// Un-escaped content
    pub value: String,
    pub pos: Position,
}

/// `[key ... target]`, resolved right to left
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub args: Vec<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub namespace: Option<String>,
    /// Owner type of a static method call (`Type.name`)
    pub static_type: Option<TypeAtom>,
    pub args: Vec<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCallExpr {
    pub ty: TypeAtom,
    pub size_flag: bool,
    pub args: Vec<Expr>,
    pub pos: Position,
}

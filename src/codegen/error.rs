//! Code generation errors
//!
//! Everything that is only discovered while lowering bodies: type errors
//! in expressions and statements, literal range errors and call
//! resolution failures.

use crate::span::Position;
use crate::typeck::{ResolveError, ResolveErrorKind};
use std::fmt;
use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

#[derive(Debug)]
pub struct GenError {
    pub kind: GenErrorKind,
    pub pos: Option<Position>,
}

impl GenError {
    pub fn new(kind: GenErrorKind, pos: Position) -> Self {
        Self {
            kind,
            pos: Some(pos),
        }
    }

    pub fn type_mismatch(expected: String, found: String, pos: Position) -> Self {
        Self::new(GenErrorKind::TypeMismatch { expected, found }, pos)
    }

    pub fn void_value(pos: Position) -> Self {
        Self::new(GenErrorKind::VoidValue, pos)
    }

    pub fn literal_out_of_range(literal: String, ty: &str, pos: Position) -> Self {
        Self::new(
            GenErrorKind::LiteralOutOfRange {
                literal,
                ty: ty.to_string(),
            },
            pos,
        )
    }

    pub fn operator_operands(op: &str, found: String, pos: Position) -> Self {
        Self::new(
            GenErrorKind::OperatorOperands {
                op: op.to_string(),
                found,
            },
            pos,
        )
    }

    pub fn no_matching_overload(name: String, args: String, pos: Position) -> Self {
        Self::new(GenErrorKind::NoMatchingOverload { name, args }, pos)
    }

    pub fn ambiguous_call(name: String, args: String, pos: Position) -> Self {
        Self::new(GenErrorKind::AmbiguousCall { name, args }, pos)
    }

    pub fn unknown_member(ty: String, name: &str, pos: Position) -> Self {
        Self::new(
            GenErrorKind::UnknownMember {
                ty,
                name: name.to_string(),
            },
            pos,
        )
    }

    pub fn inaccessible(name: String, pos: Position) -> Self {
        Self::new(GenErrorKind::InaccessibleMember { name }, pos)
    }
}

impl From<ResolveError> for GenError {
    fn from(err: ResolveError) -> Self {
        Self {
            kind: GenErrorKind::Resolve(err.kind),
            pos: err.pos,
        }
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{pos}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for GenError {}

#[derive(Error, Debug)]
pub enum GenErrorKind {
    #[error("expected a value of type {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("a call that returns nothing is used as a value")]
    VoidValue,

    #[error("type {name} is used as a value")]
    TypeAsValue { name: String },

    #[error("cannot convert {from} to {to}")]
    BadCast { from: String, to: String },

    #[error("{what} takes {expected} argument(s), found {found}")]
    WrongArgCount {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("only class instances can be thrown or caught, found {ty}")]
    NotThrowable { ty: String },

    #[error("{0}")]
    Resolve(ResolveErrorKind),

    #[error("literal {literal} does not fit in {ty}")]
    LiteralOutOfRange { literal: String, ty: String },

    #[error("literal {literal} has a fractional part but {ty} is an integer type")]
    FractionalLiteral { literal: String, ty: String },

    #[error("a number literal cannot have type {ty}")]
    LiteralNotAllowed { ty: String },

    #[error("case values must be literals")]
    NonConstantCase,

    #[error("unknown variable {name}")]
    UnknownVariable { name: String },

    #[error("no import named {short}")]
    UnknownImport { short: String },

    #[error("`me` is not available outside instance members")]
    NoReceiver,

    #[error("unknown function {name}")]
    UnknownFunction { name: String },

    #[error("no overload of {name} accepts ({args})")]
    NoMatchingOverload { name: String, args: String },

    #[error("call to {name} with ({args}) is ambiguous")]
    AmbiguousCall { name: String, args: String },

    #[error("operator {op} takes {expected}, found {found} operand(s)")]
    OperatorArity {
        op: String,
        expected: &'static str,
        found: usize,
    },

    #[error("operator {op} cannot be applied to ({found})")]
    OperatorOperands { op: String, found: String },

    #[error("operator {op} cannot be used as a statement")]
    OperatorStatement { op: String },

    #[error("{ty} has no member {name}")]
    UnknownMember { ty: String, name: String },

    #[error("values of type {ty} cannot be indexed")]
    NotIndexable { ty: String },

    #[error("array index must be an integer, found {found}")]
    IndexNotInteger { found: String },

    #[error("{name} is not accessible here")]
    InaccessibleMember { name: String },

    #[error("{name} must be accessed through {expected}")]
    StaticMismatch { name: String, expected: &'static str },

    #[error("{name} cannot be assigned")]
    NotAssignable { name: String },

    #[error("{name} cannot be read")]
    NotReadable { name: String },

    #[error("variable {name} needs a type or an initial value")]
    UntypedVariable { name: String },

    #[error("variable {name} is already declared in this scope")]
    DuplicateLocal { name: String },

    #[error("break outside of a loop or switch")]
    BreakOutsideLoop,

    #[error("continue outside of a loop")]
    ContinueOutsideLoop,

    #[error("{jump} cannot leave a finally block")]
    JumpInFinally { jump: &'static str },

    #[error("catch of {ty} is unreachable, {earlier} is caught before it")]
    UnreachableCatch { ty: String, earlier: String },

    #[error("{name} must end with a return or throw")]
    MissingReturn { name: String },

    #[error("cannot return a value from {name}, it returns nothing")]
    ReturnValueInVoid { name: String },

    #[error("{name} must return a value of type {expected}")]
    MissingReturnValue { name: String, expected: String },

    #[error("cannot allocate {ty} with {sizes} size(s)")]
    BadArrayAllocation { ty: String, sizes: usize },

    #[error("no constructor of {ty} accepts ({args})")]
    NoMatchingConstructor { ty: String, args: String },

    #[error("constructor call of {ty} with ({args}) is ambiguous")]
    AmbiguousConstructor { ty: String, args: String },

    #[error("{ty} cannot be constructed")]
    NotConstructible { ty: String },

    #[error("field {field} of struct {owner} has an initial value but {owner} declares no constructor")]
    StructFieldInitializer { owner: String, field: String },

    #[error("main must return nothing or I, found {found}")]
    BadMainReturn { found: String },
}

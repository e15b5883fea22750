//! Compile Error
//!
//! Wraps the error of whichever stage failed with the file or namespace it
//! failed in. The first error aborts the namespace and every importer.

use crate::codegen::GenError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::reader::ReadError;
use crate::sources::SourceError;
use crate::typeck::{ResolveError, ResolveErrorKind};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{}: {source}", file.display())]
    Lex {
        file: PathBuf,
        #[source]
        source: LexError,
    },

    #[error("{}: {source}", file.display())]
    Read {
        file: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error("{}: {source}", file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("namespace {namespace}: {source}")]
    Resolve {
        namespace: String,
        #[source]
        source: ResolveError,
    },

    #[error("namespace {namespace}: {source}")]
    Gen {
        namespace: String,
        #[source]
        source: GenError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    /// A namespace imports itself, directly or through others
    #[error("import cycle: {}", chain.join(" -> "))]
    ImportCycle { chain: Vec<String> },
}

impl CompileError {
    /// The innermost error, looking through failed imports
    pub fn root_cause(&self) -> &CompileError {
        match self {
            CompileError::Resolve { source, .. } => match &source.kind {
                ResolveErrorKind::ImportFailed { source, .. } => source.root_cause(),
                _ => self,
            },
            _ => self,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

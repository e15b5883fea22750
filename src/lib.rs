//! bflang Compiler
//!
//! A source-to-source compiler from a namespaced S-expression language to
//! C#. Each namespace compiles to one C# file.
//!
//! # Architecture
//!
//! ```text
//! Source files (.bf)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Reader    │  → Atoms (S-expression tree)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → Top-level declarations
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Resolver   │  → Namespace symbol tables (imports compiled first)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Code Gen   │  → C# source
//! └─────────────┘
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod reader;
pub mod sources;
pub mod span;
pub mod token;
pub mod typeck;

// Re-exports for convenience
pub use driver::{compile_dir, Driver};
pub use error::{CompileError, CompileResult};
pub use span::Position;
pub use token::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for source files
pub const FILE_EXTENSION: &str = config::SOURCE_EXTENSION;

//! Compile options

use std::path::{Path, PathBuf};

/// Source file extension
pub const SOURCE_EXTENSION: &str = "bf";

/// Generated file extension
pub const OUTPUT_EXTENSION: &str = "cs";

/// Debug dumps of the root namespace's intermediate stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    pub tokens: bool,
    pub atoms: bool,
    pub ast: bool,
}

impl EmitOptions {
    pub fn any(&self) -> bool {
        self.tokens || self.atoms || self.ast
    }
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Directory searched for source files
    pub base_dir: PathBuf,
    /// Where generated files go, the base directory when unset
    pub out_dir: Option<PathBuf>,
    pub source_extension: String,
    pub output_extension: String,
    pub emit: EmitOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            out_dir: None,
            source_extension: SOURCE_EXTENSION.to_string(),
            output_extension: OUTPUT_EXTENSION.to_string(),
            emit: EmitOptions::default(),
        }
    }
}

impl CompileOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_emit(mut self, emit: EmitOptions) -> Self {
        self.emit = emit;
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.out_dir.as_deref().unwrap_or(&self.base_dir)
    }
}

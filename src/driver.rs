//! Compilation driver
//!
//! Runs the whole pipeline for one namespace and, through the
//! [`NamespaceLoader`] callback, for every namespace it imports. Each
//! namespace is compiled once per driver; a namespace that is reached again
//! while it is still loading is an import cycle.

use crate::ast::TopDefs;
use crate::codegen::generate;
use crate::config::{CompileOptions, EmitOptions};
use crate::error::{CompileError, CompileResult};
use crate::lexer::lex;
use crate::parser::parse;
use crate::reader::read;
use crate::sources::{FsOutput, FsSources, OutputSink, SourceProvider};
use crate::typeck::{resolve, NamespaceId, NamespaceLoader, Registry};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Loading,
    Loaded(NamespaceId),
}

pub struct Driver<'s> {
    sources: &'s dyn SourceProvider,
    output: &'s mut dyn OutputSink,
    registry: Registry,
    states: HashMap<String, LoadState>,
    /// Namespaces currently loading, outermost first
    stack: Vec<String>,
    emit: EmitOptions,
}

impl<'s> Driver<'s> {
    pub fn new(sources: &'s dyn SourceProvider, output: &'s mut dyn OutputSink) -> Self {
        Self {
            sources,
            output,
            registry: Registry::new(),
            states: HashMap::new(),
            stack: Vec::new(),
            emit: EmitOptions::default(),
        }
    }

    #[must_use]
    pub fn with_emit(mut self, emit: EmitOptions) -> Self {
        self.emit = emit;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compile `namespace` and everything it imports, writing one output
    /// file per namespace.
    pub fn compile(&mut self, namespace: &str) -> CompileResult<NamespaceId> {
        let mut registry = std::mem::take(&mut self.registry);
        let result = self.load_namespace(&mut registry, namespace);
        self.registry = registry;
        result
    }

    fn load_namespace(&mut self, registry: &mut Registry, namespace: &str) -> CompileResult<NamespaceId> {
        match self.states.get(namespace) {
            Some(LoadState::Loaded(id)) => return Ok(*id),
            Some(LoadState::Loading) => {
                let start = self.stack.iter().position(|n| n == namespace).unwrap_or(0);
                let mut chain = self.stack[start..].to_vec();
                chain.push(namespace.to_string());
                return Err(CompileError::ImportCycle { chain });
            }
            None => {}
        }

        self.states.insert(namespace.to_string(), LoadState::Loading);
        self.stack.push(namespace.to_string());
        let result = self.compile_namespace(registry, namespace);
        self.stack.pop();
        match &result {
            Ok(id) => {
                self.states.insert(namespace.to_string(), LoadState::Loaded(*id));
            }
            Err(_) => {
                self.states.remove(namespace);
            }
        }
        result
    }

    fn compile_namespace(&mut self, registry: &mut Registry, namespace: &str) -> CompileResult<NamespaceId> {
        let started = Instant::now();
        let is_root = self.stack.len() == 1;
        let files = self.sources.lookup(namespace)?;

        let mut defs = TopDefs::default();
        for (index, path) in files.iter().enumerate() {
            self.parse_file(path, &mut defs, index == 0, is_root)?;
        }
        if is_root && self.emit.ast {
            println!("=== AST: {namespace} ===");
            println!("{defs:#?}");
        }

        let ns = resolve(&defs, namespace, registry, self).map_err(|source| CompileError::Resolve {
            namespace: namespace.to_string(),
            source,
        })?;
        let text = generate(&defs, registry, ns).map_err(|source| CompileError::Gen {
            namespace: namespace.to_string(),
            source,
        })?;
        self.output.write(namespace, &text)?;

        tracing::info!(
            target: "pipeline",
            stage = "namespace",
            namespace,
            files = files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compiled namespace"
        );
        Ok(ns)
    }

    fn parse_file(&self, path: &Path, defs: &mut TopDefs, is_main: bool, dump: bool) -> CompileResult<()> {
        let bytes = self.sources.read(path)?;
        // Invalid UTF-8 becomes U+FFFD, which the lexer rejects as non-ASCII
        let text = String::from_utf8_lossy(&bytes);
        let file = || path.to_path_buf();

        let tokens = lex(&text).map_err(|source| CompileError::Lex { file: file(), source })?;
        tracing::debug!(target: "pipeline", stage = "lex", file = %path.display(), tokens = tokens.len());
        if dump && self.emit.tokens {
            println!("=== Tokens: {} ===", path.display());
            for token in &tokens {
                println!("{:?} @ {} = {:?}", token.kind, token.pos, token.text);
            }
        }

        let atoms = read(&tokens).map_err(|source| CompileError::Read { file: file(), source })?;
        tracing::debug!(target: "pipeline", stage = "read", file = %path.display(), atoms = atoms.len());
        if dump && self.emit.atoms {
            println!("=== Atoms: {} ===", path.display());
            for atom in &atoms {
                println!("{atom}");
            }
        }

        parse(&atoms, defs, is_main).map_err(|source| CompileError::Parse { file: file(), source })?;
        tracing::debug!(target: "pipeline", stage = "parse", file = %path.display(), is_main);
        Ok(())
    }
}

impl NamespaceLoader for Driver<'_> {
    fn load(&mut self, registry: &mut Registry, namespace: &str) -> Result<NamespaceId, CompileError> {
        self.load_namespace(registry, namespace)
    }
}

/// Compile `namespace` from the files below `options.base_dir`.
pub fn compile_dir(options: &CompileOptions, namespace: &str) -> CompileResult<NamespaceId> {
    let sources = FsSources::new(&options.base_dir, options.source_extension.as_str());
    let mut output = FsOutput::new(options.output_dir(), options.output_extension.as_str());
    let mut driver = Driver::new(&sources, &mut output).with_emit(options.emit);
    driver.compile(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GenErrorKind;
    use crate::sources::{MemoryOutput, MemorySources, SourceError};
    use crate::typeck::ResolveErrorKind;

    fn compile(sources: &MemorySources, namespace: &str) -> (CompileResult<NamespaceId>, MemoryOutput) {
        let mut output = MemoryOutput::default();
        let result = Driver::new(sources, &mut output).compile(namespace);
        (result, output)
    }

    #[test]
    fn test_single_namespace() {
        let sources = MemorySources::new().with("app.bf", "ns app\n(func main)\n");
        let (result, output) = compile(&sources, "app");
        result.unwrap();
        assert_eq!(output.files.len(), 1);
        assert!(output.files["app"].contains("namespace App {"));
    }

    #[test]
    fn test_secondary_files_share_the_namespace() {
        let sources = MemorySources::new()
            .with("geo.bf", "ns geo\n(class Shape)\n")
            .with("geo_circle.bf", "ns geo\n(class Circle : Shape)\n");
        let (result, output) = compile(&sources, "geo");
        result.unwrap();
        assert!(output.files["geo"].contains("public class Circle : Geo.Shape {"));
    }

    #[test]
    fn test_imports_are_compiled_once() {
        let sources = MemorySources::new()
            .with("app.bf", "ns app\n(import lib.shapes s)\n(import lib.util)\n(func main)\n")
            .with("shapes.bf", "ns lib.shapes\n(import lib.util u)\n(class Square)\n")
            .with("util.bf", "ns lib.util\n(func helper)\n");
        let mut output = MemoryOutput::default();
        let mut driver = Driver::new(&sources, &mut output);
        driver.compile("app").unwrap();
        let names: Vec<&str> = ["app", "lib.shapes", "lib.util"].to_vec();
        for name in &names {
            assert!(driver.registry().find_namespace(name).is_some());
        }
        drop(driver);
        assert_eq!(output.files.keys().map(String::as_str).collect::<Vec<_>>(), names);
    }

    #[test]
    fn test_import_cycle() {
        let sources = MemorySources::new()
            .with("a.bf", "ns a\n(import b)\n")
            .with("b.bf", "ns b\n(import a)\n");
        let (result, output) = compile(&sources, "a");
        let err = result.unwrap_err();
        match err.root_cause() {
            CompileError::ImportCycle { chain } => assert_eq!(chain, &["a", "b", "a"]),
            other => panic!("expected an import cycle, got {other}"),
        }
        assert!(output.files.is_empty());
    }

    #[test]
    fn test_missing_import() {
        let sources = MemorySources::new().with("app.bf", "ns app\n(import nowhere)\n");
        let (result, _) = compile(&sources, "app");
        let err = result.unwrap_err();
        assert!(matches!(
            &err,
            CompileError::Resolve { source, .. } if matches!(source.kind, ResolveErrorKind::ImportFailed { .. })
        ));
        assert!(matches!(
            err.root_cause(),
            CompileError::Source(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_stage_errors_carry_context() {
        let sources = MemorySources::new().with("app.bf", "ns app\n(func f\n\t(g))\n");
        let (result, _) = compile(&sources, "app");
        assert!(matches!(result, Err(CompileError::Lex { ref file, .. }) if file == Path::new("app.bf")));

        let sources = MemorySources::new().with("app.bf", "ns app\n(func f (var x (g)))\n(func g)\n");
        let (result, output) = compile(&sources, "app");
        match result {
            Err(CompileError::Gen { namespace, source }) => {
                assert_eq!(namespace, "app");
                assert!(matches!(source.kind, GenErrorKind::VoidValue));
            }
            other => panic!("expected a codegen error, got {other:?}"),
        }
        assert!(output.files.is_empty());
    }

    #[test]
    fn test_secondary_file_cannot_import() {
        let sources = MemorySources::new()
            .with("app.bf", "ns app\n")
            .with("app_more.bf", "ns app\n(import lib)\n")
            .with("lib.bf", "ns lib\n");
        let (result, _) = compile(&sources, "app");
        assert!(matches!(result, Err(CompileError::Parse { .. })));
    }
}

//! Source discovery and output
//!
//! A namespace `a.b.util` lives in a main file `util.bf` plus any number of
//! secondary files `util_<suffix>.bf`. Every file starts with the line
//! `ns a.b.util`. The filesystem provider searches the base directory and
//! any subdirectory whose name starts with `bf.`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directories searched below the base directory must carry this prefix.
pub const SOURCE_DIR_PREFIX: &str = "bf.";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("no source files found for namespace {namespace}")]
    NotFound { namespace: String },

    #[error("namespace {namespace} has secondary files but no main file")]
    NoMainFile { namespace: String },

    #[error("namespace {namespace} has two main files: {} and {}", first.display(), second.display())]
    DuplicateNamespace {
        namespace: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{} declares namespace {namespace}, which does not match its file name", path.display())]
    MisnamedFile { path: PathBuf, namespace: String },

    #[error("{} must begin with `ns <namespace>`", path.display())]
    BadHeader { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Finds and reads the files of a namespace.
pub trait SourceProvider {
    /// Files of `namespace`, main file first.
    fn lookup(&self, namespace: &str) -> SourceResult<Vec<PathBuf>>;

    fn read(&self, path: &Path) -> SourceResult<Vec<u8>>;
}

/// Receives the generated text of each compiled namespace.
pub trait OutputSink {
    fn write(&mut self, namespace: &str, text: &str) -> SourceResult<()>;
}

/// Last dotted component of a namespace name
pub fn short_name(namespace: &str) -> &str {
    namespace.rsplit('.').next().unwrap_or(namespace)
}

/// The namespace named on a file's first line, if it has the `ns` form.
pub fn header_namespace(first_line: &str) -> Option<&str> {
    let rest = first_line.trim_end().strip_prefix("ns ")?;
    let name = rest.trim();
    (!name.is_empty() && !name.contains(char::is_whitespace)).then_some(name)
}

/// `util` and `util_extra` belong to short name `util`.
fn stem_belongs_to(stem: &str, short: &str) -> bool {
    stem == short
        || stem
            .strip_prefix(short)
            .map_or(false, |rest| rest.starts_with('_') && rest.len() > 1)
}

fn first_line(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == b'\n').unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Pick the files of `namespace` among `candidates` (path, first line),
/// checking that every candidate's header agrees with its file name.
fn select_files(
    namespace: &str,
    candidates: impl IntoIterator<Item = (PathBuf, String)>,
) -> SourceResult<Vec<PathBuf>> {
    let short = short_name(namespace);
    let mut main: Option<PathBuf> = None;
    let mut secondary = Vec::new();

    for (path, line) in candidates {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let Some(declared) = header_namespace(&line) else {
            return Err(SourceError::BadHeader { path });
        };
        if !stem_belongs_to(&stem, short_name(declared)) {
            return Err(SourceError::MisnamedFile {
                namespace: declared.to_string(),
                path,
            });
        }
        if declared != namespace {
            continue;
        }
        if stem == short {
            if let Some(first) = main.take() {
                return Err(SourceError::DuplicateNamespace {
                    namespace: namespace.to_string(),
                    first,
                    second: path,
                });
            }
            main = Some(path);
        } else {
            secondary.push(path);
        }
    }

    let Some(main) = main else {
        return Err(if secondary.is_empty() {
            SourceError::NotFound {
                namespace: namespace.to_string(),
            }
        } else {
            SourceError::NoMainFile {
                namespace: namespace.to_string(),
            }
        });
    };
    secondary.sort();
    let mut files = vec![main];
    files.extend(secondary);
    Ok(files)
}

// ============ Filesystem ============

/// Sources on disk below a base directory
#[derive(Debug, Clone)]
pub struct FsSources {
    base_dir: PathBuf,
    extension: String,
}

impl FsSources {
    pub fn new(base_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: extension.into(),
        }
    }

    /// Every source file reachable from the base directory
    fn source_files(&self) -> SourceResult<Vec<PathBuf>> {
        let walker = WalkDir::new(&self.base_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || entry
                        .file_name()
                        .to_str()
                        .map_or(false, |name| name.starts_with(SOURCE_DIR_PREFIX))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            let is_source = entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some(self.extension.as_str());
            if is_source {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

impl SourceProvider for FsSources {
    fn lookup(&self, namespace: &str) -> SourceResult<Vec<PathBuf>> {
        let short = short_name(namespace);
        let mut candidates = Vec::new();
        for path in self.source_files()? {
            let belongs = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map_or(false, |stem| stem_belongs_to(stem, short));
            if belongs {
                let bytes = self.read(&path)?;
                candidates.push((path, first_line(&bytes)));
            }
        }
        let files = select_files(namespace, candidates)?;
        tracing::debug!(target: "sources", namespace, files = files.len(), "found source files");
        Ok(files)
    }

    fn read(&self, path: &Path) -> SourceResult<Vec<u8>> {
        fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Writes `<dir>/<namespace>.<extension>`
#[derive(Debug, Clone)]
pub struct FsOutput {
    dir: PathBuf,
    extension: String,
}

impl FsOutput {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.{}", self.extension))
    }
}

impl OutputSink for FsOutput {
    fn write(&mut self, namespace: &str, text: &str) -> SourceResult<()> {
        let path = self.path_for(namespace);
        let io_error = |source| SourceError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_error)?;
        fs::write(&path, text).map_err(io_error)?;
        tracing::info!(target: "sources", path = %path.display(), bytes = text.len(), "wrote output");
        Ok(())
    }
}

// ============ In memory ============

/// Source files held in memory, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), text.into());
        self
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.add(path, text);
        self
    }
}

impl SourceProvider for MemorySources {
    fn lookup(&self, namespace: &str) -> SourceResult<Vec<PathBuf>> {
        let short = short_name(namespace);
        let candidates = self.files.iter().filter_map(|(path, text)| {
            let stem = path.file_stem()?.to_str()?;
            stem_belongs_to(stem, short).then(|| (path.clone(), first_line(text.as_bytes())))
        });
        select_files(namespace, candidates)
    }

    fn read(&self, path: &Path) -> SourceResult<Vec<u8>> {
        self.files
            .get(path)
            .map(|text| text.as_bytes().to_vec())
            .ok_or_else(|| SourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

/// Collects generated files by namespace
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    pub files: BTreeMap<String, String>,
}

impl OutputSink for MemoryOutput {
    fn write(&mut self, namespace: &str, text: &str) -> SourceResult<()> {
        self.files.insert(namespace.to_string(), text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        assert_eq!(header_namespace("ns app.core"), Some("app.core"));
        assert_eq!(header_namespace("ns app.core\r"), Some("app.core"));
        assert_eq!(header_namespace("(class A)"), None);
        assert_eq!(header_namespace("ns a b"), None);
    }

    #[test]
    fn test_stem_belongs_to() {
        assert!(stem_belongs_to("util", "util"));
        assert!(stem_belongs_to("util_more", "util"));
        assert!(!stem_belongs_to("utility", "util"));
        assert!(!stem_belongs_to("util_", "util"));
    }

    #[test]
    fn test_main_file_comes_first() {
        let sources = MemorySources::new()
            .with("src/util_z.bf", "ns app.util\n")
            .with("src/util_a.bf", "ns app.util\n")
            .with("src/util.bf", "ns app.util\n")
            .with("src/main.bf", "ns app.main\n");
        let files = sources.lookup("app.util").unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("src/util.bf"),
                PathBuf::from("src/util_a.bf"),
                PathBuf::from("src/util_z.bf"),
            ]
        );
    }

    #[test]
    fn test_same_short_name_in_other_namespace() {
        let sources = MemorySources::new()
            .with("x/util.bf", "ns other.util\n")
            .with("y/util.bf", "ns app.util\n");
        assert_eq!(sources.lookup("app.util").unwrap(), vec![PathBuf::from("y/util.bf")]);
    }

    #[test]
    fn test_discovery_errors() {
        let missing = MemorySources::new().lookup("app.util").unwrap_err();
        assert!(matches!(missing, SourceError::NotFound { .. }));

        let orphan = MemorySources::new().with("util_x.bf", "ns app.util\n");
        assert!(matches!(orphan.lookup("app.util"), Err(SourceError::NoMainFile { .. })));

        let twice = MemorySources::new()
            .with("a/util.bf", "ns app.util\n")
            .with("b/util.bf", "ns app.util\n");
        assert!(matches!(twice.lookup("app.util"), Err(SourceError::DuplicateNamespace { .. })));

        let misnamed = MemorySources::new().with("util.bf", "ns app.tools\n");
        assert!(matches!(misnamed.lookup("app.util"), Err(SourceError::MisnamedFile { .. })));

        let headless = MemorySources::new().with("util.bf", "(class A)\n");
        assert!(matches!(headless.lookup("app.util"), Err(SourceError::BadHeader { .. })));
    }

    #[test]
    fn test_memory_output() {
        let mut out = MemoryOutput::default();
        out.write("app.util", "text").unwrap();
        assert_eq!(out.files["app.util"], "text");
    }
}

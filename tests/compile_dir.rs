//! End-to-end compilation over a real directory tree

use bflang::config::CompileOptions;
use bflang::sources::{FsSources, SourceError, SourceProvider};
use bflang::{compile_dir, CompileError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, text: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn shapes_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app.bf",
        "ns app\n\
         (import geo.shapes)\n\
         (func main\n\
         \x20   (var c (Circle 2.0))\n\
         \x20   (var total (area c)))\n",
    );
    write(
        dir.path(),
        "bf.geo/shapes.bf",
        "ns geo.shapes\n\
         (class Shape (m area FF (return 0.0)))\n",
    );
    write(
        dir.path(),
        "bf.geo/shapes_circle.bf",
        "ns geo.shapes\n\
         (class Circle : Shape\n\
         \x20   (f r FF)\n\
         \x20   (constructor : r FF (as [r] r))\n\
         \x20   (m area FF (return (mul 3.14 [r] [r]))))\n",
    );
    dir
}

#[test]
fn test_writes_one_file_per_namespace() {
    let dir = shapes_project();
    compile_dir(&CompileOptions::new(dir.path()), "app").unwrap();

    let app = fs::read_to_string(dir.path().join("app.cs")).unwrap();
    assert!(app.contains("namespace App {"));
    assert!(app.contains("Geo.Shapes.Circle _c = new Geo.Shapes.Circle(2.0D);"));
    assert!(app.contains("double _total = _c.area();"));
    assert!(app.contains("public static void Main(string[] args) {"));

    let shapes = fs::read_to_string(dir.path().join("geo.shapes.cs")).unwrap();
    assert!(shapes.contains("namespace Geo.Shapes {"));
    assert!(shapes.contains("public class Circle : Geo.Shapes.Shape {"));
    assert!(shapes.contains("public override double area() {"));
}

#[test]
fn test_out_dir() {
    let dir = shapes_project();
    let out = TempDir::new().unwrap();
    compile_dir(&CompileOptions::new(dir.path()).with_out_dir(out.path()), "app").unwrap();
    assert!(out.path().join("app.cs").exists());
    assert!(out.path().join("geo.shapes.cs").exists());
    assert!(!dir.path().join("app.cs").exists());
}

#[test]
fn test_only_prefixed_directories_are_searched() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/util.bf", "ns util\n");
    let sources = FsSources::new(dir.path(), "bf");
    assert!(matches!(sources.lookup("util"), Err(SourceError::NotFound { .. })));

    write(dir.path(), "bf.src/util.bf", "ns util\n");
    assert_eq!(sources.lookup("util").unwrap(), vec![dir.path().join("bf.src/util.bf")]);
}

#[test]
fn test_failed_namespace_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.bf", "ns app\n(global small B 300)\n");
    let err = compile_dir(&CompileOptions::new(dir.path()), "app").unwrap_err();
    assert!(matches!(err, CompileError::Gen { .. }));
    assert!(err.to_string().contains("300"));
    assert!(!dir.path().join("app.cs").exists());
}

#[test]
fn test_import_collision() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.bf", "ns a\n(class Widget)\n");
    write(dir.path(), "b.bf", "ns b\n(class Widget)\n");
    write(dir.path(), "both.bf", "ns both\n(import a)\n(import b)\n");
    write(dir.path(), "one.bf", "ns one\n(import a)\n(func f : w Widget)\n");

    let options = CompileOptions::new(dir.path());
    assert!(matches!(compile_dir(&options, "both"), Err(CompileError::Resolve { .. })));
    compile_dir(&options, "one").unwrap();
    assert!(dir.path().join("one.cs").exists());
}

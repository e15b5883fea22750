//! bflang Compiler CLI
//!
//! `bfc <NAMESPACE> [BASE_DIR]` compiles a namespace and everything it
//! imports to C#, one `.cs` file per namespace.

use bflang::config::{CompileOptions, EmitOptions};
use bflang::driver::compile_dir;
use bflang::logging::{self, LogFormat, LogLevel, LogOptions};
use bflang::typeck::is_namespace_name;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bfc")]
#[command(version = bflang::VERSION)]
#[command(about = "Compiles a namespace of .bf sources to C#", long_about = None)]
struct Cli {
    /// Full dotted name of the namespace to compile
    #[arg(value_name = "NAMESPACE")]
    namespace: String,

    /// Directory searched for source files
    #[arg(value_name = "BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Directory for generated files (defaults to BASE_DIR)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Print the tokens of the root namespace's files
    #[arg(long)]
    emit_tokens: bool,

    /// Print the atoms of the root namespace's files
    #[arg(long)]
    emit_atoms: bool,

    /// Print the parsed declarations of the root namespace
    #[arg(long)]
    emit_ast: bool,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", value_parser = parse_level)]
    log_level: Option<LogLevel>,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    log_format: Option<LogFormat>,
}

fn parse_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse(value).ok_or_else(|| format!("unknown log level {value:?}"))
}

fn parse_format(value: &str) -> Result<LogFormat, String> {
    LogFormat::parse(value).ok_or_else(|| format!("unknown log format {value:?}"))
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    logging::init(LogOptions::resolve(cli.log_level, cli.log_format));

    if !is_namespace_name(&cli.namespace) {
        return Err(miette::miette!(
            "{:?} is not a namespace name (dotted lowercase words)",
            cli.namespace
        ));
    }

    let mut options = CompileOptions::new(cli.base_dir).with_emit(EmitOptions {
        tokens: cli.emit_tokens,
        atoms: cli.emit_atoms,
        ast: cli.emit_ast,
    });
    if let Some(dir) = cli.out_dir {
        options = options.with_out_dir(dir);
    }

    tracing::info!(
        target: "pipeline",
        stage = "cli.start",
        namespace = %cli.namespace,
        base_dir = %options.base_dir.display()
    );
    compile_dir(&options, &cli.namespace).map_err(|err| {
        tracing::error!(target: "pipeline", stage = "cli.failed", error = %err);
        miette::miette!("{err}")
    })?;
    Ok(())
}

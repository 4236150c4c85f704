//! Command-line driver for the yieldless rewriter.
//!
//! Consumes a typed source file serialized as JSON (the input contract
//! of the core), rewrites every generator function it declares, and
//! writes the replacement source fragment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yieldless_core::hir::SourceFile;
use yieldless_core::{RewriteReport, Rewriter};

#[derive(Parser)]
#[command(name = "yieldless", bin_name = "yieldless")]
#[command(about = "Rewrite yield-based generator functions into iterator state machines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite the generators of a typed source file
    Rewrite {
        /// Typed source file (JSON)
        input: PathBuf,

        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report which functions would be rewritten, without emitting code
    Check {
        /// Typed source file (JSON)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Rewrite { input, output } => run_rewrite(&input, output.as_deref()),
        Command::Check { input } => run_check(&input),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_source_file(path: &Path) -> Result<SourceFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading input file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing typed source file {}", path.display()))
}

fn run_rewrite(input: &Path, output: Option<&Path>) -> Result<()> {
    let file = load_source_file(input)?;
    let report = Rewriter::new().rewrite_file(&file);
    report_failures(&report);

    match output {
        Some(path) => {
            fs::write(path, &report.source)
                .with_context(|| format!("writing output file {}", path.display()))?;
            tracing::info!(
                functions = report.functions.len(),
                output = %path.display(),
                "rewrite complete"
            );
        }
        None => print!("{}", report.source),
    }

    if report.failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {} generator functions failed to rewrite",
            report.failures.len(),
            report.failures.len() + report.functions.len()
        )
    }
}

fn run_check(input: &Path) -> Result<()> {
    let file = load_source_file(input)?;
    let rewriter = Rewriter::new();

    let mut generators = 0usize;
    for func in &file.functions {
        if rewriter.is_generator(&file, func) {
            generators += 1;
            println!("generator: {}", func.name);
        }
    }
    let report = rewriter.rewrite_file(&file);
    report_failures(&report);
    for rewritten in &report.functions {
        for note in &rewritten.unsupported {
            println!("  note: {}: unsupported construct {}", rewritten.name, note);
        }
    }
    println!(
        "{}: {} generator(s), {} rewritten, {} failed",
        file.package_name,
        generators,
        report.functions.len(),
        report.failures.len()
    );

    if report.failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} generator(s) failed to rewrite", report.failures.len())
    }
}

fn report_failures(report: &RewriteReport) {
    for failure in &report.failures {
        eprintln!("error: {}: {}", failure.name, failure.error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use yieldless_core::hir::{Bindings, SourceFile};

    fn sample_file() -> SourceFile {
        SourceFile {
            package_path: "example.com/demo".to_string(),
            package_name: "demo".to_string(),
            imports: vec![],
            bindings: Bindings::new(),
            functions: vec![],
        }
    }

    #[test]
    fn load_source_file_parses_json() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&sample_file()).unwrap();
        tmp.write_all(json.as_bytes()).unwrap();

        let loaded = load_source_file(tmp.path()).unwrap();
        assert_eq!(loaded.package_name, "demo");
    }

    #[test]
    fn load_source_file_reports_the_offending_path() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"not json").unwrap();

        let err = load_source_file(tmp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing typed source file"));
    }

    #[test]
    fn rewrite_writes_the_package_header() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&sample_file()).unwrap();
        input.write_all(json.as_bytes()).unwrap();
        let out = tempfile::NamedTempFile::new().unwrap();

        run_rewrite(input.path(), Some(out.path())).unwrap();
        let written = fs::read_to_string(out.path()).unwrap();
        assert!(written.starts_with("package demo\n"));
    }
}

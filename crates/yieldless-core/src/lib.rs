//! # Yieldless Core - Generator Rewriting Engine
//!
//! Rewrites *generator functions* (functions that emit a lazy sequence
//! of values through a sentinel `Yield` call) into iterator state
//! machines, for a target language without stackful coroutines.
//!
//! ## Overview
//!
//! The caller hands the engine a fully typed AST ([`hir::SourceFile`]):
//! identifiers arrive with resolved bindings, types, and def/use
//! markers. For each generator function the engine produces a complete
//! replacement definition whose step function suspends at every yield
//! site and resumes there on the next invocation.
//!
//! ## Architecture
//!
//! 1. **Discovery** ([`discover`]) - find functions declaring the
//!    placeholder `Generator[T]` result that use the yield sentinel
//! 2. **Name environment** ([`names`]) - collision-free output names
//! 3. **State tracking** ([`state`]) - hoist locals into persistent state,
//!    allocate yield tags and adapter ids
//! 4. **Lowering** ([`lower`]) - flatten structured control flow into a
//!    re-entrant body
//! 5. **Assembly** ([`assemble`]) - compose the replacement function
//!
//! ## Example
//!
//! ```rust
//! use yieldless_core::hir::{Block, Bindings, Expr, FuncDecl, GoType, ImportLine, SourceFile, Stmt};
//! use yieldless_core::Rewriter;
//!
//! let rewriter = Rewriter::new();
//! let config = rewriter.config();
//! let file = SourceFile {
//!     package_path: "example.com/demo".to_string(),
//!     package_name: "demo".to_string(),
//!     imports: vec![ImportLine {
//!         alias: None,
//!         path: config.generator_type.package.clone(),
//!     }],
//!     bindings: Bindings::new(),
//!     functions: vec![FuncDecl {
//!         name: "Empty".to_string(),
//!         params: smallvec::SmallVec::new(),
//!         results: vec![GoType::named(
//!             &config.generator_type.package,
//!             &config.generator_type.name,
//!             vec![GoType::basic("string")],
//!         )],
//!         body: Block::new(vec![Stmt::Return {
//!             results: vec![Expr::nil()],
//!         }]),
//!     }],
//! };
//!
//! let rewritten = rewriter.rewrite_function(&file, &file.functions[0]).unwrap();
//! assert!(rewritten.source.contains("func Empty() yieldless.Generator[string] {"));
//! ```

pub mod assemble;
pub mod discover;
pub mod error;
pub mod frames;
pub mod hir;
pub mod imports;
pub mod lower;
pub mod names;
pub mod state;
mod templates;

use serde::{Deserialize, Serialize};

pub use assemble::RewrittenFunction;
pub use error::{ErrorKind, RewriteError, RewriteResult};

use hir::{FuncDecl, SourceFile};
use imports::ImportNames;

/// Default package path of the runtime shim the emitted code targets.
pub const RUNTIME_PACKAGE: &str = "github.com/yieldless/yieldless";

/// Identifies a named type by declaring package path and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub package: String,
    pub name: String,
}

/// Identifies a function by declaring package path and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDescriptor {
    pub package: String,
    pub name: String,
}

/// Configuration passed into the core: which named type marks a
/// generator, which function is the yield sentinel, and the local name
/// emitted code uses to reach the runtime shim package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfig {
    pub generator_type: TypeDescriptor,
    pub yield_func: FuncDescriptor,
    pub runtime_name: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            generator_type: TypeDescriptor {
                package: RUNTIME_PACKAGE.to_string(),
                name: "Generator".to_string(),
            },
            yield_func: FuncDescriptor {
                package: RUNTIME_PACKAGE.to_string(),
                name: "Yield".to_string(),
            },
            runtime_name: "yieldless".to_string(),
        }
    }
}

/// A function whose rewrite failed; other functions in the same file
/// are unaffected.
#[derive(Debug)]
pub struct FunctionFailure {
    pub name: String,
    pub error: RewriteError,
}

/// Outcome of rewriting one source file.
#[derive(Debug)]
pub struct RewriteReport {
    pub package_name: String,
    /// Package header plus every successfully rewritten function.
    pub source: String,
    pub functions: Vec<RewrittenFunction>,
    pub failures: Vec<FunctionFailure>,
}

/// The main entry point: rewrites generator functions one at a time.
///
/// A `Rewriter` holds only configuration; every per-function structure
/// (name environment, state tracker, tag allocator, context stacks) is
/// created fresh for each rewrite, so distinct functions may be
/// rewritten concurrently from separate calls.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    config: RewriteConfig,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RewriteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Whether `func` is a generator definition this rewriter would
    /// transform.
    pub fn is_generator(&self, file: &SourceFile, func: &FuncDecl) -> bool {
        discover::is_generator(file, &self.config, func)
    }

    /// Rewrites a single generator function into its iterator form.
    pub fn rewrite_function(
        &self,
        file: &SourceFile,
        func: &FuncDecl,
    ) -> RewriteResult<RewrittenFunction> {
        let imports = ImportNames::from_imports(&file.imports);
        assemble::rewrite_function(file, &self.config, &imports, func)
    }

    /// Rewrites every generator in `file`. One function failing does
    /// not abort the rest.
    pub fn rewrite_file(&self, file: &SourceFile) -> RewriteReport {
        let imports = ImportNames::from_imports(&file.imports);
        let mut report = RewriteReport {
            package_name: file.package_name.clone(),
            source: templates::package_header(&file.package_name),
            functions: Vec::new(),
            failures: Vec::new(),
        };
        for func in &file.functions {
            if !discover::is_generator(file, &self.config, func) {
                tracing::trace!(function = %func.name, "not a generator, skipping");
                continue;
            }
            match assemble::rewrite_function(file, &self.config, &imports, func) {
                Ok(rewritten) => {
                    report.source.push('\n');
                    report.source.push_str(&rewritten.source);
                    report.functions.push(rewritten);
                }
                Err(error) => {
                    tracing::debug!(function = %func.name, %error, "rewrite failed");
                    report.failures.push(FunctionFailure {
                        name: func.name.clone(),
                        error,
                    });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hir::{Binding, BindingKind, BindingScope, Bindings, Block, Expr, GoType, Ident, Stmt};
    use smallvec::smallvec;

    fn yield_stmt(file: &mut SourceFile, config: &RewriteConfig, value: &str) -> Stmt {
        let id = file.bindings.insert(Binding {
            name: config.yield_func.name.clone(),
            ty: GoType::basic("func"),
            kind: BindingKind::Func,
            scope: BindingScope::ForeignPackage,
            package: Some(config.yield_func.package.clone()),
        });
        Stmt::Expr(Expr::Call {
            fun: Box::new(Expr::Selector {
                expr: Box::new(Expr::Ident(Ident::bare("yieldless"))),
                sel: config.yield_func.name.clone(),
                sel_binding: Some(id),
            }),
            args: vec![Expr::lit(value)],
        })
    }

    fn generator(config: &RewriteConfig, name: &str, body: Block) -> FuncDecl {
        FuncDecl {
            name: name.to_string(),
            params: smallvec![],
            results: vec![GoType::named(
                &config.generator_type.package,
                &config.generator_type.name,
                vec![GoType::basic("int")],
            )],
            body,
        }
    }

    #[test]
    fn rewrite_file_emits_a_package_header() {
        let rewriter = Rewriter::new();
        let file = SourceFile {
            package_path: "example.com/demo".to_string(),
            package_name: "demo".to_string(),
            imports: vec![],
            bindings: Bindings::new(),
            functions: vec![],
        };
        let report = rewriter.rewrite_file(&file);
        assert!(report.source.starts_with("package demo\n"));
        assert!(report.functions.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn one_failing_function_does_not_abort_the_rest() {
        let rewriter = Rewriter::new();
        let config = rewriter.config().clone();
        let mut file = SourceFile {
            package_path: "example.com/demo".to_string(),
            package_name: "demo".to_string(),
            imports: vec![],
            bindings: Bindings::new(),
            functions: vec![],
        };

        let good_yield = yield_stmt(&mut file, &config, "1");
        let bad_yield = yield_stmt(&mut file, &config, "2");
        let good = generator(
            &config,
            "Good",
            Block::new(vec![
                good_yield,
                Stmt::Return {
                    results: vec![Expr::nil()],
                },
            ]),
        );
        // Bad return arity fails the function, after its yield made it
        // discoverable.
        let bad = generator(
            &config,
            "Bad",
            Block::new(vec![bad_yield, Stmt::Return { results: vec![] }]),
        );
        file.functions = vec![good, bad];

        let report = rewriter.rewrite_file(&file);
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.functions[0].name, "Good");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "Bad");
        assert!(report.source.contains("func Good()"));
        assert!(!report.source.contains("func Bad()"));
    }

    #[test]
    fn non_generators_are_skipped_silently() {
        let rewriter = Rewriter::new();
        let config = rewriter.config().clone();
        let file = SourceFile {
            package_path: "example.com/demo".to_string(),
            package_name: "demo".to_string(),
            imports: vec![],
            bindings: Bindings::new(),
            functions: vec![generator(
                &config,
                "ReturnsOnly",
                Block::new(vec![Stmt::Return {
                    results: vec![Expr::nil()],
                }]),
            )],
        };
        let report = rewriter.rewrite_file(&file);
        assert!(report.functions.is_empty());
        assert!(report.failures.is_empty());
    }
}

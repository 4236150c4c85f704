//! Expression lowering.
//!
//! Expressions never suspend; this half of the lowerer only prints
//! output-language syntax, routing identifier occurrences through the
//! name environment. The single special case is a call whose callee
//! resolves to the yield sentinel, which becomes a suspension point.

use super::FuncLowerer;
use crate::error::{RewriteError, RewriteResult};
use crate::hir::{BindingKind, BindingScope, Expr, Ident, IdentRole};
use crate::templates;

impl FuncLowerer<'_> {
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> RewriteResult<String> {
        match expr {
            Expr::Ident(ident) => self.lower_ident(ident),
            Expr::Lit(lexeme) => Ok(lexeme.clone()),
            Expr::Unary { op, expr } => {
                let expr = self.lower_expr(expr)?;
                Ok(format!("{}{expr}", op.token()))
            }
            Expr::Binary { op, left, right } => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                Ok(format!("{left} {} {right}", op.token()))
            }
            Expr::Paren(inner) => {
                let inner = self.lower_expr(inner)?;
                Ok(format!("({inner})"))
            }
            Expr::Call { fun, args } => self.lower_call(fun, args),
            Expr::Selector { expr, sel, .. } => {
                // The selector tail is a member access, not a variable
                // reference; it passes through unrenamed.
                let expr = self.lower_expr(expr)?;
                Ok(format!("{expr}.{sel}"))
            }
            Expr::Composite { ty, elts } => {
                let ty = self.lower_expr(ty)?;
                let mut parts = Vec::with_capacity(elts.len());
                for elt in elts {
                    parts.push(self.lower_expr(elt)?);
                }
                Ok(format!("{ty}{{{}}}", parts.join(", ")))
            }
            Expr::TypeRef(ty) => Ok(self.type_name(ty)),
            Expr::Index { .. } | Expr::FuncLit => Ok(self.unsupported_node(expr)),
        }
    }

    fn lower_ident(&mut self, ident: &Ident) -> RewriteResult<String> {
        // nil behaves a bit odd, so it is handled up front.
        if ident.name == "nil" {
            return Ok("nil".to_string());
        }
        if ident.name == "_" {
            return Ok("_".to_string());
        }
        match ident.role {
            IdentRole::Def => self.define_ident(ident),
            IdentRole::Use => {
                let Some(id) = ident.binding else {
                    return Ok(ident.name.clone());
                };
                let binding = self.binding(id)?;
                match binding.scope {
                    BindingScope::Builtin => Ok(ident.name.clone()),
                    BindingScope::CurrentPackage => match binding.kind {
                        BindingKind::Var => self.names.resolve(id, binding),
                        // Same-package functions and type names are not
                        // locals; they keep their source spelling.
                        _ => Ok(ident.name.clone()),
                    },
                    BindingScope::ImportedPackage => self.names.resolve(id, binding),
                    BindingScope::ForeignPackage => Ok(ident.name.clone()),
                }
            }
        }
    }

    /// Registers a defining occurrence and hoists it into persistent
    /// state.
    pub(crate) fn define_ident(&mut self, ident: &Ident) -> RewriteResult<String> {
        if ident.name == "_" {
            return Ok("_".to_string());
        }
        let Some(id) = ident.binding else {
            return Err(RewriteError::invariant(format!(
                "defining occurrence of {:?} has no binding",
                ident.name
            )));
        };
        let binding = self.binding(id)?;
        let ty = self.type_name(&binding.ty);
        let name = self.names.define_local(id, &binding.name)?;
        self.state.add_slot(name.clone(), ty);
        Ok(name)
    }

    fn lower_call(&mut self, fun: &Expr, args: &[Expr]) -> RewriteResult<String> {
        if self.is_yield_callee(fun)? {
            return self.lower_yield(args);
        }
        let fun = self.lower_expr(fun)?;
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(self.lower_expr(arg)?);
        }
        Ok(format!("{fun}({})", parts.join(", ")))
    }

    /// The yield sentinel is recognized by its resolved binding, never
    /// by source spelling.
    fn is_yield_callee(&self, fun: &Expr) -> RewriteResult<bool> {
        let Expr::Selector {
            sel_binding: Some(id),
            ..
        } = fun
        else {
            return Ok(false);
        };
        let binding = self.binding(*id)?;
        let sentinel = &self.config().yield_func;
        Ok(binding.kind == BindingKind::Func && binding.is(&sentinel.package, &sentinel.name))
    }

    fn lower_yield(&mut self, args: &[Expr]) -> RewriteResult<String> {
        // Code after a terminating return is unreachable; a yield there
        // emits nothing and allocates no tag.
        if self.blocks.after_return() {
            tracing::trace!("dropping yield after return");
            return Ok(String::new());
        }
        if args.len() != 1 {
            return Err(RewriteError::malformed(format!(
                "yield accepts a single argument, got {}",
                args.len()
            )));
        }
        let value = self.lower_expr(&args[0])?;
        let next = self.yields.next();
        tracing::trace!(tag = next, "allocated yield point");
        Ok(templates::yield_point(&value, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{
        Binding, BindingId, Bindings, Block, GoType, SourceFile, Stmt,
    };
    use crate::imports::ImportNames;
    use crate::RewriteConfig;

    struct Fixture {
        file: SourceFile,
        config: RewriteConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                file: SourceFile {
                    package_path: "example.com/demo".to_string(),
                    package_name: "demo".to_string(),
                    imports: vec![crate::hir::ImportLine {
                        alias: None,
                        path: "fmt".to_string(),
                    }],
                    bindings: Bindings::new(),
                    functions: vec![],
                },
                config: RewriteConfig::default(),
            }
        }

        fn add(&mut self, name: &str, kind: BindingKind, scope: BindingScope) -> BindingId {
            let package = match scope {
                BindingScope::CurrentPackage => Some("example.com/demo".to_string()),
                BindingScope::ForeignPackage | BindingScope::ImportedPackage => {
                    Some("fmt".to_string())
                }
                BindingScope::Builtin => None,
            };
            self.file.bindings.insert(Binding {
                name: name.to_string(),
                ty: GoType::basic("int"),
                kind,
                scope,
                package,
            })
        }

        fn lower(&self, exprs: Vec<Expr>) -> Vec<String> {
            let imports = ImportNames::from_imports(&self.file.imports);
            let mut lowerer = FuncLowerer::new(&self.file, &self.config, &imports);
            let stmts: Vec<Stmt> = exprs.into_iter().map(Stmt::Expr).collect();
            let out = lowerer.lower_body(&Block::new(stmts)).unwrap();
            out.lines().map(String::from).collect()
        }
    }

    #[test]
    fn nil_is_always_verbatim() {
        let fx = Fixture::new();
        assert_eq!(fx.lower(vec![Expr::nil()]), vec!["nil"]);
    }

    #[test]
    fn builtin_uses_keep_their_source_name() {
        let mut fx = Fixture::new();
        let id = fx.add("len", BindingKind::Builtin, BindingScope::Builtin);
        let call = Expr::Call {
            fun: Box::new(Expr::Ident(Ident::use_of("len", id))),
            args: vec![Expr::lit("xs")],
        };
        assert_eq!(fx.lower(vec![call]), vec!["len(xs)"]);
    }

    #[test]
    fn defs_then_uses_share_the_renamed_identifier() {
        let mut fx = Fixture::new();
        let first = fx.add("i", BindingKind::Var, BindingScope::CurrentPackage);
        let second = fx.add("i", BindingKind::Var, BindingScope::CurrentPackage);
        let out = fx.lower(vec![
            Expr::Ident(Ident::def("i", first)),
            Expr::Ident(Ident::def("i", second)),
            Expr::Ident(Ident::use_of("i", second)),
            Expr::Ident(Ident::use_of("i", first)),
        ]);
        assert_eq!(out, vec!["i", "i1", "i1", "i"]);
    }

    #[test]
    fn foreign_uses_pass_through() {
        let mut fx = Fixture::new();
        let println = fx.add("Println", BindingKind::Func, BindingScope::ForeignPackage);
        let pkg = fx.add("fmt", BindingKind::PackageName, BindingScope::ImportedPackage);
        let call = Expr::Call {
            fun: Box::new(Expr::Selector {
                expr: Box::new(Expr::Ident(Ident::use_of("fmt", pkg))),
                sel: "Println".to_string(),
                sel_binding: Some(println),
            }),
            args: vec![Expr::lit("\"hi\"")],
        };
        assert_eq!(fx.lower(vec![call]), vec!["fmt.Println(\"hi\")"]);
    }

    #[test]
    fn same_package_functions_keep_their_spelling() {
        let mut fx = Fixture::new();
        let helper = fx.add("helper", BindingKind::Func, BindingScope::CurrentPackage);
        let call = Expr::Call {
            fun: Box::new(Expr::Ident(Ident::use_of("helper", helper))),
            args: vec![],
        };
        assert_eq!(fx.lower(vec![call]), vec!["helper()"]);
    }

    #[test]
    fn composite_literals_recurse_through_the_lowerer() {
        let mut fx = Fixture::new();
        let id = fx.add("n", BindingKind::Var, BindingScope::CurrentPackage);
        let composite = Expr::Composite {
            ty: Box::new(Expr::TypeRef(GoType::Slice(Box::new(GoType::basic(
                "int",
            ))))),
            elts: vec![
                Expr::Ident(Ident::def("n", id)),
                Expr::lit("2"),
            ],
        };
        assert_eq!(fx.lower(vec![composite]), vec!["[]int{n, 2}"]);
    }

    #[test]
    fn selector_tails_are_not_renamed() {
        let mut fx = Fixture::new();
        let id = fx.add("book", BindingKind::Var, BindingScope::CurrentPackage);
        let out = fx.lower(vec![
            Expr::Ident(Ident::def("book", id)),
            Expr::Selector {
                expr: Box::new(Expr::Ident(Ident::use_of("book", id))),
                sel: "Name".to_string(),
                sel_binding: None,
            },
        ]);
        assert_eq!(out[1], "book.Name");
    }

    #[test]
    fn binary_and_unary_print_go_tokens() {
        let fx = Fixture::new();
        let expr = Expr::Binary {
            op: crate::hir::BinOp::Add,
            left: Box::new(Expr::lit("a")),
            right: Box::new(Expr::Unary {
                op: crate::hir::UnaryOp::Neg,
                expr: Box::new(Expr::lit("b")),
            }),
        };
        assert_eq!(fx.lower(vec![expr]), vec!["a + -b"]);
    }

    #[test]
    fn index_expressions_are_unsupported() {
        let fx = Fixture::new();
        let expr = Expr::Index {
            base: Box::new(Expr::lit("xs")),
            index: Box::new(Expr::lit("0")),
        };
        let out = fx.lower(vec![expr]).join("\n");
        assert!(out.starts_with("/* unsupported construct:"));
    }
}

//! Generator discovery.
//!
//! A function is rewritten only when it both declares the placeholder
//! result type and actually mentions the yield sentinel somewhere in
//! its body; a function that merely returns a generator it got from
//! elsewhere is left alone.

use crate::hir::{Block, Expr, FuncDecl, GoType, SourceFile, Stmt, VarSpec};
use crate::RewriteConfig;

/// Whether `func` is a generator definition under `config`.
pub fn is_generator(file: &SourceFile, config: &RewriteConfig, func: &FuncDecl) -> bool {
    if func.results.len() != 1 {
        return false;
    }
    let GoType::Named {
        package: Some(package),
        name,
        ..
    } = &func.results[0]
    else {
        return false;
    };
    if *package != config.generator_type.package || *name != config.generator_type.name {
        return false;
    }
    block_mentions_yield(file, config, &func.body)
}

fn block_mentions_yield(file: &SourceFile, config: &RewriteConfig, block: &Block) -> bool {
    block
        .stmts
        .iter()
        .any(|stmt| stmt_mentions_yield(file, config, stmt))
}

fn stmt_mentions_yield(file: &SourceFile, config: &RewriteConfig, stmt: &Stmt) -> bool {
    let expr = |e: &Expr| expr_mentions_yield(file, config, e);
    match stmt {
        Stmt::Block(block) => block_mentions_yield(file, config, block),
        Stmt::Expr(e) | Stmt::Go(e) | Stmt::Defer(e) => expr(e),
        Stmt::Return { results } => results.iter().any(expr),
        Stmt::Assign { lhs, rhs, .. } => lhs.iter().any(expr) || rhs.iter().any(expr),
        Stmt::IncDec { expr: e, .. } => expr(e),
        Stmt::VarDecl { specs } => specs
            .iter()
            .any(|VarSpec { values, .. }| values.iter().any(expr)),
        Stmt::If {
            init,
            cond,
            then,
            els,
        } => {
            init.as_deref()
                .is_some_and(|s| stmt_mentions_yield(file, config, s))
                || expr(cond)
                || block_mentions_yield(file, config, then)
                || els
                    .as_deref()
                    .is_some_and(|s| stmt_mentions_yield(file, config, s))
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
        } => {
            init.as_deref()
                .is_some_and(|s| stmt_mentions_yield(file, config, s))
                || cond.as_ref().is_some_and(expr)
                || post
                    .as_deref()
                    .is_some_and(|s| stmt_mentions_yield(file, config, s))
                || block_mentions_yield(file, config, body)
        }
        Stmt::Range {
            key,
            value,
            subject,
            body,
            ..
        } => {
            key.as_ref().is_some_and(expr)
                || value.as_ref().is_some_and(expr)
                || expr(subject)
                || block_mentions_yield(file, config, body)
        }
        Stmt::Send { chan, value } => expr(chan) || expr(value),
        Stmt::Branch { .. }
        | Stmt::TypeDecl { .. }
        | Stmt::ImportDecl { .. }
        | Stmt::FuncDecl { .. } => false,
    }
}

fn expr_mentions_yield(file: &SourceFile, config: &RewriteConfig, e: &Expr) -> bool {
    let is_sentinel = |id| {
        file.bindings
            .get(id)
            .is_ok_and(|b| b.is(&config.yield_func.package, &config.yield_func.name))
    };
    let expr = |e: &Expr| expr_mentions_yield(file, config, e);
    match e {
        Expr::Ident(ident) => ident.binding.is_some_and(is_sentinel),
        Expr::Lit(_) | Expr::TypeRef(_) | Expr::FuncLit => false,
        Expr::Unary { expr: inner, .. } | Expr::Paren(inner) => expr(inner),
        Expr::Binary { left, right, .. } => expr(left) || expr(right),
        Expr::Call { fun, args } => expr(fun) || args.iter().any(expr),
        Expr::Selector {
            expr: base,
            sel_binding,
            ..
        } => sel_binding.is_some_and(is_sentinel) || expr(base),
        Expr::Composite { ty, elts } => expr(ty) || elts.iter().any(expr),
        Expr::Index { base, index } => expr(base) || expr(index),
    }
}

//! Statement lowering.
//!
//! [`FuncLowerer`] walks one generator body and emits the flat,
//! re-entrant text of its step function. It coordinates the name
//! environment, the persistent-state tracker, the yield tag allocator,
//! and the loop/block context stacks; the concrete output shapes live
//! in [`crate::templates`].
//!
//! Constructs outside the supported set are replaced by a bracketed
//! comment carrying the offending node, and lowering continues with the
//! rest of the function.

pub(crate) mod exprs;

use std::fmt;

use crate::error::{RewriteError, RewriteResult};
use crate::frames::{BlockStack, LoopStack};
use crate::hir::{
    Binding, BindingId, Block, BranchKind, Expr, GoType, Param, SourceFile, Stmt, VarSpec,
};
use crate::imports::ImportNames;
use crate::names::NameEnv;
use crate::state::{Counter, StateTracker, YieldAllocator};
use crate::templates;
use crate::RewriteConfig;

/// Per-function rewriter state. One instance per generator; nothing is
/// shared across functions.
pub struct FuncLowerer<'a> {
    file: &'a SourceFile,
    config: &'a RewriteConfig,
    imports: &'a ImportNames,
    pub(crate) names: NameEnv,
    pub(crate) state: StateTracker,
    pub(crate) yields: YieldAllocator,
    pub(crate) blocks: BlockStack,
    loops: LoopStack,
    jump_ids: Counter,
    adapter_ids: Counter,
    unsupported: Vec<String>,
}

impl<'a> FuncLowerer<'a> {
    pub fn new(file: &'a SourceFile, config: &'a RewriteConfig, imports: &'a ImportNames) -> Self {
        Self {
            file,
            config,
            imports,
            names: NameEnv::new(),
            state: StateTracker::new(),
            yields: YieldAllocator::new(),
            blocks: BlockStack::new(),
            loops: LoopStack::new(),
            jump_ids: Counter::new(),
            adapter_ids: Counter::new(),
            unsupported: Vec::new(),
        }
    }

    pub(crate) fn binding(&self, id: BindingId) -> RewriteResult<&'a Binding> {
        self.file.bindings.get(id)
    }

    pub(crate) fn type_name(&self, ty: &GoType) -> String {
        self.imports.type_name(&self.file.package_path, ty)
    }

    pub(crate) fn config(&self) -> &RewriteConfig {
        self.config
    }

    /// Summaries of locally recovered unsupported constructs.
    pub fn unsupported_notes(&self) -> &[String] {
        &self.unsupported
    }

    pub(crate) fn register_parameter(&mut self, param: &Param) -> RewriteResult<()> {
        self.names.register_parameter(param.binding, &param.name)
    }

    /// Lowers the function body. The body is a block too, so it gets
    /// its own frame.
    pub fn lower_body(&mut self, body: &Block) -> RewriteResult<String> {
        let text = self.lower_block(body)?;
        debug_assert_eq!(self.blocks.depth(), 0, "unbalanced block stack");
        debug_assert_eq!(self.loops.depth(), 0, "unbalanced loop stack");
        Ok(text)
    }

    fn lower_block(&mut self, block: &Block) -> RewriteResult<String> {
        self.blocks.enter();
        let mut parts = Vec::new();
        let mut failure = None;
        for stmt in &block.stmts {
            match self.lower_stmt(stmt) {
                Ok(text) => {
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.blocks.leave()?;
        match failure {
            Some(err) => Err(err),
            None => Ok(parts.join("\n")),
        }
    }

    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) -> RewriteResult<String> {
        match stmt {
            Stmt::Block(block) => self.lower_block(block),
            Stmt::Expr(expr) => self.lower_expr(expr),
            Stmt::Return { results } => self.lower_return(results),
            Stmt::Assign { lhs, op, rhs } => self.lower_assign(lhs, *op, rhs),
            Stmt::IncDec { expr, op } => {
                let expr = self.lower_expr(expr)?;
                let tok = match op {
                    crate::hir::IncDecOp::Inc => "++",
                    crate::hir::IncDecOp::Dec => "--",
                };
                Ok(format!("{expr}{tok}"))
            }
            Stmt::VarDecl { specs } => self.lower_var_decl(specs),
            Stmt::If {
                init,
                cond,
                then,
                els,
            } => self.lower_if(init.as_deref(), cond, then, els.as_deref()),
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => self.lower_for(init.as_deref(), cond.as_ref(), post.as_deref(), body),
            Stmt::Range {
                key,
                value,
                subject,
                subject_ty,
                body,
            } => self.lower_range(key.as_ref(), value.as_ref(), subject, subject_ty, body, stmt),
            Stmt::Branch { kind, label } => self.lower_branch(*kind, label.as_deref(), stmt),
            Stmt::TypeDecl { .. }
            | Stmt::ImportDecl { .. }
            | Stmt::FuncDecl { .. }
            | Stmt::Go(_)
            | Stmt::Defer(_)
            | Stmt::Send { .. } => Ok(self.unsupported_node(stmt)),
        }
    }

    /// A generator-body return carries exactly the terminating
    /// error/termination value.
    fn lower_return(&mut self, results: &[Expr]) -> RewriteResult<String> {
        if results.len() != 1 {
            return Err(RewriteError::malformed(format!(
                "expected 1 return value, got {}",
                results.len()
            )));
        }
        let value = self.lower_expr(&results[0])?;
        self.blocks.mark_return()?;
        Ok(templates::terminating_return(&value))
    }

    fn lower_assign(
        &mut self,
        lhs: &[Expr],
        op: crate::hir::AssignOp,
        rhs: &[Expr],
    ) -> RewriteResult<String> {
        let mut left = Vec::with_capacity(lhs.len());
        for expr in lhs {
            left.push(self.lower_expr(expr)?);
        }
        let mut right = Vec::with_capacity(rhs.len());
        for expr in rhs {
            right.push(self.lower_expr(expr)?);
        }
        Ok(format!(
            "{} {} {}",
            left.join(", "),
            op.token(),
            right.join(", ")
        ))
    }

    /// `var` declarations move into persistent state; only the
    /// initializing assignments remain in the body.
    fn lower_var_decl(&mut self, specs: &[VarSpec]) -> RewriteResult<String> {
        let mut assignments = Vec::new();
        for spec in specs {
            for (i, ident) in spec.names.iter().enumerate() {
                let name = self.define_ident(ident)?;
                if let Some(value) = spec.values.get(i) {
                    let value = self.lower_expr(value)?;
                    assignments.push(format!("{name} = {value}"));
                }
            }
        }
        Ok(assignments.join("\n"))
    }

    fn lower_if(
        &mut self,
        init: Option<&Stmt>,
        cond: &Expr,
        then: &Block,
        els: Option<&Stmt>,
    ) -> RewriteResult<String> {
        let id = self.jump_ids.next();
        let init = match init {
            Some(stmt) => self.lower_stmt(stmt)?,
            None => String::new(),
        };
        let cond = self.lower_expr(cond)?;
        let then = self.lower_block(then)?;
        let els = match els {
            Some(stmt) => self.lower_stmt(stmt)?,
            None => String::new(),
        };
        Ok(templates::cond_if(id, &init, &cond, &then, &els))
    }

    fn lower_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Block,
    ) -> RewriteResult<String> {
        let id = self.jump_ids.next();
        self.loops.push(id);
        let lowered = self.lower_for_inner(init, cond, post, body);
        let frame = self.loops.pop()?;
        let (init, cond, post, body) = lowered?;
        if init.is_empty() && cond.is_none() && post.is_empty() {
            Ok(templates::forever_loop(&frame, &body))
        } else {
            Ok(templates::for_loop(
                &frame,
                &init,
                cond.as_deref(),
                &post,
                &body,
            ))
        }
    }

    #[allow(clippy::type_complexity)]
    fn lower_for_inner(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Block,
    ) -> RewriteResult<(String, Option<String>, String, String)> {
        let init = match init {
            Some(stmt) => self.lower_stmt(stmt)?,
            None => String::new(),
        };
        let cond = match cond {
            Some(expr) => Some(self.lower_expr(expr)?),
            None => None,
        };
        let post = match post {
            Some(stmt) => self.lower_stmt(stmt)?,
            None => String::new(),
        };
        let body = self.lower_block(body)?;
        Ok((init, cond, post, body))
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_range(
        &mut self,
        key: Option<&Expr>,
        value: Option<&Expr>,
        subject: &Expr,
        subject_ty: &GoType,
        body: &Block,
        whole: &Stmt,
    ) -> RewriteResult<String> {
        let id = self.jump_ids.next();
        self.loops.push(id);
        let lowered = self.lower_range_inner(key, value, subject, subject_ty, whole);
        let frame_body = match lowered {
            Ok(Some(prefix)) => self.lower_block(body).map(|b| Some((prefix, b))),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        let frame = self.loops.pop()?;
        match frame_body? {
            Some((prefix, body)) => Ok(templates::range_loop(
                &frame,
                &prefix.adapter,
                &prefix.ctor,
                &prefix.key,
                &prefix.value,
                &body,
            )),
            None => Ok(self.unsupported_node(whole)),
        }
    }

    /// Adapter setup for a supported range subject; `None` when the
    /// subject type has no adapter.
    fn lower_range_inner(
        &mut self,
        key: Option<&Expr>,
        value: Option<&Expr>,
        subject: &Expr,
        subject_ty: &GoType,
        _whole: &Stmt,
    ) -> RewriteResult<Option<RangePrefix>> {
        let runtime = self.config.runtime_name.clone();
        let (ctor_name, adapter_base, key_ty, value_ty) = match subject_ty {
            GoType::Map { key, value } => (
                "NewMapAdapter",
                "__mapAdapter",
                self.type_name(key),
                self.type_name(value),
            ),
            GoType::Slice(elem) => (
                "NewSliceAdapter",
                "__sliceAdapter",
                "int".to_string(),
                self.type_name(elem),
            ),
            GoType::Array { elem, .. } => (
                "NewSliceAdapter",
                "__sliceAdapter",
                "int".to_string(),
                self.type_name(elem),
            ),
            _ => return Ok(None),
        };

        let subject = self.lower_expr(subject)?;
        let adapter = format!("{adapter_base}{}", self.adapter_ids.next());
        self.state.add_adapter_decl(format!(
            "var {adapter} {runtime}.Iterator2[{key_ty}, {value_ty}]"
        ));
        let key = match key {
            Some(expr) => self.lower_expr(expr)?,
            None => "_".to_string(),
        };
        let value = match value {
            Some(expr) => self.lower_expr(expr)?,
            None => "_".to_string(),
        };
        tracing::trace!(adapter = %adapter, "synthesized range adapter");
        Ok(Some(RangePrefix {
            ctor: format!("{runtime}.{ctor_name}({subject})"),
            adapter,
            key,
            value,
        }))
    }

    fn lower_branch(
        &mut self,
        kind: BranchKind,
        label: Option<&str>,
        whole: &Stmt,
    ) -> RewriteResult<String> {
        if label.is_some() {
            return Ok(self.unsupported_node(whole));
        }
        // An empty loop stack means malformed input rather than a
        // rewriter bug; recover the same way unsupported constructs do.
        let jump = match kind {
            BranchKind::Break => self
                .loops
                .mark_break()
                .map(|id| format!("goto __After{id}")),
            BranchKind::Continue => self
                .loops
                .mark_continue()
                .map(|id| format!("goto __Continue{id}")),
            BranchKind::Goto | BranchKind::Fallthrough => None,
        };
        match jump {
            Some(text) => Ok(text),
            None => Ok(self.unsupported_node(whole)),
        }
    }

    pub(crate) fn unsupported_node<N: fmt::Debug>(&mut self, node: &N) -> String {
        let dump = format!("{node:#?}");
        let summary = dump.lines().next().unwrap_or("?").trim_end().to_string();
        tracing::debug!(construct = %summary, "unsupported construct, emitting comment");
        self.unsupported.push(summary);
        templates::unsupported(&dump)
    }
}

struct RangePrefix {
    ctor: String,
    adapter: String,
    key: String,
    value: String,
}

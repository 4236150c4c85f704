//! Typed AST for generator source files.
//!
//! The rewriter does not parse or type-check anything itself: the caller
//! hands it a [`SourceFile`] whose identifiers already carry resolved
//! [`Binding`]s and whose expressions carry [`GoType`]s wherever the
//! lowering needs one. Everything here is plain data with serde derives,
//! so a source file round-trips through JSON.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{ErrorKind, RewriteError, RewriteResult};

pub type Symbol = String;

/// Index into a [`Bindings`] table. Identity-comparable: two textually
/// equal names from different scopes get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingId(pub u32);

/// What kind of object a binding names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    Var,
    Func,
    TypeName,
    PackageName,
    Builtin,
}

/// Where a binding lives relative to the package under rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingScope {
    CurrentPackage,
    ImportedPackage,
    ForeignPackage,
    Builtin,
}

/// A declaration object attached to identifiers by the upstream type
/// checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: Symbol,
    pub ty: GoType,
    pub kind: BindingKind,
    pub scope: BindingScope,
    /// Package path of the declaring package, when there is one.
    pub package: Option<String>,
}

impl Binding {
    /// True when this binding is the named object `package`.`name`.
    pub fn is(&self, package: &str, name: &str) -> bool {
        self.name == name && self.package.as_deref() == Some(package)
    }
}

/// Binding table for one source file. Ids are positions, so the table
/// serializes as a plain array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: Binding) -> BindingId {
        let id = BindingId(u32::try_from(self.entries.len()).unwrap_or(u32::MAX));
        self.entries.push(binding);
        id
    }

    /// Looks up a binding; a miss indicates a bug in the input AST.
    pub fn get(&self, id: BindingId) -> RewriteResult<&Binding> {
        self.entries.get(id.0 as usize).ok_or_else(|| {
            RewriteError::new(ErrorKind::InternalInvariant(format!(
                "no binding with id {}",
                id.0
            )))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output-language types, as resolved by the upstream checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GoType {
    /// Predeclared types: `int`, `string`, `bool`, `error`, `any`, ...
    Basic(Symbol),
    /// A named (possibly generic) type, with the path of its declaring
    /// package when it has one.
    Named {
        package: Option<String>,
        name: Symbol,
        args: Vec<GoType>,
    },
    Slice(Box<GoType>),
    Array { len: u64, elem: Box<GoType> },
    Map { key: Box<GoType>, value: Box<GoType> },
    Pointer(Box<GoType>),
    Chan(Box<GoType>),
    Func { params: Vec<GoType>, results: Vec<GoType> },
}

impl GoType {
    pub fn basic(name: &str) -> Self {
        GoType::Basic(name.to_string())
    }

    pub fn named(package: &str, name: &str, args: Vec<GoType>) -> Self {
        GoType::Named {
            package: Some(package.to_string()),
            name: name.to_string(),
            args,
        }
    }
}

/// Whether an identifier occurrence defines its binding or uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentRole {
    Def,
    Use,
}

/// One identifier occurrence. `binding` is absent only for the handful
/// of names the checker leaves unresolved (`_`, `nil`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: Symbol,
    pub binding: Option<BindingId>,
    pub role: IdentRole,
}

impl Ident {
    pub fn def(name: &str, binding: BindingId) -> Self {
        Self {
            name: name.to_string(),
            binding: Some(binding),
            role: IdentRole::Def,
        }
    }

    pub fn use_of(name: &str, binding: BindingId) -> Self {
        Self {
            name: name.to_string(),
            binding: Some(binding),
            role: IdentRole::Use,
        }
    }

    /// The discard identifier `_` or the literal `nil`.
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            binding: None,
            role: IdentRole::Use,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LogicAnd,
    LogicOr,
    BitAnd,
    BitOr,
    BitXor,
    AndNot,
    Shl,
    Shr,
}

impl BinOp {
    pub fn token(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::LogicAnd => "&&",
            BinOp::LogicOr => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::AndNot => "&^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    BitNot,
    Addr,
}

impl UnaryOp {
    pub fn token(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::BitNot => "^",
            UnaryOp::Addr => "&",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    /// A basic literal, carried as its source lexeme.
    Lit(Symbol),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `x.field` / `pkg.Name`. The selector tail is a member access,
    /// not a variable reference; its binding is kept only so calls can
    /// be recognized by their resolved callee.
    Selector {
        expr: Box<Expr>,
        sel: Symbol,
        sel_binding: Option<BindingId>,
    },
    Composite {
        ty: Box<Expr>,
        elts: Vec<Expr>,
    },
    /// A type used in expression position (composite literal types,
    /// array type expressions).
    TypeRef(GoType),
    /// Carried for diagnostics; the lowering does not support indexing.
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// Nested function literal; unsupported inside generator bodies.
    FuncLit,
}

impl Expr {
    pub fn lit(lexeme: &str) -> Self {
        Expr::Lit(lexeme.to_string())
    }

    pub fn nil() -> Self {
        Expr::Ident(Ident::bare("nil"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `:=` (emitted as `=`; the declaration moves into persistent state)
    Define,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    pub fn token(self) -> &'static str {
        match self {
            AssignOp::Assign | AssignOp::Define => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncDecOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

/// One `var` spec: `var a, b T = x, y`. The per-name types come from
/// the bindings; `values` may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    pub names: Vec<Ident>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Block(Block),
    Expr(Expr),
    Return {
        results: Vec<Expr>,
    },
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    IncDec {
        expr: Expr,
        op: IncDecOp,
    },
    VarDecl {
        specs: Vec<VarSpec>,
    },
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        els: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        subject: Expr,
        /// Type of the ranged expression, resolved upstream.
        subject_ty: GoType,
        body: Block,
    },
    Branch {
        kind: BranchKind,
        label: Option<Symbol>,
    },
    // Constructs the lowering rejects but the AST must still carry.
    TypeDecl {
        name: Symbol,
    },
    ImportDecl {
        path: Symbol,
    },
    FuncDecl {
        name: Symbol,
    },
    Go(Expr),
    Defer(Expr),
    Send {
        chan: Expr,
        value: Expr,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// A function parameter; parameters keep their source names in the
/// output, so the name is carried alongside the binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Symbol,
    pub binding: BindingId,
    pub ty: GoType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Symbol,
    pub params: SmallVec<[Param; 4]>,
    pub results: Vec<GoType>,
    pub body: Block,
}

/// An import line of the source file; `alias` is the optional local
/// rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportLine {
    pub alias: Option<String>,
    pub path: String,
}

/// One fully typed source file, the unit the rewriter consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub package_path: String,
    pub package_name: String,
    pub imports: Vec<ImportLine>,
    pub bindings: Bindings,
    pub functions: Vec<FuncDecl>,
}

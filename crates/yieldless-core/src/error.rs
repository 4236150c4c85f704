use std::fmt;
use thiserror::Error;

/// Kinds of rewrite failures.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The function is not a well-formed generator: wrong result shape,
    /// a yield call with the wrong arity, or similar caller-visible
    /// malformations.
    #[error("malformed generator: {0}")]
    MalformedGenerator(String),

    /// A construct the rewriter does not handle. Usually recovered
    /// locally by emitting a bracketed comment; surfaced as an error
    /// only when the caller asks for strict validation.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A broken invariant inside the rewriter or the input AST. Fails
    /// the current function.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

/// Context-aware rewrite error.
#[derive(Debug, Error)]
pub struct RewriteError {
    pub kind: ErrorKind,
    pub context: Vec<String>,
}

impl RewriteError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: Vec::new(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedGenerator(msg.into()))
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalInvariant(msg.into()))
    }

    /// Add a context line, e.g. the enclosing function.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.context.is_empty() {
            write!(f, "\n\nContext:")?;
            for (i, ctx) in self.context.iter().enumerate() {
                write!(f, "\n  {}. {}", i + 1, ctx)?;
            }
        }
        Ok(())
    }
}

/// Result type alias for rewrite operations.
pub type RewriteResult<T> = Result<T, RewriteError>;

/// Extension trait for adding context to results.
pub trait ResultExt<T> {
    fn ctx(self, ctx: impl Into<String>) -> RewriteResult<T>;
}

impl<T> ResultExt<T> for RewriteResult<T> {
    fn ctx(self, ctx: impl Into<String>) -> RewriteResult<T> {
        self.map_err(|e| e.with_context(ctx))
    }
}

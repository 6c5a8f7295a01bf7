//! Errors raised by network operations.
//!
//! Precondition failures (unknown ids, duplicates, stale matches) are
//! reported before anything changes. The rest come from callbacks or from
//! bookkeeping that no longer adds up.

use std::fmt;

use thiserror::Error;

use crate::id::FactId;

/// An error kind plus where it happened.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a duplicate identifier error.
    #[must_use]
    pub fn duplicate_identifier(id: FactId) -> Self {
        Self::new(ErrorKind::DuplicateIdentifier(id))
    }

    /// Creates an unknown fact error.
    #[must_use]
    pub fn unknown_fact(id: FactId) -> Self {
        Self::new(ErrorKind::UnknownFact(id))
    }

    /// Creates an unknown WME error.
    #[must_use]
    pub fn unknown_wme(wme: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownWme(wme.into()))
    }

    /// Creates a duplicate production error.
    #[must_use]
    pub fn duplicate_production(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateProduction(name.into()))
    }

    /// Creates an unknown production error.
    #[must_use]
    pub fn unknown_production(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownProduction(name.into()))
    }

    /// Creates an unsupported negation usage error.
    #[must_use]
    pub fn unsupported_negation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedNegationUsage(message.into()))
    }

    /// Creates a stale match error.
    #[must_use]
    pub fn stale_match(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StaleMatch(message.into()))
    }

    /// Creates a callback failure error.
    #[must_use]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Callback(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error was raised before the network was touched.
    ///
    /// Precondition errors leave the network exactly as it was.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::DuplicateIdentifier(_)
                | ErrorKind::UnknownFact(_)
                | ErrorKind::UnknownWme(_)
                | ErrorKind::DuplicateProduction(_)
                | ErrorKind::UnknownProduction(_)
                | ErrorKind::StaleMatch(_)
        )
    }
}

/// Categorized error kinds.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The fact already carries an id from an earlier `add_fact`.
    #[error("duplicate identifier: fact already registered as {0}")]
    DuplicateIdentifier(FactId),

    /// No fact with this id is registered.
    #[error("unknown fact: {0}")]
    UnknownFact(FactId),

    /// The WME is not in working memory.
    #[error("unknown wme: {0}")]
    UnknownWme(String),

    /// A production with this name is already registered.
    #[error("duplicate production: {0}")]
    DuplicateProduction(String),

    /// No production with this id or name is registered.
    #[error("unknown production: {0}")]
    UnknownProduction(String),

    /// Negative or NCC join-result bookkeeping no longer agrees with the
    /// tokens it guards.
    #[error("unsupported negation usage: {0}")]
    UnsupportedNegationUsage(String),

    /// The match refers to a token that has since been retracted.
    #[error("stale match: {0}")]
    StaleMatch(String),

    /// A bind, filter, or action callback reported a failure.
    #[error("callback failed: {0}")]
    Callback(String),

    /// A network invariant was found broken; the operation was aborted.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Production or fact the failing operation was working on.
    pub source: Option<String>,
    /// Frames from the outermost operation inwards.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

/// `Result` with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

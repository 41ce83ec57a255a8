//! The three error categories this evaluator's callers have to handle:
//! abrupt failure, thrown, and raised/definitional.

use rebel_core::{Cell, CoreError, Symbol};
use std::fmt;

/// The named error tags, plus an open `Custom` tag for dispatcher-specific
/// failures that don't need their own variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorTag {
    BadBranchType,
    IndexOutOfRange,
    SeriesDataFreed,
    IllegalCr,
    NoMemory,
    BadReturnType,
    NoCatch,
    Custom(String),
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorTag::BadBranchType => write!(f, "Error_Bad_Branch_Type_Raw"),
            ErrorTag::IndexOutOfRange => write!(f, "Error_Index_Out_Of_Range_Raw"),
            ErrorTag::SeriesDataFreed => write!(f, "Error_Series_Data_Freed_Raw"),
            ErrorTag::IllegalCr => write!(f, "Error_Illegal_Cr_Raw"),
            ErrorTag::NoMemory => write!(f, "Error_No_Memory"),
            ErrorTag::BadReturnType => write!(f, "Error_Bad_Return_Type"),
            ErrorTag::NoCatch => write!(f, "Error_No_Catch"),
            ErrorTag::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

/// A user-visible failure: tag, near (source position), where (action
/// label chain), and a free-form argument list.
#[derive(Debug, Clone)]
pub struct RaisedError {
    pub tag: ErrorTag,
    pub near: Option<String>,
    pub where_: Vec<Symbol>,
    pub args: Vec<Cell>,
}

impl RaisedError {
    pub fn new(tag: ErrorTag) -> Self {
        RaisedError {
            tag,
            near: None,
            where_: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn with_near(mut self, near: impl Into<String>) -> Self {
        self.near = Some(near.into());
        self
    }

    pub fn with_where(mut self, label: Symbol) -> Self {
        self.where_.push(label);
        self
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if let Some(near) = &self.near {
            write!(f, " near {near}")?;
        }
        Ok(())
    }
}

/// Non-local exit tokens: RETURN, BREAK, CONTINUE, THROW, HALT.
/// `Return` carries the id of the Level whose action Level should catch it
/// ("definitional return").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrowLabel {
    Return(u64),
    Break,
    Continue,
    Named(Symbol),
    Halt,
}

#[derive(Debug, Clone)]
pub struct Thrown {
    pub label: ThrowLabel,
    pub value: Cell,
}

#[derive(Debug, Clone)]
pub enum RebelError {
    /// Raised with `fail(error)`; unwinds running rollback.
    Abrupt(RaisedError),
    /// A non-local exit token stored process-wide.
    Thrown(Thrown),
    /// A value-level error carried in OUT with the "raised" flag; promoted
    /// to Abrupt by the first operator that doesn't opt in to handle it.
    /// `Trampoline::dispatch`'s typechecking step is the one producer of
    /// these today -- a bad return type or an unsatisfied empty-typeset
    /// refinement raises here rather than failing outright, leaving room
    /// for a future meta-parameter class to catch it before it gets
    /// promoted.
    Raised(RaisedError),
}

impl fmt::Display for RebelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebelError::Abrupt(e) => write!(f, "abrupt failure: {e}"),
            RebelError::Thrown(t) => write!(f, "thrown: {:?}", t.label),
            RebelError::Raised(e) => write!(f, "raised: {e}"),
        }
    }
}

impl std::error::Error for RebelError {}

impl From<CoreError> for RebelError {
    fn from(e: CoreError) -> Self {
        let tag = match e {
            CoreError::IndexOutOfRange { .. } => ErrorTag::IndexOutOfRange,
            CoreError::Protected => ErrorTag::Custom("series is protected".into()),
            CoreError::MismatchedContextLengths { .. } => {
                ErrorTag::Custom("mismatched context lengths".into())
            }
        };
        RebelError::Abrupt(RaisedError::new(tag).with_near(e.to_string()))
    }
}

/// Promote a raised (definitional) error to an abrupt failure. Called at
/// the `apply_action`/`apply_action_infix` boundary so a typecheck failure
/// raised deep inside `dispatch` still reaches the caller as a normal
/// failure, since nothing in this evaluator yet opts in to catching a
/// raised error before it escapes.
pub fn promote_raised(err: RebelError) -> RebelError {
    match err {
        RebelError::Raised(e) => RebelError::Abrupt(e),
        other => other,
    }
}

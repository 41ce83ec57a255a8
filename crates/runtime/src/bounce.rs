//! The bounce protocol: what an executor step hands back to the
//! trampoline instead of returning a value directly.
//!
//! A C dispatcher would encode these as sentinel pointer values so it can
//! return a single word. Rust has sum types, so this is a plain enum
//! instead of pointer-tagging tricks -- see DESIGN.md.

use crate::error::Thrown;
use rebel_core::Cell;

#[derive(Debug, Clone)]
pub enum Bounce {
    /// The level is done; this is its result.
    Value(Cell),
    /// Evaluating to no value at all (e.g. an empty `do []`, a vaporizing
    /// `comment`) -- distinct from a value cell; this is the "void" case.
    Void,
    /// A non-local exit token is in flight; the trampoline unwinds levels
    /// looking for a catcher.
    Thrown(Thrown),
    /// Run the next sub-step of this same level (used by natives that
    /// evaluate more than one sub-expression across trampoline steps).
    Continue,
    /// Hand off to a new level and adopt its result as this level's result
    /// once it completes (tail-call shaped handoff, a DELEGATE).
    Delegate,
    /// Re-run action dispatch from TYPECHECKING (`checked = true`) or from
    /// FULFILLING_ARGS (`checked = false`) -- used by ADAPT-style wrapping.
    Redo { checked: bool },
    /// Cooperative yield point for the host to interleave other work.
    Suspend,
}

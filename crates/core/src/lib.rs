//! Core data model for a dynamically-typed, homoiconic evaluator:
//! - [`cell`]: the tagged value cell and its quoting/isotope lattice
//! - [`typeset`]: parameter class and typeset bitmaps
//! - [`series`]: heap-managed, length-bearing arrays/binaries/strings
//! - [`context`]: the varlist/keylist pair that is an object or frame's identity
//! - [`node`]: the trait object handle a cell's payload slots point through
//! - [`mold`]: textual (persistent) forms
//!
//! This crate knows nothing about evaluation, actions, or the trampoline --
//! those live in `rebel-runtime`, which depends on this crate's types.

pub mod cell;
pub mod context;
pub mod error;
pub mod interchange;
pub mod memory_stats;
pub mod mold;
pub mod node;
pub mod series;
pub mod typeset;

pub use cell::{
    Binding, Cell, CellFlags, Heart, Payload, QuoteByte, Scalar, Sideband, Symbol, ValType,
    cell_equals,
};
pub use context::Context;
pub use error::CoreError;
pub use node::{Node, NodeRef, WeakNodeRef};
pub use series::{Flavor, Series, SideBandSlot};
pub use typeset::{HeartBitmap, ParamClass, ParamFlags, Typeset};

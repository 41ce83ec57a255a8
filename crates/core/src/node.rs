//! Managed node handles
//!
//! A cell's payload and extra slots are, per the data model, "reinterpretable
//! as a node pointer or inline scalar." The cell itself never knows the
//! concrete shape behind a node slot -- only the heart byte says how to
//! interpret it. We model that with a trait object handle instead of a raw
//! pointer: `Series` and `Context` implement `Node` here, and `rebel-runtime`
//! implements it for its own action/details/varlist nodes, so `rebel-core`
//! never needs to know about actions to hold a cell that references one.
//!
//! Reference counting (`Rc`) stands in for a mark/sweep collector; cyclic
//! structures (an action's exemplar naming the action as its FRAME
//! archetype) must break the cycle with `Weak` at the point of construction
//! rather than relying on a collector to find them.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Anything a cell's payload/extra slot can point at.
pub trait Node: Any + fmt::Debug {
    /// Stable name for the node's flavor, used in diagnostics and error
    /// "near" fields rather than the Rust type name.
    fn node_kind(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A strong, shared handle to a managed node.
pub type NodeRef = Rc<RefCell<dyn Node>>;

/// A non-owning handle, used to break cycles (e.g. an exemplar's archetype
/// pointing back at the action that owns the exemplar).
pub type WeakNodeRef = Weak<RefCell<dyn Node>>;

/// Downcast a `NodeRef` to a concrete node type, panicking if the dynamic
/// type doesn't match. Callers are expected to have already checked the
/// cell's heart byte, which determines the node's type unambiguously; a
/// mismatch here means the evaluator itself is broken, not that the caller
/// supplied bad input.
pub fn downcast_ref<T: 'static>(node: &NodeRef) -> std::cell::Ref<'_, T> {
    std::cell::Ref::map(node.borrow(), |n| {
        n.as_any()
            .downcast_ref::<T>()
            .expect("node downcast does not match cell heart")
    })
}

pub fn downcast_mut<T: 'static>(node: &NodeRef) -> std::cell::RefMut<'_, T> {
    std::cell::RefMut::map(node.borrow_mut(), |n| {
        n.as_any_mut()
            .downcast_mut::<T>()
            .expect("node downcast does not match cell heart")
    })
}

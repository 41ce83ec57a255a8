//! Context: the varlist/keylist pair that is the identity of an object or
//! frame.
//!
//! `len(varlist) == len(keylist) + 1`; slot 0 of the varlist is an
//! archetype cell naming the context; slot k of the varlist (k >= 1) is the
//! binding of the symbol at slot k of the keylist. A keylist may be shared
//! by many contexts derived from the same schema; it points at an ancestor
//! keylist (via its `link` side-band slot) forming a compatibility chain.

use crate::cell::{Cell, Symbol};
use crate::error::CoreError;
use crate::node::NodeRef;
use crate::series::{Flavor, SideBandSlot, new_array_node};

/// A context, as a pair of handles into the heap. Kept as a thin struct
/// rather than stored in a cell directly -- cells reference the varlist
/// node; this wrapper is a convenience for code that holds both halves.
#[derive(Debug, Clone)]
pub struct Context {
    pub varlist: NodeRef,
    pub keylist: NodeRef,
}

impl Context {
    /// Build a context from a set of (symbol, initial value) pairs plus an
    /// archetype cell for slot 0. Returns `CoreError::MismatchedContextLengths`
    /// if the caller-supplied slices disagree in length (defensive; the
    /// constructor itself can't produce mismatched lengths, but downstream
    /// code that hand-assembles a varlist/keylist pair can).
    pub fn new(archetype: Cell, keys: Vec<Symbol>, values: Vec<Cell>) -> Result<Self, CoreError> {
        if keys.len() != values.len() {
            return Err(CoreError::MismatchedContextLengths {
                varlist_len: values.len() + 1,
                keylist_len: keys.len(),
            });
        }

        let varlist = new_array_node(Flavor::Varlist);
        let keylist = new_array_node(Flavor::Keylist);

        {
            let mut v = varlist.borrow_mut();
            let v = v
                .as_any_mut()
                .downcast_mut::<crate::series::Series>()
                .expect("varlist node is always a Series");
            v.push_cell(archetype);
            for value in values {
                v.push_cell(value);
            }
        }
        {
            let mut v = varlist.borrow_mut();
            v.as_any_mut()
                .downcast_mut::<crate::series::Series>()
                .expect("varlist node is always a Series")
                .set_link(SideBandSlot::Node(keylist.clone()));
        }
        {
            let mut k = keylist.borrow_mut();
            let k = k
                .as_any_mut()
                .downcast_mut::<crate::series::Series>()
                .expect("keylist node is always a Series");
            k.push_cell(Cell::blank()); // slot 0 unused, keeps indices aligned with varlist
            for key in keys {
                k.push_cell(Cell::word(key, crate::cell::Binding::Unbound));
            }
        }

        Ok(Context { varlist, keylist })
    }

    pub fn check_invariant(&self) -> Result<(), CoreError> {
        let varlist_len = self.varlist.borrow().as_any().downcast_ref::<crate::series::Series>()
            .expect("varlist node is always a Series").len();
        let keylist_len = self.keylist.borrow().as_any().downcast_ref::<crate::series::Series>()
            .expect("keylist node is always a Series").len();
        if varlist_len != keylist_len {
            return Err(CoreError::MismatchedContextLengths {
                varlist_len,
                keylist_len,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keylist
            .borrow()
            .as_any()
            .downcast_ref::<crate::series::Series>()
            .expect("keylist node is always a Series")
            .len()
            .saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a varlist's keysource (the keylist it was built with) back out
    /// of the varlist's `link` side-band slot, for code that only has the
    /// bare varlist `NodeRef` (e.g. a running frame) and needs to resolve a
    /// word by name rather than by cached index.
    pub fn keysource_of(varlist: &NodeRef) -> Option<NodeRef> {
        let borrowed = varlist.borrow();
        let series = borrowed
            .as_any()
            .downcast_ref::<crate::series::Series>()
            .expect("varlist node is always a Series");
        match series.link() {
            Some(SideBandSlot::Node(keylist)) => Some(keylist.clone()),
            _ => None,
        }
    }

    /// Set the ancestor keylist for compatibility checks: does action A's
    /// frame satisfy action B's parameter shape?
    pub fn set_ancestor(&self, ancestor_keylist: NodeRef) {
        self.keylist
            .borrow_mut()
            .as_any_mut()
            .downcast_mut::<crate::series::Series>()
            .expect("keylist node is always a Series")
            .set_link(SideBandSlot::Node(ancestor_keylist));
    }

    /// Walk the ancestor chain checking whether `other`'s keylist is `self`'s
    /// keylist or one of its ancestors (used for frame/parameter-shape
    /// compatibility).
    pub fn keylist_compatible_with(&self, other: &NodeRef) -> bool {
        use std::rc::Rc;

        let mut current = self.keylist.clone();
        loop {
            if Rc::ptr_eq(&current, other) {
                return true;
            }
            let next = {
                let borrowed = current.borrow();
                let series = borrowed
                    .as_any()
                    .downcast_ref::<crate::series::Series>()
                    .expect("keylist node is always a Series");
                match series.link() {
                    Some(SideBandSlot::Node(anc)) => Some(anc.clone()),
                    _ => None,
                }
            };
            match next {
                Some(anc) => current = anc,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Binding, Heart, QuoteByte};

    fn archetype() -> Cell {
        Cell::new_scalar(Heart::Frame, QuoteByte::PLAIN, crate::cell::Scalar::None)
    }

    #[test]
    fn varlist_len_is_keylist_len_plus_one() {
        let ctx = Context::new(
            archetype(),
            vec![Symbol::new("x"), Symbol::new("y")],
            vec![Cell::integer(1), Cell::integer(2)],
        )
        .unwrap();
        ctx.check_invariant().unwrap();
        assert_eq!(ctx.len(), 2);
        let _ = Binding::Unbound;
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let err = Context::new(archetype(), vec![Symbol::new("x")], vec![]).unwrap_err();
        assert!(matches!(err, CoreError::MismatchedContextLengths { .. }));
    }

    #[test]
    fn ancestor_chain_is_walked() {
        let base = Context::new(archetype(), vec![Symbol::new("x")], vec![Cell::integer(1)]).unwrap();
        let derived =
            Context::new(archetype(), vec![Symbol::new("x")], vec![Cell::integer(2)]).unwrap();
        derived.set_ancestor(base.keylist.clone());
        assert!(derived.keylist_compatible_with(&base.keylist));
        assert!(!base.keylist_compatible_with(&derived.keylist));
    }
}

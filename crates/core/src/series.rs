//! Series: heap-managed, length-bearing sequences.
//!
//! Arrays hold cells; binaries and strings hold bytes. A series carries a
//! flavor and three side-band slots (`link`, `misc`, `bonus`) whose meaning
//! is fixed by the flavor -- callers must never read a side-band slot under
//! the wrong flavor.
//!
//! A "singular" (inline single-cell) or "pairing" (two inline cells) series
//! would avoid a second heap allocation for small arrays. A `Vec` already
//! amortizes small allocations reasonably and Rust gives us no portable way
//! to inline a `Vec`'s storage into the owning struct, so this
//! implementation does not chase that optimization -- see DESIGN.md.

use crate::cell::Cell;
use crate::node::{Node, NodeRef, WeakNodeRef};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Array,
    Binary,
    StringBytes,
    Keylist,
    Varlist,
    Details,
    Pairing,
}

/// The flavor-dependent interpretation of a series' side-band slots.
#[derive(Debug, Clone, Default)]
pub struct SideBand {
    pub link: Option<SideBandSlot>,
    pub misc: Option<SideBandSlot>,
    pub bonus: Option<SideBandSlot>,
}

#[derive(Debug, Clone)]
pub enum SideBandSlot {
    Node(NodeRef),
    WeakNode(WeakNodeRef),
    Index(u32),
    Scalar(i64),
}

/// A length-bearing, resizable sequence of cells or bytes.
#[derive(Debug)]
pub struct Series {
    flavor: Flavor,
    cells: Vec<Cell>,
    bytes: Vec<u8>,
    side: SideBand,
    protected: bool,
}

impl Series {
    pub fn new_array(flavor: Flavor) -> Self {
        debug_assert!(matches!(
            flavor,
            Flavor::Array | Flavor::Keylist | Flavor::Varlist | Flavor::Details | Flavor::Pairing
        ));
        Series {
            flavor,
            cells: Vec::new(),
            bytes: Vec::new(),
            side: SideBand::default(),
            protected: false,
        }
    }

    pub fn new_bytes(flavor: Flavor) -> Self {
        debug_assert!(matches!(flavor, Flavor::Binary | Flavor::StringBytes));
        Series {
            flavor,
            cells: Vec::new(),
            bytes: Vec::new(),
            side: SideBand::default(),
            protected: false,
        }
    }

    pub fn with_capacity(flavor: Flavor, capacity: usize) -> Self {
        let mut s = Series::new_array(flavor);
        s.cells.reserve(capacity);
        s
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn len(&self) -> usize {
        match self.flavor {
            Flavor::Binary | Flavor::StringBytes => self.bytes.len(),
            _ => self.cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn protect(&mut self) {
        self.protected = true;
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Accessing index == length is end-of-feed, not out-of-range -- callers
    /// use `cell_at` for a bounds-checked, failing read and `is_end` to test
    /// the edge without tripping an error.
    pub fn is_end(&self, index: usize) -> bool {
        index >= self.len()
    }

    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cell_at_mut(&mut self, index: usize) -> Option<&mut Cell> {
        if self.protected {
            return None;
        }
        self.cells.get_mut(index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn push_cell(&mut self, cell: Cell) {
        debug_assert!(
            cell.is_array_storable(),
            "writing an isotope into an array is a bug"
        );
        self.cells.push(cell);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    pub fn link(&self) -> Option<&SideBandSlot> {
        self.side.link.as_ref()
    }

    pub fn set_link(&mut self, slot: SideBandSlot) {
        self.side.link = Some(slot);
    }

    pub fn misc(&self) -> Option<&SideBandSlot> {
        self.side.misc.as_ref()
    }

    pub fn set_misc(&mut self, slot: SideBandSlot) {
        self.side.misc = Some(slot);
    }

    pub fn bonus(&self) -> Option<&SideBandSlot> {
        self.side.bonus.as_ref()
    }

    pub fn set_bonus(&mut self, slot: SideBandSlot) {
        self.side.bonus = Some(slot);
    }
}

impl Node for Series {
    fn node_kind(&self) -> &'static str {
        match self.flavor {
            Flavor::Array => "array",
            Flavor::Binary => "binary",
            Flavor::StringBytes => "string",
            Flavor::Keylist => "keylist",
            Flavor::Varlist => "varlist",
            Flavor::Details => "details",
            Flavor::Pairing => "pairing",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn new_array_node(flavor: Flavor) -> NodeRef {
    Rc::new(RefCell::new(Series::new_array(flavor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn end_of_array_is_not_out_of_range() {
        let s = Series::new_array(Flavor::Array);
        assert!(s.is_end(0));
        assert!(s.cell_at(0).is_none());
    }

    #[test]
    fn protected_array_refuses_writes() {
        let mut s = Series::new_array(Flavor::Array);
        s.push_cell(Cell::integer(1));
        s.protect();
        assert!(s.cell_at_mut(0).is_none());
    }

    #[test]
    fn push_then_read_back() {
        let mut s = Series::new_array(Flavor::Array);
        s.push_cell(Cell::integer(10));
        s.push_cell(Cell::integer(20));
        assert_eq!(s.len(), 2);
        assert_eq!(s.cell_at(0).unwrap().heart(), crate::cell::Heart::Integer);
    }
}

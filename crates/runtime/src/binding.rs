//! Binding resolution: turn a bound word into the cell it refers to.
//!
//! A word's `extra` slot (a [`Binding`]) names how to find its value:
//! directly in a context's varlist (with a cached index), through a
//! single-cell patch (LET / module variable), relatively through an
//! action's details (needs a specifier -- the running frame -- to
//! resolve), or through a module's symbol table.

use crate::error::{ErrorTag, RaisedError, RebelError};
use rebel_core::node::downcast_ref;
use rebel_core::{Binding, Cell, Context, NodeRef, Series};

/// Resolve a bound word to its current value. `specifier` supplies the
/// running frame's varlist for `Binding::Relative` words; it is `None`
/// when resolving a word that can't legally be relative (e.g. looked up
/// outside of any action dispatch).
pub fn get_word(cell: &Cell, specifier: Option<&rebel_core::NodeRef>) -> Result<Cell, RebelError> {
    match cell.extra() {
        Binding::Unbound => Err(unbound_error(cell)),
        Binding::Context { varlist, index } => read_slot(varlist, *index as usize, cell),
        Binding::Patch(patch) => {
            let s = downcast_ref::<Series>(patch);
            s.cell_at(0).cloned().ok_or_else(|| unbound_error(cell))
        }
        Binding::Relative(_details) => {
            let varlist = specifier.ok_or_else(|| unbound_error(cell))?;
            // Relative words resolve by symbol against the active frame,
            // since the cached index belongs to the action's archetype
            // exemplar, not necessarily this specialized frame's varlist.
            let index = find_index_by_symbol(varlist, cell).ok_or_else(|| unbound_error(cell))?;
            read_slot(varlist, index, cell)
        }
        Binding::ModuleAttached(table) => {
            let index = find_index_by_symbol(table, cell).ok_or_else(|| unbound_error(cell))?;
            read_slot(table, index, cell)
        }
    }
}

fn read_slot(varlist: &rebel_core::NodeRef, index: usize, word: &Cell) -> Result<Cell, RebelError> {
    let s = downcast_ref::<Series>(varlist);
    s.cell_at(index).cloned().ok_or_else(|| unbound_error(word))
}

/// Words bound relatively or through a module carry no cached index (the
/// keylist shape can differ per specialization), so resolution walks the
/// companion keylist by symbol name. Real Ren-C caches this lookup; this
/// implementation favors clarity over micro-optimizing an interpreter
/// loop that has no JIT to protect anyway.
fn find_index_by_symbol(varlist: &NodeRef, word: &Cell) -> Option<usize> {
    let name = word.symbol()?.as_str();
    let keylist = Context::keysource_of(varlist)?;
    let k = downcast_ref::<Series>(&keylist);
    k.cells()
        .iter()
        .enumerate()
        .find(|(_, key_cell)| key_cell.symbol().map(|s| s.as_str()) == Some(name))
        .map(|(index, _)| index)
}

fn unbound_error(word: &Cell) -> RebelError {
    let name = word
        .symbol()
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| "?".to_string());
    RebelError::Abrupt(RaisedError::new(ErrorTag::Custom(format!(
        "{name} has no value"
    ))).with_near(name))
}

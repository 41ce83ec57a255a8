//! Host embedding surface: `rebValue`/`rebElide`/`rebDid`-style entry
//! points plus a thread-local last-error, grounded on the thread-local
//! `LAST_ERROR`/accessor pattern used elsewhere in this codebase for
//! surfacing a runtime error across an FFI boundary.
//!
//! The real libRebol-style API is variadic C (`rebValue("print", value,
//! "end")`); parsing a C variadic argument list is out of scope here, so
//! this module exposes the same three entry points over a pre-built
//! array handle instead -- a host embedding this crate from Rust calls
//! these directly, and a C host would build the array through a small
//! wrapper layer this crate doesn't need to provide itself.

use crate::config::Config;
use crate::error::RebelError;
use crate::trampoline::{self, Trampoline};
use rebel_core::NodeRef;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

thread_local! {
    static LAST_ERROR: RefCell<Option<RebelError>> = const { RefCell::new(None) };
    static LAST_ERROR_CSTRING: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(err: RebelError) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(err));
}

pub fn take_last_error() -> Option<RebelError> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take())
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
    LAST_ERROR_CSTRING.with(|slot| *slot.borrow_mut() = None);
}

/// Evaluate `array` to completion and return its result, or `None` with
/// the thread-local last-error set on failure. Mirrors `rebValue`.
pub fn reb_value(tramp: &mut Trampoline, array: NodeRef) -> Option<rebel_core::Cell> {
    clear_last_error();
    match tramp.eval_array(array) {
        Ok(cell) => Some(cell),
        Err(err) => {
            set_last_error(err);
            None
        }
    }
}

/// Evaluate `array` for its side effects only, discarding the result.
/// Mirrors `rebElide`.
pub fn reb_elide(tramp: &mut Trampoline, array: NodeRef) -> bool {
    reb_value(tramp, array).is_some()
}

/// Evaluate `array` and report its truthiness. Mirrors `rebDid`.
pub fn reb_did(tramp: &mut Trampoline, array: NodeRef) -> Option<bool> {
    reb_value(tramp, array).map(|cell| trampoline::is_truthy(&cell))
}

pub fn new_trampoline() -> Trampoline {
    Trampoline::new(Config::default())
}

#[unsafe(no_mangle)]
pub extern "C" fn rebel_has_error() -> i32 {
    LAST_ERROR.with(|slot| slot.borrow().is_some() as i32)
}

#[unsafe(no_mangle)]
pub extern "C" fn rebel_clear_error() {
    clear_last_error();
}

/// Borrowed, NUL-terminated error message for the current thread's last
/// error, or null if there isn't one. Valid until the next FFI call on
/// this thread.
#[unsafe(no_mangle)]
pub extern "C" fn rebel_last_error_message() -> *const c_char {
    let rendered = LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|e| e.to_string()));
    let Some(text) = rendered else {
        return std::ptr::null();
    };
    let Ok(c_string) = CString::new(text) else {
        return std::ptr::null();
    };
    LAST_ERROR_CSTRING.with(|slot| {
        *slot.borrow_mut() = Some(c_string);
        slot.borrow().as_ref().unwrap().as_ptr()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebel_core::node::downcast_mut;
    use rebel_core::series::new_array_node;
    use rebel_core::{Binding, Cell, Flavor, Heart, Series, Symbol};

    #[test]
    fn reb_value_runs_empty_array_to_void() {
        clear_last_error();
        let mut tramp = new_trampoline();
        let node = new_array_node(Flavor::Array);
        let result = reb_value(&mut tramp, node).unwrap();
        assert_eq!(result.heart(), Heart::Blank);
        assert!(result.is_isotope());
        assert_eq!(rebel_has_error(), 0);
    }

    #[test]
    fn reb_value_on_an_unbound_word_sets_and_clears_the_last_error() {
        clear_last_error();
        rebel_clear_error();
        assert_eq!(rebel_has_error(), 0);

        let mut tramp = new_trampoline();
        let node = new_array_node(Flavor::Array);
        downcast_mut::<Series>(&node).push_cell(Cell::word(Symbol::new("undefined-name"), Binding::Unbound));

        assert!(reb_value(&mut tramp, node).is_none());
        assert_eq!(rebel_has_error(), 1);
        assert!(!rebel_last_error_message().is_null());

        rebel_clear_error();
        assert_eq!(rebel_has_error(), 0);
    }
}

//! Level: an activation record for one action dispatch.
//!
//! Each level carries an output cell, a spare scratch cell, the feed it
//! reads from (if any), the frame varlist its arguments live in once
//! fulfilled, and a small state byte `Trampoline::dispatch` uses to track
//! which sub-step it's in. Unlike a deeply recursive evaluator that keeps
//! a live stack of these (one per pending call), this implementation
//! drives a single `Level` per `dispatch` call and lets Rust's own call
//! stack carry any syntactic nesting (a `(group)` inside a block
//! recursing through `eval_array`) -- see DESIGN.md for why dispatch depth
//! doesn't need its own explicit stack here.

use crate::feed::FeedRef;
use rebel_core::{Cell, NodeRef, Symbol};

/// Action dispatch sub-states, in the order `Trampoline::dispatch` moves
/// a level through them.
pub mod action_state {
    pub const INITIAL_ENTRY: u8 = 0;
    pub const FULFILLING_ARGS: u8 = 1;
    pub const DOING_PICKUPS: u8 = 2;
    pub const TYPECHECKING: u8 = 3;
    pub const DISPATCHING: u8 = 4;
}

#[derive(Debug)]
pub struct Level {
    pub id: u64,
    pub feed: Option<FeedRef>,
    pub out: Cell,
    pub spare: Cell,
    pub varlist: Option<NodeRef>,
    pub state: u8,
    pub label: Option<Symbol>,
}

impl Level {
    pub fn new(id: u64, feed: Option<FeedRef>) -> Self {
        Level {
            id,
            feed,
            out: Cell::fresh(),
            spare: Cell::fresh(),
            varlist: None,
            state: action_state::INITIAL_ENTRY,
            label: None,
        }
    }

    pub fn feed(&self) -> &FeedRef {
        self.feed.as_ref().expect("level has no feed")
    }

    /// Read argument `n` (1-based; slot 0 is the frame's archetype cell)
    /// out of this action level's frame varlist.
    pub fn arg(&self, n: usize) -> Cell {
        let varlist = self
            .varlist
            .as_ref()
            .expect("arg() called on a level with no frame varlist");
        let series = rebel_core::node::downcast_ref::<rebel_core::Series>(varlist);
        series
            .cell_at(n)
            .cloned()
            .expect("arg index out of range for this action's exemplar")
    }
}

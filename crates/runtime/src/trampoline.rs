//! The trampoline: drives levels to completion without growing the Rust
//! call stack in proportion to how many actions a running program chains
//! together.
//!
//! Every action dispatch goes through [`Trampoline::apply_action`], which
//! builds one [`Level`] per call (tracked only through the push/drop
//! counters in [`crate::diagnostics`] here, since this implementation's
//! natives all complete within a single dispatch call -- see DESIGN.md for
//! why [`Bounce::Continue`]/[`Bounce::Delegate`] are modeled but not
//! exercised). Syntactic nesting (a `(group)` inside a block) still
//! recurses through [`Trampoline::eval_array`] at the Rust level, since
//! that depth is bounded by source structure rather than by call depth.

use crate::action::Action;
use crate::bounce::Bounce;
use crate::config::Config;
use crate::diagnostics;
use crate::error::{promote_raised, ErrorTag, RaisedError, RebelError, Thrown, ThrowLabel};
use crate::feed::{Feed, FeedRef};
use crate::interrupt;
use crate::level::{action_state, Level};
use rebel_core::node::{downcast_ref, NodeRef};
use rebel_core::series::new_array_node;
use rebel_core::typeset::{HeartBitmap, ParamClass, Typeset};
use rebel_core::{Cell, CellFlags, Flavor, Heart, QuoteByte, Scalar, Series};

/// The evaluator's "no value" marker: a blank isotope. Isotopes cannot be
/// stored in an array, so this is only ever held in a Rust local or a
/// level's `out`/`spare` register, never written into a series.
pub fn void_cell() -> Cell {
    Cell::new_scalar(Heart::Blank, QuoteByte::ISOTOPE, Scalar::None)
}

pub fn is_void(cell: &Cell) -> bool {
    cell.heart() == Heart::Blank && cell.is_isotope()
}

/// Only `false` and void are falsey; everything else (including blank)
/// triggers the truthy branch -- matches the isotope-aware lattice rather
/// than classic Rebol's blank-is-falsey rule.
pub fn is_truthy(cell: &Cell) -> bool {
    if is_void(cell) {
        return false;
    }
    match cell.payload().as_scalar() {
        Some(Scalar::Logic(b)) => b,
        _ => true,
    }
}

pub struct Trampoline {
    next_id: u64,
    config: Config,
    /// Stack of enclosing user-defined-function level ids, so a bare
    /// RETURN deep inside a `do [...]` body knows which action invocation
    /// to unwind to ("definitional return").
    return_targets: Vec<u64>,
}

impl Trampoline {
    pub fn new(config: Config) -> Self {
        if config.watchdog_secs > 0 {
            interrupt::install_watchdog(std::time::Duration::from_secs(config.watchdog_secs));
        }
        Trampoline {
            next_id: 0,
            config,
            return_targets: Vec::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn push_return_target(&mut self, id: u64) {
        self.return_targets.push(id);
    }

    pub fn pop_return_target(&mut self) {
        self.return_targets.pop();
    }

    pub fn current_return_target(&self) -> Option<u64> {
        self.return_targets.last().copied()
    }

    fn push_level(&mut self) -> Result<(), RebelError> {
        if self.config.diagnostics_enabled {
            diagnostics::record_push();
            if diagnostics::level_stats().depth as usize > self.config.max_level_depth {
                return Err(RebelError::Abrupt(RaisedError::new(ErrorTag::Custom(
                    "level stack exceeded configured depth limit".into(),
                ))));
            }
        }
        Ok(())
    }

    fn drop_level(&mut self) {
        if self.config.diagnostics_enabled {
            diagnostics::record_drop();
        }
    }

    /// Evaluate every expression in `node` (an array) to completion,
    /// returning the last result. Used for `do [...]` bodies and for a
    /// bare `(group)` encountered mid-feed.
    pub fn eval_array(&mut self, node: NodeRef) -> Result<Cell, RebelError> {
        let feed = Feed::from_array(node);
        let mut last = void_cell();
        while !feed.borrow().is_end() {
            last = self.eval_expr(&feed)?;
        }
        Ok(last)
    }

    /// Evaluate exactly one full expression from `feed`, including any
    /// trailing infix chain.
    pub fn eval_expr(&mut self, feed: &FeedRef) -> Result<Cell, RebelError> {
        if interrupt::halt_requested() {
            interrupt::clear_halt();
            return Err(RebelError::Thrown(Thrown {
                label: ThrowLabel::Halt,
                value: void_cell(),
            }));
        }

        let mut left = self.eval_prefix_unit(feed)?;

        loop {
            if feed.borrow().is_end() {
                break;
            }
            let Some(peeked) = feed.borrow().current() else {
                break;
            };
            if peeked.heart() != Heart::Word {
                break;
            }
            let Ok(resolved) = crate::binding::get_word(&peeked, None) else {
                break;
            };
            let Some(action_node) = as_action_node(&resolved) else {
                break;
            };
            let is_infix = downcast_ref::<Action>(&action_node).infix;
            if !is_infix {
                break;
            }
            feed.borrow_mut().fetch_next();
            left = self.apply_action_infix(action_node, left, feed)?;
        }

        Ok(left)
    }

    /// Fetch and evaluate one prefix unit: a literal, a bound word (which
    /// may trigger a prefix action call consuming further feed items), a
    /// self-evaluating block, or a group run to completion.
    fn eval_prefix_unit(&mut self, feed: &FeedRef) -> Result<Cell, RebelError> {
        let cell = feed.borrow_mut().fetch_next().ok_or_else(|| {
            RebelError::Abrupt(RaisedError::new(ErrorTag::Custom(
                "unexpected end of input".into(),
            )))
        })?;

        if cell.quote().is_quoted() {
            return Ok(cell.unquote_one());
        }

        match cell.heart() {
            Heart::Group => {
                let node = cell
                    .payload()
                    .as_node()
                    .cloned()
                    .ok_or_else(|| RebelError::Abrupt(RaisedError::new(ErrorTag::Custom(
                        "malformed group".into(),
                    ))))?;
                self.eval_array(node)
            }
            Heart::Word => {
                let resolved = crate::binding::get_word(&cell, None)?;
                if let Some(action_node) = as_action_node(&resolved) {
                    let infix = downcast_ref::<Action>(&action_node).infix;
                    if !infix {
                        return self.apply_action(action_node, feed);
                    }
                }
                Ok(resolved)
            }
            // Blocks, paths, and every other scalar heart are self-evaluating
            // when fetched as a standalone unit.
            _ => Ok(cell),
        }
    }

    /// Dispatch a prefix action: build its frame varlist by fetching one
    /// argument per unspecialized exemplar slot, then run the dispatcher.
    /// A typecheck failure surfaces as `RebelError::Raised` and is
    /// promoted to an ordinary failure here, since nothing upstream of
    /// this call opts in to handling a raised error itself.
    pub fn apply_action(&mut self, action_node: NodeRef, feed: &FeedRef) -> Result<Cell, RebelError> {
        self.dispatch(action_node, feed, None).map_err(promote_raised)
    }

    /// Dispatch an infix action: `left` is already evaluated and becomes
    /// argument 0; the remaining arguments are fetched from `feed` as
    /// usual.
    fn apply_action_infix(
        &mut self,
        action_node: NodeRef,
        left: Cell,
        feed: &FeedRef,
    ) -> Result<Cell, RebelError> {
        self.dispatch(action_node, feed, Some(left)).map_err(promote_raised)
    }

    fn dispatch(
        &mut self,
        action_node: NodeRef,
        feed: &FeedRef,
        infix_left: Option<Cell>,
    ) -> Result<Cell, RebelError> {
        self.push_level()?;

        let (proto_cells, dispatcher, label) = {
            let action = downcast_ref::<Action>(&action_node);
            let varlist = downcast_ref::<Series>(&action.exemplar.varlist);
            (varlist.cells().to_vec(), action.dispatcher.clone(), action.label.clone())
        };

        let mut level = Level::new(self.next_id(), Some(feed.clone()));
        level.label = label;
        level.state = action_state::FULFILLING_ARGS;

        let mut infix_left = infix_left;
        let mut fulfilled = Vec::with_capacity(proto_cells.len());
        for (i, proto) in proto_cells.iter().enumerate() {
            if i == 0 {
                fulfilled.push(proto.clone());
                continue;
            }
            if proto.flags().contains(CellFlags::HIDDEN) {
                fulfilled.push(proto.clone());
                continue;
            }
            if let Some(left) = infix_left.take() {
                fulfilled.push(left);
                continue;
            }
            // A NORMAL parameter evaluates a full expression, including
            // any trailing infix chain (e.g. `add 1 + 2 3`). Any other
            // class fetches exactly one unit and stops -- most importantly
            // this is what keeps a branch-shaped argument (an IF's taken
            // block) from swallowing a following infix word like ELSE,
            // which must instead bind to the whole call's result.
            let class = proto.typeset().map(|t| t.class).unwrap_or(ParamClass::Normal);
            let val = match class {
                ParamClass::Normal => self.eval_expr(feed)?,
                _ => self.eval_prefix_unit(feed)?,
            };
            fulfilled.push(storable(val));
        }

        let frame_varlist = new_array_node(Flavor::Varlist);
        {
            let mut fv = rebel_core::node::downcast_mut::<Series>(&frame_varlist);
            for cell in &fulfilled {
                fv.push_cell(cell.clone());
            }
        }
        level.varlist = Some(frame_varlist);

        level.state = action_state::TYPECHECKING;
        for (i, proto) in proto_cells.iter().enumerate() {
            if i == 0 || proto.flags().contains(CellFlags::HIDDEN) {
                continue;
            }
            let Some(typeset) = proto.typeset() else {
                continue;
            };
            if let Err(tag) = typecheck_argument(typeset, &fulfilled[i]) {
                self.drop_level();
                return Err(RebelError::Raised(
                    RaisedError::new(tag).with_near(format!("argument {i} of {}", dispatcher.name())),
                ));
            }
        }

        level.state = action_state::DISPATCHING;
        let bounce = dispatcher.dispatch(self, &mut level)?;
        self.drop_level();
        self.resolve_bounce(bounce)
    }

    fn resolve_bounce(&self, bounce: Bounce) -> Result<Cell, RebelError> {
        match bounce {
            Bounce::Value(c) => Ok(c),
            Bounce::Void => Ok(void_cell()),
            Bounce::Thrown(t) => Err(RebelError::Thrown(t)),
            Bounce::Continue | Bounce::Delegate | Bounce::Redo { .. } | Bounce::Suspend => {
                Err(RebelError::Abrupt(RaisedError::new(ErrorTag::Custom(
                    "dispatcher returned a multi-step bounce this trampoline does not drive"
                        .into(),
                ))))
            }
        }
    }
}

/// An argument slot can't hold an isotope; a void result captured as an
/// argument value decays to a plain blank rather than violating that.
fn storable(cell: Cell) -> Cell {
    if is_void(&cell) {
        Cell::blank()
    } else {
        cell
    }
}

fn as_action_node(cell: &Cell) -> Option<NodeRef> {
    if cell.heart() != Heart::Action {
        return None;
    }
    cell.payload().as_node().cloned()
}

/// Check one fulfilled argument against its declared typeset.
///
/// `Refinement` and `Return` parameters get a narrower rule when their
/// typeset is empty: an empty bitmap isn't "accept nothing" there, it
/// means "this is the unset/no-return-value case", which only blank
/// satisfies. Every other empty-typeset parameter genuinely does accept
/// nothing, matching [`Typeset::accepts_heart`]'s own contract.
fn typecheck_argument(typeset: &Typeset, value: &Cell) -> Result<(), ErrorTag> {
    let declares_no_hearts = typeset.hearts == HeartBitmap::empty();
    match typeset.class {
        ParamClass::Refinement if declares_no_hearts => {
            if value.heart() == Heart::Blank {
                Ok(())
            } else {
                Err(ErrorTag::Custom(
                    "refinement declared with an empty typeset only accepts blank".into(),
                ))
            }
        }
        ParamClass::Return if declares_no_hearts => {
            if value.heart() == Heart::Blank {
                Ok(())
            } else {
                Err(ErrorTag::BadReturnType)
            }
        }
        ParamClass::None | ParamClass::Local | ParamClass::Output => Ok(()),
        _ if typeset.accepts_heart(value.heart()) => Ok(()),
        _ => Err(ErrorTag::Custom(format!(
            "{:?} does not satisfy the declared typeset",
            value.heart()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{action_cell, Dispatcher};
    use crate::feed::Feed;
    use rebel_core::{Context, Symbol};

    fn typeset_action(class: ParamClass, hearts: HeartBitmap) -> Cell {
        struct AlwaysVoid;
        impl Dispatcher for AlwaysVoid {
            fn dispatch(&self, _tramp: &mut Trampoline, _level: &mut Level) -> Result<Bounce, RebelError> {
                Ok(Bounce::Void)
            }
            fn name(&self) -> &'static str {
                "always-void"
            }
        }

        let archetype = Cell::new_scalar(Heart::Frame, QuoteByte::PLAIN, Scalar::None);
        let keys = vec![Symbol::new("value")];
        let values = vec![Cell::typeset_cell(Typeset::new(class, hearts))];
        let exemplar =
            Context::new(archetype, keys.clone(), values).expect("single-param exemplar is always valid");
        let action = Action::new(std::rc::Rc::new(AlwaysVoid), exemplar, keys);
        action_cell(action, QuoteByte::PLAIN)
    }

    fn dispatch_one(action: Cell, arg_source: &str) -> Result<Cell, RebelError> {
        let mut tramp = Trampoline::new(Config::default());
        let action_node = as_action_node(&action).expect("test action is always Heart::Action");
        let node = new_array_node(Flavor::Array);
        {
            let mut s = rebel_core::node::downcast_mut::<Series>(&node);
            if arg_source == "blank" {
                s.push_cell(Cell::blank());
            } else {
                s.push_cell(Cell::integer(1));
            }
        }
        let feed = Feed::from_array(node);
        tramp.apply_action(action_node, &feed)
    }

    #[test]
    fn empty_typeset_refinement_rejects_a_non_blank_argument() {
        let action = typeset_action(ParamClass::Refinement, HeartBitmap::empty());
        let err = dispatch_one(action, "integer").unwrap_err();
        assert!(matches!(err, RebelError::Abrupt(_)));
    }

    #[test]
    fn empty_typeset_refinement_accepts_blank() {
        let action = typeset_action(ParamClass::Refinement, HeartBitmap::empty());
        assert!(dispatch_one(action, "blank").is_ok());
    }

    #[test]
    fn empty_typeset_return_rejects_a_non_blank_argument_with_bad_return_type() {
        let action = typeset_action(ParamClass::Return, HeartBitmap::empty());
        match dispatch_one(action, "integer").unwrap_err() {
            RebelError::Abrupt(e) => assert_eq!(e.tag, ErrorTag::BadReturnType),
            other => panic!("expected an abrupt Error_Bad_Return_Type, got {other:?}"),
        }
    }

    #[test]
    fn a_normal_parameter_restricted_to_logic_rejects_an_integer() {
        let action = typeset_action(ParamClass::Normal, HeartBitmap::empty().with(Heart::Logic));
        assert!(dispatch_one(action, "integer").is_err());
    }
}

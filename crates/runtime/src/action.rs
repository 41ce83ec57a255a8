//! Action: a callable value.
//!
//! An action owns a dispatcher (native Rust code or a body block to run),
//! an exemplar context describing its parameters (unspecialized slots hold
//! a typeset cell; specialized slots are flagged `HIDDEN` and hold the
//! frozen argument), and an optional label used in error "where" fields.
//! A dispatcher function pointer would naturally live in the details
//! array's link/bonus side-band slots alongside the exemplar, but a
//! `dyn Fn` can't ride in a `SideBandSlot` the way a node pointer can, so
//! this implementation keeps them as direct fields of `Action` instead
//! (see DESIGN.md).

use crate::bounce::Bounce;
use crate::error::RebelError;
use crate::level::Level;
use crate::trampoline::Trampoline;
use rebel_core::node::{Node, NodeRef};
use rebel_core::typeset::{HeartBitmap, ParamClass, Typeset};
use rebel_core::{Cell, Context, Heart, QuoteByte, Symbol};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

pub trait Dispatcher {
    fn dispatch(&self, tramp: &mut Trampoline, level: &mut Level) -> Result<Bounce, RebelError>;

    /// Name used in diagnostics; natives override this with something more
    /// specific than the default.
    fn name(&self) -> &'static str {
        "anonymous"
    }
}

/// A dispatcher whose body is an ordinary block: running it pushes this
/// level's id as the current RETURN target so a bare `return` inside the
/// body unwinds exactly here ("definitional return").
pub struct UserBodyDispatcher {
    pub body: NodeRef,
}

impl Dispatcher for UserBodyDispatcher {
    fn dispatch(&self, tramp: &mut Trampoline, level: &mut Level) -> Result<Bounce, RebelError> {
        tramp.push_return_target(level.id);
        let result = tramp.eval_array(self.body.clone());
        tramp.pop_return_target();
        match result {
            Ok(value) => Ok(Bounce::Value(value)),
            Err(RebelError::Thrown(crate::error::Thrown {
                label: crate::error::ThrowLabel::Return(id),
                value,
            })) if id == level.id => Ok(Bounce::Value(value)),
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &'static str {
        "user-function"
    }
}

impl fmt::Debug for dyn Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispatcher({})", self.name())
    }
}

/// A dispatcher built from a plain Rust closure (a "native").
pub struct NativeDispatcher<F> {
    pub label: &'static str,
    pub func: F,
}

impl<F> Dispatcher for NativeDispatcher<F>
where
    F: Fn(&mut Trampoline, &mut Level) -> Result<Bounce, RebelError>,
{
    fn dispatch(&self, tramp: &mut Trampoline, level: &mut Level) -> Result<Bounce, RebelError> {
        (self.func)(tramp, level)
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

#[derive(Debug)]
pub struct Action {
    pub dispatcher: Rc<dyn Dispatcher>,
    pub exemplar: Context,
    pub param_order: Vec<Symbol>,
    pub label: Option<Symbol>,
    /// Enfix ("infix") binding: when set, the evaluator treats a preceding
    /// already-evaluated value as this action's first argument instead of
    /// fetching it from the feed (e.g. `1 + 2`).
    pub infix: bool,
}

impl Action {
    pub fn new(dispatcher: Rc<dyn Dispatcher>, exemplar: Context, param_order: Vec<Symbol>) -> Self {
        Action {
            dispatcher,
            exemplar,
            param_order,
            label: None,
            infix: false,
        }
    }

    pub fn labeled(mut self, label: Symbol) -> Self {
        self.label = Some(label);
        self
    }

    pub fn enfix(mut self) -> Self {
        self.infix = true;
        self
    }

    pub fn param_count(&self) -> usize {
        self.param_order.len()
    }
}

impl Node for Action {
    fn node_kind(&self) -> &'static str {
        "action"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Build an unspecialized exemplar from a flat `(name, class)` parameter
/// list -- the shape every native in [`crate::builtins`] uses.
pub fn make_exemplar(params: &[(&str, ParamClass)]) -> (Context, Vec<Symbol>) {
    let archetype = Cell::new_scalar(Heart::Frame, QuoteByte::PLAIN, rebel_core::Scalar::None);
    let keys: Vec<Symbol> = params.iter().map(|(name, _)| Symbol::new(*name)).collect();
    let values: Vec<Cell> = params
        .iter()
        .map(|(_, class)| Cell::typeset_cell(Typeset::new(*class, HeartBitmap::all())))
        .collect();
    let exemplar = Context::new(archetype, keys.clone(), values)
        .expect("parallel name/class slices always build a valid context");
    (exemplar, keys)
}

pub fn action_cell(action: Action, quote: rebel_core::QuoteByte) -> Cell {
    let node: NodeRef = Rc::new(std::cell::RefCell::new(action));
    Cell::new_node(rebel_core::Heart::Action, quote, node)
}

//! The native dispatcher set this evaluator ships with: enough control
//! flow, arithmetic, and non-local exits to run the scenarios in
//! DESIGN.md's testable-properties section end to end.

use crate::action::{action_cell, make_exemplar, Action, Dispatcher, NativeDispatcher};
use crate::bounce::Bounce;
use crate::error::{ErrorTag, RaisedError, RebelError, ThrowLabel, Thrown};
use crate::level::Level;
use crate::trampoline::{self, Trampoline};
use rebel_core::node::downcast_ref;
use rebel_core::series::new_array_node;
use rebel_core::typeset::ParamClass;
use rebel_core::{Cell, Context, Flavor, Heart, QuoteByte, Scalar, Series, Symbol};
use std::rc::Rc;

fn native<F>(label: &'static str, params: &[(&str, ParamClass)], infix: bool, func: F) -> Cell
where
    F: Fn(&mut Trampoline, &mut Level) -> Result<Bounce, RebelError> + 'static,
{
    let (exemplar, param_order) = make_exemplar(params);
    let dispatcher: Rc<dyn Dispatcher> = Rc::new(NativeDispatcher { label, func });
    let mut action = Action::new(dispatcher, exemplar, param_order).labeled(Symbol::new(label));
    if infix {
        action = action.enfix();
    }
    action_cell(action, QuoteByte::PLAIN)
}

fn branch_array(cell: &Cell) -> Result<rebel_core::NodeRef, RebelError> {
    cell.payload().as_node().cloned().ok_or_else(|| {
        RebelError::Abrupt(RaisedError::new(ErrorTag::BadBranchType))
    })
}

fn run_branch(tramp: &mut Trampoline, branch: &Cell) -> Result<Cell, RebelError> {
    match branch.heart() {
        Heart::Block | Heart::Group => tramp.eval_array(branch_array(branch)?),
        _ => Ok(branch.clone()),
    }
}

fn as_int(cell: &Cell) -> Result<i64, RebelError> {
    match cell.payload().as_scalar() {
        Some(Scalar::Integer(n)) => Ok(n),
        _ => Err(RebelError::Abrupt(RaisedError::new(ErrorTag::Custom(
            "expected an integer! argument".into(),
        )))),
    }
}

/// Build the global environment these natives live in: a context whose
/// varlist holds one action cell per native, bindable by name.
pub fn global_environment() -> Context {
    let natives: Vec<(&str, Cell)> = vec![
        ("if", native_if()),
        ("else", native_else()),
        ("all", native_all()),
        ("reduce", native_reduce()),
        ("elide", native_elide()),
        ("comment", native_comment()),
        ("do", native_do()),
        ("return", native_return()),
        ("catch", native_catch()),
        ("throw", native_throw()),
        ("+", native_add()),
        ("*", native_multiply()),
        ("print", native_print()),
    ];

    let archetype = Cell::new_scalar(Heart::Frame, QuoteByte::PLAIN, Scalar::None);
    let keys: Vec<Symbol> = natives.iter().map(|(name, _)| Symbol::new(*name)).collect();
    let values: Vec<Cell> = natives.into_iter().map(|(_, cell)| cell).collect();
    Context::new(archetype, keys, values).expect("builtin table is never mismatched")
}

/// A bound word referring to `name` in `env` -- the lookup a host's word
/// scanner would normally do at bind time.
pub fn bound_word(env: &Context, name: &str) -> Cell {
    let keylist = env.keylist.clone();
    let k = downcast_ref::<Series>(&keylist);
    let index = k
        .cells()
        .iter()
        .position(|c| c.symbol().map(|s| s.as_str()) == Some(name))
        .expect("unknown builtin name");
    Cell::word(
        Symbol::new(name),
        rebel_core::Binding::Context {
            varlist: env.varlist.clone(),
            index: index as u32,
        },
    )
}

fn native_if() -> Cell {
    native(
        "if",
        &[("condition", ParamClass::Normal), ("branch", ParamClass::SoftQuoted)],
        false,
        |tramp, level| {
            let cond = level.arg(1);
            if trampoline::is_truthy(&cond) {
                Ok(Bounce::Value(run_branch(tramp, &level.arg(2))?))
            } else {
                Ok(Bounce::Void)
            }
        },
    )
}

fn native_else() -> Cell {
    native(
        "else",
        &[("left", ParamClass::Normal), ("branch", ParamClass::SoftQuoted)],
        true,
        |tramp, level| {
            let left = level.arg(1);
            if trampoline::is_void(&left) {
                Ok(Bounce::Value(run_branch(tramp, &level.arg(2))?))
            } else {
                Ok(Bounce::Value(left))
            }
        },
    )
}

fn native_all() -> Cell {
    native(
        "all",
        &[("body", ParamClass::SoftQuoted)],
        false,
        |tramp, level| {
            let node = branch_array(&level.arg(1))?;
            let feed = crate::feed::Feed::from_array(node);
            let mut result = trampoline::void_cell();
            while !feed.borrow().is_end() {
                let val = tramp.eval_expr(&feed)?;
                if trampoline::is_void(&val) {
                    continue;
                }
                if !trampoline::is_truthy(&val) {
                    return Ok(Bounce::Value(val));
                }
                result = val;
            }
            if trampoline::is_void(&result) {
                Ok(Bounce::Void)
            } else {
                Ok(Bounce::Value(result))
            }
        },
    )
}

fn native_reduce() -> Cell {
    native(
        "reduce",
        &[("body", ParamClass::SoftQuoted)],
        false,
        |tramp, level| {
            let node = branch_array(&level.arg(1))?;
            let feed = crate::feed::Feed::from_array(node);
            let out_node = new_array_node(Flavor::Array);
            while !feed.borrow().is_end() {
                let val = tramp.eval_expr(&feed)?;
                if trampoline::is_void(&val) {
                    continue;
                }
                rebel_core::node::downcast_mut::<Series>(&out_node).push_cell(val);
            }
            Ok(Bounce::Value(Cell::new_node(Heart::Block, QuoteByte::PLAIN, out_node)))
        },
    )
}

fn native_elide() -> Cell {
    native("elide", &[("discarded", ParamClass::SoftQuoted)], false, |_tramp, _level| {
        Ok(Bounce::Void)
    })
}

fn native_comment() -> Cell {
    native("comment", &[("discarded", ParamClass::SoftQuoted)], false, |_tramp, _level| {
        Ok(Bounce::Void)
    })
}

fn native_do() -> Cell {
    native("do", &[("source", ParamClass::SoftQuoted)], false, |tramp, level| {
        let source = level.arg(1);
        match source.heart() {
            Heart::Block | Heart::Group => Ok(Bounce::Value(tramp.eval_array(branch_array(&source)?)?)),
            _ => Ok(Bounce::Value(source)),
        }
    })
}

fn native_return() -> Cell {
    native("return", &[("value", ParamClass::Normal)], false, |tramp, level| {
        let value = level.arg(1);
        let target = tramp.current_return_target().ok_or_else(|| {
            RebelError::Abrupt(RaisedError::new(ErrorTag::Custom(
                "RETURN used outside of a function body".into(),
            )))
        })?;
        Err(RebelError::Thrown(Thrown {
            label: ThrowLabel::Return(target),
            value,
        }))
    })
}

fn native_catch() -> Cell {
    native("catch", &[("body", ParamClass::SoftQuoted)], false, |tramp, level| {
        let node = branch_array(&level.arg(1))?;
        match tramp.eval_array(node) {
            Ok(val) => Ok(Bounce::Value(val)),
            Err(RebelError::Thrown(Thrown {
                label: ThrowLabel::Named(_),
                value,
            })) => Ok(Bounce::Value(value)),
            Err(e) => Err(e),
        }
    })
}

fn native_throw() -> Cell {
    native(
        "throw",
        &[("label", ParamClass::Normal), ("value", ParamClass::Normal)],
        false,
        |_tramp, level| {
            let label = level.arg(1);
            let value = level.arg(2);
            let name = label
                .symbol()
                .cloned()
                .unwrap_or_else(|| Symbol::new("throw"));
            Err(RebelError::Thrown(Thrown {
                label: ThrowLabel::Named(name),
                value,
            }))
        },
    )
}

fn native_add() -> Cell {
    native(
        "+",
        &[("a", ParamClass::Normal), ("b", ParamClass::Normal)],
        true,
        |_tramp, level| {
            let a = as_int(&level.arg(1))?;
            let b = as_int(&level.arg(2))?;
            Ok(Bounce::Value(Cell::integer(a + b)))
        },
    )
}

fn native_multiply() -> Cell {
    native(
        "*",
        &[("a", ParamClass::Normal), ("b", ParamClass::Normal)],
        true,
        |_tramp, level| {
            let a = as_int(&level.arg(1))?;
            let b = as_int(&level.arg(2))?;
            Ok(Bounce::Value(Cell::integer(a * b)))
        },
    )
}

fn native_print() -> Cell {
    native("print", &[("value", ParamClass::Normal)], false, |_tramp, level| {
        let value = level.arg(1);
        tracing::info!(?value, "print");
        Ok(Bounce::Void)
    })
}

/// Build a user-defined function whose body is a block, bound so a bare
/// `return` inside it unwinds to this specific invocation ("definitional
/// return").
pub fn user_function(body: rebel_core::NodeRef, params: &[&str]) -> Cell {
    let param_specs: Vec<(&str, ParamClass)> =
        params.iter().map(|name| (*name, ParamClass::Normal)).collect();
    let (exemplar, param_order) = make_exemplar(&param_specs);
    let dispatcher: Rc<dyn Dispatcher> = Rc::new(crate::action::UserBodyDispatcher { body });
    let action = Action::new(dispatcher, exemplar, param_order);
    action_cell(action, QuoteByte::PLAIN)
}

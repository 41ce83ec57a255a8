//! End-to-end evaluator scenarios, built by hand (no lexer in scope) out
//! of [`rebel_runtime::builtins::global_environment`] plus raw cell
//! construction, then driven through a [`rebel_runtime::Trampoline`].

use rebel_core::node::downcast_mut;
use rebel_core::series::new_array_node;
use rebel_core::{Cell, Context, Flavor, Heart, QuoteByte, Series};
use rebel_runtime::builtins::{bound_word, global_environment, user_function};
use rebel_runtime::config::Config;
use rebel_runtime::error::{RebelError, ThrowLabel, Thrown};
use rebel_runtime::trampoline::is_void;
use rebel_runtime::Trampoline;

fn block(cells: Vec<Cell>) -> Cell {
    let node = new_array_node(Flavor::Array);
    {
        let mut s = downcast_mut::<Series>(&node);
        for cell in cells {
            s.push_cell(cell);
        }
    }
    Cell::new_node(Heart::Block, QuoteByte::PLAIN, node)
}

fn program(cells: Vec<Cell>) -> rebel_core::NodeRef {
    let node = new_array_node(Flavor::Array);
    {
        let mut s = downcast_mut::<Series>(&node);
        for cell in cells {
            s.push_cell(cell);
        }
    }
    node
}

fn as_int(cell: &Cell) -> i64 {
    match cell.payload().as_scalar() {
        Some(rebel_core::Scalar::Integer(n)) => n,
        other => panic!("expected an integer!, got {other:?}"),
    }
}

fn tramp() -> Trampoline {
    Trampoline::new(Config::default())
}

#[test]
fn if_true_runs_its_branch() {
    let env = global_environment();
    let mut t = tramp();
    let prog = program(vec![
        bound_word(&env, "if"),
        Cell::logic(true),
        block(vec![Cell::integer(10)]),
    ]);
    let result = t.eval_array(prog).unwrap();
    assert_eq!(as_int(&result), 10);
}

#[test]
fn if_false_falls_through_to_else() {
    let env = global_environment();
    let mut t = tramp();
    let prog = program(vec![
        bound_word(&env, "if"),
        Cell::logic(false),
        block(vec![Cell::integer(10)]),
        bound_word(&env, "else"),
        block(vec![Cell::integer(20)]),
    ]);
    let result = t.eval_array(prog).unwrap();
    assert_eq!(as_int(&result), 20);
}

#[test]
fn if_false_with_no_else_is_void() {
    let env = global_environment();
    let mut t = tramp();
    let prog = program(vec![
        bound_word(&env, "if"),
        Cell::logic(false),
        block(vec![Cell::integer(10)]),
    ]);
    let result = t.eval_array(prog).unwrap();
    assert!(is_void(&result));
}

#[test]
fn reduce_collects_expression_results_and_elide_discards() {
    let env = global_environment();
    let mut t = tramp();
    // reduce [1 + 2 elide print 99 3 * 4]  ->  [3 12]
    let prog = program(vec![
        bound_word(&env, "reduce"),
        block(vec![
            Cell::integer(1),
            bound_word(&env, "+"),
            Cell::integer(2),
            bound_word(&env, "elide"),
            bound_word(&env, "print"),
            Cell::integer(99),
            Cell::integer(3),
            bound_word(&env, "*"),
            Cell::integer(4),
        ]),
    ]);
    let result = t.eval_array(prog).unwrap();
    let node = result.payload().as_node().cloned().unwrap();
    let series = rebel_core::node::downcast_ref::<Series>(&node);
    let values: Vec<i64> = series.cells().iter().map(as_int).collect();
    assert_eq!(values, vec![3, 12]);
}

#[test]
fn all_short_circuits_on_first_falsey_and_comment_is_invisible() {
    let env = global_environment();
    let mut t = tramp();
    // all [1 2 (comment "skipped") 3] -> 3
    let prog = program(vec![
        bound_word(&env, "all"),
        block(vec![
            Cell::integer(1),
            Cell::integer(2),
            Cell::new_node(
                Heart::Group,
                QuoteByte::PLAIN,
                program(vec![
                    bound_word(&env, "comment"),
                    block(vec![Cell::integer(0)]),
                ]),
            ),
            Cell::integer(3),
        ]),
    ]);
    let result = t.eval_array(prog).unwrap();
    assert_eq!(as_int(&result), 3);
}

#[test]
fn all_short_circuits_on_false() {
    let env = global_environment();
    let mut t = tramp();
    let prog = program(vec![
        bound_word(&env, "all"),
        block(vec![Cell::integer(1), Cell::logic(false), Cell::integer(3)]),
    ]);
    let result = t.eval_array(prog).unwrap();
    assert!(!rebel_runtime::trampoline::is_truthy(&result));
}

#[test]
fn definitional_return_unwinds_through_an_intervening_do() {
    let env = global_environment();
    let mut t = tramp();

    // f: does [do [return 7] 999]
    let body = program(vec![
        bound_word(&env, "do"),
        block(vec![bound_word(&env, "return"), Cell::integer(7)]),
        Cell::integer(999),
    ]);
    let f = user_function(body, &[]);

    // Bind `f` directly by building a one-entry context rather than
    // threading SET-WORD evaluation (out of scope here).
    let archetype = Cell::new_scalar(Heart::Frame, QuoteByte::PLAIN, rebel_core::Scalar::None);
    let f_env = Context::new(archetype, vec![rebel_core::Symbol::new("f")], vec![f]).unwrap();
    let f_word = Cell::word(
        rebel_core::Symbol::new("f"),
        rebel_core::Binding::Context {
            varlist: f_env.varlist.clone(),
            index: 0,
        },
    );

    let prog = program(vec![f_word]);
    let result = t.eval_array(prog).unwrap();
    assert_eq!(as_int(&result), 7);
}

#[test]
fn catch_recovers_a_named_throw() {
    let env = global_environment();
    let mut t = tramp();
    // catch [throw 'foo 42] -> 42
    let foo = Cell::word(rebel_core::Symbol::new("foo"), rebel_core::Binding::Unbound).quote_once();
    let prog = program(vec![
        bound_word(&env, "catch"),
        block(vec![bound_word(&env, "throw"), foo, Cell::integer(42)]),
    ]);
    let result = t.eval_array(prog).unwrap();
    assert_eq!(as_int(&result), 42);
}

#[test]
fn an_uncaught_throw_propagates_as_an_error() {
    let env = global_environment();
    let mut t = tramp();
    let foo = Cell::word(rebel_core::Symbol::new("foo"), rebel_core::Binding::Unbound).quote_once();
    let prog = program(vec![bound_word(&env, "throw"), foo, Cell::integer(42)]);
    match t.eval_array(prog) {
        Err(RebelError::Thrown(Thrown {
            label: ThrowLabel::Named(name),
            value,
        })) => {
            assert_eq!(name.as_str(), "foo");
            assert_eq!(as_int(&value), 42);
        }
        other => panic!("expected an uncaught named throw, got {other:?}"),
    }
}

#[test]
fn elide_always_discards_even_a_non_void_branch_result() {
    let env = global_environment();
    let mut t = tramp();
    let prog = program(vec![bound_word(&env, "elide"), block(vec![Cell::integer(5)])]);
    let result = t.eval_array(prog).unwrap();
    assert!(is_void(&result));
}

#[test]
fn infix_plus_chains_with_prefix_calls() {
    let env = global_environment();
    let mut t = tramp();
    // add-like infix chaining: 1 + 2 + 3 -> 6
    let prog = program(vec![
        Cell::integer(1),
        bound_word(&env, "+"),
        Cell::integer(2),
        bound_word(&env, "+"),
        Cell::integer(3),
    ]);
    let result = t.eval_array(prog).unwrap();
    assert_eq!(as_int(&result), 6);
}

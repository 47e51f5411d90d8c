//! Semántica de las estructuras de control, ejecutadas sobre la máquina simulada.

mod common;

use common::{run, translate, Fault};
use ds_compiler::CompileError;

// ============================================================================
// Condicionales
// ============================================================================

#[test]
fn if_without_else() {
    let state = run(&["x=5", "y=0", "i x>3 y=1 e"]);
    assert_eq!(state.var("Y"), 1);

    let state = run(&["x=2", "y=0", "i x>3 y=1 e"]);
    assert_eq!(state.var("Y"), 0);
}

#[test]
fn if_else_takes_one_branch() {
    for (x, expected) in [(1, 10), (7, 20)] {
        let assign = format!("x={}", x);
        let state = run(&[assign.as_str(), "i x<5 y=10 l y=20 e"]);
        assert_eq!(state.var("Y"), expected, "x = {}", x);
    }
}

#[test]
fn relations() {
    let state = run(&["a=3=3", "b=3#3", "c=2<3", "d=2>3", "e=(1+1)=2"]);
    assert_eq!(state.var("A"), 1);
    assert_eq!(state.var("B"), 0);
    assert_eq!(state.var("C"), 1);
    assert_eq!(state.var("D"), 0);
    assert_eq!(state.var("E"), 1);
    assert!(state.stack.is_empty());
}

#[test]
fn xor_and_precedence() {
    assert_eq!(run(&["t~t"]).acc(), 0);
    assert_eq!(run(&["t~f"]).acc(), 1);
    assert_eq!(run(&["f|t&f"]).acc(), 0);
    assert_eq!(run(&["!f&f"]).acc(), 0);
    assert_eq!(run(&["1<2&2<3"]).acc(), 1);
}

// ============================================================================
// Ciclos
// ============================================================================

#[test]
fn while_counts_down() {
    let state = run(&["i=0", "w i<4 i=i+1 e"]);
    assert_eq!(state.var("I"), 4);
}

#[test]
fn while_may_not_run() {
    let state = run(&["n=0", "w f n=1 e"]);
    assert_eq!(state.var("N"), 0);
}

#[test]
fn loop_exits_through_break() {
    let state = run(&["n=0", "p n=n+1 i n=10 b e e"]);
    assert_eq!(state.var("N"), 10);
    assert!(state.stack.is_empty());
}

#[test]
fn repeat_runs_at_least_once() {
    let state = run(&["n=100", "r n=n+1 u t"]);
    assert_eq!(state.var("N"), 101);

    let state = run(&["n=0", "r n=n+2 u n>5"]);
    assert_eq!(state.var("N"), 6);
}

#[test]
fn for_is_inclusive() {
    let state = run(&["s=0", "f k=1 4 s=s+k e"]);
    assert_eq!(state.var("S"), 10);
    assert_eq!(state.var("K"), 5);
    assert!(state.stack.is_empty());
}

#[test]
fn for_with_empty_range() {
    let state = run(&["s=0", "f k=5 1 s=s+1 e"]);
    assert_eq!(state.var("S"), 0);
    assert!(state.stack.is_empty());
}

#[test]
fn do_repeats_count_times() {
    let state = run(&["n=0", "d 3 n=n+1 e"]);
    assert_eq!(state.var("N"), 3);
    assert!(state.stack.is_empty());
}

#[test]
fn do_with_non_positive_count() {
    for count in ["0", "-2"] {
        let line = format!("d {} n=n+1 e", count);
        let state = run(&["n=0", line.as_str()]);
        assert_eq!(state.var("N"), 0, "count {}", count);
        assert!(state.stack.is_empty());
    }
}

#[test]
fn break_leaves_stack_clean() {
    let state = run(&["n=0", "d 5 n=n+1 i n=2 b e e"]);
    assert_eq!(state.var("N"), 2);
    assert!(state.stack.is_empty());

    let state = run(&["f k=1 10 i k=3 b e e"]);
    assert_eq!(state.var("K"), 3);
    assert!(state.stack.is_empty());
}

#[test]
fn break_exits_innermost_loop() {
    let state = run(&["outer=0", "inner=0", "f k=1 3 outer=outer+1 p inner=inner+1 b e e"]);
    assert_eq!(state.var("OUTER"), 3);
    assert_eq!(state.var("INNER"), 3);
    assert!(state.stack.is_empty());
}

#[test]
fn keyword_letters_as_variables() {
    let state = run(&["i = 1", "e\t= i + 1", "w = 0", "w w<e w = w + i e"]);
    assert_eq!(state.var("I"), 1);
    assert_eq!(state.var("E"), 2);
    assert_eq!(state.var("W"), 2);
}

#[test]
fn keywords_ignore_case() {
    let state = run(&["N=0", "W n<2 n=N+1 E"]);
    assert_eq!(state.var("N"), 2);
}

// ============================================================================
// Errores y fallas
// ============================================================================

#[test]
fn break_outside_loop_is_rejected() {
    let error = translate(&["x=1", "i t b e"]).unwrap_err();
    assert!(matches!(error.val(), CompileError::NoLoop));
    assert_eq!(error.location().start().line(), 2);
}

#[test]
fn unassigned_variables_fault_at_run_time() {
    let machine = translate(&["x=y+1"]).unwrap();
    assert_eq!(machine.run().unwrap_err(), Fault::UnknownVariable("Y".into()));
}

#[test]
fn calls_return_zero() {
    let machine = translate(&["x=foo()+1", "y=foo()"]).unwrap();
    assert_eq!(machine.stubs, ["FOO"]);

    let state = machine.run().unwrap();
    assert_eq!(state.var("X"), 1);
    assert_eq!(state.var("Y"), 0);
}

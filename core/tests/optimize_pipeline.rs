mod common;

use common::{count_applies_of, eval, is_dead_edge, Rt};
use graphopt_core::ir::{AbstractValue, FunctionBuilder, GraphId, Manager, NodeId, Primitive, Value};
use graphopt_core::{optimize, optimize_graph, OptConfig, PassKind, Resources};

fn i64t() -> Option<AbstractValue> {
    Some(AbstractValue::i64())
}

/// pair(x) = (x + x, x + x); main(x) = pair(x)[0] * 2
fn build(mng: &mut Manager) -> (GraphId, NodeId) {
    let mut b = FunctionBuilder::new(mng, "pair");
    let x = b.param("x", i64t());
    let s1 = b.call_prim(Primitive::Add, &[x, x], i64t());
    let s2 = b.call_prim(Primitive::Add, &[x, x], i64t());
    let t = b.tuple(&[s1, s2]);
    let pair = b.output(t).unwrap();

    let mut b = FunctionBuilder::new(mng, "main");
    let x = b.param("x", i64t());
    let pt = b.abs_of(t);
    let r = b.call_graph(pair, &[x], pt);
    let r0 = b.getitem(r, 0);
    let two = b.constant(Value::Int(2));
    let out = b.call_prim(Primitive::Mul, &[r0, two], i64t());
    (b.output(out).unwrap(), t)
}

#[test]
fn default_pipeline_converges_and_preserves_results() {
    let mut mng = Manager::new();
    let (main, _) = build(&mut mng);
    mng.add_graph(main);
    let before = eval(&mng, main, vec![Rt::Int(5)]);

    let (mng, report) = optimize_graph(mng, main, OptConfig::default()).unwrap();

    assert!(report.converged);
    assert!(report.iterations() >= 2);
    assert_eq!(report.rounds[0][0], ("cse", true));
    assert_eq!(report.rounds[0][1], ("dde", false), "dde reports no change by default");
    assert_eq!(eval(&mng, main, vec![Rt::Int(5)]), before);
    assert_eq!(before, Rt::Int(20));
}

#[test]
fn cse_runs_before_dde_on_shared_tuple_elements() {
    let mut mng = Manager::new();
    let (main, t) = build(&mut mng);
    let pair = mng.node(t).graph.unwrap();

    let mut res = Resources::new(mng, OptConfig::default());
    optimize(&mut res, main).unwrap();
    let mng = res.manager;

    // After CSE both elements are the same node, so DDE kills element 1's
    // edge without touching element 0.
    assert_eq!(count_applies_of(&mng, pair, Primitive::Add), 1);
    assert!(!is_dead_edge(&mng, t, 1));
    assert!(is_dead_edge(&mng, t, 2));
}

#[test]
fn reporting_dde_takes_an_extra_round() {
    let mut config = OptConfig::default();
    config.passes = vec![PassKind::Dde];
    config.dde.report_changes = true;

    let mut mng = Manager::new();
    let (main, _) = build(&mut mng);
    let (_, report) = optimize_graph(mng, main, config).unwrap();

    assert!(report.converged);
    assert_eq!(report.rounds, vec![vec![("dde", true)], vec![("dde", false)]]);
}

#[test]
fn iteration_limit_stops_the_driver() {
    let mut config = OptConfig::default();
    config.max_iterations = 1;

    let mut mng = Manager::new();
    let (main, _) = build(&mut mng);
    let (_, report) = optimize_graph(mng, main, config).unwrap();

    assert_eq!(report.iterations(), 1);
    assert!(!report.converged);
}

#[test]
fn quiet_program_converges_in_one_round() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let n = b.call_prim(Primitive::Neg, &[x], i64t());
    let main = b.output(n).unwrap();

    let (_, report) = optimize_graph(mng, main, OptConfig::default()).unwrap();
    assert!(report.converged);
    assert_eq!(report.iterations(), 1);
}

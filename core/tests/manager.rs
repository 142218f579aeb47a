use graphopt_core::ir::traverse::{dfs, toposort};
use graphopt_core::ir::{AbstractValue, Edge, FunctionBuilder, Manager, Primitive, Value};
use graphopt_core::ErrorCategory;

fn i64t() -> Option<AbstractValue> {
    Some(AbstractValue::i64())
}

#[test]
fn add_graph_makes_callees_live() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "callee");
    let x = b.param("x", i64t());
    let callee = b.output(x).unwrap();

    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let r = b.call_graph(callee, &[x], i64t());
    let main = b.output(r).unwrap();

    assert!(!mng.contains_graph(main));
    mng.add_graph(main);
    assert!(mng.contains_graph(main));
    assert!(mng.contains_graph(callee));
    assert_eq!(mng.graphs().collect::<Vec<_>>(), vec![main, callee]);
    assert_eq!(mng.reachable_graphs(main), vec![main, callee]);
    assert_eq!(mng.roots().collect::<Vec<_>>(), vec![main]);
}

#[test]
fn uses_index_tracks_edges() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let s = b.call_prim(Primitive::Add, &[x, x], i64t());
    let main = b.output(s).unwrap();
    mng.add_graph(main);

    let uses: Vec<Edge> = mng.uses(x).collect();
    assert_eq!(uses, vec![Edge::new(s, 1), Edge::new(s, 2)]);
    assert_eq!(mng.use_count(s), 1);
}

#[test]
fn set_edge_releases_orphaned_nodes() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let y = b.param("y", i64t());
    let m = b.call_prim(Primitive::Mul, &[x, y], i64t());
    let n = b.call_prim(Primitive::Neg, &[m], i64t());
    let t = b.tuple(&[n, x]);
    let main = b.output(t).unwrap();
    mng.add_graph(main);
    assert!(mng.is_live(m));

    mng.set_edge(t, 1, y).unwrap();

    assert!(!mng.is_live(n));
    assert!(!mng.is_live(m), "release cascades through inputs");
    assert!(mng.is_live(x) && mng.is_live(y), "parameters stay");
    assert_eq!(mng.use_count(y), 1);
    assert_eq!(mng.node(t).inputs()[1], y);
}

#[test]
fn replace_redirects_every_user() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let one = b.constant(Value::Int(1));
    let s = b.call_prim(Primitive::Add, &[x, one], i64t());
    let t = b.tuple(&[s, s, x]);
    let main = b.output(t).unwrap();
    mng.add_graph(main);

    mng.replace(s, x).unwrap();

    assert_eq!(&mng.node(t).inputs()[1..], &[x, x, x]);
    assert_eq!(mng.use_count(x), 3);
    assert!(!mng.is_live(s));
}

#[test]
fn recursive_graph_is_pruned_once_unreachable() {
    let mut mng = Manager::new();
    let rec = mng.new_graph("rec");
    let mut b = FunctionBuilder::for_graph(&mut mng, rec);
    let x = b.param("x", i64t());
    let again = b.call_graph(rec, &[x], i64t());
    b.output(again).unwrap();

    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let r = b.call_graph(rec, &[x], i64t());
    let main = b.output(r).unwrap();
    mng.add_graph(main);
    assert!(mng.contains_graph(rec));

    let ret = mng.graph(main).return_.unwrap();
    mng.set_edge(ret, 1, x).unwrap();

    assert!(!mng.contains_graph(rec), "self reference does not keep rec alive");
    assert!(!mng.is_live(again));
}

#[test]
fn keep_roots_drops_other_roots() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "a");
    let x = b.param("x", i64t());
    let a = b.output(x).unwrap();
    let mut b = FunctionBuilder::new(&mut mng, "b");
    let y = b.param("y", i64t());
    let g = b.output(y).unwrap();

    mng.add_graph(a);
    mng.add_graph(g);
    assert!(mng.contains_graph(g));

    mng.keep_roots(&[a]);
    assert!(mng.contains_graph(a));
    assert!(!mng.contains_graph(g));
    assert!(!mng.is_live(y));
}

#[test]
fn bad_edges_are_internal_errors() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let n = b.call_prim(Primitive::Neg, &[x], i64t());
    let main = b.output(n).unwrap();
    mng.add_graph(main);

    let err = mng.set_edge(n, 5, x).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Internal);
    assert_eq!(err.node(), Some(n));

    let err = mng.set_edge(x, 0, n).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Internal);
}

#[test]
fn toposort_puts_inputs_first() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let n = b.call_prim(Primitive::Neg, &[x], i64t());
    let s = b.call_prim(Primitive::Add, &[n, x], i64t());
    let main = b.output(s).unwrap();
    let ret = mng.graph(main).return_.unwrap();

    let order = toposort(&mng, ret);
    let pos = |id| order.iter().position(|o| *o == id).unwrap();
    assert!(pos(x) < pos(n));
    assert!(pos(n) < pos(s));
    assert!(pos(s) < pos(ret));
    assert_eq!(order.len(), order.iter().collect::<std::collections::HashSet<_>>().len());

    let pre = dfs(&mng, ret);
    assert_eq!(pre[0], ret);
    assert_eq!(pre.len(), order.len());
}

#[test]
fn printer_lists_applies_in_order() {
    let mut mng = Manager::new();
    let mut b = FunctionBuilder::new(&mut mng, "main");
    let x = b.param("x", i64t());
    let y = b.param("y", i64t());
    let s = b.call_prim(Primitive::Add, &[x, y], i64t());
    let main = b.output(s).unwrap();

    let text = mng.display_graph(main).to_string();
    let expected = format!(
        "graph main({} x, {} y) {{\n  {} = add({}, {})\n  return {}\n}}\n",
        x, y, s, x, y, s
    );
    assert_eq!(text, expected);

    let typed = mng.display_graph_typed(main).to_string();
    assert!(typed.contains(":: i64"));
}

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use graphopt_core::ir::{GraphId, Manager, NodeId, NodeKind, Primitive, Value};

/// Runtime value of the reference evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Rt {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Key(String),
    Tuple(Vec<Rt>),
    Array(Vec<Rt>),
    Env(BTreeMap<String, Rt>),
    Func(Func),
    Nil,
    Dead,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Func {
    Graph(GraphId),
    Prim(Primitive),
    Partial(Box<Func>, Vec<Rt>),
}

/// Evaluate `graph` on `args`. Panics on anything ill-typed.
pub fn eval(mng: &Manager, graph: GraphId, args: Vec<Rt>) -> Rt {
    let g = mng.graph(graph);
    assert_eq!(g.parameters.len(), args.len(), "arity mismatch calling {}", g.name);
    let mut frame: HashMap<NodeId, Rt> = g.parameters.iter().copied().zip(args).collect();
    let out = mng.output(graph).expect("graph without output");
    eval_node(mng, out, &mut frame)
}

fn eval_node(mng: &Manager, node: NodeId, frame: &mut HashMap<NodeId, Rt>) -> Rt {
    if let Some(v) = frame.get(&node) {
        return v.clone();
    }
    let v = match &mng.node(node).kind {
        NodeKind::Constant(value) => from_value(value),
        NodeKind::Parameter => panic!("unbound parameter {}", node),
        NodeKind::Apply(inputs) => {
            let vals: Vec<Rt> = inputs.iter().map(|i| eval_node(mng, *i, frame)).collect();
            let (f, args) = vals.split_first().expect("empty apply");
            match f {
                Rt::Func(f) => call(mng, f, args.to_vec()),
                Rt::Dead => Rt::Dead,
                other => panic!("calling a non-function {:?}", other),
            }
        }
    };
    frame.insert(node, v.clone());
    v
}

fn from_value(value: &Value) -> Rt {
    match value {
        Value::Int(i) => Rt::Int(*i),
        Value::Float(f) => Rt::Float(*f),
        Value::Bool(b) => Rt::Bool(*b),
        Value::Str(s) => Rt::Str(s.clone()),
        Value::SymbolicKey(k) => Rt::Key(k.clone()),
        Value::Graph(g) => Rt::Func(Func::Graph(*g)),
        Value::Prim(p) => Rt::Func(Func::Prim(*p)),
        Value::Nil => Rt::Nil,
        Value::Dead => Rt::Dead,
    }
}

pub fn call(mng: &Manager, f: &Func, args: Vec<Rt>) -> Rt {
    match f {
        Func::Graph(g) => eval(mng, *g, args),
        Func::Partial(inner, bound) => {
            let mut all = bound.clone();
            all.extend(args);
            call(mng, inner, all)
        }
        Func::Prim(p) => call_prim(mng, *p, args),
    }
}

fn arith(p: Primitive, a: &Rt, b: &Rt) -> Rt {
    match (a, b) {
        (Rt::Int(x), Rt::Int(y)) => match p {
            Primitive::Add => Rt::Int(x + y),
            Primitive::Sub => Rt::Int(x - y),
            Primitive::Mul => Rt::Int(x * y),
            Primitive::Div => Rt::Int(x / y),
            Primitive::Mod => Rt::Int(x % y),
            Primitive::Eq => Rt::Bool(x == y),
            Primitive::Ne => Rt::Bool(x != y),
            Primitive::Lt => Rt::Bool(x < y),
            Primitive::Le => Rt::Bool(x <= y),
            Primitive::Gt => Rt::Bool(x > y),
            Primitive::Ge => Rt::Bool(x >= y),
            _ => panic!("{} on ints", p.name()),
        },
        (Rt::Float(x), Rt::Float(y)) => match p {
            Primitive::Add => Rt::Float(x + y),
            Primitive::Sub => Rt::Float(x - y),
            Primitive::Mul => Rt::Float(x * y),
            Primitive::Div => Rt::Float(x / y),
            Primitive::Eq => Rt::Bool(x == y),
            Primitive::Lt => Rt::Bool(x < y),
            Primitive::Gt => Rt::Bool(x > y),
            _ => panic!("{} on floats", p.name()),
        },
        (Rt::Bool(x), Rt::Bool(y)) => match p {
            Primitive::And => Rt::Bool(*x && *y),
            Primitive::Or => Rt::Bool(*x || *y),
            Primitive::Eq => Rt::Bool(x == y),
            _ => panic!("{} on bools", p.name()),
        },
        _ => panic!("{} on {:?} and {:?}", p.name(), a, b),
    }
}

fn call_prim(mng: &Manager, p: Primitive, args: Vec<Rt>) -> Rt {
    use Primitive::*;
    match p {
        Return => args[0].clone(),
        MakeTuple => Rt::Tuple(args),
        TupleGetitem => match (&args[0], &args[1]) {
            (Rt::Tuple(t), Rt::Int(i)) => t[*i as usize].clone(),
            (Rt::Dead, _) => Rt::Dead,
            other => panic!("tuple_getitem on {:?}", other),
        },
        TupleSetitem => match (&args[0], &args[1]) {
            (Rt::Tuple(t), Rt::Int(i)) => {
                let mut t = t.clone();
                t[*i as usize] = args[2].clone();
                Rt::Tuple(t)
            }
            other => panic!("tuple_setitem on {:?}", other),
        },
        EnvSetitem => match (&args[0], &args[1]) {
            (Rt::Env(e), Rt::Key(k)) => {
                let mut e = e.clone();
                e.insert(k.clone(), args[2].clone());
                Rt::Env(e)
            }
            (Rt::Nil, Rt::Key(k)) => Rt::Env(BTreeMap::from([(k.clone(), args[2].clone())])),
            other => panic!("env_setitem on {:?}", other),
        },
        EnvGetitem => match (&args[0], &args[1]) {
            (Rt::Env(e), Rt::Key(k)) => e.get(k).cloned().unwrap_or_else(|| args[2].clone()),
            (Rt::Nil, _) => args[2].clone(),
            other => panic!("env_getitem on {:?}", other),
        },
        ArrayMap => {
            let Rt::Func(f) = &args[0] else { panic!("array_map without a function") };
            let arrays: Vec<&Vec<Rt>> = args[1..]
                .iter()
                .map(|a| match a {
                    Rt::Array(v) => v,
                    other => panic!("array_map over {:?}", other),
                })
                .collect();
            let len = arrays.first().map_or(0, |a| a.len());
            Rt::Array(
                (0..len)
                    .map(|i| call(mng, f, arrays.iter().map(|a| a[i].clone()).collect()))
                    .collect(),
            )
        }
        Partial => {
            let Rt::Func(f) = &args[0] else { panic!("partial without a function") };
            Rt::Func(Func::Partial(Box::new(f.clone()), args[1..].to_vec()))
        }
        Switch => match &args[0] {
            Rt::Bool(true) => args[1].clone(),
            Rt::Bool(false) => args[2].clone(),
            other => panic!("switch on {:?}", other),
        },
        Neg => match &args[0] {
            Rt::Int(x) => Rt::Int(-x),
            Rt::Float(x) => Rt::Float(-x),
            other => panic!("neg on {:?}", other),
        },
        Not => match &args[0] {
            Rt::Bool(b) => Rt::Bool(!b),
            other => panic!("not on {:?}", other),
        },
        _ => {
            if args.iter().any(|a| *a == Rt::Dead) {
                return Rt::Dead;
            }
            arith(p, &args[0], &args[1])
        }
    }
}

/// Live applies owned by `graph`.
pub fn applies_in(mng: &Manager, graph: GraphId) -> Vec<NodeId> {
    mng.all_nodes()
        .filter(|n| mng.node(*n).graph == Some(graph) && mng.node(*n).is_apply())
        .collect()
}

pub fn count_applies_of(mng: &Manager, graph: GraphId, prim: Primitive) -> usize {
    applies_in(mng, graph).into_iter().filter(|n| mng.is_apply_of(*n, prim)).count()
}

/// Input slot `index` of `owner` currently holds a dead sentinel.
pub fn is_dead_edge(mng: &Manager, owner: NodeId, index: usize) -> bool {
    let target = mng.node(owner).inputs()[index];
    mng.node(target).value().is_some_and(Value::is_dead)
}

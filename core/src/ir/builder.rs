use std::collections::HashMap;

use super::absval::{AbstractValue, FunctionRef};
use super::manager::Manager;
use super::node::{GraphId, NodeId};
use super::prim::Primitive;
use super::value::Value;
use crate::error::OptResult;

/// A per-graph construction helper: creates parameters, constants and
/// applies inside one graph, keeps a name -> node map for callers that
/// build from named descriptions, and fills in the obvious annotations
/// (tuples, indexing, partial application) from the inputs' annotations.
pub struct FunctionBuilder<'m> {
    mng: &'m mut Manager,
    graph: GraphId,
    names: HashMap<String, NodeId>,
}

impl<'m> FunctionBuilder<'m> {
    pub fn new(mng: &'m mut Manager, name: &str) -> Self {
        let graph = mng.new_graph(name);
        FunctionBuilder { mng, graph, names: HashMap::new() }
    }

    /// Build the body of a graph created earlier, e.g. one that refers to
    /// itself.
    pub fn for_graph(mng: &'m mut Manager, graph: GraphId) -> Self {
        FunctionBuilder { mng, graph, names: HashMap::new() }
    }

    pub fn graph(&self) -> GraphId {
        self.graph
    }

    pub fn manager(&mut self) -> &mut Manager {
        &mut *self.mng
    }

    pub fn param(&mut self, name: &str, abs: Option<AbstractValue>) -> NodeId {
        let p = self.mng.add_parameter(self.graph, abs);
        self.mng.set_debug_name(p, name);
        self.names.insert(name.to_string(), p);
        p
    }

    pub fn bind(&mut self, name: &str, node: NodeId) {
        self.names.insert(name.to_string(), node);
    }

    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn constant(&mut self, value: Value) -> NodeId {
        self.mng.constant(value)
    }

    pub fn constant_with(&mut self, value: Value, abs: Option<AbstractValue>) -> NodeId {
        self.mng.constant_with(value, abs)
    }

    pub fn abs_of(&self, node: NodeId) -> Option<AbstractValue> {
        self.mng.node(node).abs.clone()
    }

    /// Apply of an arbitrary function node.
    pub fn call(&mut self, func: NodeId, args: &[NodeId], abs: Option<AbstractValue>) -> NodeId {
        let mut inputs = Vec::with_capacity(args.len() + 1);
        inputs.push(func);
        inputs.extend_from_slice(args);
        self.mng.apply(self.graph, inputs, abs)
    }

    pub fn call_prim(
        &mut self,
        prim: Primitive,
        args: &[NodeId],
        abs: Option<AbstractValue>,
    ) -> NodeId {
        let f = self.mng.constant(Value::Prim(prim));
        self.call(f, args, abs)
    }

    pub fn call_graph(
        &mut self,
        callee: GraphId,
        args: &[NodeId],
        abs: Option<AbstractValue>,
    ) -> NodeId {
        let f = self.mng.constant(Value::Graph(callee));
        self.call(f, args, abs)
    }

    pub fn tuple(&mut self, elems: &[NodeId]) -> NodeId {
        let abs: Option<Vec<AbstractValue>> = elems.iter().map(|e| self.abs_of(*e)).collect();
        self.call_prim(Primitive::MakeTuple, elems, abs.map(AbstractValue::Tuple))
    }

    pub fn getitem(&mut self, tuple: NodeId, index: i64) -> NodeId {
        let abs = match self.abs_of(tuple) {
            Some(AbstractValue::Tuple(elems)) => {
                usize::try_from(index).ok().and_then(|i| elems.get(i).cloned())
            }
            _ => None,
        };
        let key = self.mng.constant(Value::Int(index));
        self.call_prim(Primitive::TupleGetitem, &[tuple, key], abs)
    }

    pub fn env_set(&mut self, env: NodeId, key: &str, value: NodeId) -> NodeId {
        let key = self.mng.constant(Value::SymbolicKey(key.to_string()));
        self.call_prim(Primitive::EnvSetitem, &[env, key, value], Some(AbstractValue::Env))
    }

    pub fn env_get(&mut self, env: NodeId, key: &str, default: NodeId) -> NodeId {
        let abs = self.abs_of(default);
        let key = self.mng.constant(Value::SymbolicKey(key.to_string()));
        self.call_prim(Primitive::EnvGetitem, &[env, key, default], abs)
    }

    /// `partial(func, args...)`, annotated with one `Partial` target per
    /// possible target of `func`.
    pub fn partial(&mut self, func: NodeId, args: &[NodeId]) -> NodeId {
        let bound: Vec<AbstractValue> = args.iter().filter_map(|a| self.abs_of(*a)).collect();
        let abs = self.abs_of(func).and_then(|a| {
            a.as_function().map(|f| {
                let targets: Vec<FunctionRef> = f
                    .get_sync()
                    .iter()
                    .map(|t| FunctionRef::Partial {
                        func: Box::new(t.clone()),
                        args: bound.clone(),
                    })
                    .collect();
                AbstractValue::functions(targets)
            })
        });
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(func);
        all.extend_from_slice(args);
        self.call_prim(Primitive::Partial, &all, abs)
    }

    /// Set the graph's output and hand back its id.
    pub fn output(self, node: NodeId) -> OptResult<GraphId> {
        self.mng.set_output(self.graph, node)?;
        Ok(self.graph)
    }
}

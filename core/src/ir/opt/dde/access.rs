//! Node-to-access-path resolution.
//!
//! For each node we work out which calls it may have come out of and where
//! inside their results: `x = f(..)[0][$k]` resolves to callees `{f}` at path
//! `(0, $k)`. Indexing only extends the path of what it indexes. Any other
//! apply *finishes* its inputs, i.e. records that each input's callees are
//! demanded at the input's path, since we do not track what the callee does
//! with its arguments. Finished entries are the demand edges the liveness
//! search follows.
use std::collections::{HashMap, HashSet};

use log::trace;

use super::structure::{AccessPath, PathKey};
use crate::error::{InternalError, OptResult};
use crate::ir::absval::{AbstractValue, FunctionRef};
use crate::ir::manager::Manager;
use crate::ir::node::{GraphId, NodeId};
use crate::ir::prim::Primitive;
use crate::ir::traverse;

const ISSUER: &str = "graphopt.opt.dde.access";

/// "Part `path` of the result of calling `graph` is needed."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Demand {
    pub graph: GraphId,
    pub path: AccessPath,
}

impl Demand {
    pub fn whole(graph: GraphId) -> Self {
        Demand { graph, path: Vec::new() }
    }
}

/// Ultimate target of a call once partial applications are peeled off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    Graph(GraphId),
    Prim(Primitive),
}

/// Strip partial applications from `target`, returning the underlying callee
/// and the annotations of the arguments bound along the way. The innermost
/// partial's arguments come first, matching the order they precede the call
/// arguments.
pub fn flatten_call(target: &FunctionRef) -> OptResult<(Callee, Vec<AbstractValue>)> {
    match target {
        FunctionRef::Partial { func, args } => {
            let (callee, mut bound) = flatten_call(func)?;
            bound.extend(args.iter().cloned());
            Ok((callee, bound))
        }
        FunctionRef::Graph(g) => Ok((Callee::Graph(*g), Vec::new())),
        FunctionRef::Primitive(p) | FunctionRef::TypedPrimitive { prim: p, .. } => {
            Ok((Callee::Prim(*p), Vec::new()))
        }
        FunctionRef::Opaque => Err(InternalError::new(
            "unsupported call target: opaque function",
            ISSUER,
        )
        .boxed()),
    }
}

#[derive(Debug, Clone, Default)]
struct Resolved {
    callees: Vec<GraphId>,
    path: AccessPath,
}

struct PathResolver<'a> {
    mng: &'a Manager,
    cache: HashMap<NodeId, Resolved>,
    in_progress: HashSet<NodeId>,
    finished: HashMap<NodeId, Vec<Demand>>,
}

impl<'a> PathResolver<'a> {
    fn new(mng: &'a Manager) -> Self {
        PathResolver {
            mng,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
            finished: HashMap::new(),
        }
    }

    fn finish(&mut self, node: NodeId, resolved: &Resolved) {
        if resolved.callees.is_empty() {
            return;
        }
        let entry = self.finished.entry(node).or_default();
        for g in resolved.callees.iter() {
            entry.push(Demand { graph: *g, path: resolved.path.clone() });
        }
    }

    /// Key of an indexing apply, when the key is a usable constant.
    fn index_key(&self, node: NodeId) -> Option<(NodeId, PathKey)> {
        let inputs = self.mng.node(node).inputs();
        let (base, key) = match self.mng.apply_prim(node)? {
            Primitive::TupleGetitem if inputs.len() == 3 => (inputs[1], inputs[2]),
            Primitive::EnvGetitem if inputs.len() == 4 => (inputs[1], inputs[2]),
            _ => return None,
        };
        let key = self.mng.node(key).value().and_then(PathKey::from_value)?;
        Some((base, key))
    }

    fn access_path(&mut self, node: NodeId) -> OptResult<Resolved> {
        if let Some(r) = self.cache.get(&node) {
            return Ok(r.clone());
        }
        // Re-entering a node we are still resolving: treat as unknown.
        if !self.in_progress.insert(node) {
            return Ok(Resolved::default());
        }

        let rval = if let Some((base, key)) = self.index_key(node) {
            if self.mng.is_apply_of(node, Primitive::EnvGetitem) {
                // The default flows out unchanged when the key is missing.
                let default = self.mng.node(node).inputs()[3];
                let d = self.access_path(default)?;
                self.finish(default, &d);
            }
            let mut r = self.access_path(base)?;
            r.path.push(key);
            r
        } else if self.mng.node(node).is_apply() {
            self.resolve_call(node)?
        } else {
            Resolved::default()
        };

        self.in_progress.remove(&node);
        self.cache.insert(node, rval.clone());
        Ok(rval)
    }

    fn resolve_call(&mut self, node: NodeId) -> OptResult<Resolved> {
        let mng = self.mng;
        let inputs = mng.node(node).inputs().to_vec();
        for inp in inputs.iter() {
            let r = self.access_path(*inp)?;
            self.finish(*inp, &r);
        }

        let Some((&func, args)) = inputs.split_first() else {
            return Err(InternalError::at("apply without a function input", ISSUER, node).boxed());
        };
        let Some(fna) = mng.node(func).abs.as_ref().and_then(AbstractValue::as_function) else {
            return Err(InternalError::at(
                "function position has no function annotation",
                ISSUER,
                func,
            )
            .boxed());
        };

        let mut callees: Vec<GraphId> = Vec::new();
        for target in fna.get_sync() {
            let (callee, bound) = flatten_call(target)?;
            match callee {
                Callee::Prim(Primitive::ArrayMap) => {
                    // array_map calls its first argument on every element.
                    let mapped = match bound.first() {
                        Some(a) => Some(a.clone()),
                        None => args.first().and_then(|a| mng.node(*a).abs.clone()),
                    };
                    let Some(AbstractValue::Function(mapped)) = mapped else {
                        return Err(InternalError::at(
                            "array_map without a function to map",
                            ISSUER,
                            node,
                        )
                        .boxed());
                    };
                    let mut graphs = Vec::new();
                    for t in mapped.get_sync() {
                        if let (Callee::Graph(g), _) = flatten_call(t)? {
                            graphs.push(g);
                        }
                    }
                    self.finish(node, &Resolved { callees: graphs, path: Vec::new() });
                }
                Callee::Graph(g) => {
                    if !callees.contains(&g) {
                        callees.push(g);
                    }
                }
                Callee::Prim(_) => {}
            }
        }
        Ok(Resolved { callees, path: Vec::new() })
    }
}

/// Demand edges for every live node under `root`: `node -> [(graph, path)]`
/// meaning the computation of `node` needs `graph(..)[path]`. Pins `root` as
/// the only reachability root first.
pub fn node_to_paths(mng: &mut Manager, root: GraphId) -> OptResult<HashMap<NodeId, Vec<Demand>>> {
    mng.keep_roots(&[root]);
    let mng: &Manager = mng;
    let mut resolver = PathResolver::new(mng);

    // Topological order first keeps the recursion shallow; the sweep over
    // all nodes catches anything not under a return.
    for g in mng.graphs() {
        if let Some(ret) = mng.graph(g).return_ {
            for node in traverse::toposort(mng, ret) {
                resolver.access_path(node)?;
            }
        }
    }
    for node in mng.all_nodes() {
        resolver.access_path(node)?;
    }

    trace!("dde: {} node(s) carry demands", resolver.finished.len());
    Ok(resolver.finished)
}

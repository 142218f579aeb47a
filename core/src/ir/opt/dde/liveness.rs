//! Output-path dependencies and the liveness search over them.
use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use super::access::{node_to_paths, Demand};
use super::structure::{format_path, output_structure, AccessPath, PathKey};
use crate::error::OptResult;
use crate::ir::absval::{AbstractValue, FunctionRef};
use crate::ir::manager::Manager;
use crate::ir::node::{Edge, GraphId};
use crate::ir::traverse;
use crate::ir::value::Value;

/// Edge holding one part of a graph's output and the demands that
/// computing that part raises.
#[derive(Debug, Clone)]
pub struct PathDeps {
    pub edge: Edge,
    pub demands: IndexSet<Demand>,
}

pub type Dependencies = IndexMap<GraphId, IndexMap<AccessPath, PathDeps>>;

/// For every live graph and every path of its output structure, the union of
/// the demands of all nodes the part at that path is computed from.
pub fn dependencies(mng: &mut Manager, root: GraphId) -> OptResult<Dependencies> {
    let finished = node_to_paths(mng, root)?;
    let mng: &Manager = mng;

    let mut results: Dependencies = IndexMap::new();
    for g in mng.graphs() {
        let mut per_path: IndexMap<AccessPath, PathDeps> = IndexMap::new();
        for (path, edge) in output_structure(mng, g) {
            let node = mng.node(edge.owner).inputs()[edge.index];
            let mut demands = IndexSet::new();
            for n in traverse::dfs(mng, node) {
                if let Some(ds) = finished.get(&n) {
                    demands.extend(ds.iter().cloned());
                }
            }
            per_path.insert(path, PathDeps { edge, demands });
        }
        results.insert(g, per_path);
    }
    Ok(results)
}

/// Result of the liveness search. `seen` holds the (graph, path) vertices the
/// search expanded; `keep` holds every prefix of those.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    pub seen: HashSet<(GraphId, AccessPath)>,
    pub keep: HashSet<(GraphId, AccessPath)>,
}

impl Liveness {
    /// A path is live if it leads to something expanded, or if something
    /// expanded contains it. Live paths are closed under taking prefixes.
    pub fn is_live(&self, graph: GraphId, path: &[PathKey]) -> bool {
        if self.keep.contains(&(graph, path.to_vec())) {
            return true;
        }
        (0..=path.len()).any(|k| self.seen.contains(&(graph, path[..k].to_vec())))
    }
}

/// Graphs whose values flow out of `root`: they can be called by whoever
/// receives the result, so their whole output is needed. Every part of the
/// output structure is checked, since an environment's annotation says
/// nothing about its entries.
fn escaping_graphs(mng: &Manager, root: GraphId) -> Vec<GraphId> {
    let mut out = Vec::new();
    let Some(output) = mng.output(root) else { return out };
    if let Some(abs) = mng.node(output).abs.as_ref() {
        collect_graphs(abs, &mut out);
    }
    for (_, edge) in output_structure(mng, root) {
        let node = mng.node(edge.owner).inputs()[edge.index];
        if let Some(abs) = mng.node(node).abs.as_ref() {
            collect_graphs(abs, &mut out);
        }
        if let Some(g) = mng.node(node).value().and_then(Value::as_graph) {
            push_unique(&mut out, g);
        }
    }
    out
}

fn push_unique(out: &mut Vec<GraphId>, g: GraphId) {
    if !out.contains(&g) {
        out.push(g);
    }
}

fn collect_graphs(abs: &AbstractValue, out: &mut Vec<GraphId>) {
    match abs {
        AbstractValue::Function(f) => {
            for target in f.get_sync() {
                collect_target(target, out);
            }
        }
        AbstractValue::Tuple(elems) => {
            for e in elems.iter() {
                collect_graphs(e, out);
            }
        }
        AbstractValue::Array(elem) => collect_graphs(elem, out),
        _ => {}
    }
}

/// Nothing is called here, so an opaque target is just a value that names no
/// graph.
fn collect_target(target: &FunctionRef, out: &mut Vec<GraphId>) {
    match target {
        FunctionRef::Graph(g) => push_unique(out, *g),
        FunctionRef::Partial { func, args } => {
            collect_target(func, out);
            for a in args.iter() {
                collect_graphs(a, out);
            }
        }
        FunctionRef::Primitive(_) | FunctionRef::TypedPrimitive { .. } | FunctionRef::Opaque => {}
    }
}

/// Run the liveness search from every output path of `root` and return the
/// structure edges of each graph whose path is not live.
pub fn find_dead_paths(
    mng: &mut Manager,
    root: GraphId,
) -> OptResult<IndexMap<GraphId, Vec<Edge>>> {
    let deps = dependencies(mng, root)?;
    let liveness = search(mng, root, &deps)?;

    let mut missing: IndexMap<GraphId, Vec<Edge>> = IndexMap::new();
    for (g, per_path) in deps.iter() {
        for (path, pd) in per_path.iter() {
            if !liveness.is_live(*g, path) {
                trace!("dde: {} {} is dead", g, format_path(path));
                missing.entry(*g).or_default().push(pd.edge);
            }
        }
    }
    Ok(missing)
}

/// Graph search over (graph, path) vertices, collapsing every requested path
/// to its longest prefix the callee actually builds.
pub fn search(mng: &Manager, root: GraphId, deps: &Dependencies) -> OptResult<Liveness> {
    let mut work: Vec<Demand> = Vec::new();
    if let Some(per_path) = deps.get(&root) {
        work.extend(per_path.keys().map(|p| Demand { graph: root, path: p.clone() }));
    }
    for g in escaping_graphs(mng, root) {
        work.push(Demand::whole(g));
    }

    let mut requested: HashSet<Demand> = HashSet::new();
    let mut liveness = Liveness::default();
    while let Some(demand) = work.pop() {
        if !requested.insert(demand.clone()) {
            continue;
        }
        let Some(per_path) = deps.get(&demand.graph) else { continue };
        let mut path = demand.path;
        while !path.is_empty() && !per_path.contains_key(&path) {
            path.pop();
        }
        let Some(pd) = per_path.get(&path) else { continue };
        if !liveness.seen.insert((demand.graph, path.clone())) {
            continue;
        }
        for k in 0..=path.len() {
            liveness.keep.insert((demand.graph, path[..k].to_vec()));
        }
        work.extend(pd.demands.iter().cloned());
    }

    debug!(
        "dde: {} path(s) expanded, {} kept",
        liveness.seen.len(),
        liveness.keep.len()
    );
    Ok(liveness)
}

//! file: core/src/ir/manager.rs
//! description: owner of every node and graph, plus the indices kept in sync
//! with edge mutations.
//!
//! Nodes and graphs live in arenas addressed by `NodeId`/`GraphId`. A node is
//! *live* when a live graph reaches it through input edges; only live owners
//! contribute to the reverse `uses` index. `set_edge` is the single
//! primitive that changes topology: it registers the new use, drops the old
//! one, releases nodes left without users and prunes graphs that can no
//! longer be reached from the roots.
use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use log::trace;

use super::absval::AbstractValue;
use super::node::{Edge, Graph, GraphId, Node, NodeId, NodeKind};
use super::prim::Primitive;
use super::traverse;
use super::value::Value;
use crate::error::{InternalError, OptResult};

const ISSUER: &str = "graphopt.ir.manager";

#[derive(Debug, Default)]
pub struct Manager {
    nodes: Vec<Node>,
    graphs: Vec<Graph>,
    live_nodes: IndexSet<NodeId>,
    live_graphs: IndexSet<GraphId>,
    uses: HashMap<NodeId, IndexSet<Edge>>,
    roots: IndexSet<GraphId>,
}

/// Annotation a constant gets when the caller does not provide one.
pub fn default_abstract(value: &Value) -> Option<AbstractValue> {
    match value {
        Value::Int(_) => Some(AbstractValue::i64()),
        Value::Float(_) => Some(AbstractValue::f64()),
        Value::Bool(_) => Some(AbstractValue::bool()),
        Value::Str(_) => Some(AbstractValue::Scalar(super::absval::ScalarType::Str)),
        Value::SymbolicKey(_) => Some(AbstractValue::SymbolicKey),
        Value::Graph(g) => Some(AbstractValue::graph(*g)),
        Value::Prim(p) => Some(AbstractValue::prim(*p)),
        Value::Nil => Some(AbstractValue::Nil),
        Value::Dead => None,
    }
}

impl Manager {
    pub fn new() -> Self {
        Manager::default()
    }

    // ------------------------------------------------------------------
    // construction

    pub fn new_graph(&mut self, name: &str) -> GraphId {
        let id = GraphId(self.graphs.len() as u32);
        self.graphs.push(Graph::new(name));
        id
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn add_parameter(&mut self, graph: GraphId, abs: Option<AbstractValue>) -> NodeId {
        let id = self.push_node(Node {
            kind: NodeKind::Parameter,
            graph: Some(graph),
            abs,
            debug_name: None,
        });
        self.graphs[graph.index()].parameters.push(id);
        if self.live_graphs.contains(&graph) {
            self.acquire(id);
        }
        id
    }

    /// Constant annotated from its own value (see `default_abstract`).
    pub fn constant(&mut self, value: Value) -> NodeId {
        let abs = default_abstract(&value);
        self.constant_with(value, abs)
    }

    pub fn constant_with(&mut self, value: Value, abs: Option<AbstractValue>) -> NodeId {
        self.push_node(Node {
            kind: NodeKind::Constant(value),
            graph: None,
            abs,
            debug_name: None,
        })
    }

    /// New apply node in `graph`. It becomes live once something live uses it.
    pub fn apply(
        &mut self,
        graph: GraphId,
        inputs: Vec<NodeId>,
        abs: Option<AbstractValue>,
    ) -> NodeId {
        self.push_node(Node {
            kind: NodeKind::Apply(inputs),
            graph: Some(graph),
            abs,
            debug_name: None,
        })
    }

    /// Make `output` the value returned by `graph`, creating the return node
    /// on first use.
    pub fn set_output(&mut self, graph: GraphId, output: NodeId) -> OptResult<()> {
        if let Some(ret) = self.graphs[graph.index()].return_ {
            return self.set_edge(ret, 1, output);
        }
        let ret_fn = self.constant(Value::Prim(Primitive::Return));
        let abs = self.nodes[output.index()].abs.clone();
        let ret = self.apply(graph, vec![ret_fn, output], abs);
        self.graphs[graph.index()].return_ = Some(ret);
        if self.live_graphs.contains(&graph) {
            self.acquire(ret);
        }
        Ok(())
    }

    pub fn set_abstract(&mut self, node: NodeId, abs: Option<AbstractValue>) {
        self.nodes[node.index()].abs = abs;
    }

    pub fn set_debug_name(&mut self, node: NodeId, name: &str) {
        self.nodes[node.index()].debug_name = Some(name.to_string());
    }

    // ------------------------------------------------------------------
    // queries

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn graph(&self, id: GraphId) -> &Graph {
        &self.graphs[id.index()]
    }

    pub fn output(&self, graph: GraphId) -> Option<NodeId> {
        let ret = self.graphs[graph.index()].return_?;
        self.node(ret).inputs().get(1).copied()
    }

    /// Live graphs, in the order they became live.
    pub fn graphs(&self) -> impl Iterator<Item = GraphId> + '_ {
        self.live_graphs.iter().copied()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.live_nodes.iter().copied()
    }

    pub fn roots(&self) -> impl Iterator<Item = GraphId> + '_ {
        self.roots.iter().copied()
    }

    pub fn uses(&self, node: NodeId) -> impl Iterator<Item = Edge> + '_ {
        self.uses.get(&node).into_iter().flat_map(|set| set.iter().copied())
    }

    pub fn use_count(&self, node: NodeId) -> usize {
        self.uses.get(&node).map_or(0, |set| set.len())
    }

    pub fn is_live(&self, node: NodeId) -> bool {
        self.live_nodes.contains(&node)
    }

    pub fn contains_graph(&self, graph: GraphId) -> bool {
        self.live_graphs.contains(&graph)
    }

    /// Primitive in function position, if `node` is an apply of a constant
    /// primitive.
    pub fn apply_prim(&self, node: NodeId) -> Option<Primitive> {
        let f = *self.node(node).inputs().first()?;
        self.node(f).value().and_then(Value::as_prim)
    }

    pub fn is_apply_of(&self, node: NodeId, prim: Primitive) -> bool {
        self.apply_prim(node) == Some(prim)
    }

    /// Graphs reachable from `root` through graph constants, `root` first.
    pub fn reachable_graphs(&self, root: GraphId) -> Vec<GraphId> {
        self.reachable_from(std::iter::once(root))
    }

    fn reachable_from(&self, roots: impl Iterator<Item = GraphId>) -> Vec<GraphId> {
        let mut seen: IndexSet<GraphId> = IndexSet::new();
        let mut work: Vec<GraphId> = Vec::new();
        for r in roots {
            if seen.insert(r) {
                work.push(r);
            }
        }
        while let Some(g) = work.pop() {
            let Some(ret) = self.graphs[g.index()].return_ else { continue };
            for n in traverse::dfs(self, ret) {
                if let Some(h) = self.node(n).value().and_then(Value::as_graph) {
                    if seen.insert(h) {
                        work.push(h);
                    }
                }
            }
        }
        seen.into_iter().collect()
    }

    // ------------------------------------------------------------------
    // roots

    /// Pin `graph` as a root and make everything it reaches live.
    pub fn add_graph(&mut self, graph: GraphId) {
        self.roots.insert(graph);
        self.acquire_graph(graph);
    }

    /// Replace the root set with `roots` and drop whatever they cannot reach.
    pub fn keep_roots(&mut self, roots: &[GraphId]) {
        self.roots = roots.iter().copied().collect();
        for &r in roots {
            self.acquire_graph(r);
        }
        self.prune_graphs();
    }

    // ------------------------------------------------------------------
    // mutation

    /// Point `owner.inputs[index]` at `new`.
    pub fn set_edge(&mut self, owner: NodeId, index: usize, new: NodeId) -> OptResult<()> {
        let old = match &mut self.nodes[owner.index()].kind {
            NodeKind::Apply(inputs) => match inputs.get_mut(index) {
                Some(slot) => std::mem::replace(slot, new),
                None => {
                    return Err(InternalError::at(
                        format!("input index {} out of range", index),
                        ISSUER,
                        owner,
                    )
                    .boxed());
                }
            },
            _ => {
                return Err(
                    InternalError::at("set_edge on a node without inputs", ISSUER, owner).boxed()
                );
            }
        };
        if old == new || !self.live_nodes.contains(&owner) {
            return Ok(());
        }

        trace!("set_edge {}[{}]: {} -> {}", owner, index, old, new);
        let edge = Edge::new(owner, index);
        // Acquire before releasing so nodes shared by old and new survive.
        self.uses.entry(new).or_default().insert(edge);
        self.acquire(new);

        if let Some(set) = self.uses.get_mut(&old) {
            set.swap_remove(&edge);
        }
        if self.release(old) {
            self.prune_graphs();
        }
        Ok(())
    }

    /// Redirect every user of `old` to `new`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> OptResult<()> {
        if old == new {
            return Ok(());
        }
        let edges: Vec<Edge> = self.uses(old).collect();
        for e in edges {
            self.set_edge(e.owner, e.index, new)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // index maintenance

    fn acquire_graph(&mut self, graph: GraphId) {
        if !self.live_graphs.insert(graph) {
            return;
        }
        trace!("graph {} ({}) is live", graph, self.graphs[graph.index()].name);
        let mut start: Vec<NodeId> = self.graphs[graph.index()].parameters.clone();
        start.extend(self.graphs[graph.index()].return_);
        for n in start {
            self.acquire(n);
        }
    }

    fn acquire(&mut self, node: NodeId) {
        let mut stack = vec![node];
        let mut graphs: Vec<GraphId> = Vec::new();
        while let Some(n) = stack.pop() {
            if !self.live_nodes.insert(n) {
                continue;
            }
            let inputs = self.nodes[n.index()].inputs().to_vec();
            for (i, inp) in inputs.into_iter().enumerate() {
                self.uses.entry(inp).or_default().insert(Edge::new(n, i));
                stack.push(inp);
            }
            if let Some(g) = self.nodes[n.index()].value().and_then(Value::as_graph) {
                graphs.push(g);
            }
        }
        for g in graphs {
            self.acquire_graph(g);
        }
    }

    fn releasable(&self, node: NodeId) -> bool {
        if !self.live_nodes.contains(&node) || self.use_count(node) > 0 {
            return false;
        }
        let n = &self.nodes[node.index()];
        match n.graph {
            Some(g) if self.live_graphs.contains(&g) => {
                !n.is_parameter() && self.graphs[g.index()].return_ != Some(node)
            }
            _ => true,
        }
    }

    /// Drop `node` if nothing uses it anymore, cascading into its inputs.
    /// Returns true when a graph constant went away, i.e. some graph may
    /// have become unreachable.
    fn release(&mut self, node: NodeId) -> bool {
        let mut stack = vec![node];
        let mut dropped_graph_ref = false;
        while let Some(n) = stack.pop() {
            if !self.releasable(n) {
                continue;
            }
            self.live_nodes.swap_remove(&n);
            self.uses.remove(&n);
            let inputs = self.nodes[n.index()].inputs().to_vec();
            for (i, inp) in inputs.into_iter().enumerate() {
                if let Some(set) = self.uses.get_mut(&inp) {
                    set.swap_remove(&Edge::new(n, i));
                    if set.is_empty() {
                        stack.push(inp);
                    }
                }
            }
            if self.nodes[n.index()].value().and_then(Value::as_graph).is_some() {
                dropped_graph_ref = true;
            }
        }
        dropped_graph_ref
    }

    fn prune_graphs(&mut self) {
        let reachable: HashSet<GraphId> = self
            .reachable_from(self.roots.iter().copied())
            .into_iter()
            .collect();
        let dead: Vec<GraphId> = self
            .live_graphs
            .iter()
            .copied()
            .filter(|g| !reachable.contains(g))
            .collect();
        if dead.is_empty() {
            return;
        }
        for g in dead.iter() {
            trace!("graph {} ({}) is unreachable", g, self.graphs[g.index()].name);
            self.live_graphs.shift_remove(g);
        }
        for g in dead {
            let mut owned: Vec<NodeId> = self.graphs[g.index()].parameters.clone();
            owned.extend(self.graphs[g.index()].return_);
            for n in owned {
                self.release(n);
            }
        }
    }
}

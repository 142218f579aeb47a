//! Text dump of graphs, one apply per line:
//!
//! ```text
//! graph main(%1 x, %2 y) {
//!   %5 = add(%1, %2)
//!   return %5
//! }
//! ```
use std::fmt;

use super::manager::Manager;
use super::node::{GraphId, NodeId, NodeKind};
use super::traverse;
use super::value::Value;

pub struct GraphDisplay<'a> {
    mng: &'a Manager,
    graph: GraphId,
    with_types: bool,
}

impl Manager {
    pub fn display_graph(&self, graph: GraphId) -> GraphDisplay<'_> {
        GraphDisplay { mng: self, graph, with_types: false }
    }

    /// Same as `display_graph`, with each node's annotation appended.
    pub fn display_graph_typed(&self, graph: GraphId) -> GraphDisplay<'_> {
        GraphDisplay { mng: self, graph, with_types: true }
    }
}

impl GraphDisplay<'_> {
    fn operand(&self, f: &mut fmt::Formatter<'_>, node: NodeId) -> fmt::Result {
        match &self.mng.node(node).kind {
            NodeKind::Constant(Value::Graph(g)) => write!(f, "@{}", self.mng.graph(*g).name),
            NodeKind::Constant(v) => write!(f, "{}", v),
            _ => write!(f, "{}", node),
        }
    }
}

impl fmt::Display for GraphDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.mng.graph(self.graph);
        write!(f, "graph {}(", g.name)?;
        for (i, p) in g.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
            if let Some(name) = &self.mng.node(*p).debug_name {
                write!(f, " {}", name)?;
            }
        }
        writeln!(f, ") {{")?;

        let Some(ret) = g.return_ else {
            return writeln!(f, "}}");
        };
        for node in traverse::toposort(self.mng, ret) {
            let n = self.mng.node(node);
            // Free variables from enclosing graphs are printed where they are
            // defined, not here.
            if n.graph != Some(self.graph) || !n.is_apply() {
                continue;
            }
            let inputs = n.inputs();
            if node == ret {
                write!(f, "  return ")?;
                match inputs.get(1) {
                    Some(out) => self.operand(f, *out)?,
                    None => write!(f, "?")?,
                }
                writeln!(f)?;
                continue;
            }
            write!(f, "  {} = ", node)?;
            if let Some((func, args)) = inputs.split_first() {
                self.operand(f, *func)?;
                write!(f, "(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.operand(f, *a)?;
                }
                write!(f, ")")?;
            }
            if self.with_types {
                if let Some(abs) = &n.abs {
                    write!(f, " :: {}", abs)?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "}}")
    }
}

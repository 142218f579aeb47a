use crate::ir::manager::Manager;
use crate::ir::node::{Edge, GraphId, NodeId};
use crate::ir::prim::Primitive;
use crate::ir::value::Value;

/// One step from a structured value down to one of its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathKey {
    /// Tuple position.
    Index(usize),
    /// Environment entry.
    Key(String),
}

impl PathKey {
    pub fn from_value(value: &Value) -> Option<PathKey> {
        match value {
            Value::Int(i) => usize::try_from(*i).ok().map(PathKey::Index),
            Value::SymbolicKey(k) => Some(PathKey::Key(k.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for PathKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathKey::Index(i) => write!(f, "{}", i),
            PathKey::Key(k) => write!(f, "${}", k),
        }
    }
}

/// Route from a graph's return value to one of its parts. Empty means the
/// whole value.
pub type AccessPath = Vec<PathKey>;

pub fn format_path(path: &[PathKey]) -> String {
    let parts: Vec<String> = path.iter().map(|k| k.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Every place where a part of `graph`'s output is built in the graph's own
/// body, as (path, edge holding that part). The whole output is `()` at the
/// return node's argument slot. This does not look through calls.
///
/// A tuple or environment is only taken apart when the edge we reached it
/// through is its sole use: rewriting its element edges must not change what
/// any other user sees.
pub fn output_structure(mng: &Manager, graph: GraphId) -> Vec<(AccessPath, Edge)> {
    let mut out = Vec::new();
    let Some(ret) = mng.graph(graph).return_ else { return out };
    out.push((Vec::new(), Edge::new(ret, 1)));
    if let Some(output) = mng.output(graph) {
        collect(mng, output, &Vec::new(), &mut out);
    }
    out
}

fn collect(mng: &Manager, node: NodeId, path: &AccessPath, out: &mut Vec<(AccessPath, Edge)>) {
    if mng.use_count(node) > 1 {
        return;
    }
    let inputs = mng.node(node).inputs();
    match mng.apply_prim(node) {
        Some(Primitive::MakeTuple) => {
            for (i, inp) in inputs.iter().enumerate().skip(1) {
                let mut p = path.clone();
                p.push(PathKey::Index(i - 1));
                out.push((p.clone(), Edge::new(node, i)));
                collect(mng, *inp, &p, out);
            }
        }
        Some(Primitive::EnvSetitem) if inputs.len() == 4 => {
            let (env, key, value) = (inputs[1], inputs[2], inputs[3]);
            let Some(key) = mng.node(key).value().and_then(PathKey::from_value) else { return };
            // The base environment sits underneath this layer, at the same path.
            collect(mng, env, path, out);
            let mut p = path.clone();
            p.push(key);
            out.push((p.clone(), Edge::new(node, 3)));
            collect(mng, value, &p, out);
        }
        _ => {}
    }
}

use std::hash::{Hash, Hasher};

use super::node::GraphId;
use super::prim::Primitive;

/// Literal payload of a constant node.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Key into an environment (`env_getitem`/`env_setitem`).
    SymbolicKey(String),
    Graph(GraphId),
    Prim(Primitive),
    Nil,
    /// Placeholder for data nobody reads.
    Dead,
}

impl Value {
    pub fn as_graph(&self) -> Option<GraphId> {
        match self {
            Value::Graph(g) => Some(*g),
            _ => None,
        }
    }

    pub fn as_prim(&self) -> Option<Primitive> {
        match self {
            Value::Prim(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Value::Dead)
    }
}

// Floats compare by bit pattern: constants are identities for CSE, not
// numbers, so 0.0 and -0.0 must stay apart and NaN must equal itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::SymbolicKey(a), Value::SymbolicKey(b)) => a == b,
            (Value::Graph(a), Value::Graph(b)) => a == b,
            (Value::Prim(a), Value::Prim(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Dead, Value::Dead) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Str(s) | Value::SymbolicKey(s) => s.hash(state),
            Value::Graph(g) => g.hash(state),
            Value::Prim(p) => p.hash(state),
            Value::Nil | Value::Dead => {}
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::SymbolicKey(k) => write!(f, "${}", k),
            Value::Graph(g) => write!(f, "@{}", g),
            Value::Prim(p) => write!(f, "{}", p),
            Value::Nil => write!(f, "nil"),
            Value::Dead => write!(f, "DEAD"),
        }
    }
}

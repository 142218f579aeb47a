use super::absval::AbstractValue;
use super::value::Value;

/// Index of a node in the manager's arena. Node identity is index identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// Index of a graph in the manager's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(pub(crate) u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl GraphId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// An input slot: `owner.inputs[index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub owner: NodeId,
    pub index: usize,
}

impl Edge {
    pub fn new(owner: NodeId, index: usize) -> Self {
        Edge { owner, index }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Constant(Value),
    Parameter,
    /// `inputs[0]` is the function, `inputs[1..]` the arguments.
    Apply(Vec<NodeId>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Owning graph. Constants are free-floating and have none.
    pub graph: Option<GraphId>,
    pub abs: Option<AbstractValue>,
    pub debug_name: Option<String>,
}

impl Node {
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant(_))
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, NodeKind::Parameter)
    }

    pub fn is_apply(&self) -> bool {
        matches!(self.kind, NodeKind::Apply(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Constant(v) => Some(v),
            _ => None,
        }
    }

    pub fn inputs(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Apply(inputs) => inputs,
            _ => &[],
        }
    }

    pub fn abstract_value(&self) -> Option<&AbstractValue> {
        self.abs.as_ref()
    }
}

/// A function definition. Nodes belonging to it point back through
/// `Node::graph`.
#[derive(Debug, Clone)]
pub struct Graph {
    pub name: String,
    pub parameters: Vec<NodeId>,
    /// Apply of `Primitive::Return` to the output; `None` until set.
    pub return_: Option<NodeId>,
}

impl Graph {
    pub fn new(name: &str) -> Self {
        Graph { name: name.to_string(), parameters: Vec::new(), return_: None }
    }
}

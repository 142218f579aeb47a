//! file: cli/src/program.rs
//! description: JSON program descriptions.
//!
//! ```json
//! {
//!   "root": "main",
//!   "graphs": [
//!     { "name": "main",
//!       "params": [{ "name": "x", "type": "i64" }],
//!       "nodes": [
//!         { "name": "one", "const": 1 },
//!         { "name": "s", "apply": ["add", "x", "one"], "type": "i64" }
//!       ],
//!       "output": "s" }
//!   ]
//! }
//! ```
//!
//! Names inside `apply` resolve to a node of the same graph first, then to
//! a graph, then to a primitive. Constants are JSON scalars, or one-key
//! objects for the other kinds: `{"key": "a"}`, `{"float": 1}`, `{"nil": true}`,
//! `{"graph": "f"}`, `{"prim": "add"}`.
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use graphopt_core::error::{GraphoptErrorExt, InvalidInputError};
use graphopt_core::ir::{
    AbstractValue, FunctionBuilder, FunctionRef, GraphId, Manager, NodeId, Primitive, ScalarType,
    Value,
};

const ISSUER: &str = "graphopt.program";

type LoadResult<T> = Result<T, Box<dyn GraphoptErrorExt>>;

fn invalid(message: impl Into<String>) -> Box<dyn GraphoptErrorExt> {
    InvalidInputError::new(message, ISSUER).boxed()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramSpec {
    #[serde(default)]
    pub root: Option<String>,
    pub graphs: Vec<GraphSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    pub output: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub name: String,
    #[serde(rename = "const", default)]
    pub constant: Option<serde_json::Value>,
    #[serde(default)]
    pub apply: Option<Vec<String>>,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeSpec>,
}

/// Annotation syntax: `"i64"`, `{"tuple": [..]}`, `{"array": ..}`,
/// `{"fn": ["f", "add", {"partial": "g", "args": [..]}]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Name(String),
    Tuple { tuple: Vec<TypeSpec> },
    Array { array: Box<TypeSpec> },
    Function {
        #[serde(rename = "fn")]
        targets: Vec<FnSpec>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FnSpec {
    Name(String),
    Partial { partial: String, args: Vec<TypeSpec> },
}

/// A loaded program: the manager holding every graph and the root.
#[derive(Debug)]
pub struct Program {
    pub manager: Manager,
    pub root: GraphId,
    pub graphs: Vec<GraphId>,
}

impl Program {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> LoadResult<Program> {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| invalid(format!("read program {}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> LoadResult<Program> {
        let spec: ProgramSpec = serde_json::from_str(raw)
            .map_err(|e| invalid(format!("parse program: {}", e)))?;
        Self::build(&spec)
    }

    pub fn build(spec: &ProgramSpec) -> LoadResult<Program> {
        if spec.graphs.is_empty() {
            return Err(invalid("program has no graphs"));
        }

        let mut manager = Manager::new();
        let mut by_name: HashMap<String, GraphId> = HashMap::new();
        let mut graphs = Vec::with_capacity(spec.graphs.len());
        for g in spec.graphs.iter() {
            if by_name.contains_key(&g.name) {
                return Err(invalid(format!("duplicate graph name '{}'", g.name)));
            }
            let id = manager.new_graph(&g.name);
            by_name.insert(g.name.clone(), id);
            graphs.push(id);
        }

        for (g, id) in spec.graphs.iter().zip(graphs.iter()) {
            build_graph(&mut manager, &by_name, g, *id)?;
        }

        let root = match &spec.root {
            Some(name) => *by_name
                .get(name)
                .ok_or_else(|| invalid(format!("root graph '{}' is not defined", name)))?,
            None => graphs[0],
        };
        Ok(Program { manager, root, graphs })
    }
}

fn build_graph(
    mng: &mut Manager,
    graphs: &HashMap<String, GraphId>,
    spec: &GraphSpec,
    id: GraphId,
) -> LoadResult<()> {
    // Annotations first, while the manager is not borrowed by the builder.
    let param_types = spec
        .params
        .iter()
        .map(|p| p.ty.as_ref().map(|t| resolve_type(graphs, t)).transpose())
        .collect::<LoadResult<Vec<_>>>()?;
    let node_types = spec
        .nodes
        .iter()
        .map(|n| n.ty.as_ref().map(|t| resolve_type(graphs, t)).transpose())
        .collect::<LoadResult<Vec<_>>>()?;

    let mut b = FunctionBuilder::for_graph(mng, id);
    for (p, abs) in spec.params.iter().zip(param_types) {
        if b.lookup(&p.name).is_some() {
            return Err(invalid(format!("duplicate name '{}' in graph '{}'", p.name, spec.name)));
        }
        b.param(&p.name, abs);
    }

    for (n, abs) in spec.nodes.iter().zip(node_types) {
        if b.lookup(&n.name).is_some() {
            return Err(invalid(format!("duplicate name '{}' in graph '{}'", n.name, spec.name)));
        }
        let node = match (&n.constant, &n.apply) {
            (Some(c), None) => {
                let value = resolve_const(graphs, c).map_err(|e| {
                    invalid(format!("node '{}' in graph '{}': {}", n.name, spec.name, e))
                })?;
                match abs {
                    Some(abs) => b.constant_with(value, Some(abs)),
                    None => b.constant(value),
                }
            }
            (None, Some(names)) => {
                let Some((func, args)) = names.split_first() else {
                    return Err(invalid(format!(
                        "node '{}' in graph '{}' applies nothing",
                        n.name, spec.name
                    )));
                };
                let func = resolve_name(&mut b, graphs, func, &spec.name)?;
                let args = args
                    .iter()
                    .map(|a| resolve_name(&mut b, graphs, a, &spec.name))
                    .collect::<LoadResult<Vec<NodeId>>>()?;
                let callable = b.manager().node(func).abs.as_ref();
                if !callable.is_some_and(AbstractValue::is_function) {
                    return Err(invalid(format!(
                        "node '{}' in graph '{}': '{}' is applied but has no function type",
                        n.name, spec.name, names[0]
                    )));
                }
                let prim = b.manager().node(func).value().and_then(Value::as_prim);
                if let Some(expected) = prim.and_then(|p| p.arity()) {
                    if expected != args.len() {
                        return Err(invalid(format!(
                            "node '{}' in graph '{}': {} takes {} argument(s), got {}",
                            n.name,
                            spec.name,
                            names[0],
                            expected,
                            args.len()
                        )));
                    }
                }
                b.call(func, &args, abs)
            }
            _ => {
                return Err(invalid(format!(
                    "node '{}' in graph '{}' needs exactly one of \"const\" or \"apply\"",
                    n.name, spec.name
                )));
            }
        };
        b.manager().set_debug_name(node, &n.name);
        b.bind(&n.name, node);
    }

    let Some(out) = b.lookup(&spec.output) else {
        return Err(invalid(format!(
            "output '{}' of graph '{}' is not defined",
            spec.output, spec.name
        )));
    };
    b.output(out)?;
    Ok(())
}

fn resolve_name(
    b: &mut FunctionBuilder<'_>,
    graphs: &HashMap<String, GraphId>,
    name: &str,
    owner: &str,
) -> LoadResult<NodeId> {
    if let Some(node) = b.lookup(name) {
        return Ok(node);
    }
    if let Some(g) = graphs.get(name) {
        return Ok(b.constant(Value::Graph(*g)));
    }
    if let Some(p) = Primitive::from_name(name) {
        return Ok(b.constant(Value::Prim(p)));
    }
    Err(invalid(format!("unknown name '{}' in graph '{}'", name, owner)))
}

fn resolve_const(
    graphs: &HashMap<String, GraphId>,
    c: &serde_json::Value,
) -> Result<Value, String> {
    use serde_json::Value as J;
    match c {
        J::Bool(b) => Ok(Value::Bool(*b)),
        J::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("unsupported number {}", n)),
        },
        J::String(s) => Ok(Value::Str(s.clone())),
        J::Object(map) if map.len() == 1 => {
            let Some((kind, v)) = map.iter().next() else {
                return Err("empty constant".to_string());
            };
            match (kind.as_str(), v) {
                ("key", J::String(k)) => Ok(Value::SymbolicKey(k.clone())),
                ("float", J::Number(n)) => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| format!("bad float {}", n)),
                ("nil", _) => Ok(Value::Nil),
                ("graph", J::String(name)) => graphs
                    .get(name)
                    .map(|g| Value::Graph(*g))
                    .ok_or_else(|| format!("unknown graph '{}'", name)),
                ("prim", J::String(name)) => Primitive::from_name(name)
                    .map(Value::Prim)
                    .ok_or_else(|| format!("unknown primitive '{}'", name)),
                _ => Err(format!("unsupported constant {}", c)),
            }
        }
        _ => Err(format!("unsupported constant {}", c)),
    }
}

fn resolve_type(graphs: &HashMap<String, GraphId>, t: &TypeSpec) -> LoadResult<AbstractValue> {
    match t {
        TypeSpec::Name(name) => {
            scalar_type(name).ok_or_else(|| invalid(format!("unknown type '{}'", name)))
        }
        TypeSpec::Tuple { tuple } => Ok(AbstractValue::Tuple(
            tuple.iter().map(|e| resolve_type(graphs, e)).collect::<LoadResult<Vec<_>>>()?,
        )),
        TypeSpec::Array { array } => {
            Ok(AbstractValue::Array(Box::new(resolve_type(graphs, array)?)))
        }
        TypeSpec::Function { targets } => {
            let refs = targets
                .iter()
                .map(|f| resolve_fn(graphs, f))
                .collect::<LoadResult<Vec<_>>>()?;
            Ok(AbstractValue::functions(refs))
        }
    }
}

fn resolve_fn(graphs: &HashMap<String, GraphId>, f: &FnSpec) -> LoadResult<FunctionRef> {
    match f {
        FnSpec::Name(name) if name == "opaque" => Ok(FunctionRef::Opaque),
        FnSpec::Name(name) => {
            if let Some(g) = graphs.get(name) {
                return Ok(FunctionRef::Graph(*g));
            }
            Primitive::from_name(name)
                .map(FunctionRef::Primitive)
                .ok_or_else(|| invalid(format!("unknown function '{}'", name)))
        }
        FnSpec::Partial { partial, args } => {
            let func = resolve_fn(graphs, &FnSpec::Name(partial.clone()))?;
            let args = args
                .iter()
                .map(|a| resolve_type(graphs, a))
                .collect::<LoadResult<Vec<_>>>()?;
            Ok(FunctionRef::Partial { func: Box::new(func), args })
        }
    }
}

fn scalar_type(name: &str) -> Option<AbstractValue> {
    let scalar = |s| Some(AbstractValue::Scalar(s));
    match name {
        "bool" => scalar(ScalarType::Bool),
        "str" => scalar(ScalarType::Str),
        "env" => Some(AbstractValue::Env),
        "nil" => Some(AbstractValue::Nil),
        "symkey" => Some(AbstractValue::SymbolicKey),
        _ => {
            let bits: u8 = name.get(1..)?.parse().ok()?;
            match name.get(..1)? {
                "i" => scalar(ScalarType::Int(bits)),
                "u" => scalar(ScalarType::UInt(bits)),
                "f" => scalar(ScalarType::Float(bits)),
                _ => None,
            }
        }
    }
}

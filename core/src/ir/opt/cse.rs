//! file: core/src/ir/opt/cse.rs
//! description: common subexpression elimination.
//!
//! Nodes are hashed structurally in topological order and bucketed by
//! (hash, owning graph). Inside a bucket the first node is canonical and
//! every later node that is really equal to it is replaced by it:
//! - constants: same value and same type key (`type_key`);
//! - applies: same arity and inputs that are the *same nodes*. Buckets are
//!   processed in topological order, so equal inputs were merged already.
//! Parameters hash by identity and never merge.
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use log::{debug, trace};

use super::{Pass, Resources};
use crate::config::CseConfig;
use crate::error::{InternalError, OptResult};
use crate::ir::absval::{AbstractValue, FunctionRef};
use crate::ir::manager::Manager;
use crate::ir::node::{GraphId, Node, NodeId, NodeKind};
use crate::ir::traverse;

const ISSUER: &str = "graphopt.opt.cse";

/// What tells two equal literals apart: 1.0::f32 is not 1.0::f64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey<'a> {
    Abstract(&'a AbstractValue),
    Typed(&'a FunctionRef),
}

/// A function-typed constant is keyed by its target only when that target is
/// a single typed primitive; other function annotations are not used.
pub fn type_key(node: &Node) -> Option<TypeKey<'_>> {
    match node.abs.as_ref()? {
        AbstractValue::Function(f) => match f.get_unique() {
            Some(t @ FunctionRef::TypedPrimitive { .. }) => Some(TypeKey::Typed(t)),
            _ => None,
        },
        abs => Some(TypeKey::Abstract(abs)),
    }
}

pub type GroupKey = (u64, Option<GraphId>);

/// Group together every node that could be merged. Some members of a group
/// may still turn out to be unmergeable.
pub fn group_nodes(mng: &mut Manager, root: GraphId) -> OptResult<IndexMap<GroupKey, Vec<NodeId>>> {
    mng.add_graph(root);

    let mut hashes: HashMap<NodeId, u64> = HashMap::new();
    let mut groups: IndexMap<GroupKey, Vec<NodeId>> = IndexMap::new();

    for g in mng.reachable_graphs(root) {
        let Some(ret) = mng.graph(g).return_ else { continue };
        for node in traverse::toposort(mng, ret) {
            if hashes.contains_key(&node) {
                continue;
            }
            let n = mng.node(node);
            let mut hasher = DefaultHasher::new();
            match &n.kind {
                NodeKind::Constant(value) => {
                    value.hash(&mut hasher);
                    type_key(n).hash(&mut hasher);
                }
                NodeKind::Apply(inputs) => {
                    for inp in inputs.iter() {
                        let Some(h) = hashes.get(inp) else {
                            return Err(InternalError::at(
                                format!("input {} hashed after its user", inp),
                                ISSUER,
                                node,
                            )
                            .boxed());
                        };
                        h.hash(&mut hasher);
                    }
                    inputs.len().hash(&mut hasher);
                }
                NodeKind::Parameter => node.hash(&mut hasher),
            }
            let h = hasher.finish();
            hashes.insert(node, h);
            groups.entry((h, n.graph)).or_default().push(node);
        }
    }
    Ok(groups)
}

fn mergeable(mng: &Manager, main: NodeId, other: NodeId) -> bool {
    let (a, b) = (mng.node(main), mng.node(other));
    match (&a.kind, &b.kind) {
        (NodeKind::Constant(v1), NodeKind::Constant(v2)) => v1 == v2 && type_key(a) == type_key(b),
        (NodeKind::Apply(in1), NodeKind::Apply(in2)) => {
            in1.len() == in2.len() && in1.iter().zip(in2.iter()).all(|(i1, i2)| i1 == i2)
        }
        _ => false,
    }
}

/// Apply CSE on everything reachable from `root`. Returns whether any node
/// was replaced.
pub fn cse(mng: &mut Manager, root: GraphId) -> OptResult<bool> {
    let groups = group_nodes(mng, root)?;
    let mut replaced = 0usize;

    // `groups` keeps insertion order, which is topological order of each
    // group's first member.
    for (_, group) in groups.iter() {
        let Some((&main, others)) = group.split_first() else { continue };
        for &other in others {
            if !mng.is_live(main) || !mng.is_live(other) {
                continue;
            }
            if mergeable(mng, main, other) {
                trace!("cse: {} -> {}", other, main);
                mng.replace(other, main)?;
                replaced += 1;
            }
        }
    }

    debug!("cse: {} node(s) replaced", replaced);
    Ok(replaced > 0)
}

/// Common subexpression elimination.
#[derive(Debug, Clone)]
pub struct Cse {
    report_changes: bool,
}

impl Cse {
    pub fn new(config: &CseConfig) -> Self {
        Cse { report_changes: config.report_changes }
    }
}

impl Default for Cse {
    fn default() -> Self {
        Cse::new(&CseConfig::default())
    }
}

impl Pass for Cse {
    fn name(&self) -> &'static str {
        "cse"
    }

    fn run(&self, res: &mut Resources, root: GraphId) -> OptResult<bool> {
        let changed = cse(&mut res.manager, root)?;
        Ok(changed && self.report_changes)
    }
}

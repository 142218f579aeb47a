//! file: core/src/ir/opt/dde/mod.rs
//! description: dead data elimination.
//!
//! Finds parts of graph outputs (tuple elements, environment entries, whole
//! return values) that no caller ever reads and replaces the edges holding
//! them with a `DEAD` constant. Whatever computed the part is then released
//! by the manager.
//!
//! - `structure`: where each part of a graph's output is built.
//! - `access`: which call results, and which parts of them, each node needs.
//! - `liveness`: demands per output part and the search from the root.
use log::{debug, trace};

use super::{Pass, Resources};
use crate::config::DdeConfig;
use crate::error::OptResult;
use crate::ir::absval::{AbstractError, AbstractValue};
use crate::ir::manager::Manager;
use crate::ir::node::GraphId;
use crate::ir::value::Value;

pub mod access;
pub mod liveness;
pub mod structure;

pub use self::access::{flatten_call, node_to_paths, Callee, Demand};
pub use self::liveness::{dependencies, find_dead_paths, Liveness};
pub use self::structure::{output_structure, AccessPath, PathKey};

/// Rewrite every dead output part reachable from `root`. Returns the number
/// of edges rewritten.
pub fn eliminate(mng: &mut Manager, root: GraphId) -> OptResult<usize> {
    let missing = find_dead_paths(mng, root)?;
    let mut rewritten = 0usize;

    for (g, edges) in missing {
        // An earlier rewrite may have made the graph unreachable.
        if !mng.contains_graph(g) {
            continue;
        }
        for edge in edges {
            if !mng.is_live(edge.owner) {
                continue;
            }
            let Some(&target) = mng.node(edge.owner).inputs().get(edge.index) else { continue };
            if mng.node(target).value().is_some_and(Value::is_dead) {
                continue;
            }
            let abs = match mng.node(target).abs.clone() {
                Some(a) if a.is_function() => Some(AbstractValue::Error(AbstractError::Dead)),
                other => other,
            };
            let dead = mng.constant_with(Value::Dead, abs);
            trace!("dde: {}[{}] {} -> DEAD", edge.owner, edge.index, target);
            mng.set_edge(edge.owner, edge.index, dead)?;
            rewritten += 1;
        }
    }

    debug!("dde: {} edge(s) rewritten", rewritten);
    Ok(rewritten)
}

/// Dead data elimination.
#[derive(Debug, Clone)]
pub struct DeadDataElimination {
    report_changes: bool,
}

impl DeadDataElimination {
    pub fn new(config: &DdeConfig) -> Self {
        DeadDataElimination { report_changes: config.report_changes }
    }
}

impl Default for DeadDataElimination {
    fn default() -> Self {
        DeadDataElimination::new(&DdeConfig::default())
    }
}

impl Pass for DeadDataElimination {
    fn name(&self) -> &'static str {
        "dde"
    }

    fn run(&self, res: &mut Resources, root: GraphId) -> OptResult<bool> {
        let rewritten = eliminate(&mut res.manager, root)?;
        Ok(rewritten > 0 && self.report_changes)
    }
}

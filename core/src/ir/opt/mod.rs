//! IR optimizer module: common subexpression elimination and dead data
//! elimination over the managed graph, plus a fixed-point driver.
use log::{info, warn};

use crate::config::{OptConfig, PassKind};
use crate::error::OptResult;
use crate::ir::manager::Manager;
use crate::ir::node::GraphId;

pub mod cse;
pub mod dde;

pub use self::cse::Cse;
pub use self::dde::DeadDataElimination;

/// Shared state handed to every pass: the manager owning the IR and the
/// configuration the passes were built from.
#[derive(Debug, Default)]
pub struct Resources {
    pub manager: Manager,
    pub config: OptConfig,
}

impl Resources {
    pub fn new(manager: Manager, config: OptConfig) -> Self {
        Resources { manager, config }
    }
}

/// A whole-program rewrite rooted at one graph. Returns whether the graph
/// changed, as far as the pass is willing to report it.
pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&self, res: &mut Resources, root: GraphId) -> OptResult<bool>;
}

pub fn build_passes(config: &OptConfig) -> Vec<Box<dyn Pass>> {
    config
        .passes
        .iter()
        .map(|kind| -> Box<dyn Pass> {
            match kind {
                PassKind::Cse => Box::new(Cse::new(&config.cse)),
                PassKind::Dde => Box::new(DeadDataElimination::new(&config.dde)),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct OptimizeReport {
    /// One entry per round: (pass name, reported change) in run order.
    pub rounds: Vec<Vec<(&'static str, bool)>>,
    /// False when `max_iterations` ran out before a quiet round.
    pub converged: bool,
}

impl OptimizeReport {
    pub fn iterations(&self) -> usize {
        self.rounds.len()
    }
}

/// Run the configured passes on `root` until a full round reports no change
/// or the iteration limit is reached.
pub fn optimize(res: &mut Resources, root: GraphId) -> OptResult<OptimizeReport> {
    let passes = build_passes(&res.config);
    let max_iterations = res.config.max_iterations.max(1);
    let mut report = OptimizeReport::default();

    for round in 0..max_iterations {
        let mut changed = false;
        let mut row = Vec::with_capacity(passes.len());
        for pass in passes.iter() {
            let c = pass.run(res, root)?;
            row.push((pass.name(), c));
            changed |= c;
        }
        info!(
            "optimize round {}: {}",
            round + 1,
            row.iter().map(|(n, c)| format!("{}={}", n, c)).collect::<Vec<_>>().join(" ")
        );
        report.rounds.push(row);
        if !changed {
            report.converged = true;
            break;
        }
    }

    if !report.converged {
        warn!("optimizer did not converge after {} rounds", max_iterations);
    }
    Ok(report)
}

pub mod config;
pub mod error;
pub mod ir;

pub use config::{CseConfig, DdeConfig, OptConfig, PassKind};
pub use error::{
    ErrorCategory, GraphoptErrorExt, InternalError, InvalidInputError, Level, OptResult,
};
pub use ir::opt::{optimize, Cse, DeadDataElimination, OptimizeReport, Pass, Resources};

pub fn generate_error_report(error: &dyn GraphoptErrorExt) -> String {
    let node = match error.node() {
        Some(n) => n.to_string(),
        None => "unknown node".to_string(),
    };
    format!(
        "GRAPHOPT | {} | {} | {} | {}",
        error.level(),
        error.category(),
        node,
        error.message()
    )
}

/// Run the configured passes on `root` to a fixed point.
pub fn optimize_graph(
    manager: ir::Manager,
    root: ir::GraphId,
    config: OptConfig,
) -> OptResult<(ir::Manager, OptimizeReport)> {
    let mut res = Resources::new(manager, config);
    let report = optimize(&mut res, root)?;
    Ok((res.manager, report))
}

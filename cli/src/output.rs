// cli/src/output.rs
// Output utilities for the CLI
// description: styling, graph dumps and the per-round change table.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use console::Style;

use graphopt_core::ir::{GraphId, Manager};
use graphopt_core::{GraphoptErrorExt, Level, OptimizeReport};

/// Styles for different output elements
pub struct FormatStyle {
    pub title: Style,
    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub success: Style,
}

impl Default for FormatStyle {
    fn default() -> Self {
        FormatStyle {
            title: Style::new().bold().underlined(),
            info: Style::new().cyan(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            success: Style::new().green().bold(),
        }
    }
}

/// Text of every graph reachable from `root`, root first.
pub fn dump_graphs(mng: &Manager, root: GraphId) -> String {
    mng.reachable_graphs(root)
        .into_iter()
        .map(|g| mng.display_graph(g).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One row per round, one column per pass; a cell says whether that pass
/// reported a change in that round.
pub fn rounds_table(report: &OptimizeReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("round")];
    if let Some(first) = report.rounds.first() {
        header.extend(first.iter().map(|(name, _)| Cell::new(name)));
    }
    table.set_header(header);

    for (i, row) in report.rounds.iter().enumerate() {
        let mut cells = vec![Cell::new(i + 1)];
        cells.extend(
            row.iter()
                .map(|(_, changed)| Cell::new(if *changed { "changed" } else { "-" })),
        );
        table.add_row(cells);
    }
    table
}

pub fn summary_line(style: &FormatStyle, report: &OptimizeReport) -> String {
    if report.converged {
        style
            .success
            .apply_to(format!("converged after {} round(s)", report.iterations()))
            .to_string()
    } else {
        style
            .warning
            .apply_to(format!("stopped after {} round(s) without converging", report.iterations()))
            .to_string()
    }
}

pub fn error_line(style: &FormatStyle, err: &dyn GraphoptErrorExt) -> String {
    let s = match err.level() {
        Level::Info => &style.info,
        Level::Warning => &style.warning,
        Level::Error | Level::Critical => &style.error,
    };
    s.apply_to(graphopt_core::generate_error_report(err)).to_string()
}

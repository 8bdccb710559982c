use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::alert::format::{format_amount, format_percent};
use crate::alert::rules::{AlertLevel, Thresholds};
use crate::alert::telegram::ChatSummary;
use crate::metrics::Assessment;
use crate::scheduler::{CycleReport, EntityFailure};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn level_cell(level: AlertLevel) -> Cell {
    let cell = Cell::new(level.to_string());
    match level {
        AlertLevel::Normal => cell.fg(Color::Green),
        AlertLevel::Warning => cell.fg(Color::Yellow),
        AlertLevel::Critical => cell.fg(Color::Red),
    }
}

pub fn render_readings_table(assessments: &[Assessment], thresholds: &Thresholds) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Entity",
        "Kind",
        "Utilization",
        "Level",
        "Supply APY",
        "Total",
        "Available",
        "Debt / Deployed",
    ]);

    for a in assessments {
        let r = &a.reading;
        table.add_row(Row::from(vec![
            Cell::new(&r.display_name),
            Cell::new(r.kind.to_string()),
            Cell::new(format_percent(a.utilization_percent)),
            level_cell(thresholds.classify(a.utilization_percent)),
            Cell::new(format_percent(r.supply_apy_percent)),
            Cell::new(format_amount(r.total_liquidity)),
            Cell::new(format_amount(r.available_liquidity)),
            Cell::new(format_amount(r.total_debt)),
        ]));
    }
    table.to_string()
}

pub fn render_failures_table(failures: &[EntityFailure]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Entity", "Error"]);
    for f in failures {
        table.add_row(Row::from(vec![
            Cell::new(&f.display_name).fg(Color::Red),
            Cell::new(&f.reason),
        ]));
    }
    table.to_string()
}

/// Readings plus, when any entity failed, the failures underneath.
pub fn render_cycle(report: &CycleReport, thresholds: &Thresholds) -> String {
    let mut out = render_readings_table(&report.assessments, thresholds);
    if !report.failures.is_empty() {
        out.push('\n');
        out.push_str(&render_failures_table(&report.failures));
    }
    out
}

pub fn render_chats_table(chats: &[ChatSummary]) -> String {
    let mut table = new_table();
    table.set_header(vec!["", "Chat ID", "Type", "Title"]);
    for chat in chats {
        table.add_row(Row::from(vec![
            Cell::new(chat.marker()),
            Cell::new(chat.id.to_string()),
            Cell::new(&chat.kind),
            Cell::new(&chat.title),
        ]));
    }
    table.to_string()
}

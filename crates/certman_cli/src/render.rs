//! Table rendering for the weekly report.

use certman_core::{WeeklyReport, REPORT_HEADER};
use prettytable::format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR;
use prettytable::{Cell, Row, Table};

pub fn report_table(report: &WeeklyReport) -> String {
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(REPORT_HEADER.iter().map(|title| Cell::new(title)).collect()));
    for row in &report.rows {
        table.add_row(Row::new(row.cells().iter().map(|cell| Cell::new(cell)).collect()));
    }

    format!(
        "Certificates obtained {}\n{}\nTotal certificates obtained: {}\n",
        report.window, table, report.total
    )
}

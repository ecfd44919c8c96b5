//! Output formatting for report rows.

use comfy_table::Table;

use pgextras_core::{Record, Report};

/// Renders rows as an aligned table followed by a row count.
pub fn table(rows: &[Record]) -> String {
    let Some(first) = rows.first() else {
        return "(0 rows)".to_string();
    };

    let mut table = Table::new();
    table.set_header(first.columns());
    for row in rows {
        table.add_row(row.iter().map(|(_, value)| value.unwrap_or("")));
    }

    let noun = if rows.len() == 1 { "row" } else { "rows" };
    format!("{table}\n({} {noun})", rows.len())
}

/// Renders rows as a pretty-printed JSON array of objects.
pub fn json(rows: &[Record]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}

/// Lists every report with its description.
pub fn catalog() -> String {
    let width = Report::ALL
        .iter()
        .map(|r| r.name().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for report in Report::ALL {
        let marker = if report.requires_pg_stat_statements() {
            " (needs pg_stat_statements)"
        } else {
            ""
        };
        out.push_str(&format!(
            "{:width$}  {}{marker}\n",
            report.name(),
            report.description()
        ));
    }
    out
}

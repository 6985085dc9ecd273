//! Display logic for the whois-sweep CLI.
//!
//! This module renders result rows as an aligned table, CSV or JSON, and
//! draws the progress line shown while a sweep is running. Uses only the
//! `console` crate for styling.

use console::{measure_text_width, pad_str, style, Alignment, Term};
use std::time::Duration;
use whois_sweep_lib::{QueryOptions, ResultRow};

// ── Progress ─────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A one-line progress indicator on stderr so stdout stays clean.
///
/// Does nothing when stderr is not a terminal.
pub struct Progress {
    term: Term,
    total: usize,
    completed: usize,
}

impl Progress {
    pub fn start(total: usize) -> Option<Self> {
        let term = Term::stderr();
        if !term.is_term() || total < 2 {
            return None;
        }
        let progress = Self {
            term,
            total,
            completed: 0,
        };
        progress.draw("starting");
        Some(progress)
    }

    /// Record one finished domain.
    pub fn advance(&mut self, domain: &str) {
        self.completed += 1;
        self.draw(domain);
    }

    pub fn finish(self) {
        let _ = self.term.clear_line();
    }

    fn draw(&self, last: &str) {
        let frame = SPINNER_FRAMES[self.completed % SPINNER_FRAMES.len()];
        let _ = self.term.clear_line();
        let _ = self.term.write_str(&format!(
            "{} {} {}",
            style(frame).cyan(),
            style(format!("[{}/{}]", self.completed, self.total)).dim(),
            last
        ));
    }
}

// ── Columns ──────────────────────────────────────────────────────────────────

/// A named column and how to read it from a row.
struct Column {
    header: &'static str,
    value: fn(&ResultRow) -> &str,
}

fn table_columns(options: &QueryOptions) -> Vec<Column> {
    let mut columns = vec![
        Column { header: "Domain", value: |r| r.domain.as_str() },
        Column { header: "Registrar", value: |r| r.registrar.as_str() },
        Column { header: "Expires", value: |r| r.expires.as_str() },
        Column { header: "Days Left", value: |r| r.days_left.as_str() },
    ];
    push_enrichment_columns(&mut columns, options);
    columns
}

fn csv_columns(options: &QueryOptions) -> Vec<Column> {
    let mut columns = vec![
        Column { header: "Domain", value: |r| r.domain.as_str() },
        Column { header: "Registrar", value: |r| r.registrar.as_str() },
        Column { header: "Expires", value: |r| r.expires.as_str() },
        Column { header: "Days Left", value: |r| r.days_left.as_str() },
        Column { header: "Status", value: |r| r.status.as_str() },
    ];
    push_enrichment_columns(&mut columns, options);
    columns.push(Column { header: "Country", value: |r| r.country.as_str() });
    columns
}

fn push_enrichment_columns(columns: &mut Vec<Column>, options: &QueryOptions) {
    if options.include_asn {
        columns.push(Column { header: "ASN", value: |r| r.asn.as_str() });
    }
    if options.include_ipv4 {
        columns.push(Column { header: "IPv4", value: |r| r.ipv4.as_str() });
    }
    if options.include_ipv6 {
        columns.push(Column { header: "IPv6", value: |r| r.ipv6.as_str() });
    }
}

// ── Table ────────────────────────────────────────────────────────────────────

/// Render rows as a bordered text table.
pub fn render_table(rows: &[ResultRow], options: &QueryOptions) -> String {
    let columns = table_columns(options);

    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            rows.iter()
                .map(|row| measure_text_width((column.value)(row)))
                .chain(std::iter::once(column.header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let separator = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let render_line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!(" {} ", pad_str(cell, *width, Alignment::Left, None)))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(separator.clone());
    out.push(render_line(
        columns
            .iter()
            .map(|c| style(c.header).bold().to_string())
            .collect(),
    ));
    out.push(separator.clone());
    for row in rows {
        out.push(render_line(
            columns
                .iter()
                .map(|column| styled_cell(column, row))
                .collect(),
        ));
    }
    out.push(separator);

    out.join("\n")
}

fn styled_cell(column: &Column, row: &ResultRow) -> String {
    let value = (column.value)(row);
    match column.header {
        "Registrar" if row.status == "failed" => style(value).red().to_string(),
        "Days Left" => match value.parse::<i64>() {
            Ok(days) if days < 0 => style(value).red().bold().to_string(),
            Ok(days) if days < 30 => style(value).yellow().to_string(),
            Ok(_) => style(value).green().to_string(),
            Err(_) => value.to_string(),
        },
        _ => value.to_string(),
    }
}

/// Print the table followed by the reasons for any failed rows.
pub fn print_table(rows: &[ResultRow], options: &QueryOptions) {
    println!("{}", render_table(rows, options));

    let failures: Vec<&ResultRow> = rows.iter().filter(|r| r.status == "failed").collect();
    if !failures.is_empty() {
        println!();
        for row in failures {
            println!(
                "  {} {}  {}",
                style("✗").red(),
                row.domain,
                style(&row.error).dim()
            );
        }
    }
}

/// Print a one-line summary of a finished sweep.
pub fn print_summary(total: usize, succeeded: usize, duration: Duration) {
    let failed = total - succeeded;
    let failed_part = if failed > 0 {
        style(format!("{} failed", failed)).red().to_string()
    } else {
        style("0 failed").dim().to_string()
    };
    println!(
        "{} domain{} queried: {}, {} {}",
        total,
        if total == 1 { "" } else { "s" },
        style(format!("{} succeeded", succeeded)).green(),
        failed_part,
        style(format!("({:.1}s)", duration.as_secs_f64())).dim()
    );
}

// ── CSV ──────────────────────────────────────────────────────────────────────

/// Render rows as CSV with a header line.
pub fn render_csv(rows: &[ResultRow], options: &QueryOptions) -> String {
    let columns = csv_columns(options);
    let mut lines = Vec::with_capacity(rows.len() + 1);

    lines.push(
        columns
            .iter()
            .map(|c| csv_field(c.header))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            columns
                .iter()
                .map(|column| csv_field((column.value)(row)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ── JSON ─────────────────────────────────────────────────────────────────────

pub fn render_json(rows: &[ResultRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

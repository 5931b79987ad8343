use std::{fmt::Write as _, io::IsTerminal};

use crate::common::format_count;
use crate::pipeline::RunOutcome;

const BORDER: &str = "+--------------------------------------------+--------------------------+";

struct Palette {
    reset: &'static str,
    bold: &'static str,
    cyan: &'static str,
    green: &'static str,
    yellow: &'static str,
}

impl Palette {
    fn new(use_color: bool) -> Self {
        if use_color {
            Self {
                reset: "\x1b[0m",
                bold: "\x1b[1m",
                cyan: "\x1b[36m",
                green: "\x1b[32m",
                yellow: "\x1b[33m",
            }
        } else {
            Self {
                reset: "",
                bold: "",
                cyan: "",
                green: "",
                yellow: "",
            }
        }
    }
}

fn section(out: &mut String, p: &Palette, title: &str) {
    let _ = writeln!(out, "{}{}{}{}", p.bold, p.cyan, BORDER, p.reset);
    let _ = writeln!(out, "{}{}| {:<42} | {:<24} |{}", p.bold, p.cyan, title, "", p.reset);
    let _ = writeln!(out, "{}{}{}{}", p.bold, p.cyan, BORDER, p.reset);
}

fn line(out: &mut String, label: &str, color: &str, value: &str, reset: &str) {
    let _ = writeln!(out, "| {:<42} | {}{:<24}{} |", label, color, value, reset);
}

pub fn render_run_report(outcome: &RunOutcome, use_color: bool) -> String {
    let p = Palette::new(use_color);
    let mut out = String::new();

    out.push('\n');
    section(&mut out, &p, "KARNATAKA MASTER DATASET BUILD");
    for stats in &outcome.sources {
        let color = if stats.rows_skipped > 0 { p.yellow } else { p.green };
        let value = format!(
            "{} kept / {} skipped",
            format_count(stats.rows_kept()),
            format_count(stats.rows_skipped)
        );
        line(&mut out, &format!("Source {}", stats.kind), color, &value, p.reset);
    }

    section(&mut out, &p, "ROWS BY DATA TYPE");
    for (data_type, count) in &outcome.counts_by_type {
        line(&mut out, data_type.as_str(), "", &format_count(*count), "");
    }
    line(
        &mut out,
        "Total rows written",
        p.green,
        &format_count(outcome.rows_written),
        p.reset,
    );
    line(
        &mut out,
        "District aliases/patterns in matcher",
        "",
        &format_count(outcome.alias_patterns),
        "",
    );
    if let Some(pairs) = outcome.overlap_pairs {
        line(
            &mut out,
            "KPME/OSM overlap candidates",
            p.yellow,
            &format_count(pairs),
            p.reset,
        );
    }
    let _ = writeln!(out, "{}{}{}{}", p.bold, p.cyan, BORDER, p.reset);

    let _ = writeln!(out, "  unified csv:    {}", outcome.master_csv.display());
    let _ = writeln!(out, "  summary csv:    {}", outcome.summary_csv.display());
    if let Some(path) = &outcome.parquet_output {
        let _ = writeln!(out, "  parquet:        {}", path.display());
    }
    if let Some(path) = &outcome.quality_report {
        let _ = writeln!(out, "  quality report: {}", path.display());
    }
    if let Some(path) = &outcome.overlap_report {
        let _ = writeln!(out, "  overlap report: {}", path.display());
    }
    out
}

pub fn print_run_report(outcome: &RunOutcome) {
    let use_color = std::io::stdout().is_terminal();
    println!("{}", render_run_report(outcome, use_color));
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use path_slash::PathExt;

use crate::coverage::model::{CoverageData, CoverageSummary, FileCoverage, LineStatus};

const SUCCESS_THRESHOLD: f64 = 85.0;
const WARNING_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct PrintOpts {
    pub root: PathBuf,
    pub max_files: Option<u32>,
    pub markers: MarkerSelection,
    pub max_cols: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MarkerSelection {
    #[default]
    None,
    All,
    File(String),
}

/// Drops files the include/exclude globs reject. The summary is left as
/// parsed: it is the report-wide truth and already differs from the sum of
/// per-file maps whenever the report carried records outside any file.
pub fn filter_data(
    data: CoverageData,
    root: &Path,
    includes: &[String],
    excludes: &[String],
) -> CoverageData {
    let include_set = build_globset(includes);
    let exclude_set = build_globset(excludes);
    let files = data
        .files
        .into_iter()
        .filter(|(filename, _file)| {
            let rel = path_rel_posix(filename, root);
            let included = include_set.as_ref().map_or(true, |s| s.is_match(&rel));
            let excluded = exclude_set.as_ref().map_or(false, |s| s.is_match(&rel));
            included && !excluded
        })
        .collect::<BTreeMap<_, _>>();
    CoverageData {
        files,
        summary: data.summary,
    }
}

pub fn format_summary(data: &CoverageData) -> String {
    let summary = &data.summary;
    let mut out = format!(
        "Lines: {:.1}% ({}/{})",
        summary.line_rate * 100.0,
        summary.lines_covered,
        summary.lines_total
    );
    if summary.branches_total > 0 {
        out.push_str(&format!(
            "\nBranches: {:.1}% ({}/{})",
            summary.branch_rate * 100.0,
            summary.branches_covered,
            summary.branches_total
        ));
    }
    out
}

pub fn format_file_table(data: &CoverageData, opts: &PrintOpts) -> String {
    let mut rows: Vec<&FileCoverage> = data.files.values().collect();
    rows.sort_by(|a, b| {
        a.line_rate
            .partial_cmp(&b.line_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let rows = apply_max_files(rows, opts.max_files)
        .into_iter()
        .map(|file| (path_rel_posix(&file.filename, &opts.root), file))
        .collect::<Vec<_>>();

    let max_name_len = rows
        .iter()
        .map(|(name, _file)| name.chars().count().saturating_add(1))
        .max()
        .unwrap_or(0);
    let (file_width, uncovered_width) = compute_table_widths(max_name_len, opts.max_cols);
    let header_file_width = file_width.saturating_sub(1);

    let dash = format!(
        "{}|---------|----------|{}",
        "-".repeat(file_width),
        "-".repeat(uncovered_width)
    );
    let header = format!(
        "{:<header_file_width$} | % Lines | % Branch |{}",
        "File",
        fill_cell("Uncovered Line #s", uncovered_width, 1)
    );

    let layout = RowLayout {
        indent_file: true,
        file_width,
        uncovered_width,
    };
    let mut report = vec![dash.clone(), header, dash.clone()];
    report.push(render_table_row(
        "All files",
        data.summary.line_rate * 100.0,
        (data.summary.branches_total > 0).then_some(data.summary.branch_rate * 100.0),
        "",
        RowLayout {
            indent_file: false,
            ..layout
        },
    ));
    for (name, file) in rows {
        let has_branch_lines = file.lines.values().any(|line| line.is_branch);
        report.push(render_table_row(
            &name,
            file.line_rate * 100.0,
            has_branch_lines.then_some(file.branch_rate * 100.0),
            &render_uncovered_line_numbers(file),
            layout,
        ));
    }
    report.push(dash);
    report.join("\n")
}

/// Picks the files a `--markers` listing covers. A bare name matches on
/// path suffix so `--markers=Button.js` finds `src/components/Button.js`
/// without also catching `MyButton.js`.
pub fn marker_files<'a>(
    data: &'a CoverageData,
    selection: &MarkerSelection,
    root: &Path,
) -> Vec<&'a FileCoverage> {
    match selection {
        MarkerSelection::None => vec![],
        MarkerSelection::All => data.files.values().collect(),
        MarkerSelection::File(name) => {
            let want = name.replace('\\', "/");
            data.files
                .values()
                .filter(|file| {
                    let rel = path_rel_posix(&file.filename, root);
                    rel == want || rel.ends_with(&format!("/{want}"))
                })
                .collect()
        }
    }
}

/// One row per recorded line, the terminal stand-in for editor gutter
/// markers.
pub fn format_line_markers(file: &FileCoverage, root: &Path) -> String {
    let mut out = vec![
        bold(&path_rel_posix(&file.filename, root)),
        format!("{:>6}  {:<9}  {:>6}  Conditions", "Line", "Status", "Hits"),
    ];
    for line in file.lines.values() {
        let conditions = line.condition_coverage.as_deref().unwrap_or("");
        out.push(
            format!(
                "{:>6}  {}  {:>6}  {}",
                line.line_number,
                status_cell(line.status()),
                line.hits,
                conditions,
            )
            .trim_end()
            .to_string(),
        );
    }
    out.join("\n")
}

/// The aggregate line for a multi-config run, shaped like the original
/// status readout: `Overall: 72.7% (1/2 configs)`.
pub fn format_config_totals(
    configs_with_coverage: usize,
    configs_total: usize,
    totals: &CoverageSummary,
) -> String {
    let pct = totals.line_rate * 100.0;
    if configs_with_coverage == configs_total {
        format!("Overall: {pct:.1}% ({configs_total} configs)")
    } else {
        format!("Overall: {pct:.1}% ({configs_with_coverage}/{configs_total} configs)")
    }
}

pub fn tint_pct(pct: f64, text: &str) -> String {
    if pct >= SUCCESS_THRESHOLD {
        ansi_rgb("#22c55e", text)
    } else if pct >= WARNING_THRESHOLD {
        ansi_rgb("#eab308", text)
    } else {
        ansi_rgb("#ff2323", text)
    }
}

#[derive(Debug, Clone, Copy)]
struct RowLayout {
    indent_file: bool,
    file_width: usize,
    uncovered_width: usize,
}

fn render_table_row(
    file_label: &str,
    line_pct: f64,
    branch_pct: Option<f64>,
    uncovered: &str,
    layout: RowLayout,
) -> String {
    let leader_spaces = usize::from(layout.indent_file);
    let file_cell = fill_cell(file_label, layout.file_width, leader_spaces);
    let line_text = fmt_pct(line_pct);
    let branch_text = branch_pct.map_or_else(|| "N/A".to_string(), fmt_pct);
    let row_pct = branch_pct.map_or(line_pct, |pct| line_pct.min(pct));

    let file_cell = tint_pct(row_pct, &file_cell);
    let line_cell = tint_pct(line_pct, &format!(" {line_text:>7} "));
    let branch_cell = tint_pct(
        branch_pct.unwrap_or(line_pct),
        &format!(" {branch_text:>8} "),
    );
    let uncovered_cell = tint_pct(row_pct, &fill_cell(uncovered, layout.uncovered_width, 1));
    format!("{file_cell}|{line_cell}|{branch_cell}|{uncovered_cell}")
}

fn render_uncovered_line_numbers(file: &FileCoverage) -> String {
    let uncovered_lines = file
        .lines
        .values()
        .filter_map(|line| (line.hits == 0).then_some(line.line_number))
        .collect::<Vec<_>>();
    if uncovered_lines.is_empty() {
        return String::new();
    }
    let mut parts: Vec<String> = vec![];
    let mut i = 0usize;
    while i < uncovered_lines.len() {
        let start = uncovered_lines[i];
        let mut end = start;
        while i + 1 < uncovered_lines.len() && uncovered_lines[i + 1] == end + 1 {
            i += 1;
            end = uncovered_lines[i];
        }
        if start == end {
            parts.push(format!("{start}"));
        } else {
            parts.push(format!("{start}-{end}"));
        }
        i += 1;
    }
    parts.join(",")
}

fn compute_table_widths(max_name_len: usize, max_cols: usize) -> (usize, usize) {
    let file_width = max_name_len.saturating_add(1).max(9 + 1);
    let fixed = 9usize + 10usize + 3usize;
    let min_uncovered = 19usize;

    if max_cols > fixed + min_uncovered {
        let desired = max_cols.saturating_sub(fixed + file_width);
        (file_width, desired.max(min_uncovered))
    } else {
        (file_width, min_uncovered)
    }
}

fn fill_cell(text: &str, width: usize, leading_spaces: usize) -> String {
    let leader = " ".repeat(leading_spaces.min(width));
    let remaining = width.saturating_sub(leader.chars().count());
    if remaining == 0 {
        return leader;
    }

    let text_len = text.chars().count();
    if text_len <= remaining {
        let pad = " ".repeat(remaining - text_len);
        return format!("{leader}{text}{pad}");
    }

    let ellipsis = "...";
    let tail_len = remaining.saturating_sub(ellipsis.chars().count());
    let tail = text
        .chars()
        .rev()
        .take(tail_len)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<String>();
    format!("{leader}{ellipsis}{tail}")
}

fn fmt_pct(pct: f64) -> String {
    let v = if pct.is_finite() { pct } else { 0.0 };
    let floored = (v * 100.0).floor() / 100.0;
    let fixed = format!("{floored:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn apply_max_files<'a>(
    mut files: Vec<&'a FileCoverage>,
    max: Option<u32>,
) -> Vec<&'a FileCoverage> {
    let Some(m) = max else {
        return files;
    };
    files.truncate((m.max(1)) as usize);
    files
}

fn build_globset(globs: &[String]) -> Option<GlobSet> {
    if globs.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for g in globs {
        if let Ok(glob) = Glob::new(g) {
            builder.add(glob);
        }
    }
    builder.build().ok()
}

fn path_rel_posix(abs_or_rel: &str, root: &Path) -> String {
    let p = Path::new(abs_or_rel);
    let rel = p
        .strip_prefix(root)
        .ok()
        .and_then(|x| x.to_str())
        .unwrap_or(abs_or_rel);
    Path::new(rel).to_slash_lossy().to_string()
}

fn status_cell(status: LineStatus) -> String {
    match status {
        LineStatus::Covered => ansi_rgb("#22c55e", &format!("{:<9}", "covered")),
        LineStatus::Partial => ansi_rgb("#eab308", &format!("{:<9}", "partial")),
        LineStatus::Uncovered => ansi_rgb("#ff2323", &format!("{:<9}", "uncovered")),
    }
}

fn bold(text: &str) -> String {
    if !colors_enabled() {
        return text.to_string();
    }
    format!("\u{1b}[1m{text}\u{1b}[22m")
}

fn colors_enabled() -> bool {
    let no_color = !std::env::var("NO_COLOR")
        .ok()
        .unwrap_or_default()
        .trim()
        .is_empty();
    if no_color {
        return false;
    }
    let forced = !std::env::var("FORCE_COLOR")
        .ok()
        .unwrap_or_default()
        .trim()
        .is_empty();
    crate::format::terminal::is_output_terminal() || forced
}

fn ansi_rgb(hex: &str, text: &str) -> String {
    if !colors_enabled() {
        return text.to_string();
    }
    let (r, g, b) = parse_hex_rgb(hex).unwrap_or((255, 255, 255));
    format!("\u{1b}[38;2;{r};{g};{b}m{text}\u{1b}[0m")
}

fn parse_hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let normalized = hex.trim().trim_start_matches('#');
    let full = match normalized.len() {
        3 => normalized.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => normalized.to_string(),
        _ => return None,
    };
    let r = u8::from_str_radix(&full[0..2], 16).ok()?;
    let g = u8::from_str_radix(&full[2..4], 16).ok()?;
    let b = u8::from_str_radix(&full[4..6], 16).ok()?;
    Some((r, g, b))
}

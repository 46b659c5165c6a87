use std::collections::BTreeMap;
use std::path::Path;

use lcov::Reader;
use lcov::Record;

use crate::coverage::model::{CoverageData, FileCoverage, LineCoverage, SummaryTally, rate};
use crate::coverage::resolve_report_path;

#[derive(Debug, Clone)]
struct LcovFileBuf {
    filename: String,
    lines: BTreeMap<u32, LineCoverage>,
}

#[derive(Debug, Default)]
struct LcovParseState {
    current: Option<LcovFileBuf>,
    files: BTreeMap<String, FileCoverage>,
    tally: SummaryTally,
}

pub fn read_lcov_file(path: &Path, base_dir: Option<&Path>, verbose: bool) -> Option<CoverageData> {
    if !path.exists() {
        if verbose {
            eprintln!("markerlamp: no lcov report at {}", path.display());
        }
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(text) => Some(parse_lcov_text(&text, base_dir)),
        Err(err) => {
            eprintln!("markerlamp: failed to read {}: {err}", path.display());
            None
        }
    }
}

pub fn parse_lcov_text(text: &str, base_dir: Option<&Path>) -> CoverageData {
    let state = Reader::new(text.as_bytes()).filter_map(Result::ok).fold(
        LcovParseState::default(),
        |mut state, record| {
            match record {
                Record::SourceFile { path } => {
                    // An unterminated previous file is dropped, not flushed.
                    state.current = Some(LcovFileBuf {
                        filename: resolve_report_path(&path.to_string_lossy(), base_dir),
                        lines: BTreeMap::new(),
                    });
                }
                Record::LineData { line, count, .. } => {
                    let hits = count.min(u64::from(u32::MAX)) as u32;
                    // The summary counts every DA record, including ones
                    // that arrive before any SF and never reach a file.
                    state.tally = state.tally.record_line(hits);
                    if let Some(buf) = state.current.as_mut() {
                        buf.lines.insert(
                            line,
                            LineCoverage {
                                line_number: line,
                                hits,
                                is_branch: false,
                                condition_coverage: None,
                            },
                        );
                    }
                }
                Record::BranchData { line, taken, .. } => {
                    let covered = matches!(taken, Some(t) if t > 0);
                    state.tally = state.tally.record_branches(u32::from(covered), 1);
                    if let Some(buf) = state.current.as_mut()
                        && let Some(entry) = buf.lines.get_mut(&line)
                    {
                        entry.is_branch = true;
                    }
                }
                Record::EndOfRecord => {
                    flush_current(&mut state);
                }
                _ => {}
            }
            state
        },
    );

    // A trailing file with no end_of_record never reaches the map.
    CoverageData {
        files: state.files,
        summary: state.tally.into_summary(),
    }
}

fn flush_current(state: &mut LcovParseState) {
    let Some(buf) = state.current.take() else {
        return;
    };
    let file = FileCoverage {
        filename: buf.filename,
        line_rate: 0.0,
        branch_rate: 0.0,
        lines: buf.lines,
    };
    let file = FileCoverage {
        line_rate: rate(file.lines_covered(), file.lines_total()),
        ..file
    };
    state.files.insert(file.filename.clone(), file);
}

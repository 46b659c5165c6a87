use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::str;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::coverage::condition::condition_counts;
use crate::coverage::model::{CoverageData, FileCoverage, LineCoverage, SummaryTally};
use crate::coverage::resolve_report_path;

#[derive(Debug)]
struct ClassBuf {
    filename: String,
    line_rate: f64,
    branch_rate: f64,
    lines: BTreeMap<u32, LineCoverage>,
}

pub fn read_cobertura_file(
    path: &Path,
    base_dir: Option<&Path>,
    verbose: bool,
) -> Option<CoverageData> {
    if !path.exists() {
        if verbose {
            eprintln!("markerlamp: no cobertura report at {}", path.display());
        }
        return None;
    }
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("markerlamp: failed to read {}: {err}", path.display());
            return None;
        }
    };
    parse_cobertura_text(&text, base_dir)
}

/// Parses Cobertura XML into coverage data. The document must have a
/// `<coverage>` root; anything else, including XML that fails mid-stream,
/// is reported on stderr and yields `None` rather than a partial model.
pub fn parse_cobertura_text(text: &str, base_dir: Option<&Path>) -> Option<CoverageData> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut saw_root = false;
    let mut files: BTreeMap<String, FileCoverage> = BTreeMap::new();
    let mut current: Option<ClassBuf> = None;
    let mut in_methods = false;
    let mut tally = SummaryTally::default();

    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf);
        let is_empty_element = matches!(&event, Ok(Event::Empty(_)));
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if !saw_root {
                    if e.name().as_ref() != b"coverage" {
                        eprintln!("markerlamp: cobertura report has no coverage root element");
                        return None;
                    }
                    saw_root = true;
                } else {
                    match e.name().as_ref() {
                        b"class" => {
                            let attrs = attr_map(e);
                            // Classes without a filename are skipped entirely,
                            // lines included.
                            current = attrs.get("filename").map(|filename| ClassBuf {
                                filename: resolve_report_path(filename, base_dir),
                                line_rate: float_attr(&attrs, "line-rate"),
                                branch_rate: float_attr(&attrs, "branch-rate"),
                                lines: BTreeMap::new(),
                            });
                            in_methods = false;
                            // A self-closing class never gets an End event.
                            if is_empty_element
                                && let Some(class) = current.take()
                            {
                                store_class(&mut files, class);
                            }
                        }
                        b"methods" if !is_empty_element => {
                            in_methods = true;
                        }
                        // Istanbul repeats line elements under each method;
                        // only the class-level lines block counts.
                        b"line" if !in_methods => {
                            if let Some(class) = current.as_mut() {
                                let attrs = attr_map(e);
                                tally = record_line(class, &attrs, tally);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"class" => {
                    if let Some(class) = current.take() {
                        store_class(&mut files, class);
                    }
                }
                b"methods" => {
                    in_methods = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                eprintln!("markerlamp: failed to parse cobertura report: {err}");
                return None;
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        eprintln!("markerlamp: cobertura report has no coverage root element");
        return None;
    }

    Some(CoverageData {
        files,
        summary: tally.into_summary(),
    })
}

fn record_line(
    class: &mut ClassBuf,
    attrs: &HashMap<String, String>,
    tally: SummaryTally,
) -> SummaryTally {
    let hits = attrs
        .get("hits")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0);
    let is_branch = attrs.get("branch").is_some_and(|v| v == "true");
    let condition_coverage = attrs.get("condition-coverage").cloned();

    // The summary counts every line element, even one whose number does
    // not parse and therefore never lands in the per-file map.
    let mut tally = tally.record_line(hits);
    if is_branch
        && let Some(text) = condition_coverage.as_deref()
        && let Some((covered, total)) = condition_counts(text)
    {
        tally = tally.record_branches(covered, total);
    }

    if let Some(line_number) = attrs.get("number").and_then(|v| v.parse::<u32>().ok()) {
        class.lines.insert(
            line_number,
            LineCoverage {
                line_number,
                hits,
                is_branch,
                condition_coverage,
            },
        );
    }
    tally
}

// Repeated filenames across packages keep the last class seen.
fn store_class(files: &mut BTreeMap<String, FileCoverage>, class: ClassBuf) {
    files.insert(
        class.filename.clone(),
        FileCoverage {
            filename: class.filename,
            line_rate: class.line_rate,
            branch_rate: class.branch_rate,
            lines: class.lines,
        },
    );
}

fn float_attr(attrs: &HashMap<String, String>, key: &str) -> f64 {
    attrs
        .get(key)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn attr_map(e: &BytesStart) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}

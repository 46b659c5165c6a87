use std::path::{Path, PathBuf};
use std::time::Instant;

use path_slash::PathExt;
use serde::Serialize;

use crate::args::ParsedArgs;
use crate::config::{self, KarmaConfig, ReportKind};
use crate::coverage::model::{CoverageData, CoverageSummary, SummaryTally};
use crate::coverage::print::{self, PrintOpts};
use crate::coverage::select::select_coverage;
use crate::diagnostics_trace;

#[derive(Debug)]
pub(crate) struct SourceOutcome {
    pub config_path: Option<PathBuf>,
    pub coverage: Option<CoverageData>,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    root: String,
    sources: Vec<SourceReport<'a>>,
    totals: CoverageSummary,
}

#[derive(Debug, Serialize)]
struct SourceReport<'a> {
    config: Option<String>,
    coverage: &'a CoverageData,
}

/// One full pass: resolve sources, parse, render. Returns the process
/// exit code; every call parses from scratch.
pub fn run_report(repo_root: &Path, args: &ParsedArgs) -> i32 {
    let started_at = Instant::now();
    let outcomes = collect_outcomes(repo_root, args);
    let sources_total = outcomes.len();
    let with_coverage = outcomes
        .iter()
        .filter(|outcome| outcome.coverage.is_some())
        .count();
    let parse_outcomes = outcomes
        .iter()
        .map(|outcome| {
            serde_json::json!({
                "config": outcome
                    .config_path
                    .as_ref()
                    .map(|path| display_rel(path, repo_root)),
                "covered": outcome.coverage.is_some(),
                "lines_total": outcome
                    .coverage
                    .as_ref()
                    .map(|data| data.summary.lines_total),
            })
        })
        .collect::<Vec<_>>();

    let code = if args.json {
        println!("{}", render_json(repo_root, &outcomes));
        i32::from(with_coverage == 0)
    } else if with_coverage == 0 {
        if sources_total == 0 {
            eprintln!(
                "markerlamp: no karma configs with coverage settings under {}",
                repo_root.to_string_lossy()
            );
        } else {
            eprintln!("markerlamp: no coverage data found; run tests to generate reports");
        }
        1
    } else {
        print_text_report(repo_root, args, outcomes);
        0
    };

    diagnostics_trace::maybe_write_run_trace(
        repo_root,
        args,
        Some(started_at),
        serde_json::json!({
            "sources": parse_outcomes,
            "sources_with_coverage": with_coverage,
            "exit_code": code,
        }),
    );
    code
}

/// The files whose changes should trigger a watch rerun: the reports
/// themselves plus the configs that point at them. Candidate paths that
/// do not exist yet stay in the set so their creation is noticed.
pub fn watch_paths(repo_root: &Path, args: &ParsedArgs) -> Vec<PathBuf> {
    let mut paths = [&args.cobertura_path, &args.lcov_path]
        .into_iter()
        .flatten()
        .map(PathBuf::from)
        .collect::<Vec<_>>();
    if !paths.is_empty() {
        return paths;
    }

    let config_paths = match &args.config_path {
        Some(explicit) => vec![PathBuf::from(explicit)],
        None => config::discover_karma_configs(repo_root),
    };
    for path in config_paths {
        if let Ok(config) = config::load_karma_config(&path, false) {
            [ReportKind::Cobertura, ReportKind::Lcov]
                .into_iter()
                .filter_map(|kind| config::coverage_file_path(&config, kind))
                .for_each(|report| paths.push(report));
            paths.push(config.config_path);
        }
    }
    paths.sort();
    paths.dedup();
    paths
}

pub(crate) fn collect_outcomes(repo_root: &Path, args: &ParsedArgs) -> Vec<SourceOutcome> {
    if args.cobertura_path.is_some() || args.lcov_path.is_some() {
        let cobertura = args.cobertura_path.as_ref().map(PathBuf::from);
        let lcov = args.lcov_path.as_ref().map(PathBuf::from);
        let coverage = select_coverage(
            cobertura.as_deref(),
            lcov.as_deref(),
            Some(repo_root),
            args.verbose,
        );
        return vec![SourceOutcome {
            config_path: None,
            coverage,
        }];
    }

    resolve_configs(repo_root, args)
        .into_iter()
        .map(|config| {
            let cobertura = config::coverage_file_path(&config, ReportKind::Cobertura);
            let lcov = config::coverage_file_path(&config, ReportKind::Lcov);
            let base_dir = config.config_path.parent().map(Path::to_path_buf);
            if args.verbose {
                eprintln!(
                    "markerlamp: config={} coverage_dir={:?} cobertura={:?} lcov={:?}",
                    config.config_path.to_string_lossy(),
                    config.coverage_dir,
                    cobertura,
                    lcov
                );
            }
            let coverage = select_coverage(
                cobertura.as_deref(),
                lcov.as_deref(),
                base_dir.as_deref(),
                args.verbose,
            );
            SourceOutcome {
                config_path: Some(config.config_path),
                coverage,
            }
        })
        .collect()
}

fn resolve_configs(repo_root: &Path, args: &ParsedArgs) -> Vec<KarmaConfig> {
    if let Some(explicit) = &args.config_path {
        return match config::load_karma_config(Path::new(explicit), args.verbose) {
            Ok(config) => vec![config],
            Err(err) => {
                eprintln!("markerlamp: {err}");
                vec![]
            }
        };
    }

    let mut configs: Vec<KarmaConfig> = vec![];
    for path in config::discover_karma_configs(repo_root) {
        match config::load_karma_config(&path, args.verbose) {
            Ok(config) => {
                if config.coverage_dir.is_some() {
                    configs.push(config);
                } else if args.verbose {
                    eprintln!(
                        "markerlamp: {} has no coverage reporter, skipping",
                        path.to_string_lossy()
                    );
                }
            }
            Err(err) => eprintln!("markerlamp: {err}"),
        }
    }
    configs
}

fn print_text_report(repo_root: &Path, args: &ParsedArgs, outcomes: Vec<SourceOutcome>) {
    let opts = PrintOpts {
        root: repo_root.to_path_buf(),
        max_files: args.max_files,
        markers: args.markers.clone(),
        max_cols: crate::format::terminal::detect_terminal_size_cols_rows()
            .map_or(120, |(cols, _rows)| cols as usize),
    };
    let multi = outcomes.len() > 1;
    let total_configs = outcomes.len();
    let mut covered_configs = 0usize;
    let mut totals = SummaryTally::default();

    let mut first = true;
    for outcome in outcomes {
        if !first {
            println!();
        }
        first = false;

        if multi && let Some(config_path) = &outcome.config_path {
            println!("{}", display_rel(config_path, repo_root));
        }
        let Some(data) = outcome.coverage else {
            if multi {
                println!("no coverage files found");
            }
            continue;
        };
        covered_configs += 1;
        totals = totals.absorb(&data.summary);

        let filtered = print::filter_data(data, &opts.root, &args.include_globs, &args.exclude_globs);
        println!("{}", print::format_summary(&filtered));
        println!();
        println!("{}", print::format_file_table(&filtered, &opts));
        for file in print::marker_files(&filtered, &opts.markers, &opts.root) {
            println!();
            println!("{}", print::format_line_markers(file, &opts.root));
        }
    }

    if multi && covered_configs > 0 {
        println!();
        println!(
            "{}",
            print::format_config_totals(covered_configs, total_configs, &totals.into_summary())
        );
    }
}

pub(crate) fn render_json(repo_root: &Path, outcomes: &[SourceOutcome]) -> String {
    let sources = outcomes
        .iter()
        .filter_map(|outcome| {
            outcome.coverage.as_ref().map(|coverage| SourceReport {
                config: outcome
                    .config_path
                    .as_ref()
                    .map(|path| display_rel(path, repo_root)),
                coverage,
            })
        })
        .collect::<Vec<_>>();
    let totals = sources
        .iter()
        .fold(SummaryTally::default(), |acc, source| {
            acc.absorb(&source.coverage.summary)
        })
        .into_summary();
    let report = RunReport {
        root: repo_root.to_slash_lossy().to_string(),
        sources,
        totals,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}

fn display_rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_slash_lossy()
        .to_string()
}

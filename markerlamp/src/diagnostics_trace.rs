use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::args::ParsedArgs;

#[derive(Debug, Clone, Serialize)]
pub struct RunTrace {
    pub schema_version: u32,
    pub tool_version: &'static str,
    pub repo_root: String,
    pub started_at_unix_ms: Option<u128>,
    pub elapsed_ms: Option<u128>,
    pub args: ArgsSummary,
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArgsSummary {
    pub ci: bool,
    pub verbose: bool,
    pub watch: bool,
    pub json: bool,
    pub markers: String,
    pub max_files: Option<u32>,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub cobertura_path: Option<String>,
    pub lcov_path: Option<String>,
    pub config_path: Option<String>,
    pub workspace_root: Option<String>,
}

fn diagnostics_dir() -> Option<PathBuf> {
    std::env::var("MARKERLAMP_DIAGNOSTICS_DIR")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

pub fn maybe_write_run_trace(
    repo_root: &Path,
    args: &ParsedArgs,
    started_at: Option<Instant>,
    extra: serde_json::Value,
) {
    let Some(dir) = diagnostics_dir() else {
        return;
    };
    let _ = std::fs::create_dir_all(&dir);
    let trace_path = dir.join("run_trace.json");

    let started_at_unix_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis());
    let elapsed_ms = started_at.map(|t| t.elapsed().as_millis());

    let trace = RunTrace {
        schema_version: 1,
        tool_version: crate::core_version(),
        repo_root: repo_root.to_string_lossy().to_string(),
        started_at_unix_ms,
        elapsed_ms,
        args: ArgsSummary {
            ci: args.ci,
            verbose: args.verbose,
            watch: args.watch,
            json: args.json,
            markers: format!("{:?}", args.markers),
            max_files: args.max_files,
            include_globs: args.include_globs.clone(),
            exclude_globs: args.exclude_globs.clone(),
            cobertura_path: args.cobertura_path.clone(),
            lcov_path: args.lcov_path.clone(),
            config_path: args.config_path.clone(),
            workspace_root: args.workspace_root.clone(),
        },
        extra,
    };

    if let Ok(file) = std::fs::File::create(trace_path) {
        let _ = serde_json::to_writer_pretty(file, &trace);
    }
}

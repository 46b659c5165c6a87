pub fn help_text() -> &'static str {
    r#"markerlamp

Usage:
  markerlamp [--cobertura=<path>] [--lcov=<path>] [--markers[=<file>]] [flags...]

Reads karma coverage reports (Cobertura XML or LCOV text) and prints
per-file and per-line coverage. Without explicit report paths, karma
configs are discovered under the workspace root and their
coverageReporter settings point at the report files.

Flags:
  -h, --help                 Print help
  --cobertura=<path>         Read this Cobertura XML report (skips discovery)
  --lcov=<path>              Read this LCOV report (skips discovery)
  --config=<path>            Use one karma config instead of discovery
  --root=<dir>               Workspace root override (default: git root of cwd)
  --include=<glob,...>       Include globs for the file table (comma-separated)
  --exclude=<glob,...>       Exclude globs for the file table (comma-separated)
  --max-files=<n>            Max files shown in the file table
  --markers[=<file>]         Per-line markers for every file, or for one file
  --json                     Emit the coverage model as JSON
  --watch[=true|false]       Re-run when reports or configs change (polling)
  --ci[=true|false]          CI mode (no watch; sets CI=1)
  --verbose[=true|false]     More markerlamp diagnostics

Exit codes:
  0  coverage found and rendered
  1  no coverage data
  2  usage error

Notes:
  Cobertura is preferred when both report kinds exist; results are never
  merged across formats.
"#
}

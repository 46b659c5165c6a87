use std::path::Path;

use crate::coverage::cobertura::read_cobertura_file;
use crate::coverage::lcov::read_lcov_file;
use crate::coverage::model::CoverageData;

/// Cobertura wins when both formats are readable; the loser is never
/// parsed, and results are never merged.
pub fn select_coverage(
    cobertura: Option<&Path>,
    lcov: Option<&Path>,
    base_dir: Option<&Path>,
    verbose: bool,
) -> Option<CoverageData> {
    if let Some(path) = cobertura
        && let Some(data) = read_cobertura_file(path, base_dir, verbose)
    {
        return Some(data);
    }
    lcov.and_then(|path| read_lcov_file(path, base_dir, verbose))
}

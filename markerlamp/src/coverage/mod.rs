use std::path::Path;

use path_slash::PathExt;

pub mod cobertura;
pub mod condition;
pub mod lcov;
pub mod model;
pub mod print;
pub mod select;


/// Report paths are keyed as written in the report, except that relative
/// paths are joined onto the report's base directory (the karma config dir)
/// when one is known. Joined paths use forward slashes on every platform.
pub fn resolve_report_path(raw: &str, base_dir: Option<&Path>) -> String {
    let path = Path::new(raw);
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path).to_slash_lossy().to_string(),
        _ => raw.to_string(),
    }
}

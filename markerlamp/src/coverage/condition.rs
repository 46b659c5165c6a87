use once_cell::sync::Lazy;
use regex::Regex;

static CONDITION_COUNTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)/(\d+)").unwrap());

static CONDITION_PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").unwrap());

/// Pulls the covered/total condition counts out of a Cobertura
/// `condition-coverage` value, e.g. `"50% (1/2)"` -> `(1, 2)`. Values
/// without a `covered/total` pair carry no usable branch data and yield
/// `None`.
pub fn condition_counts(text: &str) -> Option<(u32, u32)> {
    let caps = CONDITION_COUNTS_RE.captures(text)?;
    let covered = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let total = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some((covered, total))
}

pub fn condition_percent(text: &str) -> Option<f64> {
    let caps = CONDITION_PERCENT_RE.captures(text)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::coverage::condition;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCoverage {
    pub line_number: u32,
    pub hits: u32,
    pub is_branch: bool,
    pub condition_coverage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub filename: String,
    pub line_rate: f64,
    pub branch_rate: f64,
    pub lines: BTreeMap<u32, LineCoverage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub lines_covered: u32,
    pub lines_total: u32,
    pub line_rate: f64,
    pub branches_covered: u32,
    pub branches_total: u32,
    pub branch_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageData {
    pub files: BTreeMap<String, FileCoverage>,
    pub summary: CoverageSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Covered,
    Partial,
    Uncovered,
}

impl LineCoverage {
    /// Classifies a line for marker rendering. A branch line with hits but
    /// an incomplete condition-coverage percentage is `Partial`; a branch
    /// line whose percentage cannot be read counts as fully covered.
    pub fn status(&self) -> LineStatus {
        if self.hits == 0 {
            return LineStatus::Uncovered;
        }
        if self.is_branch
            && let Some(text) = self.condition_coverage.as_deref()
            && let Some(pct) = condition::condition_percent(text)
            && pct < 100.0
        {
            return LineStatus::Partial;
        }
        LineStatus::Covered
    }
}

impl FileCoverage {
    pub fn lines_covered(&self) -> u32 {
        (self
            .lines
            .values()
            .filter(|line| line.hits > 0)
            .count()
            .min(u32::MAX as usize)) as u32
    }

    pub fn lines_total(&self) -> u32 {
        (self.lines.len().min(u32::MAX as usize)) as u32
    }
}

/// Running totals threaded through a parse as a plain value; the summary
/// reflects every record seen, including records for files that were later
/// overwritten or never closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryTally {
    pub lines_covered: u32,
    pub lines_total: u32,
    pub branches_covered: u32,
    pub branches_total: u32,
}

impl SummaryTally {
    pub fn record_line(self, hits: u32) -> Self {
        Self {
            lines_total: self.lines_total.saturating_add(1),
            lines_covered: self
                .lines_covered
                .saturating_add(u32::from(hits > 0)),
            ..self
        }
    }

    pub fn record_branches(self, covered: u32, total: u32) -> Self {
        Self {
            branches_covered: self.branches_covered.saturating_add(covered),
            branches_total: self.branches_total.saturating_add(total),
            ..self
        }
    }

    pub fn absorb(self, summary: &CoverageSummary) -> Self {
        Self {
            lines_covered: self.lines_covered.saturating_add(summary.lines_covered),
            lines_total: self.lines_total.saturating_add(summary.lines_total),
            branches_covered: self
                .branches_covered
                .saturating_add(summary.branches_covered),
            branches_total: self.branches_total.saturating_add(summary.branches_total),
        }
    }

    pub fn into_summary(self) -> CoverageSummary {
        CoverageSummary {
            lines_covered: self.lines_covered,
            lines_total: self.lines_total,
            line_rate: rate(self.lines_covered, self.lines_total),
            branches_covered: self.branches_covered,
            branches_total: self.branches_total,
            branch_rate: rate(self.branches_covered, self.branches_total),
        }
    }
}

pub fn rate(covered: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

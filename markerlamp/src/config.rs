use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::Deserialize;

use crate::error::MarkerlampError;

pub(crate) mod jsonish;


/// Karma writes one report per configured reporter; only these two carry
/// per-line data this tool can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Cobertura,
    Lcov,
}

impl ReportKind {
    pub fn reporter_name(self) -> &'static str {
        match self {
            ReportKind::Cobertura => "cobertura",
            ReportKind::Lcov => "lcov",
        }
    }

    pub fn default_file(self) -> &'static str {
        match self {
            ReportKind::Cobertura => "cobertura-coverage.xml",
            ReportKind::Lcov => "lcov.info",
        }
    }
}

/// The `coverageReporter` block as it appears in a karma config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReporterBlock {
    pub dir: Option<String>,
    #[serde(default)]
    pub reporters: Vec<CoverageReporterEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReporterEntry {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subdir: Option<String>,
    pub file: Option<String>,
}

/// One discovered karma config plus whatever coverage settings could be
/// read out of it statically.
#[derive(Debug, Clone, Default)]
pub struct KarmaConfig {
    pub config_path: PathBuf,
    pub coverage_dir: Option<String>,
    pub reporters: Vec<CoverageReporterEntry>,
}

const CONFIG_SCAN_LIMIT: usize = 20;

pub fn find_repo_root(start: &Path) -> PathBuf {
    git2::Repository::discover(start)
        .ok()
        .and_then(|repo| repo.workdir().map(|workdir| workdir.to_path_buf()))
        .unwrap_or_else(|| start.to_path_buf())
}

/// Walks the tree under `root` for karma-style config files, any name
/// ending in `conf.js`. Capped so a giant monorepo cannot stall startup.
pub fn discover_karma_configs(root: &Path) -> Vec<PathBuf> {
    let mut configs = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(|entry| entry.file_name().to_str() != Some("node_modules"))
        .build()
        .map_while(Result::ok)
        .filter(|dent| dent.file_type().is_some_and(|file_type| file_type.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with("conf.js"))
        })
        .collect::<Vec<_>>();
    configs.sort();
    configs.truncate(CONFIG_SCAN_LIMIT);
    configs
}

/// Reads coverage settings out of a karma config without executing it.
/// A config whose `coverageReporter` block cannot be extracted or parsed
/// still loads, with no coverage settings attached.
pub fn load_karma_config(path: &Path, verbose: bool) -> Result<KarmaConfig, MarkerlampError> {
    let raw = std::fs::read_to_string(path).map_err(|source| MarkerlampError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(literal) = jsonish::extract_object_literal(&raw, "coverageReporter") else {
        return Ok(KarmaConfig {
            config_path: path.to_path_buf(),
            ..KarmaConfig::default()
        });
    };
    match parse_reporter_block(path, &literal) {
        Ok(block) => Ok(KarmaConfig {
            config_path: path.to_path_buf(),
            coverage_dir: block.dir,
            reporters: block.reporters,
        }),
        Err(err) => {
            if verbose {
                eprintln!("markerlamp: {err}");
            }
            Ok(KarmaConfig {
                config_path: path.to_path_buf(),
                ..KarmaConfig::default()
            })
        }
    }
}

fn parse_reporter_block(
    path: &Path,
    literal: &str,
) -> Result<CoverageReporterBlock, MarkerlampError> {
    jsonish::parse_jsonish::<CoverageReporterBlock>(literal).map_err(|err| {
        MarkerlampError::ConfigParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })
}

/// Resolves where the report for `kind` should sit on disk, or `None`
/// when the config never writes one. Relative dirs are taken against
/// the config file's own directory, matching how karma resolves them.
pub fn coverage_file_path(config: &KarmaConfig, kind: ReportKind) -> Option<PathBuf> {
    let dir = config.coverage_dir.as_deref()?;
    let reporter = config
        .reporters
        .iter()
        .find(|entry| entry.kind.as_deref() == Some(kind.reporter_name()))?;
    let file = reporter
        .file
        .clone()
        .unwrap_or_else(|| kind.default_file().to_string());
    let mut path = PathBuf::from(dir);
    if let Some(subdir) = reporter.subdir.as_deref()
        && !subdir.is_empty()
        && subdir != "."
    {
        path.push(subdir);
    }
    path.push(file);
    if path.is_relative()
        && let Some(config_dir) = config.config_path.parent()
    {
        return Some(config_dir.join(path));
    }
    Some(path)
}

pub fn coverage_file_exists(config: &KarmaConfig) -> bool {
    [ReportKind::Cobertura, ReportKind::Lcov]
        .into_iter()
        .filter_map(|kind| coverage_file_path(config, kind))
        .any(|path| path.exists())
}

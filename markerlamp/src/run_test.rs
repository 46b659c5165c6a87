use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use crate::args::ParsedArgs;
use crate::coverage::lcov::parse_lcov_text;
use crate::run::{SourceOutcome, collect_outcomes, render_json, watch_paths};

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn karma_config_with_reporters() -> &'static str {
    r#"module.exports = function (config) {
  config.set({
    coverageReporter: {
      dir: 'coverage/',
      reporters: [
        { type: 'cobertura', subdir: '.' },
        { type: 'lcov', subdir: '.' }
      ]
    }
  });
};
"#
}

#[test]
fn explicit_report_paths_bypass_discovery() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("lcov.info");
    write_file(&report, "SF:src/a.js\nDA:1,1\nend_of_record\n");
    // A config on disk that explicit paths must ignore.
    write_file(
        &dir.path().join("karma.conf.js"),
        karma_config_with_reporters(),
    );

    let args = ParsedArgs {
        lcov_path: Some(report.to_string_lossy().to_string()),
        ..ParsedArgs::default()
    };
    let outcomes = collect_outcomes(dir.path(), &args);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].config_path, None);
    let data = outcomes[0].coverage.as_ref().unwrap();
    let expected = dir.path().join("src/a.js");
    assert!(data.files.contains_key(&expected.to_string_lossy().to_string()));
}

#[test]
fn discovery_yields_one_outcome_per_config_with_coverage() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir.path().join("packages/a/karma.conf.js"),
        karma_config_with_reporters(),
    );
    write_file(
        &dir.path().join("packages/a/coverage/lcov.info"),
        "SF:src/a.js\nDA:1,1\nend_of_record\n",
    );
    write_file(
        &dir.path().join("packages/b/karma.conf.js"),
        karma_config_with_reporters(),
    );
    write_file(
        &dir.path().join("packages/c/karma.conf.js"),
        "module.exports = function (config) { config.set({ port: 9876 }); };",
    );

    let outcomes = collect_outcomes(dir.path(), &ParsedArgs::default());

    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[0].config_path.as_deref(),
        Some(dir.path().join("packages/a/karma.conf.js").as_path())
    );
    assert!(outcomes[0].coverage.is_some());
    assert!(outcomes[1].coverage.is_none());
}

#[test]
fn explicit_config_flag_loads_only_that_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("packages/a/karma.conf.js");
    write_file(&config, karma_config_with_reporters());
    write_file(
        &dir.path().join("packages/b/karma.conf.js"),
        karma_config_with_reporters(),
    );

    let args = ParsedArgs {
        config_path: Some(config.to_string_lossy().to_string()),
        ..ParsedArgs::default()
    };
    let outcomes = collect_outcomes(dir.path(), &args);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].config_path.as_deref(), Some(config.as_path()));
}

#[test]
fn json_report_keeps_only_sources_with_coverage() {
    let root = PathBuf::from("/repo");
    let outcomes = vec![
        SourceOutcome {
            config_path: Some(root.join("packages/a/karma.conf.js")),
            coverage: Some(parse_lcov_text(
                "SF:/repo/src/a.js\nDA:1,1\nDA:2,0\nend_of_record\n",
                None,
            )),
        },
        SourceOutcome {
            config_path: Some(root.join("packages/b/karma.conf.js")),
            coverage: None,
        },
    ];

    let value: Value = serde_json::from_str(&render_json(&root, &outcomes)).unwrap();
    assert_eq!(value["root"], "/repo");
    let sources = value["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["config"], "packages/a/karma.conf.js");
    assert_eq!(sources[0]["coverage"]["summary"]["linesCovered"], 1);
    assert_eq!(value["totals"]["linesTotal"], 2);
}

#[test]
fn json_report_is_valid_with_no_sources() {
    let value: Value = serde_json::from_str(&render_json(Path::new("/repo"), &[])).unwrap();
    assert_eq!(value["root"], "/repo");
    assert!(value["sources"].as_array().unwrap().is_empty());
    assert_eq!(value["totals"]["linesTotal"], 0);
}

#[test]
fn watch_set_is_explicit_reports_when_given() {
    let args = ParsedArgs {
        cobertura_path: Some("out/cobertura.xml".to_string()),
        lcov_path: Some("out/lcov.info".to_string()),
        ..ParsedArgs::default()
    };
    let paths = watch_paths(Path::new("/repo"), &args);
    assert_eq!(
        paths,
        vec![
            PathBuf::from("out/cobertura.xml"),
            PathBuf::from("out/lcov.info")
        ]
    );
}

#[test]
fn watch_set_covers_configs_and_candidate_reports() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("karma.conf.js");
    write_file(&config, karma_config_with_reporters());
    write_file(
        &dir.path().join("coverage/lcov.info"),
        "SF:a.js\nDA:1,1\nend_of_record\n",
    );

    let paths = watch_paths(dir.path(), &ParsedArgs::default());

    assert_eq!(paths.len(), 3);
    assert!(paths.contains(&config));
    assert!(paths.contains(&dir.path().join("coverage/lcov.info")));
    // The cobertura candidate is watched even though nothing wrote it yet.
    assert!(paths.contains(&dir.path().join("coverage/cobertura-coverage.xml")));
}

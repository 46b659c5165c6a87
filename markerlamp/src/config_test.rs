use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{
    CoverageReporterEntry, KarmaConfig, ReportKind, coverage_file_exists, coverage_file_path,
    discover_karma_configs, find_repo_root, load_karma_config,
};
use crate::error::MarkerlampError;

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn reporter(kind: &str, subdir: Option<&str>, file: Option<&str>) -> CoverageReporterEntry {
    CoverageReporterEntry {
        kind: Some(kind.to_string()),
        subdir: subdir.map(str::to_string),
        file: file.map(str::to_string),
    }
}

#[test]
fn discovery_finds_conf_js_files_sorted() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("karma.conf.js"), "// root");
    write_file(&dir.path().join("packages/app/karma.conf.js"), "// app");
    write_file(
        &dir.path().join("packages/lib/my-lib-karma.conf.js"),
        "// lib",
    );
    write_file(&dir.path().join("node_modules/pkg/karma.conf.js"), "// dep");
    write_file(&dir.path().join("src/index.js"), "// not a config");

    let configs = discover_karma_configs(dir.path());
    assert_eq!(configs.len(), 3);
    assert_eq!(configs[0], dir.path().join("karma.conf.js"));
    assert!(configs.iter().all(|p| !p.to_string_lossy().contains("node_modules")));
}

#[test]
fn discovery_honors_gitignore_inside_a_repo() {
    let dir = TempDir::new().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    write_file(&dir.path().join(".gitignore"), "dist/\n");
    write_file(&dir.path().join("karma.conf.js"), "// kept");
    write_file(&dir.path().join("dist/karma.conf.js"), "// ignored");

    let configs = discover_karma_configs(dir.path());
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0], dir.path().join("karma.conf.js"));
}

#[test]
fn discovery_caps_the_config_count() {
    let dir = TempDir::new().unwrap();
    for i in 0..25 {
        write_file(&dir.path().join(format!("cfg{i:02}-conf.js")), "//");
    }
    assert_eq!(discover_karma_configs(dir.path()).len(), 20);
}

#[test]
fn load_reads_the_coverage_reporter_block() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("karma.conf.js");
    write_file(
        &path,
        r#"
module.exports = function (config) {
  config.set({
    frameworks: ['jasmine'],
    coverageReporter: {
      dir: 'coverage/',
      reporters: [
        { type: 'html', subdir: 'html' },
        { type: 'cobertura', subdir: '.', file: 'cobertura-coverage.xml' },
        { type: 'lcov', subdir: 'lcov' }
      ]
    },
    reporters: ['progress', 'coverage']
  });
};
"#,
    );

    let config = load_karma_config(&path, false).unwrap();
    assert_eq!(config.config_path, path);
    assert_eq!(config.coverage_dir.as_deref(), Some("coverage/"));
    assert_eq!(config.reporters.len(), 3);
    assert_eq!(config.reporters[1].kind.as_deref(), Some("cobertura"));
    assert_eq!(config.reporters[2].subdir.as_deref(), Some("lcov"));
}

#[test]
fn load_without_block_yields_bare_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("karma.conf.js");
    write_file(&path, "module.exports = function (config) { config.set({ port: 9876 }); };");

    let config = load_karma_config(&path, false).unwrap();
    assert_eq!(config.config_path, path);
    assert_eq!(config.coverage_dir, None);
    assert!(config.reporters.is_empty());
}

#[test]
fn load_with_unreadable_block_falls_back_to_bare_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("karma.conf.js");
    write_file(
        &path,
        "config.set({ coverageReporter: { dir: outputDir, reporters: [] } });",
    );

    let config = load_karma_config(&path, false).unwrap();
    assert_eq!(config.coverage_dir, None);
    assert!(config.reporters.is_empty());
}

#[test]
fn load_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_karma_config(&dir.path().join("absent.conf.js"), false).unwrap_err();
    assert!(matches!(err, MarkerlampError::Io { .. }));
}

#[test]
fn report_paths_resolve_against_the_config_dir() {
    let config = KarmaConfig {
        config_path: PathBuf::from("/repo/packages/app/karma.conf.js"),
        coverage_dir: Some("coverage/".to_string()),
        reporters: vec![
            reporter("cobertura", Some("."), None),
            reporter("lcov", Some("lcov"), None),
        ],
    };

    assert_eq!(
        coverage_file_path(&config, ReportKind::Cobertura),
        Some(PathBuf::from(
            "/repo/packages/app/coverage/cobertura-coverage.xml"
        ))
    );
    assert_eq!(
        coverage_file_path(&config, ReportKind::Lcov),
        Some(PathBuf::from("/repo/packages/app/coverage/lcov/lcov.info"))
    );
}

#[test]
fn report_paths_keep_absolute_dirs_and_custom_files() {
    let config = KarmaConfig {
        config_path: PathBuf::from("/repo/karma.conf.js"),
        coverage_dir: Some("/var/out".to_string()),
        reporters: vec![reporter("cobertura", None, Some("cob.xml"))],
    };
    assert_eq!(
        coverage_file_path(&config, ReportKind::Cobertura),
        Some(PathBuf::from("/var/out/cob.xml"))
    );
}

#[test]
fn report_path_is_none_without_dir_or_matching_reporter() {
    let no_dir = KarmaConfig {
        config_path: PathBuf::from("/repo/karma.conf.js"),
        coverage_dir: None,
        reporters: vec![reporter("lcov", None, None)],
    };
    assert_eq!(coverage_file_path(&no_dir, ReportKind::Lcov), None);

    let html_only = KarmaConfig {
        config_path: PathBuf::from("/repo/karma.conf.js"),
        coverage_dir: Some("coverage/".to_string()),
        reporters: vec![reporter("html", Some("html"), None)],
    };
    assert_eq!(coverage_file_path(&html_only, ReportKind::Cobertura), None);
    assert_eq!(coverage_file_path(&html_only, ReportKind::Lcov), None);
}

#[test]
fn coverage_file_exists_checks_both_kinds() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("coverage/lcov/lcov.info"), "SF:a.js\nend_of_record\n");

    let config = KarmaConfig {
        config_path: dir.path().join("karma.conf.js"),
        coverage_dir: Some("coverage/".to_string()),
        reporters: vec![
            reporter("cobertura", Some("."), None),
            reporter("lcov", Some("lcov"), None),
        ],
    };
    assert!(coverage_file_exists(&config));

    let missing = KarmaConfig {
        config_path: dir.path().join("karma.conf.js"),
        coverage_dir: Some("elsewhere/".to_string()),
        reporters: vec![reporter("lcov", None, None)],
    };
    assert!(!coverage_file_exists(&missing));
}

#[test]
fn repo_root_falls_back_to_the_start_dir() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    assert_eq!(find_repo_root(&nested), nested);
}

#[test]
fn repo_root_is_the_git_workdir() {
    let dir = TempDir::new().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    let nested = dir.path().join("packages/app");
    fs::create_dir_all(&nested).unwrap();

    let found = find_repo_root(&nested);
    assert_eq!(
        found.canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

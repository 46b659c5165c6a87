use std::fs;
use std::path::Path;

use markerlamp::coverage::select::select_coverage;
use path_slash::PathExt;
use tempfile::TempDir;

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn seed_both_reports(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let cobertura = dir.path().join("coverage/cobertura-coverage.xml");
    let lcov = dir.path().join("coverage/lcov.info");
    write_file(
        &cobertura,
        r#"<coverage><packages><package><classes>
            <class name="A" filename="src/from-xml.js" line-rate="1">
              <lines><line number="1" hits="1"/></lines>
            </class>
        </classes></package></packages></coverage>"#,
    );
    write_file(&lcov, "SF:src/from-lcov.js\nDA:1,1\nend_of_record\n");
    (cobertura, lcov)
}

#[test]
fn cobertura_wins_over_lcov() {
    let dir = TempDir::new().unwrap();
    let (cobertura, lcov) = seed_both_reports(&dir);

    let data = select_coverage(Some(&cobertura), Some(&lcov), Some(dir.path()), false).unwrap();
    let expected = dir.path().join("src/from-xml.js").to_slash_lossy().to_string();
    assert!(data.files.contains_key(&expected));
    assert_eq!(data.files.len(), 1);
}

#[test]
fn broken_cobertura_falls_back_to_lcov() {
    let dir = TempDir::new().unwrap();
    let (cobertura, lcov) = seed_both_reports(&dir);
    fs::write(&cobertura, "<report>not a coverage root</report>").unwrap();

    let data = select_coverage(Some(&cobertura), Some(&lcov), Some(dir.path()), false).unwrap();
    let expected = dir.path().join("src/from-lcov.js").to_slash_lossy().to_string();
    assert!(data.files.contains_key(&expected));
}

#[test]
fn nothing_readable_yields_none() {
    let dir = TempDir::new().unwrap();
    let cobertura = dir.path().join("coverage/cobertura-coverage.xml");
    let lcov = dir.path().join("coverage/lcov.info");
    assert!(select_coverage(Some(&cobertura), Some(&lcov), Some(dir.path()), false).is_none());
}

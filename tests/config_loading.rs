// tests/config_loading.rs

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::{tempdir, NamedTempFile};
use freshen::config::{default_config_path, load_and_validate, load_from_path, parse_str};
use freshen::errors::FreshenError;
use freshen::types::ExcludeMatchMode;

const FULL_CONFIG: &str = r#"
[watch]
path = "src"
timeout_ms = 150
recursive = false
description = "blog"

[templates]
search_paths = ["src/layouts", "src/partials"]

[pipeline.styles]
source = "src/scss"
source_extensions = [".scss", "sass"]
target = "public/css"
target_extension = ".css"
exclude = ["_"]
exclude_match = ["prefix", "glob"]
flatten = true

[pipeline.pages]
source = "src/pages"
source_extensions = [".njk"]
target = "public"
target_extension = ".html"
templates = true
"#;

fn expect_config_error(contents: &str, needle: &str) {
    match parse_str(contents, "/root") {
        Err(FreshenError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {:?} lacks {:?}", msg, needle)
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn full_config_round_trips_into_requests() {
    let cfg = parse_str(FULL_CONFIG, "/blog").unwrap();

    assert_eq!(cfg.watch.path, PathBuf::from("src"));
    assert_eq!(cfg.watch.timeout(), Duration::from_millis(150));
    assert!(!cfg.watch.recursive);
    assert_eq!(cfg.watch.description, "blog");
    assert_eq!(
        cfg.search_paths(),
        vec![
            PathBuf::from("/blog/src/layouts"),
            PathBuf::from("/blog/src/partials"),
        ]
    );

    let styles = &cfg.pipelines()["styles"];
    assert_eq!(
        styles.exclude_match,
        vec![ExcludeMatchMode::Prefix, ExcludeMatchMode::Glob]
    );
    assert!(styles.flatten);
    assert!(!styles.templates);
    assert!(cfg.pipelines()["pages"].templates);

    let request = cfg.classify_request(styles).unwrap();
    assert_eq!(request.source_dir, PathBuf::from("/blog/src/scss"));
    assert_eq!(request.target_dir, PathBuf::from("/blog/public/css"));
    assert!(request.flatten);
    assert!(request.exclude.is_excluded("_vars.scss", "_vars.scss"));
}

#[test]
fn defaults_apply_to_omitted_sections() {
    let cfg = parse_str(
        r#"
[pipeline.docs]
source = "docs"
source_extensions = ["md"]
target = "site"
target_extension = "html"
"#,
        "/r",
    )
    .unwrap();

    assert_eq!(cfg.watch.path, PathBuf::from("."));
    assert_eq!(cfg.watch.timeout_ms, 200);
    assert!(cfg.watch.recursive);
    assert!(cfg.templates.search_paths.is_empty());

    let docs = &cfg.pipelines()["docs"];
    assert!(docs.exclude.is_empty());
    assert!(!docs.flatten);
    let request = cfg.classify_request(docs).unwrap();
    assert_eq!(request.exclude.modes(), &[ExcludeMatchMode::Exact]);
}

#[test]
fn absolute_paths_are_not_rebased() {
    let cfg = parse_str(
        r#"
[pipeline.abs]
source = "/var/src"
source_extensions = [".md"]
target = "../out"
target_extension = ".html"
"#,
        "/home/me/site",
    )
    .unwrap();

    let request = cfg.classify_request(&cfg.pipelines()["abs"]).unwrap();
    assert_eq!(request.source_dir, PathBuf::from("/var/src"));
    assert_eq!(request.target_dir, PathBuf::from("/home/me/out"));
}

#[test]
fn missing_pipelines_are_rejected() {
    expect_config_error("[watch]\ntimeout_ms = 10\n", "at least one");
}

#[test]
fn zero_timeout_is_rejected() {
    expect_config_error(
        r#"
[watch]
timeout_ms = 0

[pipeline.a]
source = "s"
source_extensions = [".x"]
target = "t"
target_extension = ".y"
"#,
        "timeout_ms",
    );
}

#[test]
fn empty_extensions_are_rejected() {
    expect_config_error(
        r#"
[pipeline.a]
source = "s"
source_extensions = ["", "."]
target = "t"
target_extension = ".y"
"#,
        "source_extensions",
    );
    expect_config_error(
        r#"
[pipeline.a]
source = "s"
source_extensions = [".x"]
target = "t"
target_extension = ""
"#,
        "target_extension",
    );
}

#[test]
fn bad_exclude_glob_is_rejected_at_load_time() {
    expect_config_error(
        r#"
[pipeline.a]
source = "s"
source_extensions = [".x"]
target = "t"
target_extension = ".y"
exclude = ["[oops"]
exclude_match = ["glob"]
"#,
        "pipeline 'a'",
    );
}

#[test]
fn unknown_match_mode_is_a_toml_error() {
    let result = parse_str(
        r#"
[pipeline.a]
source = "s"
source_extensions = [".x"]
target = "t"
target_extension = ".y"
exclude_match = ["fuzzy"]
"#,
        "/r",
    );
    assert!(matches!(result, Err(FreshenError::TomlError(_))));
}

#[test]
fn load_and_validate_roots_paths_at_the_config_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Freshen.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.root(), dir.path());
    assert_eq!(
        cfg.resolve(Path::new("src/scss")),
        dir.path().join("src/scss")
    );
}

#[test]
fn load_from_path_skips_validation() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[watch]\ntimeout_ms = 0\n").unwrap();

    let raw = load_from_path(file.path()).unwrap();
    assert_eq!(raw.watch.timeout_ms, 0);
    assert!(raw.pipeline.is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    match load_and_validate(&path) {
        Err(FreshenError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected Io error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn default_config_file_name() {
    assert_eq!(default_config_path(), PathBuf::from("Freshen.toml"));
}

// tests/template_staleness.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use freshen::fs::mock::MockFileSystem;
use freshen::errors::FreshenError;
use freshen::fs::FileSystem;
use freshen::templates::{ReferenceKind, TemplateGraph};
use freshen_test_utils::failing_fs::FailingStatFs;
use freshen_test_utils::init_tracing;
use serde_json::json;

fn graph_with(fs: &MockFileSystem, search_paths: &[&str]) -> TemplateGraph {
    let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
    TemplateGraph::new(fs, search_paths.iter().map(PathBuf::from).collect())
}

fn site_with_layout(page_mtime: u64, base_mtime: u64) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/site/pages/index.njk",
        "{% extends \"base.njk\" %}\n{% block content %}hi{% endblock %}",
        page_mtime,
    );
    fs.add_file("/site/layouts/base.njk", "<html>{% block content %}{% endblock %}</html>", base_mtime);
    fs
}

#[test]
fn newer_parent_makes_page_stale() {
    init_tracing();
    let fs = site_with_layout(100, 200);
    let mut graph = graph_with(&fs, &["/site/layouts"]);

    let pages = Path::new("/site/pages");
    assert!(graph.is_stale(pages, "index.njk", 150).unwrap());
    assert_eq!(
        graph.stale_cause(pages, "index.njk", 150).unwrap(),
        Some(PathBuf::from("/site/layouts/base.njk"))
    );

    let record = graph.get(Path::new("/site/pages/index.njk")).unwrap();
    assert_eq!(
        record.changed_ancestor,
        Some(PathBuf::from("/site/layouts/base.njk"))
    );
}

#[test]
fn page_is_fresh_when_everything_predates_reference() {
    let fs = site_with_layout(100, 200);
    let mut graph = graph_with(&fs, &["/site/layouts"]);

    assert!(!graph.is_stale(Path::new("/site/pages"), "index.njk", 250).unwrap());
    let record = graph.get(Path::new("/site/pages/index.njk")).unwrap();
    assert_eq!(record.changed_ancestor, None);
}

#[test]
fn equal_timestamp_is_not_stale() {
    let fs = site_with_layout(100, 200);
    let mut graph = graph_with(&fs, &["/site/layouts"]);

    assert!(!graph.is_stale(Path::new("/site/pages"), "index.njk", 200).unwrap());
}

#[test]
fn page_itself_newer_is_its_own_cause() {
    let fs = site_with_layout(300, 100);
    let mut graph = graph_with(&fs, &["/site/layouts"]);

    let cause = graph.stale_cause(Path::new("/site/pages"), "index.njk", 200).unwrap();
    assert_eq!(cause, Some(PathBuf::from("/site/pages/index.njk")));
    let record = graph.get(Path::new("/site/pages/index.njk")).unwrap();
    assert_eq!(record.changed_ancestor, None);
}

#[test]
fn staleness_is_transitive_through_the_extends_chain() {
    let fs = MockFileSystem::new();
    fs.add_file("/t/c.njk", "{% extends 'b.njk' %}", 100);
    fs.add_file("/t/b.njk", "{% extends 'a.njk' %}", 100);
    fs.add_file("/t/a.njk", "root", 300);
    let mut graph = graph_with(&fs, &["/t"]);

    let cause = graph.stale_cause(Path::new("/t"), "c.njk", 200).unwrap();
    assert_eq!(cause, Some(PathBuf::from("/t/a.njk")));
    assert_eq!(
        graph.extends_chain(Path::new("/t"), "c.njk").unwrap(),
        vec![
            PathBuf::from("/t/c.njk"),
            PathBuf::from("/t/b.njk"),
            PathBuf::from("/t/a.njk"),
        ]
    );
}

#[test]
fn newer_include_makes_page_stale() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/pages/about.njk", "{% include \"nav.njk\" %} body", 100);
    fs.add_file("/site/partials/nav.njk", "<nav/>", 300);
    let mut graph = graph_with(&fs, &["/site/partials"]);

    let cause = graph.stale_cause(Path::new("/site/pages"), "about.njk", 200).unwrap();
    assert_eq!(cause, Some(PathBuf::from("/site/partials/nav.njk")));

    let record = graph.get(Path::new("/site/pages/about.njk")).unwrap();
    assert!(record.includes_extracted());
    assert_eq!(record.includes.len(), 1);
    assert_eq!(record.includes[0].last_modified, 300);
}

#[test]
fn include_of_an_ancestor_propagates_to_the_page() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/pages/index.njk", "{% extends 'base.njk' %}", 100);
    fs.add_file(
        "/site/layouts/base.njk",
        "<body>{% include 'footer.njk' ignore missing %}</body>",
        100,
    );
    fs.add_file("/site/layouts/footer.njk", "(c)", 400);
    let mut graph = graph_with(&fs, &["/site/layouts"]);

    let cause = graph.stale_cause(Path::new("/site/pages"), "index.njk", 200).unwrap();
    assert_eq!(cause, Some(PathBuf::from("/site/layouts/footer.njk")));
}

#[test]
fn unresolved_parent_is_a_warning_not_an_error() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/pages/lost.njk", "{% extends 'nowhere.njk' %}", 100);
    let mut graph = graph_with(&fs, &["/site/layouts"]);

    assert!(!graph.is_stale(Path::new("/site/pages"), "lost.njk", 200).unwrap());

    let warnings = graph.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, ReferenceKind::Extends);
    assert_eq!(warnings[0].reference, "nowhere.njk");
    assert_eq!(warnings[0].template, PathBuf::from("/site/pages/lost.njk"));
}

#[test]
fn unresolved_include_is_skipped_with_a_warning() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/pages/p.njk", "{% include 'gone.njk' %}", 100);
    let mut graph = graph_with(&fs, &[]);

    assert!(!graph.is_stale(Path::new("/site/pages"), "p.njk", 200).unwrap());
    let record = graph.get(Path::new("/site/pages/p.njk")).unwrap();
    assert!(record.includes.is_empty());
    assert_eq!(graph.warnings()[0].kind, ReferenceKind::Include);
}

#[test]
fn missing_page_is_an_error() {
    let fs = MockFileSystem::new();
    let mut graph = graph_with(&fs, &[]);

    assert!(graph.is_stale(Path::new("/site/pages"), "absent.njk", 0).is_err());
}

#[test]
fn extends_cycle_stops_with_a_warning() {
    let fs = MockFileSystem::new();
    fs.add_file("/t/a.njk", "{% extends 'b.njk' %}", 10);
    fs.add_file("/t/b.njk", "{% extends 'a.njk' %}", 10);
    let mut graph = graph_with(&fs, &["/t"]);

    assert!(!graph.is_stale(Path::new("/t"), "a.njk", 100).unwrap());
    assert!(graph.warnings().iter().any(|w| w.reason.contains("cycle")));
}

#[test]
fn same_basename_in_different_directories_does_not_collide() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/blog/post.njk", "{% extends 'base.njk' %}", 10);
    fs.add_file("/site/blog/base.njk", "blog layout", 500);
    fs.add_file("/site/docs/page.njk", "{% extends 'base.njk' %}", 10);
    fs.add_file("/site/docs/base.njk", "docs layout", 50);
    let mut graph = graph_with(&fs, &[]);

    assert!(graph.is_stale(Path::new("/site/blog"), "post.njk", 100).unwrap());
    assert!(!graph.is_stale(Path::new("/site/docs"), "page.njk", 100).unwrap());

    assert!(graph.get(Path::new("/site/blog/base.njk")).is_some());
    assert!(graph.get(Path::new("/site/docs/base.njk")).is_some());
    assert_eq!(graph.len(), 4);
}

#[test]
fn search_paths_are_tried_in_order_before_own_dir() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/pages/p.njk", "{% extends 'base.njk' %}", 10);
    fs.add_file("/site/pages/base.njk", "local", 10);
    fs.add_file("/site/second/base.njk", "second", 10);
    fs.add_file("/site/first/base.njk", "first", 10);
    let graph = graph_with(&fs, &["/site/first", "/site/second"]);

    let found = graph.resolve("base.njk", Path::new("/site/pages")).unwrap();
    assert_eq!(found.path, PathBuf::from("/site/first/base.njk"));
    assert_eq!(found.dir, PathBuf::from("/site/first"));

    let local_only = graph_with(&fs, &[]);
    let found = local_only.resolve("base.njk", Path::new("/site/pages")).unwrap();
    assert_eq!(found.path, PathBuf::from("/site/pages/base.njk"));
}

#[test]
fn lookup_upgrades_an_existing_entry_in_place() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/t/page.njk",
        "{% extends 'base.njk' %}{% include 'nav.njk' %}<main/>",
        10,
    );
    fs.add_file("/t/base.njk", "", 10);
    fs.add_file("/t/nav.njk", "", 10);
    let mut graph = graph_with(&fs, &["/t"]);

    let record = graph.lookup(Path::new("/t"), "page.njk", false, false).unwrap();
    assert!(!record.includes_extracted());
    assert!(!record.is_stripped());
    assert!(record.includes.is_empty());
    assert_eq!(
        record.extends.as_ref().map(|p| p.path.clone()),
        Some(PathBuf::from("/t/base.njk"))
    );

    let record = graph.lookup(Path::new("/t"), "page.njk", true, true).unwrap();
    assert!(record.includes_extracted());
    assert!(record.is_stripped());
    assert_eq!(record.includes.len(), 1);
    assert_eq!(record.content, "<main/>");
    assert!(record.raw.contains("extends"));

    // Asking again without the flags never undoes them.
    let record = graph.lookup(Path::new("/t"), "page.njk", false, false).unwrap();
    assert!(record.includes_extracted());
    assert!(record.is_stripped());
    assert_eq!(graph.len(), 1);
}

#[test]
fn cached_entries_ignore_later_edits_until_invalidated() {
    let fs = site_with_layout(100, 100);
    let mut graph = graph_with(&fs, &["/site/layouts"]);
    let pages = Path::new("/site/pages");

    assert!(!graph.is_stale(pages, "index.njk", 150).unwrap());

    fs.set_modified("/site/layouts/base.njk", 300);
    assert!(!graph.is_stale(pages, "index.njk", 150).unwrap());

    assert!(graph.invalidate(Path::new("/site/layouts/base.njk")));
    assert!(graph.is_stale(pages, "index.njk", 150).unwrap());
}

#[test]
fn dependents_of_follows_extends_and_include_edges() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/pages/a.njk", "{% extends 'base.njk' %}", 10);
    fs.add_file("/site/pages/b.njk", "{% extends 'base.njk' %}", 10);
    fs.add_file("/site/pages/c.njk", "{% include 'nav.njk' %}", 10);
    fs.add_file("/site/layouts/base.njk", "{% include 'nav.njk' %}", 10);
    fs.add_file("/site/layouts/nav.njk", "", 10);
    let mut graph = graph_with(&fs, &["/site/layouts"]);

    for page in ["a.njk", "b.njk", "c.njk"] {
        graph.is_stale(Path::new("/site/pages"), page, 100).unwrap();
    }

    assert_eq!(
        graph.dependents_of(Path::new("/site/layouts/base.njk")),
        vec![
            PathBuf::from("/site/pages/a.njk"),
            PathBuf::from("/site/pages/b.njk"),
        ]
    );
    assert_eq!(
        graph.dependents_of(Path::new("/site/layouts/nav.njk")),
        vec![
            PathBuf::from("/site/layouts/base.njk"),
            PathBuf::from("/site/pages/a.njk"),
            PathBuf::from("/site/pages/b.njk"),
            PathBuf::from("/site/pages/c.njk"),
        ]
    );
    assert!(graph.dependents_of(Path::new("/site/unknown.njk")).is_empty());
}

#[test]
fn metadata_collects_blocks_and_literal_sets() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/t/layout.njk",
        r#"{% set title = "Home" %}
{%- set nav = [
  { title: "Home", url: "/" },
  { title: 'Docs', url: "/docs/", },
] -%}
{% set count = 3 %}
{% set computed = items | length %}
{% block head %}{% endblock %}
{% block content %}{% endblock %}"#,
        10,
    );
    let mut graph = graph_with(&fs, &[]);

    let metadata = graph.metadata(Path::new("/t"), "layout.njk").unwrap().clone();
    assert_eq!(metadata.blocks, vec!["head", "content"]);
    assert_eq!(metadata.variables.get("title"), Some(&json!("Home")));
    assert_eq!(metadata.variables.get("count"), Some(&json!(3)));
    assert_eq!(
        metadata.variables.get("nav"),
        Some(&json!([
            { "title": "Home", "url": "/" },
            { "title": "Docs", "url": "/docs/" },
        ]))
    );
    assert!(!metadata.variables.contains_key("computed"));

    let record = graph.get(Path::new("/t/layout.njk")).unwrap();
    assert!(record.metadata().is_some());
}

#[test]
fn unreadable_include_stat_is_an_error() {
    let mock = MockFileSystem::new();
    mock.add_file("/site/pages/p.njk", "{% include 'nav.njk' %}", 10);
    mock.add_file("/site/partials/nav.njk", "", 10);
    let fs: Arc<dyn FileSystem> =
        Arc::new(FailingStatFs::new(mock).fail_stat("/site/partials/nav.njk"));
    let mut graph = TemplateGraph::new(fs, vec![PathBuf::from("/site/partials")]);

    match graph.is_stale(Path::new("/site/pages"), "p.njk", 100) {
        Err(FreshenError::Io { path, .. }) => {
            assert_eq!(path, PathBuf::from("/site/partials/nav.njk"))
        }
        other => panic!("expected Io error, got {:?}", other),
    }
    // The page itself parsed fine; only the include pass failed.
    let record = graph.get(Path::new("/site/pages/p.njk")).unwrap();
    assert!(!record.includes_extracted());
}

#[test]
fn deeply_nested_set_is_skipped_not_fatal() {
    let fs = MockFileSystem::new();
    let deep = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
    fs.add_file(
        "/t/deep.njk",
        format!("{{% set ok = 1 %}}{{% set bad = {} %}}", deep),
        10,
    );
    let mut graph = graph_with(&fs, &[]);

    let metadata = graph.metadata(Path::new("/t"), "deep.njk").unwrap();
    assert_eq!(metadata.variables.get("ok"), Some(&json!(1)));
    assert!(!metadata.variables.contains_key("bad"));
}

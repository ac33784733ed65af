use proptest::prelude::*;
use freshen::classify::{classify, ClassifyRequest};
use freshen::fs::mock::MockFileSystem;
use freshen::types::ChangeStatus;

// One entry per source: (source mtime, optional target mtime).
fn tree_strategy(max_files: usize) -> impl Strategy<Value = Vec<(u64, Option<u64>)>> {
    proptest::collection::vec((0..1_000u64, proptest::option::of(0..1_000u64)), 1..=max_files)
}

fn build_fs(tree: &[(u64, Option<u64>)]) -> MockFileSystem {
    let fs = MockFileSystem::new();
    for (i, (source, target)) in tree.iter().enumerate() {
        fs.add_file(format!("/p/src/f{}.md", i), "", *source);
        if let Some(t) = target {
            fs.add_file(format!("/p/out/f{}.html", i), "", *t);
        }
    }
    fs
}

proptest! {
    #[test]
    fn status_follows_strict_timestamp_comparison(tree in tree_strategy(12)) {
        let fs = build_fs(&tree);
        let req = ClassifyRequest::new("/p/src", &[".md"], "/p/out", ".html");
        let records = classify(&fs, &req).unwrap();

        prop_assert_eq!(records.len(), tree.len());
        for (i, (source, target)) in tree.iter().enumerate() {
            let record = &records[i];
            prop_assert_eq!(&record.relative, &format!("f{}.md", i));
            let expected = match target {
                None => ChangeStatus::New,
                Some(t) if source > t => ChangeStatus::Modified,
                Some(_) => ChangeStatus::Unchanged,
            };
            prop_assert_eq!(record.status, expected);
            prop_assert_eq!(record.target_modified, target.unwrap_or(0));
        }
    }

    #[test]
    fn classification_is_idempotent(tree in tree_strategy(12)) {
        let fs = build_fs(&tree);
        let req = ClassifyRequest::new("/p/src", &["md"], "/p/out", "html");

        let first = classify(&fs, &req).unwrap();
        let second = classify(&fs, &req).unwrap();
        prop_assert_eq!(first, second);
    }
}

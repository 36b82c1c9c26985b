use std::collections::BTreeSet;

use proptest::prelude::*;
use vocset::vocab::{self, ClassVocabulary};

mod common;
mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn vocabulary_build_is_deterministic(
        files in proptest::collection::vec(
            proptest::collection::vec(proptest_helpers::arb_class_name(), 0..6),
            1..8,
        )
    ) {
        let temp = tempfile::tempdir().expect("create temp dir");
        common::create_layout(temp.path());
        for (idx, names) in files.iter().enumerate() {
            let objects: Vec<common::Obj<'_>> = names
                .iter()
                .map(|name| common::Obj::new(name, 1.0, 1.0, 2.0, 2.0))
                .collect();
            common::write_annotation(temp.path(), &format!("{idx:04}"), 4, 4, &objects);
        }

        let annotations = temp.path().join("Annotations");
        let first = vocab::build(&annotations).expect("first build");
        let second = vocab::build(&annotations).expect("second build");
        prop_assert_eq!(&first, &second);

        let expected: BTreeSet<&str> = files.iter().flatten().map(String::as_str).collect();
        prop_assert_eq!(first.len(), expected.len());
        for (position, (name, id)) in first.iter().enumerate() {
            prop_assert_eq!(id.as_u32() as usize, position + 1);
            prop_assert!(expected.contains(name));
        }
    }

    #[test]
    fn save_then_load_roundtrips(names in proptest::collection::btree_set(proptest_helpers::arb_class_name(), 0..30)) {
        let vocabulary = ClassVocabulary::from_names(names);
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("classes.json");

        vocab::save(&vocabulary, &path).expect("save");
        let restored = vocab::load(&path).expect("load");
        prop_assert_eq!(restored, vocabulary);
    }

    #[test]
    fn ids_are_dense_and_reversible(names in proptest::collection::vec(proptest_helpers::arb_class_name(), 0..30)) {
        let vocabulary = ClassVocabulary::from_names(names.iter().cloned());
        for name in &names {
            let id = vocabulary.get(name).expect("every input name has an id");
            prop_assert!(id.as_u32() >= 1 && id.as_u32() as usize <= vocabulary.len());
            prop_assert_eq!(vocabulary.name(id), Some(name.as_str()));
        }
    }
}

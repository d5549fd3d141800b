//! Shared fixtures plus conformance checks that every storage backend must pass.

use textprint_core::{traits::Storage, RecordStore};
use textprint_storage_ephemeral::EphemeralStorage;
use textprint_storage_local::LocalStorage;

/// A local store rooted in a temporary directory that lives as long as the fixture.
pub struct LocalFixture {
    pub store: RecordStore<LocalStorage>,
    pub dir: tempfile::TempDir,
}

pub fn ephemeral_store() -> RecordStore<EphemeralStorage> {
    RecordStore::new(EphemeralStorage::new())
}

pub fn local_store() -> std::io::Result<LocalFixture> {
    let dir = tempfile::tempdir()?;
    let storage = LocalStorage::new(dir.path())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(LocalFixture {
        store: RecordStore::new(storage),
        dir,
    })
}

/// Insert each value in order, stopping at the first failure.
pub fn seed<S: Storage>(
    store: &RecordStore<S>,
    values: &[&str],
) -> Result<(), textprint_core::CoreError> {
    for value in values {
        store.insert(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod conformance {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use textprint_core::{
        analyze::fingerprint, filter, translate, CoreError, FilterSpec, ValidationError,
    };

    fn check_analysis<S: Storage>(store: &RecordStore<S>) {
        let record = store.insert("A man a plan a canal Panama").unwrap();
        assert!(record.properties.is_palindrome);
        assert_eq!(record.properties.word_count, 7);
        assert_eq!(record.properties.length, 27);
        assert_eq!(record.id, fingerprint("A man a plan a canal Panama"));
        assert_eq!(record.properties.sha256_hash, record.id);

        let fetched = store.get_by_value("A man a plan a canal Panama").unwrap();
        assert_eq!(fetched, record);
    }

    fn check_duplicates_and_validation<S: Storage>(store: &RecordStore<S>) {
        store.insert("hello").unwrap();
        assert!(matches!(
            store.insert("hello"),
            Err(CoreError::DuplicateRecord(_))
        ));
        assert!(matches!(
            store.insert(""),
            Err(CoreError::Validation(ValidationError::EmptyValue))
        ));
        assert_eq!(store.count().unwrap(), 1);
    }

    fn check_delete<S: Storage>(store: &RecordStore<S>) {
        store.insert("gone").unwrap();
        store.delete_by_value("gone").unwrap();
        assert!(matches!(
            store.get_by_value("gone"),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_by_value("gone"),
            Err(CoreError::NotFound(_))
        ));
        // the value can be stored again once deleted
        store.insert("gone").unwrap();
    }

    fn check_filters<S: Storage>(store: &RecordStore<S>) {
        seed(store, &["racecar", "hello world", "noon", "abc", "level up"]).unwrap();

        let single_palindromes = translate("all single word palindromic strings").unwrap();
        let outcome = filter::apply(store, &single_palindromes.parsed_filters).unwrap();
        let values: Vec<&str> = outcome.records.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, ["noon", "racecar"]);

        let spec = FilterSpec {
            min_length: Some(4),
            contains_character: Some('l'),
            ..FilterSpec::default()
        };
        let outcome = filter::apply(store, &spec).unwrap();
        let values: Vec<&str> = outcome.records.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, ["level up", "hello world"]);
        assert_eq!(outcome.filters_applied, spec);

        let everything = filter::apply(store, &FilterSpec::default()).unwrap();
        assert_eq!(everything.records.len(), 5);
        assert_eq!(everything.records[0].value, "level up");
        assert_eq!(everything.records[4].value, "racecar");
    }

    fn check_concurrent_insert<S>(store: Arc<RecordStore<S>>)
    where
        S: Storage + Send + Sync + 'static,
    {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.insert("contended").is_ok())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn ephemeral_analysis() {
        check_analysis(&ephemeral_store());
    }

    #[test]
    fn local_analysis() {
        let fixture = local_store().unwrap();
        check_analysis(&fixture.store);
    }

    #[test]
    fn ephemeral_duplicates_and_validation() {
        check_duplicates_and_validation(&ephemeral_store());
    }

    #[test]
    fn local_duplicates_and_validation() {
        let fixture = local_store().unwrap();
        check_duplicates_and_validation(&fixture.store);
    }

    #[test]
    fn ephemeral_delete() {
        check_delete(&ephemeral_store());
    }

    #[test]
    fn local_delete() {
        let fixture = local_store().unwrap();
        check_delete(&fixture.store);
    }

    #[test]
    fn ephemeral_filters() {
        check_filters(&ephemeral_store());
    }

    #[test]
    fn local_filters() {
        let fixture = local_store().unwrap();
        check_filters(&fixture.store);
    }

    #[test]
    fn ephemeral_concurrent_insert() {
        check_concurrent_insert(Arc::new(ephemeral_store()));
    }

    #[test]
    fn local_concurrent_insert() {
        let fixture = local_store().unwrap();
        let LocalFixture { store, dir } = fixture;
        check_concurrent_insert(Arc::new(store));
        drop(dir);
    }

    #[test]
    fn local_records_survive_reopen() {
        let fixture = local_store().unwrap();
        seed(&fixture.store, &["first", "second"]).unwrap();
        let reopened = RecordStore::new(LocalStorage::new(fixture.dir.path()).unwrap());
        let values: Vec<String> = reopened
            .scan(|_| true)
            .unwrap()
            .into_iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, ["second", "first"]);
        assert_eq!(
            reopened.get_by_value("first").unwrap(),
            fixture.store.get_by_value("first").unwrap()
        );
    }
}

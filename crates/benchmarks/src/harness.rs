use textprint_core::{filter, traits::Storage, FilterSpec, RecordStore};
use textprint_storage_ephemeral::EphemeralStorage;
use textprint_storage_local::{LocalConfig, LocalStorage};

pub struct EphemeralStack {
    pub store: RecordStore<EphemeralStorage>,
}

impl EphemeralStack {
    pub fn new() -> Self {
        Self {
            store: RecordStore::new(EphemeralStorage::new()),
        }
    }

    pub fn insert_all(&self, values: &[String]) {
        measure_insert(&self.store, values);
    }
}

impl Default for EphemeralStack {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LocalStack {
    pub store: RecordStore<LocalStorage>,
    pub root: tempfile::TempDir,
}

impl LocalStack {
    /// Benchmarks run without fsync so they measure the store, not the disk.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create local bench dir");
        let storage = LocalStorage::with_config(root.path(), LocalConfig { fsync: false })
            .expect("open local bench storage");
        Self {
            store: RecordStore::new(storage),
            root,
        }
    }

    pub fn insert_all(&self, values: &[String]) {
        measure_insert(&self.store, values);
    }
}

impl Default for LocalStack {
    fn default() -> Self {
        Self::new()
    }
}

pub fn measure_insert<S: Storage>(store: &RecordStore<S>, values: &[String]) {
    for value in values {
        store.insert(value).expect("insert");
    }
}

pub fn measure_filter<S: Storage>(store: &RecordStore<S>, spec: &FilterSpec) -> usize {
    filter::apply(store, spec).expect("filter").records.len()
}

/// A filter that touches every property the engine knows about.
pub fn mixed_filter() -> FilterSpec {
    FilterSpec {
        is_palindrome: Some(false),
        min_length: Some(4),
        max_length: Some(64),
        word_count: Some(2),
        contains_character: Some('e'),
    }
}

use crate::model::AnalyzedRecord;

/// Storage trait to be implemented by storage adapters.
/// No async in core; callers should use spawn_blocking when invoking from async contexts.
pub trait Storage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist `record` unless a record with the same id already exists.
    /// Returns `false` without writing when the id is taken. The check and
    /// the write must be atomic with respect to other inserts.
    fn insert_if_absent(&self, record: &AnalyzedRecord) -> Result<bool, Self::Error>;

    fn get(&self, id: &str) -> Result<Option<AnalyzedRecord>, Self::Error>;

    /// Returns `false` when nothing was stored under `id`.
    fn delete(&self, id: &str) -> Result<bool, Self::Error>;

    /// Records matching `predicate`, most recently inserted first.
    fn scan(
        &self,
        predicate: &dyn Fn(&AnalyzedRecord) -> bool,
    ) -> Result<Vec<AnalyzedRecord>, Self::Error>;

    fn count(&self) -> Result<usize, Self::Error>;
}

//! Content-addressable record store on top of a [`Storage`] backend.

use crate::{
    analyze::fingerprint,
    errors::CoreError,
    model::AnalyzedRecord,
    traits::Storage,
    validate::validate_value,
};
use tracing::debug;

pub struct RecordStore<S> {
    backend: S,
}

impl<S> RecordStore<S>
where
    S: Storage,
{
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn insert(&self, value: &str) -> Result<AnalyzedRecord, CoreError> {
        let value = validate_value(value)?;
        let record = AnalyzedRecord::new(value);
        let inserted = self
            .backend
            .insert_if_absent(&record)
            .map_err(CoreError::storage)?;
        if !inserted {
            debug!(fingerprint = %record.id, "duplicate insert rejected");
            return Err(CoreError::DuplicateRecord(record.id));
        }
        debug!(fingerprint = %record.id, length = record.length(), "record inserted");
        Ok(record)
    }

    pub fn get_by_fingerprint(&self, id: &str) -> Result<AnalyzedRecord, CoreError> {
        self.backend
            .get(id)
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound(id.to_owned()))
    }

    pub fn get_by_value(&self, value: &str) -> Result<AnalyzedRecord, CoreError> {
        let id = fingerprint(value);
        self.backend
            .get(&id)
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound(value.to_owned()))
    }

    pub fn delete_by_value(&self, value: &str) -> Result<(), CoreError> {
        let id = fingerprint(value);
        if self.backend.delete(&id).map_err(CoreError::storage)? {
            debug!(fingerprint = %id, "record deleted");
            Ok(())
        } else {
            Err(CoreError::NotFound(value.to_owned()))
        }
    }

    pub fn scan<F>(&self, predicate: F) -> Result<Vec<AnalyzedRecord>, CoreError>
    where
        F: Fn(&AnalyzedRecord) -> bool,
    {
        self.backend.scan(&predicate).map_err(CoreError::storage)
    }

    pub fn count(&self) -> Result<usize, CoreError> {
        self.backend.count().map_err(CoreError::storage)
    }
}

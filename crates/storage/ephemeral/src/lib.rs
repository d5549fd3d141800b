use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use textprint_core::{model::AnalyzedRecord, traits::Storage};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EphemeralError {
    #[error("inconsistent index: {0}")]
    Inconsistent(String),
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, AnalyzedRecord>,
    recent: VecDeque<String>, // newest at front
}

pub struct EphemeralStorage {
    inner: RwLock<Inner>,
}

impl EphemeralStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for EphemeralStorage {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Storage for EphemeralStorage {
    type Error = EphemeralError;

    fn insert_if_absent(&self, record: &AnalyzedRecord) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write();
        if inner.records.contains_key(&record.id) {
            return Ok(false);
        }
        inner.records.insert(record.id.clone(), record.clone());
        inner.recent.push_front(record.id.clone());
        debug!(fingerprint = %record.id, "ephemeral insert");
        Ok(true)
    }

    fn get(&self, id: &str) -> Result<Option<AnalyzedRecord>, Self::Error> {
        Ok(self.inner.read().records.get(id).cloned())
    }

    fn delete(&self, id: &str) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write();
        if inner.records.remove(id).is_none() {
            return Ok(false);
        }
        match inner.recent.iter().position(|x| x == id) {
            Some(pos) => {
                inner.recent.remove(pos);
                Ok(true)
            }
            None => Err(EphemeralError::Inconsistent(id.to_string())),
        }
    }

    fn scan(
        &self,
        predicate: &dyn Fn(&AnalyzedRecord) -> bool,
    ) -> Result<Vec<AnalyzedRecord>, Self::Error> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        for id in &inner.recent {
            let record = inner
                .records
                .get(id)
                .ok_or_else(|| EphemeralError::Inconsistent(id.clone()))?;
            if predicate(record) {
                out.push(record.clone());
            }
        }
        Ok(out)
    }

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.inner.read().records.len())
    }
}

//! Structured filters over analyzed records.
//!
//! A [`FilterSpec`] is a conjunction of optional constraints. [`compile`]
//! turns it into a predicate; [`apply`] runs that predicate against a
//! [`RecordStore`] and reports which constraints were in effect.

use crate::{
    errors::{CoreError, ValidationError},
    model::AnalyzedRecord,
    store::RecordStore,
    traits::Storage,
    validate::{parse_bool, parse_count, parse_single_char},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_palindrome: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains_character: Option<char>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self == &FilterSpec::default()
    }

    pub fn matches(&self, record: &AnalyzedRecord) -> bool {
        let props = &record.properties;
        self.is_palindrome.map_or(true, |p| props.is_palindrome == p)
            && self.min_length.map_or(true, |n| props.length >= n)
            && self.max_length.map_or(true, |n| props.length <= n)
            && self.word_count.map_or(true, |n| props.word_count == n)
            && self.contains_character.map_or(true, |c| record.contains_char(c))
    }

    /// Rejects bound combinations that can never match. Only the natural
    /// language path calls this; structured callers get an empty result.
    pub fn check_conflicts(&self) -> Result<(), CoreError> {
        match (self.min_length, self.max_length) {
            (Some(min_length), Some(max_length)) if min_length > max_length => {
                Err(CoreError::ConflictingFilters {
                    min_length,
                    max_length,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Unparsed filter inputs as they arrive from query strings or CLI flags.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilterParams {
    pub is_palindrome: Option<String>,
    pub min_length: Option<String>,
    pub max_length: Option<String>,
    pub word_count: Option<String>,
    pub contains_character: Option<String>,
}

impl FilterParams {
    pub fn parse(&self) -> Result<FilterSpec, ValidationError> {
        Ok(FilterSpec {
            is_palindrome: self
                .is_palindrome
                .as_deref()
                .map(|raw| parse_bool("is_palindrome", raw))
                .transpose()?,
            min_length: self
                .min_length
                .as_deref()
                .map(|raw| parse_count("min_length", raw))
                .transpose()?,
            max_length: self
                .max_length
                .as_deref()
                .map(|raw| parse_count("max_length", raw))
                .transpose()?,
            word_count: self
                .word_count
                .as_deref()
                .map(|raw| parse_count("word_count", raw))
                .transpose()?,
            contains_character: self
                .contains_character
                .as_deref()
                .map(parse_single_char)
                .transpose()?,
        })
    }
}

pub type Predicate = Box<dyn Fn(&AnalyzedRecord) -> bool + Send + Sync>;

pub fn compile(spec: &FilterSpec) -> Predicate {
    let spec = spec.clone();
    Box::new(move |record| spec.matches(record))
}

#[derive(Clone, Debug, Serialize)]
pub struct FilterOutcome {
    pub records: Vec<AnalyzedRecord>,
    pub filters_applied: FilterSpec,
}

pub fn apply<S: Storage>(
    store: &RecordStore<S>,
    spec: &FilterSpec,
) -> Result<FilterOutcome, CoreError> {
    let predicate = compile(spec);
    let records = store.scan(|r| predicate(r))?;
    tracing::debug!(matched = records.len(), filters = ?spec, "filter applied");
    Ok(FilterOutcome {
        records,
        filters_applied: spec.clone(),
    })
}

//! Core domain model, analysis, filtering and query translation.
//! No async and no IO within this crate.

pub mod analyze;
pub mod errors;
pub mod filter;
pub mod model;
pub mod nl;
pub mod store;
pub mod traits;
pub mod validate;

pub use crate::analyze::{analyze, fingerprint, Analysis};
pub use crate::errors::{CoreError, ValidationError};
pub use crate::filter::{apply, compile, FilterOutcome, FilterParams, FilterSpec, Predicate};
pub use crate::model::{AnalyzedRecord, CharacterFrequency, Fingerprint, StringProperties};
pub use crate::nl::{translate, InterpretedQuery};
pub use crate::store::RecordStore;
pub use crate::traits::Storage;
pub use crate::validate::{validate_value, value_from_json};

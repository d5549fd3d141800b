//! Content fingerprinting and property derivation.
//!
//! Everything here is a pure function of the input string. Callers are
//! expected to reject empty input before getting here (see
//! [`crate::validate::validate_value`]).

use crate::model::{CharacterFrequency, Fingerprint, StringProperties};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Analysis {
    pub fingerprint: Fingerprint,
    pub properties: StringProperties,
}

pub fn analyze(value: &str) -> Analysis {
    let fingerprint = fingerprint(value);
    let properties = StringProperties {
        length: value.chars().count(),
        is_palindrome: is_palindrome(value),
        unique_characters: unique_characters(value),
        word_count: word_count(value),
        sha256_hash: fingerprint.clone(),
        character_frequency_map: character_frequency(value),
    };
    Analysis {
        fingerprint,
        properties,
    }
}

/// SHA-256 over the UTF-8 bytes, lowercase hex.
pub fn fingerprint(value: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn word_count(value: &str) -> usize {
    value.split_whitespace().count()
}

pub fn unique_characters(value: &str) -> usize {
    value.chars().collect::<HashSet<_>>().len()
}

pub fn character_frequency(value: &str) -> CharacterFrequency {
    let mut freq = CharacterFrequency::new();
    for ch in value.chars() {
        *freq.entry(ch).or_insert(0) += 1;
    }
    freq
}

/// Only ASCII letters and digits take part, compared case-insensitively.
/// Input with none of them (e.g. `"!!!"`) cleans to the empty string and
/// counts as a palindrome.
pub fn is_palindrome(value: &str) -> bool {
    let cleaned: Vec<char> = value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    cleaned.iter().eq(cleaned.iter().rev())
}

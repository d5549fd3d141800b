use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SHA-256 of the stored value, 64 lowercase hex chars.
pub type Fingerprint = String;

pub type CharacterFrequency = BTreeMap<char, usize>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StringProperties {
    pub length: usize,
    pub is_palindrome: bool,
    pub unique_characters: usize,
    pub word_count: usize,
    pub sha256_hash: Fingerprint,
    pub character_frequency_map: CharacterFrequency,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyzedRecord {
    pub id: Fingerprint,
    pub value: String,
    pub properties: StringProperties,
    #[serde(with = "utc_z")]
    pub created_at: DateTime<Utc>,
}

impl AnalyzedRecord {
    /// Analyze `value` and stamp the result with the current time.
    pub fn new(value: &str) -> Self {
        Self::with_created_at(value, Utc::now())
    }

    pub fn with_created_at(value: &str, created_at: DateTime<Utc>) -> Self {
        let analysis = crate::analyze::analyze(value);
        Self {
            id: analysis.fingerprint,
            value: value.to_owned(),
            properties: analysis.properties,
            created_at,
        }
    }

    pub fn length(&self) -> usize {
        self.properties.length
    }

    pub fn contains_char(&self, c: char) -> bool {
        self.properties.character_frequency_map.contains_key(&c)
    }
}

/// RFC 3339 timestamps that always carry an explicit `Z` suffix.
pub mod utc_z {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

//! Heuristic natural-language query translation.
//!
//! This is pattern matching, not parsing. A fixed, ordered list of rules is
//! run against the lower-cased query; each rule that fires writes into the
//! same [`FilterSpec`], so a later rule overwrites an earlier one when both
//! set the same field.
//!
//! Supported phrasings:
//! - "all single word palindromic strings" -> `word_count = 1`, `is_palindrome = true`
//! - "strings longer than 10 characters" -> `min_length = 11`
//! - "strings shorter than 3 characters" -> `max_length = 2`
//! - "strings containing the letter z" -> `contains_character = 'z'`
//! - "palindromic strings that contain the first vowel" -> `contains_character = 'a'`
//!
//! The last rule sets `z` for any query with "containing" followed later by a
//! word ending in `z`, whatever the letter rule found. It is kept as-is.

use crate::{errors::CoreError, filter::FilterSpec};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterpretedQuery {
    pub original: String,
    pub parsed_filters: FilterSpec,
}

struct Rule {
    name: &'static str,
    pattern: Regex,
    apply: fn(&Captures<'_>, &mut FilterSpec),
}

impl Rule {
    fn new(name: &'static str, pattern: &str, apply: fn(&Captures<'_>, &mut FilterSpec)) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid rule pattern"),
            apply,
        }
    }
}

/// Digits too large for `usize` saturate.
fn captured_number(caps: &Captures<'_>) -> Option<usize> {
    match caps.get(1)?.as_str().parse::<usize>() {
        Ok(n) => Some(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(usize::MAX),
        Err(_) => None,
    }
}

fn captured_char(caps: &Captures<'_>) -> Option<char> {
    caps.get(1).and_then(|m| m.as_str().chars().next())
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("word_count", r"\b(single word|one word)\b", |_, spec| {
            spec.word_count = Some(1);
        }),
        Rule::new("palindrome", r"palindrom", |_, spec| {
            spec.is_palindrome = Some(true);
        }),
        Rule::new("longer_than", r"longer than (\d+)", |caps, spec| {
            if let Some(n) = captured_number(caps) {
                spec.min_length = Some(n.saturating_add(1));
            }
        }),
        Rule::new("shorter_than", r"shorter than (\d+)", |caps, spec| {
            if let Some(n) = captured_number(caps) {
                spec.max_length = Some(n.saturating_sub(1));
            }
        }),
        Rule::new("containing_letter", r"containing the letter (\w)", |caps, spec| {
            if let Some(c) = captured_char(caps) {
                spec.contains_character = Some(c);
            }
        }),
        Rule::new("contain_letter", r"contain the letter (\w)", |caps, spec| {
            if let Some(c) = captured_char(caps) {
                spec.contains_character = Some(c);
            }
        }),
        Rule::new("first_vowel", r"first vowel", |_, spec| {
            spec.contains_character.get_or_insert('a');
        }),
        Rule::new("containing_z", r"\bcontaining.*z\b", |_, spec| {
            spec.contains_character = Some('z');
        }),
    ]
});

/// Translate `query` into filters. Fails with [`CoreError::EmptyQuery`] for
/// blank input and [`CoreError::UnparseableQuery`] when no rule fires.
pub fn translate(query: &str) -> Result<InterpretedQuery, CoreError> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(CoreError::EmptyQuery);
    }

    let mut spec = FilterSpec::default();
    let mut fired = Vec::new();
    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(&normalized) {
            (rule.apply)(&caps, &mut spec);
            fired.push(rule.name);
        }
    }

    if spec.is_empty() {
        return Err(CoreError::UnparseableQuery(query.to_owned()));
    }
    tracing::debug!(query = %normalized, rules = ?fired, "natural language query translated");
    Ok(InterpretedQuery {
        original: query.to_owned(),
        parsed_filters: spec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(q: &str) -> FilterSpec {
        translate(q).unwrap().parsed_filters
    }

    #[test]
    fn single_word_palindromes() {
        assert_eq!(
            filters("all single word palindromic strings"),
            FilterSpec {
                word_count: Some(1),
                is_palindrome: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn longer_and_shorter_than() {
        assert_eq!(filters("strings longer than 10 characters").min_length, Some(11));
        assert_eq!(filters("strings shorter than 3 characters").max_length, Some(2));
        assert_eq!(filters("strings shorter than 0 characters").max_length, Some(0));
        assert_eq!(
            filters("strings longer than 99999999999999999999999").min_length,
            Some(usize::MAX)
        );
        assert_eq!(
            filters("strings shorter than 99999999999999999999999").max_length,
            Some(usize::MAX - 1)
        );
        assert_eq!(
            filters("strings longer than 10 characters"),
            FilterSpec {
                min_length: Some(11),
                ..Default::default()
            }
        );
    }

    #[test]
    fn letter_rules() {
        assert_eq!(
            filters("strings containing the letter q").contains_character,
            Some('q')
        );
        assert_eq!(
            filters("words that contain the letter e").contains_character,
            Some('e')
        );
        assert_eq!(
            filters("strings containing the letter z").contains_character,
            Some('z')
        );
    }

    #[test]
    fn first_vowel_defers_to_explicit_letter() {
        let spec = filters("palindromic strings that contain the first vowel");
        assert_eq!(spec.contains_character, Some('a'));
        assert_eq!(spec.is_palindrome, Some(true));

        let spec = filters("contain the letter e or the first vowel");
        assert_eq!(spec.contains_character, Some('e'));
    }

    #[test]
    fn containing_z_overrides_earlier_letter() {
        // Heuristic: any word ending in 'z' after "containing" forces 'z'.
        let spec = filters("strings containing the letter q like quiz");
        assert_eq!(spec.contains_character, Some('z'));
    }

    #[test]
    fn query_is_case_insensitive_and_echoed_verbatim() {
        let out = translate("  Strings LONGER than 4  ").unwrap();
        assert_eq!(out.original, "  Strings LONGER than 4  ");
        assert_eq!(out.parsed_filters.min_length, Some(5));
    }

    #[test]
    fn conflicting_bounds_are_parsed_then_caught() {
        let spec = filters("strings longer than 19 and shorter than 6 characters");
        assert_eq!(spec.min_length, Some(20));
        assert_eq!(spec.max_length, Some(5));
        assert!(matches!(
            spec.check_conflicts(),
            Err(CoreError::ConflictingFilters { .. })
        ));
    }

    #[test]
    fn empty_and_unparseable() {
        assert!(matches!(translate(""), Err(CoreError::EmptyQuery)));
        assert!(matches!(translate("   "), Err(CoreError::EmptyQuery)));
        assert!(matches!(
            translate("banana split"),
            Err(CoreError::UnparseableQuery(_))
        ));
    }
}

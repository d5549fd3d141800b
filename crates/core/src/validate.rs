use crate::errors::ValidationError;

/// Values must be non-empty. Whitespace-only strings are accepted.
pub fn validate_value(value: &str) -> Result<&str, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyValue);
    }
    Ok(value)
}

/// Pull the `value` field out of a loosely typed request body.
pub fn value_from_json(body: &serde_json::Value) -> Result<String, ValidationError> {
    match body.get("value") {
        None | Some(serde_json::Value::Null) => Err(ValidationError::MissingValue),
        Some(serde_json::Value::String(s)) => validate_value(s).map(str::to_owned),
        Some(_) => Err(ValidationError::NonStringValue),
    }
}

pub fn parse_bool(field: &'static str, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValidationError::InvalidBool { field }),
    }
}

pub fn parse_count(field: &'static str, raw: &str) -> Result<usize, ValidationError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ValidationError::InvalidInteger { field })
}

pub fn parse_single_char(raw: &str) -> Result<char, ValidationError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ValidationError::InvalidCharacter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_from_json_cases() {
        assert_eq!(value_from_json(&json!({"value": "hi"})).unwrap(), "hi");
        assert_eq!(value_from_json(&json!({"value": "  "})).unwrap(), "  ");
        assert_eq!(
            value_from_json(&json!({})),
            Err(ValidationError::MissingValue)
        );
        assert_eq!(
            value_from_json(&json!({"value": 12})),
            Err(ValidationError::NonStringValue)
        );
        assert_eq!(
            value_from_json(&json!({"value": ""})),
            Err(ValidationError::EmptyValue)
        );
    }

    #[test]
    fn scalar_parsers() {
        assert!(parse_bool("is_palindrome", "TRUE").unwrap());
        assert!(!parse_bool("is_palindrome", "false").unwrap());
        assert!(parse_bool("is_palindrome", "yes").is_err());
        assert_eq!(parse_count("min_length", "12").unwrap(), 12);
        assert!(parse_count("min_length", "-1").is_err());
        assert!(parse_count("min_length", "ten").is_err());
        assert_eq!(parse_single_char("ß").unwrap(), 'ß');
        assert!(parse_single_char("").is_err());
        assert!(parse_single_char("ab").is_err());
    }
}

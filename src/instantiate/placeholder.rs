//! Placeholder values for generated instances

use serde_json::Value;

/// Value emitted for `integer` and `number` properties
pub const INTEGER_SENTINEL: i64 = -1;

/// `{{ NAME }}` token for a string property
pub fn string_placeholder(key: &str) -> Value {
    Value::String(format!("{{{{ {} }}}}", placeholder_name(key)))
}

/// `{{ BOOLEAN_NAME }}` token for a boolean property
pub fn boolean_placeholder(key: &str) -> Value {
    Value::String(format!("{{{{ BOOLEAN_{} }}}}", placeholder_name(key)))
}

pub fn integer_placeholder() -> Value {
    Value::from(INTEGER_SENTINEL)
}

/// Upper snake case form of a property key.
///
/// Hyphens, spaces and dots become underscores; a lowercase-to-uppercase
/// transition (`serviceName`) also starts a new word.
pub fn placeholder_name(key: &str) -> String {
    let mut result = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;

    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c);
            prev_lower = false;
        } else if c == '-' || c == ' ' || c == '.' || c == '_' {
            if !result.ends_with('_') {
                result.push('_');
            }
            prev_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_names() {
        assert_eq!(placeholder_name("service-name"), "SERVICE_NAME");
        assert_eq!(placeholder_name("unique-id"), "UNIQUE_ID");
        assert_eq!(placeholder_name("serviceName"), "SERVICE_NAME");
        assert_eq!(placeholder_name("host"), "HOST");
        assert_eq!(placeholder_name("key rotation--period"), "KEY_ROTATION_PERIOD");
    }

    #[test]
    fn test_placeholder_tokens() {
        assert_eq!(string_placeholder("service-name"), "{{ SERVICE_NAME }}");
        assert_eq!(boolean_placeholder("enabled"), "{{ BOOLEAN_ENABLED }}");
        assert_eq!(integer_placeholder(), -1);
    }
}

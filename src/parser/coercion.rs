use std::fmt;

use serde::Serialize;

/// A typed configuration value.
///
/// Serializes untagged, so a namespace dump renders each value in its native
/// JSON type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Null,
    String(String),
}

/// Map a raw cell to a typed value. First matching rule wins:
/// boolean literals, `null`, base-10 `i64`, `f64`, then the raw string.
///
/// Only the exact casings `true`/`TRUE`/`false`/`FALSE`/`null` are recognized and
/// nothing is trimmed, so `" 7"` stays a string.
pub fn coerce(raw: &str) -> ConfigValue {
    match raw {
        "true" | "TRUE" => return ConfigValue::Bool(true),
        "false" | "FALSE" => return ConfigValue::Bool(false),
        "null" => return ConfigValue::Null,
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return ConfigValue::Integer(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return ConfigValue::Float(float);
    }
    ConfigValue::String(raw.to_owned())
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            // Debug keeps a fraction or exponent (1000.0, 1e21) so the text re-coerces to a float
            ConfigValue::Float(x) => write!(f, "{:?}", x),
            ConfigValue::Null => f.write_str("null"),
            ConfigValue::String(s) => f.write_str(s),
        }
    }
}

//! Serde helpers for the JSON document wire format.

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value as JsonValue;

/// Largest integer an f64 represents exactly (2^53).
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Serialize whole-valued floats as JSON integers.
///
/// Documents written by the browser carry `"progress": 40`, not `40.0`;
/// writing them back unchanged keeps a load/save cycle byte-stable.
pub fn serialize_compact_f64<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INT {
        s.serialize_i64(*value as i64)
    } else {
        s.serialize_f64(*value)
    }
}

/// `#[serde(with = ...)]` module for [`serialize_compact_f64`].
pub mod compact_f64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        serialize_compact_f64(value, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        f64::deserialize(d)
    }
}

/// Accept a string, a number or null where the schema says "string-typed
/// numeric" (grade credits). Older documents stored plain numbers.
pub fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match JsonValue::deserialize(d)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Probe {
        #[serde(with = "super::compact_f64")]
        n: f64,
        #[serde(deserialize_with = "super::string_or_number")]
        s: String,
    }

    #[test]
    fn test_whole_floats_serialize_as_integers() {
        let p = Probe {
            n: 40.0,
            s: "3".to_string(),
        };
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"n":40,"s":"3"}"#);
    }

    #[test]
    fn test_fractional_floats_keep_fraction() {
        let p = Probe {
            n: 12.5,
            s: String::new(),
        };
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"n":12.5,"s":""}"#);
    }

    #[test]
    fn test_string_or_number_accepts_numbers() {
        let p: Probe = serde_json::from_str(r#"{"n":1,"s":4}"#).unwrap();
        assert_eq!(p.s, "4");
        let p: Probe = serde_json::from_str(r#"{"n":1,"s":null}"#).unwrap();
        assert_eq!(p.s, "");
    }
}

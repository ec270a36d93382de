use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A panel scalar that can arrive as number, string, bool or null.
/// Xtream panels disagree on whether `auth`, `exp_date`, `active_cons` and
/// ids are strings or integers, so everything numeric-ish goes through this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FlexValue {
    Number(i64),
    Text(String),
    #[default]
    Null,
}

impl FlexValue {
    /// Numeric view; numeric strings are parsed, blank strings are not numbers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlexValue::Number(n) => Some(*n),
            FlexValue::Text(s) => s.trim().parse().ok(),
            FlexValue::Null => None,
        }
    }

    /// Textual view, numbers rendered in decimal.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FlexValue::Number(n) => Some(n.to_string()),
            FlexValue::Text(s) => Some(s.clone()),
            FlexValue::Null => None,
        }
    }

    /// Non-negative count, anything unusable collapses to zero.
    pub fn as_count(&self) -> u32 {
        self.as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    }

    /// Same leniency for values already held as `serde_json::Value`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(FlexValue::Number)
                .unwrap_or(FlexValue::Null),
            serde_json::Value::String(s) => FlexValue::Text(s.clone()),
            serde_json::Value::Bool(b) => FlexValue::Number(i64::from(*b)),
            _ => FlexValue::Null,
        }
    }
}

impl Serialize for FlexValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FlexValue::Number(n) => serializer.serialize_i64(*n),
            FlexValue::Text(s) => serializer.serialize_str(s),
            FlexValue::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FlexValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct FlexValueVisitor;

        impl<'de> Visitor<'de> for FlexValueVisitor {
            type Value = FlexValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number, string, bool or null")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(FlexValue::Number(i64::from(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(FlexValue::Number(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(i64::try_from(v)
                    .map(FlexValue::Number)
                    .unwrap_or_else(|_| FlexValue::Text(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(FlexValue::Number(v as i64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(FlexValue::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(FlexValue::Text(v))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(FlexValue::Null)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(FlexValue::Null)
            }

            fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
            where
                D2: Deserializer<'de>,
            {
                FlexValue::deserialize(deserializer)
            }
        }

        deserializer.deserialize_any(FlexValueVisitor)
    }
}

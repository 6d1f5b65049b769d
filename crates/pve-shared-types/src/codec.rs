//! Encodings used by the Proxmox API on the wire
//!
//! Lists travel as comma-joined strings, booleans as `0`/`1` and integers
//! are sometimes rendered as strings.

use std::fmt;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserializer, Serializer};

/// Join a list into its comma-separated wire form. `None` and empty lists are absent.
pub fn join_list(values: Option<&[String]>) -> Option<String> {
    match values {
        Some(values) if !values.is_empty() => Some(values.join(",")),
        _ => None,
    }
}

/// Split a comma-separated wire value back into a list. `None` and `""` are absent.
pub fn split_list(value: Option<&str>) -> Option<Vec<String>> {
    match value {
        Some(value) if !value.is_empty() => Some(value.split(',').map(str::to_string).collect()),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `Option<bool>` sent as `1`/`0`, accepted as a JSON boolean, an integer or a string.
pub mod pve_bool {
    use super::*;

    struct PveBoolVisitor;

    impl<'de> Visitor<'de> for PveBoolVisitor {
        type Value = Option<bool>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, 0/1 or a boolean string")
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match v {
                0 => Ok(Some(false)),
                1 => Ok(Some(true)),
                _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
            }
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match v {
                0 => Ok(Some(false)),
                1 => Ok(Some(true)),
                _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_bool(v)
                .map(Some)
                .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(PveBoolVisitor)
        }
    }

    pub fn serialize<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_u8(u8::from(*v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PveBoolVisitor)
    }
}

/// `Option<i32>` accepted either as a JSON number or as a numeric string.
pub mod pve_int {
    use super::*;

    struct PveIntVisitor;

    impl<'de> Visitor<'de> for PveIntVisitor {
        type Value = Option<i32>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a 32-bit integer or a numeric string")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i32::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i32::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            v.trim()
                .parse::<i32>()
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(PveIntVisitor)
        }
    }

    pub fn serialize<S>(value: &Option<i32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_i32(*v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PveIntVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default, with = "pve_bool")]
        flag: Option<bool>,
        #[serde(default, with = "pve_int")]
        number: Option<i32>,
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn join_and_split_lists() {
        let nodes = strings(&["a", "b", "c"]);
        let joined = join_list(Some(nodes.as_slice()));
        assert_eq!(joined.as_deref(), Some("a,b,c"));
        assert_eq!(split_list(joined.as_deref()), Some(nodes));
    }

    #[test]
    fn empty_lists_are_absent() {
        assert_eq!(join_list(Some(&[][..])), None);
        assert_eq!(join_list(None), None);
        assert_eq!(split_list(Some("")), None);
        assert_eq!(split_list(None), None);
    }

    #[test]
    fn booleans_accept_proxmox_encodings() {
        for (json, expected) in [
            (r#"{"flag": 1}"#, Some(true)),
            (r#"{"flag": 0}"#, Some(false)),
            (r#"{"flag": true}"#, Some(true)),
            (r#"{"flag": "1"}"#, Some(true)),
            (r#"{"flag": "off"}"#, Some(false)),
            (r#"{"flag": null}"#, None),
            (r#"{}"#, None),
        ] {
            let flags: Flags = serde_json::from_str(json).unwrap();
            assert_eq!(flags.flag, expected, "decoding {json}");
        }

        assert!(serde_json::from_str::<Flags>(r#"{"flag": 2}"#).is_err());
        assert!(serde_json::from_str::<Flags>(r#"{"flag": "maybe"}"#).is_err());
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let flags: Flags = serde_json::from_str(r#"{"number": "1450"}"#).unwrap();
        assert_eq!(flags.number, Some(1450));

        let flags: Flags = serde_json::from_str(r#"{"number": 4789}"#).unwrap();
        assert_eq!(flags.number, Some(4789));

        assert!(serde_json::from_str::<Flags>(r#"{"number": "mtu"}"#).is_err());
        assert!(serde_json::from_str::<Flags>(r#"{"number": 9999999999}"#).is_err());
    }
}

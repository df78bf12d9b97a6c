//! Lenient decoding for the server's loosely typed JSON.
//!
//! The server encodes numbers as strings in some places, sends `null` for
//! fields it has nothing to say about, and collapses one-element arrays into
//! bare objects. Those quirks are handled by `serde_with` adapters on the
//! fields themselves; this module holds the one they do not cover.

use serde::{Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};

/// Booleans sent as JSON booleans or as text in any letter case.
///
/// `true`, `"true"` and `"True"` all decode to `true`; any other text
/// decodes to `false`. Serializes as a plain boolean.
pub(crate) struct BoolFromText;

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrText {
    Bool(bool),
    Text(String),
}

impl<'de> DeserializeAs<'de, bool> for BoolFromText {
    fn deserialize_as<D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match BoolOrText::deserialize(deserializer)? {
            BoolOrText::Bool(b) => b,
            BoolOrText::Text(s) => s.eq_ignore_ascii_case("true"),
        })
    }
}

impl SerializeAs<bool> for BoolFromText {
    fn serialize_as<S>(source: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bool(*source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_with::{serde_as, DefaultOnNull, NoneAsEmptyString, OneOrMany, PickFirst};

    #[serde_as]
    #[derive(Serialize, Deserialize)]
    struct Fields {
        #[serde_as(as = "PickFirst<(Option<_>, NoneAsEmptyString)>")]
        #[serde(default)]
        n: Option<i64>,
        #[serde_as(as = "Option<BoolFromText>")]
        b: Option<bool>,
        #[serde_as(as = "DefaultOnNull<PickFirst<(Vec<_>, OneOrMany<_>)>>")]
        #[serde(default)]
        items: Vec<u32>,
    }

    #[test]
    fn test_number_as_string() {
        let p: Fields = serde_json::from_str(r#"{"n":"42"}"#).unwrap();
        assert_eq!(p.n, Some(42));
        let p: Fields = serde_json::from_str(r#"{"n":-1}"#).unwrap();
        assert_eq!(p.n, Some(-1));
        let p: Fields = serde_json::from_str(r#"{"n":""}"#).unwrap();
        assert_eq!(p.n, None);
        let p: Fields = serde_json::from_str(r#"{"n":null}"#).unwrap();
        assert_eq!(p.n, None);
    }

    #[test]
    fn test_bool_as_string() {
        let p: Fields = serde_json::from_str(r#"{"b":"True"}"#).unwrap();
        assert_eq!(p.b, Some(true));
        let p: Fields = serde_json::from_str(r#"{"b":false}"#).unwrap();
        assert_eq!(p.b, Some(false));
        let p: Fields = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.b, None);
        assert_eq!(
            serde_json::to_string(&Fields { n: None, b: Some(true), items: vec![] }).unwrap(),
            r#"{"n":null,"b":true,"items":[]}"#
        );
    }

    #[test]
    fn test_single_object_becomes_vec() {
        let p: Fields = serde_json::from_str(r#"{"items":7}"#).unwrap();
        assert_eq!(p.items, vec![7]);
        let p: Fields = serde_json::from_str(r#"{"items":[1,2]}"#).unwrap();
        assert_eq!(p.items, vec![1, 2]);
        let p: Fields = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(p.items.is_empty());
        let p: Fields = serde_json::from_str(r#"{"items":null}"#).unwrap();
        assert!(p.items.is_empty());
        let p: Fields = serde_json::from_str(r#"{}"#).unwrap();
        assert!(p.items.is_empty());
    }

    #[test]
    fn test_malformed_number_rejected() {
        assert!(serde_json::from_str::<Fields>(r#"{"n":"abc"}"#).is_err());
    }
}

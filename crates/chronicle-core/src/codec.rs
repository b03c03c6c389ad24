//! Structured payload codec shared by event and readmodel persistence.
//!
//! Payload types declare camelCase field names through serde. On encode,
//! object fields holding `null` are omitted. On decode, a payload that does
//! not match the target shape exactly is read again with struct field names
//! matched case-insensitively, ignoring underscores, so `aggregateid`,
//! `AGGREGATE_ID` and `AggregateId` all bind to `aggregateId`.

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, forward_to_deserialize_any};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// Encodes `value` into a JSON payload without `null` object fields.
///
/// # Errors
///
/// Returns `DomainError::Serialization` if `value` cannot be represented as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, DomainError> {
    let mut payload = serde_json::to_value(value)?;
    strip_nulls(&mut payload);
    Ok(payload)
}

/// Decodes a JSON payload into `T`, tolerating differently cased keys.
///
/// # Errors
///
/// Returns `DomainError::Serialization` if the payload does not match `T`
/// even with case-insensitive field names. The error describes the
/// exact-match attempt.
pub fn decode<T: DeserializeOwned>(payload: &Value) -> Result<T, DomainError> {
    match <T as Deserialize>::deserialize(payload) {
        Ok(value) => Ok(value),
        Err(exact) => <T as Deserialize>::deserialize(CaseInsensitive(payload))
            .map_err(|_| DomainError::from(exact)),
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, field| !field.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn fold(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves `key` to the struct field it names, or returns it unchanged.
fn match_field<'a>(key: &'a str, fields: &'static [&'static str]) -> &'a str {
    if fields.iter().any(|field| *field == key) {
        return key;
    }
    let folded = fold(key);
    match fields.iter().find(|field| fold(field) == folded) {
        Some(field) => *field,
        None => key,
    }
}

/// Reads a [`Value`] while binding object keys to struct fields without
/// regard to case.
struct CaseInsensitive<'de>(&'de Value);

impl<'de> Deserializer<'de> for CaseInsensitive<'de> {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => visitor.visit_seq(Items(items.iter())),
            Value::Object(map) => visitor.visit_map(Entries::new(entries(map, None))),
            leaf => leaf.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(Entries::new(entries(map, Some(fields)))),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

fn entries<'de>(
    map: &'de Map<String, Value>,
    fields: Option<&'static [&'static str]>,
) -> Vec<(&'de str, &'de Value)> {
    map.iter()
        .map(|(key, value)| match fields {
            Some(fields) => (match_field(key, fields), value),
            None => (key.as_str(), value),
        })
        .collect()
}

struct Items<'de>(std::slice::Iter<'de, Value>);

impl<'de> SeqAccess<'de> for Items<'de> {
    type Error = serde_json::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.0
            .next()
            .map(|item| seed.deserialize(CaseInsensitive(item)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct Entries<'de> {
    entries: std::vec::IntoIter<(&'de str, &'de Value)>,
    value: Option<&'de Value>,
}

impl<'de> Entries<'de> {
    fn new(entries: Vec<(&'de str, &'de Value)>) -> Self {
        Self {
            entries: entries.into_iter(),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for Entries<'de> {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.entries.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(BorrowedStrDeserializer::<Self::Error>::new(key))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(CaseInsensitive(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Renamed {
        aggregate_id: u32,
        new_name: String,
        nickname: Option<String>,
    }

    #[test]
    fn test_encode_uses_camel_case_and_omits_absent_fields() {
        // Arrange
        let value = Renamed {
            aggregate_id: 7,
            new_name: "Updated Name".to_owned(),
            nickname: None,
        };

        // Act
        let payload = encode(&value).unwrap();

        // Assert
        assert_eq!(payload, json!({ "aggregateId": 7, "newName": "Updated Name" }));
    }

    #[test]
    fn test_encode_keeps_nulls_inside_arrays() {
        let payload = encode(&json!({ "items": [1, null], "gone": null })).unwrap();

        assert_eq!(payload, json!({ "items": [1, null] }));
    }

    #[test]
    fn test_decode_accepts_pascal_case_keys() {
        let payload = json!({ "AggregateId": 7, "NewName": "Updated Name" });

        let value: Renamed = decode(&payload).unwrap();

        assert_eq!(value.aggregate_id, 7);
        assert_eq!(value.new_name, "Updated Name");
        assert_eq!(value.nickname, None);
    }

    #[test]
    fn test_decode_accepts_snake_and_upper_case_keys() {
        let payload = json!({ "aggregate_id": 7, "new_name": "x", "NICKNAME": "y" });

        let value: Renamed = decode(&payload).unwrap();

        assert_eq!(value.nickname.as_deref(), Some("y"));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let payload = json!({ "aggregateId": "not a number" });

        let result: Result<Renamed, DomainError> = decode(&payload);

        match result {
            Err(DomainError::Serialization(_)) => {}
            other => panic!("expected Serialization, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_accepts_all_lowercase_keys() {
        let payload = json!({ "aggregateid": 7, "newname": "x" });

        let value: Renamed = decode(&payload).unwrap();

        assert_eq!(value.aggregate_id, 7);
        assert_eq!(value.new_name, "x");
    }

    #[test]
    fn test_decode_accepts_all_uppercase_keys() {
        let payload = json!({ "AGGREGATEID": 7, "NEWNAME": "x", "NICKNAME": null });

        let value: Renamed = decode(&payload).unwrap();

        assert_eq!(value.aggregate_id, 7);
        assert_eq!(value.new_name, "x");
        assert_eq!(value.nickname, None);
    }

    #[test]
    fn test_decode_matches_nested_keys_case_insensitively() {
        #[derive(Debug, PartialEq, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Batch {
            batch_id: u32,
            renames: Vec<Renamed>,
        }

        let payload = json!({
            "BATCHID": 1,
            "Renames": [{ "aggregateid": 7, "NEW_NAME": "x" }]
        });

        let batch: Batch = decode(&payload).unwrap();

        assert_eq!(batch.batch_id, 1);
        assert_eq!(batch.renames[0].aggregate_id, 7);
        assert_eq!(batch.renames[0].new_name, "x");
    }

    #[test]
    fn test_decode_keeps_map_keys_as_written() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Tally {
            tally_id: u32,
            counts: std::collections::BTreeMap<String, u32>,
        }

        let tally: Tally = decode(&json!({ "TallyId": 2, "counts": { "TallyId": 5 } })).unwrap();

        assert_eq!(tally.tally_id, 2);
        assert_eq!(tally.counts.get("TallyId"), Some(&5));
    }

    #[test]
    fn test_match_field_ignores_case_and_underscores() {
        const FIELDS: &[&str] = &["aggregateId", "newName"];

        assert_eq!(match_field("aggregate_id", FIELDS), "aggregateId");
        assert_eq!(match_field("AGGREGATEID", FIELDS), "aggregateId");
        assert_eq!(match_field("newName", FIELDS), "newName");
        assert_eq!(match_field("unknown", FIELDS), "unknown");
    }
}

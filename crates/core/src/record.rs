use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Flat field map carried by every record. Nested objects are allowed as
/// values but merges only ever operate on the top level.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// A single addressable unit of persisted state under a collection path.
///
/// `id` and `created_at` are assigned by the gateway on create and are
/// immutable afterwards; everything feature-specific lives in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Record {
    pub fn new(id: String, created_at: DateTime<Utc>, fields: FieldMap) -> Self {
        Self {
            id,
            created_at,
            fields,
        }
    }

    /// Decode the field map into a typed document.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(self.fields.clone()))
    }

    /// Merge a partial field map into this record, last-write-wins per
    /// top-level field. Keys absent from the patch are untouched.
    pub fn merge_fields(&mut self, patch: FieldMap) {
        for (key, value) in patch {
            self.fields.insert(key, value);
        }
    }
}

/// Encode a document into a field map suitable for create/update calls.
///
/// Documents always serialize to JSON objects; anything else is a programmer
/// error surfaced as a serde error.
pub fn to_fields<T: Serialize>(data: &T) -> Result<FieldMap, serde_json::Error> {
    match serde_json::to_value(data)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "document must serialize to an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with(fields: serde_json::Value) -> Record {
        let serde_json::Value::Object(map) = fields else {
            panic!("fields must be an object");
        };
        Record::new("r1".to_string(), Utc::now(), map)
    }

    #[test]
    fn merge_overwrites_only_patched_fields() {
        let mut record = record_with(json!({"title": "old", "completed": false}));
        let serde_json::Value::Object(patch) = json!({"completed": true}) else {
            unreachable!()
        };
        record.merge_fields(patch);
        assert_eq!(record.fields["title"], json!("old"));
        assert_eq!(record.fields["completed"], json!(true));
    }

    #[test]
    fn merge_is_last_write_wins_per_field() {
        let mut record = record_with(json!({"title": "a"}));
        let serde_json::Value::Object(p1) = json!({"title": "b", "extra": 1}) else {
            unreachable!()
        };
        let serde_json::Value::Object(p2) = json!({"title": "c"}) else {
            unreachable!()
        };
        record.merge_fields(p1);
        record.merge_fields(p2);
        assert_eq!(record.fields["title"], json!("c"));
        assert_eq!(record.fields["extra"], json!(1));
    }

    #[test]
    fn to_fields_rejects_non_objects() {
        assert!(to_fields(&"just a string").is_err());
        assert!(to_fields(&42u32).is_err());
    }

    #[test]
    fn record_roundtrips_through_json() {
        let record = record_with(json!({"title": "Read Ch.5"}));
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: Record = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

/// A JSON record kept as its original source text
///
/// Key order and number literals are never re-parsed, so a record written
/// back out carries exactly the keys, order and digits it was read with.
/// Equality compares the stored text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonRecord(Box<RawValue>);

impl JsonRecord {
    /// Record holding the serialized form of `value`
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        serde_json::value::to_raw_value(value).map(Self)
    }

    /// Source text of the record
    pub fn get(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for JsonRecord {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_text_is_kept() {
        let records: Vec<JsonRecord> =
            serde_json::from_str(r#"[{"b": 1.50, "a": 2}, 98765432109876543210]"#).unwrap();

        assert_eq!(records[0].get(), r#"{"b": 1.50, "a": 2}"#);
        assert_eq!(records[1].get(), "98765432109876543210");
    }

    #[test]
    fn test_from_value() {
        let record = JsonRecord::from_value(&json!({"id": 7})).unwrap();
        assert_eq!(record.get(), r#"{"id":7}"#);
        assert_eq!(record, JsonRecord::from_value(&json!({"id": 7})).unwrap());
    }
}

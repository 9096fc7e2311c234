//! Record types
//!
//! `Record` is what the table stores and returns. `NewRecord` is what a caller
//! hands to `add`: it has no `id`, since only the engine assigns primary keys.

use serde::{Deserialize, Serialize};

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Engine-assigned primary key, unique and never reused
    pub id: i64,
    /// Caller-supplied value, indexed for secondary lookup (not unique)
    pub second_id: i64,
    pub name: String,
}

/// A record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub second_id: i64,
    pub name: String,
}

impl NewRecord {
    pub fn new(second_id: i64, name: impl Into<String>) -> Self {
        Self {
            second_id,
            name: name.into(),
        }
    }

    /// Attach the key the engine assigned on insert
    pub fn with_id(self, id: i64) -> Record {
        Record {
            id,
            second_id: self.second_id,
            name: self.name,
        }
    }
}

impl Record {
    /// Copy of this record with a different name, same keys
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} [second_id={}] {}", self.id, self.second_id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let record = NewRecord::new(1, "New Test data").with_id(7);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["second_id"], 1);
        assert_eq!(json["name"], "New Test data");
    }

    #[test]
    fn test_new_record_has_no_id() {
        let json = serde_json::to_value(NewRecord::new(3, "x")).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_renamed_keeps_keys() {
        let record = Record { id: 4, second_id: 9, name: "before".into() };
        let edited = record.renamed("after");

        assert_eq!(edited.id, 4);
        assert_eq!(edited.second_id, 9);
        assert_eq!(edited.name, "after");
        assert_eq!(edited.to_string(), "#4 [second_id=9] after");
    }
}

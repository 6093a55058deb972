use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single persisted record. Items are append-only: nothing in the
/// system updates or deletes one after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Free-form text; amounts like "9.99" are kept verbatim.
    pub value: Option<String>,
    /// Assigned by the store at insertion (UTC, second precision).
    pub created_at: NaiveDateTime,
}

impl Item {
    /// Description, treating NULL and "" alike.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|s| !s.is_empty())
    }

    /// Value, treating NULL and "" alike.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(description: Option<&str>, value: Option<&str>) -> Item {
        Item {
            id: 1,
            name: "Widget".to_string(),
            description: description.map(String::from),
            value: value.map(String::from),
            created_at: NaiveDateTime::parse_from_str("2025-01-02 03:04:05", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    #[test]
    fn empty_fields_read_as_absent() {
        let it = item(Some(""), None);
        assert_eq!(it.description(), None);
        assert_eq!(it.value(), None);
    }

    #[test]
    fn non_empty_fields_are_returned() {
        let it = item(Some("A small widget"), Some("9.99"));
        assert_eq!(it.description(), Some("A small widget"));
        assert_eq!(it.value(), Some("9.99"));
    }
}

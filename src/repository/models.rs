// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::store::entity::{optional_timestamp_column, timestamp_column};
use crate::store::{Column, Entity, Timestamped, Value};

const EPOCH_TEXT: &str = "TEXT NOT NULL DEFAULT '1970-01-01T00:00:00.000000Z'";

/// A user-keyed opaque value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueEntry {
    /// User supplied key
    pub id: String,

    pub value: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker. Kept in the schema, never set or filtered on.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl KeyValueEntry {
    /// Entry with both timestamps set to now; the repository restamps them.
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            value: value.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Entity for KeyValueEntry {
    type Id = String;

    const NAME: &'static str = "data";
    const TABLE: &'static str = "data";
    const ID_COLUMN: &'static str = "id";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", "TEXT PRIMARY KEY"),
        Column::new("value", "TEXT NOT NULL DEFAULT ''"),
        Column::new("created_at", EPOCH_TEXT),
        Column::new("updated_at", EPOCH_TEXT),
        Column::indexed("deleted_at", "TEXT"),
    ];

    fn id(&self) -> String {
        self.id.clone()
    }

    fn is_addressable(id: &String) -> bool {
        !id.is_empty()
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("value", self.value.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            value: row.try_get("value")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
            deleted_at: optional_timestamp_column(row, "deleted_at")?,
        })
    }

    fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, existing: &Self, now: DateTime<Utc>) {
        self.created_at = existing.created_at;
        self.deleted_at = existing.deleted_at;
        self.updated_at = now;
    }
}

impl Timestamped for KeyValueEntry {
    const CREATED_AT_COLUMN: &'static str = "created_at";
}

/// A named, geo-tagged place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Engine-assigned on create
    pub id: i64,

    pub latitude: f64,

    #[serde(alias = "longitutde")]
    pub longitude: f64,

    #[serde(rename = "location")]
    pub location_name: String,

    /// URI or encoded image reference, stored as given
    pub image: String,
}

impl Entity for Location {
    type Id = i64;

    const NAME: &'static str = "Location";
    const TABLE: &'static str = "locations";
    const ID_COLUMN: &'static str = "id";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        Column::new("latitude", "REAL NOT NULL DEFAULT 0"),
        Column::new("longitude", "REAL NOT NULL DEFAULT 0"),
        Column::new("location", "TEXT NOT NULL DEFAULT ''"),
        Column::new("image", "TEXT NOT NULL DEFAULT ''"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn is_addressable(id: &i64) -> bool {
        *id >= 0
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        let mut values = Vec::with_capacity(5);
        if self.id > 0 {
            values.push(("id", self.id.into()));
        }
        values.extend([
            ("latitude", self.latitude.into()),
            ("longitude", self.longitude.into()),
            ("location", self.location_name.clone().into()),
            ("image", self.image.clone().into()),
        ]);
        values
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            location_name: row.try_get("location")?,
            image: row.try_get("image")?,
        })
    }

    fn assign_id(&mut self, rowid: i64) {
        self.id = rowid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_entry_new() {
        let entry = KeyValueEntry::new("key", "value");

        assert_eq!(entry.id, "key");
        assert_eq!(entry.value, "value");
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.deleted_at, None);
        assert!(entry.created_at <= Utc::now());
    }

    #[test]
    fn test_key_value_entry_addressable() {
        assert!(KeyValueEntry::is_addressable(&"k".to_string()));
        assert!(!KeyValueEntry::is_addressable(&String::new()));
    }

    #[test]
    fn test_stamp_updated_keeps_creation_time() {
        let mut existing = KeyValueEntry::new("k", "old");
        existing.created_at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut incoming = KeyValueEntry::new("k", "new");
        let now = Utc::now();

        incoming.stamp_updated(&existing, now);

        assert_eq!(incoming.created_at, existing.created_at);
        assert_eq!(incoming.updated_at, now);
        assert_eq!(incoming.value, "new");
    }

    #[test]
    fn test_location_serialize_json() {
        let location = Location {
            id: 7,
            latitude: 46.77,
            longitude: 23.59,
            location_name: "Cluj".to_string(),
            image: "https://example.com/cluj.png".to_string(),
        };

        let json = serde_json::to_string(&location).unwrap();
        assert!(json.contains("\"id\":7"));
        assert!(json.contains("\"latitude\":46.77"));
        assert!(json.contains("\"longitude\":23.59"));
        assert!(json.contains("\"location\":\"Cluj\""));
        assert!(json.contains("\"image\":\"https://example.com/cluj.png\""));
    }

    #[test]
    fn test_location_deserialize_accepts_legacy_longitude_spelling() {
        let json = r#"{"latitude": 1.5, "longitutde": 2.5, "location": "Somewhere"}"#;

        let location: Location = serde_json::from_str(json).unwrap();
        assert_eq!(location.longitude, 2.5);
        assert_eq!(location.latitude, 1.5);
        assert_eq!(location.location_name, "Somewhere");
        assert_eq!(location.id, 0);
        assert_eq!(location.image, "");
    }

    #[test]
    fn test_location_values_leave_out_unassigned_id() {
        let unassigned = Location::default();
        assert!(unassigned.values().iter().all(|(column, _)| *column != "id"));

        let assigned = Location { id: 3, ..Location::default() };
        assert_eq!(assigned.values()[0], ("id", Value::Integer(3)));
    }

    #[test]
    fn test_location_addressable() {
        assert!(Location::is_addressable(&0));
        assert!(Location::is_addressable(&12));
        assert!(!Location::is_addressable(&-1));
    }
}

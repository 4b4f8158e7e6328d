//! Integration tests for the attribute binder against an in-memory record.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use typecol_binder::{
    Assignment, AttributeBinder, AttributeCache, AttributeError, BindingRegistry, Column,
    RawValue, Record,
};
use typecol_schema::{FieldType, Schema, TypedStruct};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserSettings {
    theme: String,
    font_size: i64,
    notifications: bool,
}

impl TypedStruct for UserSettings {
    const NAME: &'static str = "UserSettings";

    fn schema() -> typecol_schema::Result<Schema> {
        Schema::builder(Self::NAME)
            .optional("theme", FieldType::String, "light")
            .optional("font_size", FieldType::Integer, 14)
            .optional("notifications", FieldType::Boolean, true)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserPreferences {
    language: String,
    timezone: String,
}

impl TypedStruct for UserPreferences {
    const NAME: &'static str = "UserPreferences";

    fn schema() -> typecol_schema::Result<Schema> {
        Schema::builder(Self::NAME)
            .optional("language", FieldType::String, "en")
            .optional("timezone", FieldType::String, "UTC")
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Calibration {
    offset: f64,
}

impl TypedStruct for Calibration {
    const NAME: &'static str = "Calibration";

    fn schema() -> typecol_schema::Result<Schema> {
        Schema::builder(Self::NAME)
            .optional("offset", FieldType::Float, 0.0)
            .build()
    }
}

const SETTINGS: Column<UserSettings> = Column::new("settings");
const PREFERENCES: Column<UserPreferences> = Column::new("preferences");
const CALIBRATION: Column<Calibration> = Column::new("calibration");
const SETTINGS_AS_PREFERENCES: Column<UserPreferences> = Column::new("settings");

/// Minimal record: staged columns plus a "committed" copy standing in for storage.
#[derive(Debug, Default)]
struct TestRecord {
    record_type: String,
    staged: BTreeMap<String, RawValue>,
    committed: BTreeMap<String, RawValue>,
    cache: AttributeCache,
}

impl TestRecord {
    fn new(record_type: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            ..Default::default()
        }
    }

    fn with_text(mut self, column: &str, text: &str) -> Self {
        self.committed
            .insert(column.to_string(), RawValue::Text(text.to_string()));
        self.staged = self.committed.clone();
        self
    }

    fn commit(&mut self, binder: &AttributeBinder) -> Result<(), AttributeError> {
        binder.before_persist(self)?;
        self.committed = self.staged.clone();
        Ok(())
    }

    fn reload(&mut self) {
        self.staged = self.committed.clone();
        self.cache.clear_all();
    }

    fn staged_value(&self, column: &str) -> Option<&Value> {
        match self.staged.get(column)? {
            RawValue::Structured(value) => Some(value),
            RawValue::Text(_) => None,
        }
    }
}

impl Record for TestRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn read_raw(&self, column: &str) -> Option<RawValue> {
        self.staged.get(column).cloned()
    }

    fn write_raw(&mut self, column: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.staged
                    .insert(column.to_string(), RawValue::Structured(value));
            }
            None => {
                self.staged.remove(column);
            }
        }
    }

    fn attribute_cache(&self) -> &AttributeCache {
        &self.cache
    }

    fn attribute_cache_mut(&mut self) -> &mut AttributeCache {
        &mut self.cache
    }
}

fn binder() -> AttributeBinder {
    let mut registry = BindingRegistry::new();
    registry.register("User", &SETTINGS).unwrap();
    registry.register("User", &PREFERENCES).unwrap();
    registry.declare_subtype("Sensor", "User").unwrap();
    registry.register("Sensor", &CALIBRATION).unwrap();
    AttributeBinder::new(Arc::new(registry))
}

#[test]
fn reads_stored_json_text() {
    let binder = binder();
    let mut user = TestRecord::new("User")
        .with_text("settings", r#"{"theme":"dark","font_size":16,"notifications":false}"#);

    let settings = binder.read(&mut user, &SETTINGS).unwrap().unwrap();
    assert_eq!(settings.theme, "dark");
    assert_eq!(settings.font_size, 16);
    assert!(!settings.notifications);
}

#[test]
fn nil_column_reads_as_none_and_is_cached() {
    let binder = binder();
    let mut user = TestRecord::new("User");

    assert!(binder.read(&mut user, &SETTINGS).unwrap().is_none());
    assert!(user.cache.get("settings").is_loaded());
    assert!(user.cache.get("settings").value().is_none());
}

#[test]
fn null_text_reads_as_none() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", "null");
    assert!(binder.read(&mut user, &SETTINGS).unwrap().is_none());
}

#[test]
fn repeated_reads_return_the_same_struct() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", r#"{"theme":"dark"}"#);

    let first: *const UserSettings = binder.read(&mut user, &SETTINGS).unwrap().unwrap();
    let second: *const UserSettings = binder.read(&mut user, &SETTINGS).unwrap().unwrap();
    assert!(std::ptr::eq(first, second));
}

#[test]
fn in_place_mutation_is_visible_on_next_read() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", "{}");

    binder.read(&mut user, &SETTINGS).unwrap().unwrap().theme = "dark".to_string();
    assert_eq!(binder.read(&mut user, &SETTINGS).unwrap().unwrap().theme, "dark");
}

#[test]
fn malformed_text_is_a_deserialization_error() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", "{not json");

    let error = binder.read(&mut user, &SETTINGS).unwrap_err();
    assert!(matches!(error, AttributeError::Deserialization { .. }));
    assert!(user.cache.get("settings").is_unloaded());
}

#[test]
fn stored_value_of_wrong_shape_is_a_deserialization_error() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", r#"{"font_size":"big"}"#);

    let error = binder.read(&mut user, &SETTINGS).unwrap_err();
    let schema_error = error.schema_error().unwrap();
    assert_eq!(schema_error.offending_fields(), vec!["font_size"]);
}

#[test]
fn assigning_a_struct_encodes_immediately() {
    let binder = binder();
    let mut user = TestRecord::new("User");
    let settings = UserSettings {
        theme: "dark".to_string(),
        font_size: 18,
        notifications: false,
    };

    binder
        .assign(&mut user, &SETTINGS, Assignment::Typed(settings.clone()))
        .unwrap();

    assert_eq!(
        user.staged_value("settings"),
        Some(&json!({"theme": "dark", "font_size": 18, "notifications": false}))
    );
    assert_eq!(user.cache.peek::<UserSettings>("settings"), Some(&settings));
}

#[test]
fn assigning_a_map_caches_the_normalized_struct() {
    let binder = binder();
    let mut user = TestRecord::new("User");

    binder
        .assign(
            &mut user,
            &SETTINGS,
            json!({"theme": "blue", "font_size": "20", "unknown": 1}).into(),
        )
        .unwrap();

    assert_eq!(
        user.staged_value("settings"),
        Some(&json!({"theme": "blue", "font_size": 20, "notifications": true}))
    );
    let cached = binder.read(&mut user, &SETTINGS).unwrap().unwrap();
    assert_eq!(
        *cached,
        UserSettings {
            theme: "blue".to_string(),
            font_size: 20,
            notifications: true,
        }
    );
}

#[test]
fn map_and_struct_assignments_read_back_identically() {
    let binder = binder();
    let typed = UserSettings {
        theme: "dark".to_string(),
        font_size: 14,
        notifications: true,
    };

    let mut from_struct = TestRecord::new("User");
    binder
        .assign(&mut from_struct, &SETTINGS, Assignment::Typed(typed.clone()))
        .unwrap();
    let mut from_map = TestRecord::new("User");
    binder
        .assign(&mut from_map, &SETTINGS, json!({"theme": "dark"}).into())
        .unwrap();

    assert_eq!(from_struct.staged_value("settings"), from_map.staged_value("settings"));
    assert_eq!(
        binder.read(&mut from_map, &SETTINGS).unwrap().cloned(),
        Some(typed)
    );
}

#[test]
fn invalid_map_leaves_record_untouched() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", r#"{"theme":"dark"}"#);
    binder.read(&mut user, &SETTINGS).unwrap();

    let error = binder
        .assign(&mut user, &SETTINGS, json!({"notifications": "sometimes"}).into())
        .unwrap_err();
    assert!(matches!(error, AttributeError::Deserialization { .. }));
    assert_eq!(
        user.read_raw("settings"),
        Some(RawValue::Text(r#"{"theme":"dark"}"#.to_string()))
    );
    assert_eq!(binder.read(&mut user, &SETTINGS).unwrap().unwrap().theme, "dark");
}

#[test]
fn assigning_nil_clears_storage_and_cache() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", "{}");
    binder.read(&mut user, &SETTINGS).unwrap();

    binder.assign(&mut user, &SETTINGS, Assignment::Nil).unwrap();
    assert!(user.read_raw("settings").is_none());
    assert!(user.cache.get("settings").is_unloaded());
    assert!(binder.read(&mut user, &SETTINGS).unwrap().is_none());

    binder
        .assign(&mut user, &PREFERENCES, Value::Null.into())
        .unwrap();
    assert!(binder.read(&mut user, &PREFERENCES).unwrap().is_none());
}

#[test]
fn rejects_scalar_and_array_assignments() {
    let binder = binder();
    let mut user = TestRecord::new("User");

    for (value, kind) in [
        (json!("invalid"), "string"),
        (json!(42), "integer"),
        (json!([1, 2]), "array"),
        (json!(true), "boolean"),
    ] {
        let error = binder
            .assign(&mut user, &SETTINGS, value.into())
            .unwrap_err();
        assert!(matches!(error, AttributeError::InvalidAssignmentShape { .. }));
        assert_eq!(
            error.to_string(),
            format!("settings must be a UserSettings, a structural map, or nil, got {kind}")
        );
    }
    assert!(user.read_raw("settings").is_none());
    assert!(user.cache.get("settings").is_unloaded());
}

#[test]
fn columns_are_independent() {
    let binder = binder();
    let mut user = TestRecord::new("User")
        .with_text("settings", r#"{"theme":"dark"}"#)
        .with_text("preferences", r#"{"language":"fr","timezone":"Europe/Paris"}"#);

    binder.read(&mut user, &SETTINGS).unwrap();
    binder
        .assign(&mut user, &PREFERENCES, json!({"language": "de"}).into())
        .unwrap();

    assert_eq!(user.cache.peek::<UserSettings>("settings").unwrap().theme, "dark");
    assert_eq!(
        user.read_raw("settings"),
        Some(RawValue::Text(r#"{"theme":"dark"}"#.to_string()))
    );
    let preferences = binder.read(&mut user, &PREFERENCES).unwrap().unwrap();
    assert_eq!(preferences.language, "de");
    assert_eq!(preferences.timezone, "UTC");
}

#[test]
fn before_persist_flushes_in_place_changes() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", "{}");

    binder.read(&mut user, &SETTINGS).unwrap().unwrap().font_size = 22;
    assert_eq!(binder.before_persist(&mut user).unwrap(), 1);
    assert_eq!(user.staged_value("settings").unwrap()["font_size"], json!(22));
}

#[test]
fn before_persist_skips_unloaded_and_nil_slots() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", "{}");
    binder.read(&mut user, &PREFERENCES).unwrap();

    assert_eq!(binder.before_persist(&mut user).unwrap(), 0);
    assert_eq!(user.read_raw("settings"), Some(RawValue::Text("{}".to_string())));
}

#[test]
fn failed_flush_writes_nothing() {
    let binder = binder();
    let mut sensor = TestRecord::new("Sensor")
        .with_text("settings", "{}")
        .with_text("calibration", r#"{"offset":1.5}"#);

    binder.read(&mut sensor, &SETTINGS).unwrap().unwrap().theme = "dark".to_string();
    binder.read(&mut sensor, &CALIBRATION).unwrap().unwrap().offset = f64::INFINITY;

    let error = sensor.commit(&binder).unwrap_err();
    assert!(matches!(error, AttributeError::Serialization { .. }));
    assert_eq!(error.column(), Some("calibration"));
    assert_eq!(sensor.read_raw("settings"), Some(RawValue::Text("{}".to_string())));
}

#[test]
fn reload_discards_unsaved_changes() {
    let binder = binder();
    let mut user = TestRecord::new("User").with_text("settings", r#"{"theme":"light"}"#);

    binder.read(&mut user, &SETTINGS).unwrap().unwrap().theme = "dark".to_string();
    user.reload();
    assert_eq!(binder.read(&mut user, &SETTINGS).unwrap().unwrap().theme, "light");

    binder.read(&mut user, &SETTINGS).unwrap().unwrap().theme = "dark".to_string();
    user.commit(&binder).unwrap();
    user.reload();
    assert_eq!(binder.read(&mut user, &SETTINGS).unwrap().unwrap().theme, "dark");
}

#[test]
fn subtype_sees_inherited_columns() {
    let binder = binder();
    let mut sensor = TestRecord::new("Sensor").with_text("preferences", r#"{"language":"nl"}"#);

    assert_eq!(
        binder.read(&mut sensor, &PREFERENCES).unwrap().unwrap().language,
        "nl"
    );
    assert!(binder.read(&mut sensor, &CALIBRATION).unwrap().is_none());

    let mut user = TestRecord::new("User");
    let error = binder.read(&mut user, &CALIBRATION).unwrap_err();
    assert!(matches!(error, AttributeError::UnregisteredColumn { .. }));
}

#[test]
fn column_handle_must_match_registered_struct() {
    let binder = binder();
    let mut user = TestRecord::new("User");

    let error = binder
        .assign(&mut user, &SETTINGS_AS_PREFERENCES, Assignment::Nil)
        .unwrap_err();
    assert!(matches!(
        error,
        AttributeError::ColumnTypeMismatch {
            bound: "UserSettings",
            requested: "UserPreferences",
            ..
        }
    ));
    assert!(error.is_contract_violation());
}

use chrono::{NaiveDate, NaiveDateTime};
use scribe_core::{Entry, EntryDraft, EntryPatch, EntryValidationError, HistoryRecord};

#[test]
fn entry_serialization_uses_expected_wire_fields() {
    let entry = sample_entry();

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["entry_id"], 7);
    assert_eq!(json["category"], "books");
    assert_eq!(json["sub_category"], "fiction");
    assert_eq!(json["title"], "The Great Gatsby");
    assert_eq!(json["fronted_title"], "Great Gatsby, The");
    assert_eq!(json["content"], "raw body");
    assert_eq!(json["dynamic_content"], "derived body");
    assert_eq!(json["created_by"], "nick");
    assert_eq!(json["edited_by"], "jordan");
    assert_eq!(json["created"], "2026-01-02T03:04:05");
    assert_eq!(json["edited"], "2026-01-02T09:00:00");
    assert_eq!(json["published"], serde_json::Value::Null);
    assert_eq!(json["is_draft"], false);
    assert_eq!(json["is_hidden"], true);

    let decoded: Entry = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, entry);
}

#[test]
fn draft_default_is_blank_and_fails_validation() {
    let err = EntryDraft::default()
        .validate(&scribe_core::StoreConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        EntryValidationError::EmptyFields(vec![
            "category",
            "sub_category",
            "title",
            "content",
            "author",
        ])
    );
}

#[test]
fn patch_round_trips_tri_state_flags() {
    let patch = EntryPatch {
        title: Some("New Title".to_string()),
        is_draft: Some(true),
        ..EntryPatch::default()
    };

    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json["title"], "New Title");
    assert_eq!(json["is_draft"], true);
    assert_eq!(json["is_hidden"], serde_json::Value::Null);
    assert_eq!(json["content"], serde_json::Value::Null);

    let decoded: EntryPatch = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, patch);
}

#[test]
fn history_record_exposes_its_owning_entry() {
    let record = HistoryRecord {
        history_id: 3,
        entry: sample_entry(),
    };

    assert_eq!(record.entry_id(), 7);

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["history_id"], 3);
    assert_eq!(json["entry"]["entry_id"], 7);

    let decoded: HistoryRecord = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, record);
}

fn sample_entry() -> Entry {
    Entry {
        entry_id: 7,
        category: "books".to_string(),
        sub_category: "fiction".to_string(),
        title: "The Great Gatsby".to_string(),
        fronted_title: "Great Gatsby, The".to_string(),
        content: "raw body".to_string(),
        dynamic_content: Some("derived body".to_string()),
        created_by: "nick".to_string(),
        edited_by: "jordan".to_string(),
        created: at(2026, 1, 2, 3, 4, 5),
        edited: at(2026, 1, 2, 9, 0, 0),
        published: None,
        is_draft: false,
        is_hidden: true,
    }
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

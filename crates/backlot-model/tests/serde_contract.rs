// SPDX-License-Identifier: Apache-2.0

use backlot_model::{LeadRecord, MirrorSnapshot, NewLead};
use serde_json::{json, Value};

#[test]
fn lead_record_wire_names_match_table_columns() {
    let raw = json!({
        "id": "3e9c1b2a",
        "address": "123 Main St, Boston, MA 02108",
        "street": "123 Main St",
        "city": "Boston",
        "state": "MA",
        "zip_code": "02108",
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane@example.com",
        "lot_size": "6,200 sq ft",
        "zoning": "Residential R-1",
        "allows_adu": true,
        "max_adu_size": "900 sq ft",
        "setback_front": "20 ft",
        "setback_back": "15 ft",
        "setback_sides": "8 ft",
        "additional_notes": ["Property is eligible for ADU development"],
        "satellite_image_url": "https://example.test/map.png",
        "service_available": true,
        "created_at": "2026-08-01T12:00:00Z"
    });
    let record: LeadRecord = serde_json::from_value(raw.clone()).expect("deserialize");
    assert_eq!(record.id.as_str(), "3e9c1b2a");
    assert!(record.service_available);

    let back = serde_json::to_value(&record).expect("serialize");
    assert_eq!(back, raw);
}

#[test]
fn absent_and_null_analysis_columns_fall_back_to_presentation_defaults() {
    // A row written before the analysis columns existed.
    let sparse: LeadRecord = serde_json::from_value(json!({
        "id": "a1",
        "address": "9 Elm St, Fresno, CA 93701",
        "first_name": "Sam",
        "last_name": "Lee",
        "email": "sam@example.com"
    }))
    .expect("sparse row");
    assert!(sparse.allows_adu, "allows_adu defaults true");
    assert!(!sparse.service_available, "service_available defaults false");
    assert!(sparse.additional_notes.is_empty());

    // The same columns explicitly null.
    let nulled: LeadRecord = serde_json::from_value(json!({
        "id": "a2",
        "address": "9 Elm St, Fresno, CA 93701",
        "first_name": "Sam",
        "last_name": "Lee",
        "email": "sam@example.com",
        "allows_adu": null,
        "service_available": null,
        "additional_notes": null,
        "lot_size": null
    }))
    .expect("nulled row");
    assert!(nulled.allows_adu);
    assert!(!nulled.service_available);
    assert!(nulled.additional_notes.is_empty());
    assert_eq!(nulled.lot_size, None);
}

#[test]
fn new_lead_serializes_every_table_column_it_owns() {
    let lead = NewLead {
        address: "123 Main St, Boston, MA 02108".to_string(),
        street: Some("123 Main St".to_string()),
        city: Some("Boston".to_string()),
        state: Some("MA".to_string()),
        zip_code: Some("02108".to_string()),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        lot_size: None,
        zoning: None,
        allows_adu: true,
        max_adu_size: None,
        setback_front: None,
        setback_back: None,
        setback_sides: None,
        additional_notes: vec![],
        satellite_image_url: Some("https://example.test/map.png".to_string()),
        service_available: true,
    };
    let value = serde_json::to_value(&lead).expect("serialize");
    let obj = value.as_object().expect("object");
    for column in [
        "address",
        "street",
        "city",
        "state",
        "zip_code",
        "first_name",
        "last_name",
        "email",
        "satellite_image_url",
        "service_available",
    ] {
        assert!(obj.contains_key(column), "missing column {column}");
    }
    assert!(!obj.contains_key("id"), "id is server-minted");
    assert!(!obj.contains_key("created_at"), "created_at is server-minted");
}

#[test]
fn mirror_snapshot_roundtrips_and_tolerates_old_slots() {
    let snapshot = MirrorSnapshot {
        address: "123 Main St, Boston, MA 02108".to_string(),
        street: "123 Main St".to_string(),
        city: "Boston".to_string(),
        state: "MA".to_string(),
        zip_code: "02108".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        lead_id: Some("3e9c1b2a".to_string()),
        saved_at_ms: 1_754_300_000_000,
    };
    let text = serde_json::to_string(&snapshot).expect("serialize");
    let back: MirrorSnapshot = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back, snapshot);

    // Slots written before the identifier field existed still load.
    let old: Value = json!({
        "address": "123 Main St, Boston, MA 02108",
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane@example.com"
    });
    let parsed: MirrorSnapshot = serde_json::from_value(old).expect("old slot");
    assert_eq!(parsed.lead_id, None);
    assert_eq!(parsed.saved_at_ms, 0);
    assert!(parsed.service_available(), "falls back to the address heuristic");
}

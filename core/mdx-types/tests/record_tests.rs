use mdx_types::{FieldValue, Record, RecordKey};

#[test]
fn record_from_json_object() {
    let record = Record::from_json(serde_json::json!({
        "id": 1,
        "nome": "Ana",
        "ativo": true
    }))
    .unwrap();

    assert_eq!(record.len(), 3);
    assert_eq!(record.get("nome"), Some(&FieldValue::Text("Ana".into())));
    assert_eq!(record.key("id"), Some(RecordKey::Int(1)));
}

#[test]
fn record_from_non_object_fails() {
    assert!(Record::from_json(serde_json::json!([1, 2])).is_err());
}

#[test]
fn record_json_roundtrip_preserves_fields() {
    let json = serde_json::json!({"id": 3, "nome": "Bia", "extra": {"k": 1}});
    let record = Record::from_json(json.clone()).unwrap();
    assert_eq!(record.to_json(), json);
}

#[test]
fn record_serde() {
    let record = Record::new().with("id", 1i64).with("nome", "Ana");
    let s = serde_json::to_string(&record).unwrap();
    let back: Record = serde_json::from_str(&s).unwrap();
    assert_eq!(back, record);
}

#[test]
fn record_insert_remove() {
    let mut record = Record::new();
    record.insert("a", 1i64);
    assert!(record.contains("a"));
    assert_eq!(record.remove("a"), Some(FieldValue::Int(1)));
    assert!(record.is_empty());
}

#[test]
fn key_missing_or_null() {
    let record = Record::new().with("id", FieldValue::Null);
    assert_eq!(record.key("id"), None);
    assert_eq!(record.key("other"), None);
}

#[test]
fn key_from_text_and_integral_float() {
    assert_eq!(
        RecordKey::from_value(&FieldValue::Text("abc".into())),
        Some(RecordKey::Text("abc".into()))
    );
    assert_eq!(RecordKey::from_value(&FieldValue::Float(4.0)), Some(RecordKey::Int(4)));
    assert_eq!(RecordKey::from_value(&FieldValue::Float(4.5)), None);
}

#[test]
fn keys_order_numerically() {
    let mut keys = vec![RecordKey::Int(10), RecordKey::Int(2), RecordKey::Int(1)];
    keys.sort();
    assert_eq!(keys, vec![RecordKey::Int(1), RecordKey::Int(2), RecordKey::Int(10)]);
}

#[test]
fn key_display() {
    assert_eq!(RecordKey::Int(42).to_string(), "42");
    assert_eq!(RecordKey::Text("x".into()).to_string(), "x");
}

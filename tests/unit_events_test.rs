use almacen_relay::core::RelayError;
use almacen_relay::core::events::{
    AccountStatus, EntityKind, UserChange, classify_inbound, logout_target,
};
use serde_json::json;
use strum::IntoEnumIterator;

#[test]
fn test_every_entity_has_update_and_updated_names() {
    for entity in EntityKind::iter() {
        let update = entity.update_event();
        let updated = entity.updated_event();
        assert_eq!(EntityKind::parse_update_event(update), Some(entity));
        assert_eq!(update, format!("update {entity}"));
        assert_eq!(updated, format!("{entity} updated"));
    }
}

#[test]
fn test_parse_update_event_rejects_unknown_names() {
    assert_eq!(EntityKind::parse_update_event("update pedido"), None);
    assert_eq!(EntityKind::parse_update_event("user updated"), None);
    assert_eq!(EntityKind::parse_update_event("update  user"), None);
    assert_eq!(EntityKind::parse_update_event(""), None);
}

#[test]
fn test_classify_inbound_unknown_event_error() {
    let err = classify_inbound("chat message").unwrap_err();
    assert_eq!(err, RelayError::UnknownEvent("chat message".to_string()));
}

#[test]
fn test_status_inactive_encodings() {
    for estado in [json!(false), json!(0), json!(0.0), json!("inactive")] {
        assert_eq!(
            AccountStatus::from_estado(Some(&estado)),
            AccountStatus::Inactive,
            "estado {estado} should deactivate"
        );
    }
}

#[test]
fn test_status_active_encodings() {
    for estado in [
        json!(true),
        json!(1),
        json!("active"),
        json!("INACTIVE"),
        json!(null),
        json!([0]),
    ] {
        assert_eq!(
            AccountStatus::from_estado(Some(&estado)),
            AccountStatus::Active,
            "estado {estado} should stay active"
        );
    }
    assert_eq!(AccountStatus::from_estado(None), AccountStatus::Active);
}

#[test]
fn test_user_change_parses_id_and_status() {
    let change = UserChange::from_record(&json!({
        "id": "u42",
        "name": "Ana",
        "estado": false,
    }));
    assert_eq!(change.id.as_deref(), Some("u42"));
    assert!(change.status.is_inactive());
}

#[test]
fn test_user_change_numeric_id_is_canonicalized() {
    let change = UserChange::from_record(&json!({ "id": 42, "estado": 0 }));
    assert_eq!(change.id.as_deref(), Some("42"));
    assert!(change.status.is_inactive());
}

#[test]
fn test_user_change_missing_fields() {
    let change = UserChange::from_record(&json!({ "name": "sin id" }));
    assert_eq!(change.id, None);
    assert_eq!(change.status, AccountStatus::Active);
}

#[test]
fn test_logout_target_accepts_string_and_number() {
    assert_eq!(logout_target(&json!("u7")).as_deref(), Some("u7"));
    assert_eq!(logout_target(&json!(7)).as_deref(), Some("7"));
    assert_eq!(logout_target(&json!({"id": "u7"})), None);
    assert_eq!(logout_target(&json!(null)), None);
}

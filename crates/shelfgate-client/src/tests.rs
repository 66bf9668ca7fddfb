use data_encoding::BASE64URL_NOPAD;
use serde_json::{Value, json};

use super::*;

fn response(value: Value) -> LoginResponse {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

fn token_with(payload: &Value) -> String {
    let payload = serde_json::to_vec(payload).expect("Can't fail");
    format!("h.{}.s", BASE64URL_NOPAD.encode(&payload))
}

#[test_log::test]
fn login_id_prefers_response_fields() {
    let token = token_with(&json!({ "id": 1 }));
    let resp = response(json!({ "memberId": "42", "user": { "id": 2 } }));

    assert_eq!(
        member_id_from_login(&resp, Some(&token)),
        Some(MemberId::new(42))
    );
}

#[test_log::test]
fn login_id_falls_back_to_nested_user() {
    let resp = response(json!({ "token": "x", "user": { "user_id": 17 } }));

    assert_eq!(member_id_from_login(&resp, None), Some(MemberId::new(17)));
}

#[test_log::test]
fn login_id_falls_back_to_token_payload() {
    let token = token_with(&json!({ "sub": "555@mail.com" }));
    let resp = response(json!({ "token": token.clone(), "user": "reader" }));

    assert_eq!(
        member_id_from_login(&resp, Some(&token)),
        Some(MemberId::new(555))
    );
}

#[test_log::test]
fn login_id_can_be_missing() {
    let resp = response(json!({ "id": "b7c9-uuid", "user": { "id": 1.5 } }));

    assert_eq!(member_id_from_login(&resp, Some("xxx.yyy.zzz")), None);
    assert_eq!(member_id_from_login(&resp, None), None);
}

use std::sync::Arc;

use serde_json::json;
use shelfgate_core::{RawMemberId, Session};
use shelfgate_store::SessionStore;

use super::*;
use crate::ActiveSubscription;
use crate::test_util::{Reply, ScriptedService, member};

fn resolver(service: ScriptedService) -> (EntitlementResolver, SessionStore, Arc<ScriptedService>) {
    let service = Arc::new(service);
    let store = SessionStore::in_memory();
    (
        EntitlementResolver::new(service.clone(), store.clone()),
        store,
        service,
    )
}

fn no_active() -> Reply<ActiveSubscription> {
    Reply::Ok(ActiveSubscription {
        id: None,
        active: false,
    })
}

#[test_log::test(tokio::test)]
async fn active_subscription_grants_premium_without_history_call() {
    let (resolver, _store, service) = resolver(ScriptedService::with_active_id(7));

    assert_eq!(
        resolver.query(member(42)).await,
        EntitlementSignal::ActiveSubscription
    );
    assert!(resolver.resolve_member(member(42)).await);
    assert_eq!(service.history_calls(), 0);
}

#[test_log::test(tokio::test)]
async fn history_grants_premium_when_no_active_id() {
    let (resolver, _store, service) = resolver(ScriptedService::new(
        no_active(),
        Reply::Ok(vec![json!({ "id": 1, "active": false })]),
    ));

    assert_eq!(
        resolver.query(member(42)).await,
        EntitlementSignal::SubscriptionHistory
    );
    assert_eq!(service.active_calls(), 1);
    assert_eq!(service.history_calls(), 1);
}

#[test_log::test(tokio::test)]
async fn history_grants_premium_when_active_call_fails() {
    let (resolver, _store, _service) = resolver(ScriptedService::new(
        Reply::Fail,
        Reply::Ok(vec![json!({ "id": 3 })]),
    ));

    assert!(resolver.resolve_member(member(42)).await);
}

#[test_log::test(tokio::test)]
async fn empty_history_is_not_premium() {
    let (resolver, _store, _service) = resolver(ScriptedService::new(no_active(), Reply::Ok(vec![])));

    assert_eq!(resolver.query(member(42)).await, EntitlementSignal::None);
}

#[test_log::test(tokio::test)]
async fn both_calls_failing_is_never_premium() {
    let (resolver, store, service) = resolver(ScriptedService::unavailable());
    store
        .set(&Session::logged_in(Some(member(42)), None, None).with_premium(true))
        .expect("Can't fail");

    for _ in 0..3 {
        assert!(!resolver.resolve_member(member(42)).await);
    }
    assert_eq!(service.active_calls(), 3);
    assert_eq!(service.history_calls(), 3);

    // a previously cached `true` is revoked, not kept
    assert!(!store.get().is_premium);
}

#[test_log::test(tokio::test)]
async fn non_numeric_member_id_is_rejected_without_remote_calls() {
    let (resolver, _store, service) = resolver(ScriptedService::with_active_id(7));

    for raw in [json!("abc"), json!(-1), json!(1.5), json!(null), json!({})] {
        assert!(!resolver.resolve(&RawMemberId::new(raw)).await);
    }
    assert_eq!(service.calls(), 0);

    assert!(resolver.resolve(&RawMemberId::new(json!("42"))).await);
}

#[test_log::test(tokio::test)]
async fn verdict_updates_cached_session_state() {
    let (resolver, store, _service) = resolver(ScriptedService::with_active_id(7));
    let session = Session::logged_in(Some(member(42)), None, Some("reader".to_owned()));
    store.set(&session).expect("Can't fail");

    assert!(resolver.resolve_member(member(42)).await);

    assert_eq!(store.get(), session.with_premium(true));
}

#[test_log::test(tokio::test)]
async fn verdict_for_someone_else_is_not_recorded() {
    let (resolver, store, _service) = resolver(ScriptedService::with_active_id(7));
    let session = Session::logged_in(Some(member(1)), None, None);
    store.set(&session).expect("Can't fail");

    assert!(resolver.resolve_member(member(42)).await);

    assert_eq!(store.get(), session);
}

#[test_log::test(tokio::test)]
async fn verdict_does_not_resurrect_cleared_session() {
    let (resolver, store, _service) = resolver(ScriptedService::with_active_id(7));

    assert!(resolver.resolve_member(member(42)).await);

    assert_eq!(store.get(), Session::default());
}

use std::{
    sync::{atomic::Ordering, Arc},
    time::Duration,
};

use ams_client::{
    store::{MemoryStorage, StorageArea, ACCESS_TOKEN_KEY},
    Client,
};
use serde_json::json;

use crate::harness::{self, MockGateway};

#[test_log::test(tokio::test)]
async fn background_refresh_replaces_stored_token_only() {
    let mock = MockGateway::new();
    let initial = harness::mint_token(harness::future_exp(), &[("ams", "Admin")]);
    let refreshed = harness::mint_token(harness::future_exp() + 60, &[("ams", "Admin")]);
    mock.valid_tokens
        .lock()
        .extend([initial.clone(), refreshed.clone()]);
    *mock.refresh_access.lock() = Some(refreshed.clone());
    *mock.profile.lock() = Some(json!({ "name": "Ada" }));

    let storage = Arc::new(MemoryStorage::default());
    storage.set(ACCESS_TOKEN_KEY, &initial);

    let url = harness::serve(mock.clone()).await;
    let client = Client::builder()
        .with_url(url)
        .with_persistent_storage(storage.clone())
        .with_refresh_interval(Duration::from_millis(100))
        .connect()
        .await
        .unwrap();

    assert!(client.session().is_authenticated());

    tokio::time::sleep(Duration::from_millis(350)).await;

    // The fast path moved the token without touching the session.
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).as_deref(), Some(refreshed.as_str()));
    assert!(mock.refresh_hits.load(Ordering::SeqCst) >= 1);
    let session = client.session();
    assert!(session.is_authenticated());
    assert_eq!(session.user().unwrap().name(), Some("Ada"));
    // No full re-check happened: verify was only hit by the initial check.
    assert_eq!(mock.verify_hits.load(Ordering::SeqCst), 1);

    client.close();
}

#[test_log::test(tokio::test)]
async fn failed_refresh_falls_back_to_full_check() {
    let mock = MockGateway::new();
    let token = harness::mint_token(harness::future_exp(), &[("ams", "Admin")]);
    mock.valid_tokens.lock().push(token.clone());
    *mock.profile.lock() = Some(json!({ "name": "Ada" }));

    let storage = Arc::new(MemoryStorage::default());
    storage.set(ACCESS_TOKEN_KEY, &token);

    let url = harness::serve(mock.clone()).await;
    let client = Client::builder()
        .with_url(url)
        .with_persistent_storage(storage.clone())
        .with_refresh_interval(Duration::from_millis(100))
        .connect()
        .await
        .unwrap();

    assert!(client.session().is_authenticated());

    // The refresh endpoint starts failing and the token is invalidated
    // server-side; the fallback check must end the session.
    mock.valid_tokens.lock().clear();

    tokio::time::sleep(Duration::from_millis(350)).await;

    assert!(mock.refresh_hits.load(Ordering::SeqCst) >= 1);
    let session = client.session();
    assert!(session.user().is_none());
    assert!(session.is_initialized());
    assert!(storage.get(ACCESS_TOKEN_KEY).is_none());

    client.close();
}

#[tokio::test]
async fn worker_is_disarmed_without_a_session() {
    let mock = MockGateway::new();
    let url = harness::serve(mock.clone()).await;

    let client = Client::builder()
        .with_url(url)
        .with_refresh_interval(Duration::from_millis(50))
        .connect()
        .await
        .unwrap();

    assert!(client.session().user().is_none());

    tokio::time::sleep(Duration::from_millis(250)).await;

    // Unauthenticated ticks never reach the refresh endpoint.
    assert_eq!(mock.refresh_hits.load(Ordering::SeqCst), 0);

    client.close();
}

//! Remote mirror sync and checkout handoff.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use storefront_cart::storage::MemoryStorage;
use storefront_cart::{CartStore, CartSync, CheckoutError, SyncOutcome};
use storefront_cart_core::{PricingPolicy, RemoteCartId};
use storefront_cart_integration_tests::{
    FakeBackend, cart_json, client_for, mutation_response, product, variant_id,
};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store() -> CartStore {
    CartStore::open(Arc::new(MemoryStorage::new()), PricingPolicy::default())
}

fn sync_with_fake() -> CartSync<FakeBackend> {
    CartSync::new(store(), FakeBackend::new())
}

#[tokio::test]
async fn test_empty_cart_is_not_synced() {
    let sync = sync_with_fake();
    assert_eq!(sync.sync_with_remote().await, SyncOutcome::SkippedEmpty);
    assert!(sync.backend().calls().is_empty());
    assert!(sync.mirror().await.is_none());
}

#[tokio::test]
async fn test_first_sync_creates_and_records_remote_cart() {
    let sync = sync_with_fake();
    sync.store().add_item(&product("socks", 1000), 2, None).unwrap();

    let outcome = sync.sync_with_remote().await;
    let SyncOutcome::Created(id) = outcome else {
        panic!("expected creation, got {outcome:?}");
    };

    assert_eq!(sync.store().persistence().load_remote_id(), Some(id.clone()));
    assert_eq!(
        sync.backend().lines(&id).unwrap(),
        vec![(variant_id("socks").to_string(), 2)]
    );
    assert_eq!(sync.mirror().await.unwrap().remote_id, id);
}

#[tokio::test]
async fn test_later_syncs_reconcile_recorded_cart() {
    let sync = sync_with_fake();
    let store = sync.store().clone();
    let socks = store.add_item(&product("socks", 1000), 1, None).unwrap();
    store.add_item(&product("hat", 1500), 1, None).unwrap();
    let id = sync.sync_with_remote().await.remote_id().cloned().unwrap();

    store.set_quantity(&socks, 3);
    store.remove_item(&store.snapshot().items.last().unwrap().id.clone());
    store.add_item(&product("scarf", 2500), 1, None).unwrap();

    assert_eq!(sync.sync_with_remote().await, SyncOutcome::Updated(id.clone()));
    assert_eq!(
        sync.backend().lines(&id).unwrap(),
        vec![
            (variant_id("socks").to_string(), 3),
            (variant_id("scarf").to_string(), 1),
        ]
    );
    assert_eq!(
        sync.backend().calls(),
        vec!["create_cart", "get_cart", "remove_lines", "update_lines", "add_lines"]
    );
}

#[tokio::test]
async fn test_expired_remote_cart_is_recreated() {
    let sync = sync_with_fake();
    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();
    let first = sync.sync_with_remote().await.remote_id().cloned().unwrap();

    sync.backend().expire(&first);
    let outcome = sync.sync_with_remote().await;

    let SyncOutcome::Created(second) = outcome else {
        panic!("expected recreation, got {outcome:?}");
    };
    assert_ne!(first, second);
    assert_eq!(sync.store().persistence().load_remote_id(), Some(second));
}

#[tokio::test]
async fn test_failed_sync_leaves_local_cart_intact() {
    let sync = sync_with_fake();
    sync.store().add_item(&product("socks", 1000), 2, None).unwrap();
    let before = sync.store().snapshot();

    sync.backend().set_offline(true);
    let outcome = sync.sync_with_remote().await;

    assert!(matches!(outcome, SyncOutcome::Failed(ref reason) if reason.contains("unreachable")));
    assert_eq!(sync.store().snapshot(), before);
    assert_eq!(sync.store().persistence().load_remote_id(), None);

    // Mutations keep working while the backend is down
    sync.store().add_item(&product("hat", 500), 1, None).unwrap();
    assert_eq!(sync.store().totals().item_count, 3);
}

#[tokio::test]
async fn test_checkout_returns_url_and_resets_cart() {
    let sync = sync_with_fake();
    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();

    let url = sync.checkout().await.unwrap();

    assert_eq!(url.host_str(), Some("shop.example.com"));
    assert!(url.path().starts_with("/cart/c/"));
    assert!(sync.store().snapshot().is_empty());
    assert_eq!(sync.store().persistence().load_remote_id(), None);
    assert!(sync.mirror().await.is_none());
}

#[tokio::test]
async fn test_edit_during_checkout_is_kept() {
    let sync = Arc::new(sync_with_fake());
    sync.backend().set_delay(Duration::from_millis(100));
    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();

    let pending = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.checkout().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    sync.store().add_item(&product("hat", 500), 1, None).unwrap();

    assert_eq!(pending.await.unwrap().unwrap_err(), CheckoutError::CartChanged);
    assert_eq!(sync.store().totals().item_count, 2);

    // Checking out again pushes the hat to the same remote cart
    sync.backend().set_delay(Duration::ZERO);
    let remote_id = sync.store().persistence().load_remote_id().unwrap();
    sync.checkout().await.unwrap();

    assert!(sync.store().snapshot().is_empty());
    assert_eq!(remote_id, RemoteCartId::new("gid://shopify/Cart/fake-1"));
    assert_eq!(
        sync.backend().lines(&remote_id).unwrap(),
        vec![
            (variant_id("socks").to_string(), 1),
            (variant_id("hat").to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn test_checkout_of_empty_cart() {
    let sync = sync_with_fake();
    assert_eq!(sync.checkout().await.unwrap_err(), CheckoutError::EmptyCart);
}

#[tokio::test]
async fn test_checkout_unavailable_keeps_cart() {
    let sync = sync_with_fake();
    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();
    sync.backend().set_offline(true);

    let err = sync.checkout().await.unwrap_err();
    assert!(matches!(err, CheckoutError::Unavailable(_)));
    assert_eq!(sync.store().totals().item_count, 1);
}

#[tokio::test]
async fn test_spawned_sync_runs_in_background() {
    let sync = Arc::new(sync_with_fake());
    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();

    let outcome = sync.spawn_sync().await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Created(_)));
}

#[tokio::test]
async fn test_auto_sync_follows_local_changes() {
    let sync = Arc::new(sync_with_fake());
    let task = sync.spawn_auto_sync();

    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();
    for _ in 0..50 {
        if sync.mirror().await.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let mirror = sync.mirror().await.unwrap();
    assert_eq!(mirror.lines.len(), 1);
    task.abort();
}

#[tokio::test]
async fn test_checkout_through_storefront_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "CreateCart" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mutation_response(
            "cartCreate",
            cart_json("gid://shopify/Cart/abc", &[("line-1", variant_id("socks").as_str(), 1)]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let sync = CartSync::new(store(), client_for(&server));
    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();

    let url = sync.checkout().await.unwrap();
    assert_eq!(url.as_str(), "https://shop.example.com/cart/c/abc");
    assert!(sync.store().snapshot().is_empty());
}

#[tokio::test]
async fn test_invalid_checkout_url_is_unavailable() {
    let server = MockServer::start().await;
    let mut cart = cart_json("gid://shopify/Cart/abc", &[("line-1", variant_id("socks").as_str(), 1)]);
    cart["checkoutUrl"] = json!("not a url");
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mutation_response("cartCreate", cart)))
        .mount(&server)
        .await;

    let sync = CartSync::new(store(), client_for(&server));
    sync.store().add_item(&product("socks", 1000), 1, None).unwrap();

    let err = sync.checkout().await.unwrap_err();
    assert!(matches!(err, CheckoutError::Unavailable(_)));
    assert_eq!(sync.store().totals().item_count, 1);
}

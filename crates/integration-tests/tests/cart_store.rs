//! Cart store behavior against the HTTP catalog and stock service.
//!
//! Each test spawns its own fake service; see `TestContext`.

#![allow(clippy::unwrap_used)]

use std::num::NonZeroU32;
use std::sync::Arc;

use rocketshoes_core::{Cart, ProductId};
use rocketshoes_integration_tests::TestContext;
use rocketshoes_storefront::api::ApiClient;
use rocketshoes_storefront::cart::{CartError, CartOperation, CartStore, FileSlot, Notification};
use rust_decimal::Decimal;
use url::Url;

fn amount(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

const SHOE: ProductId = ProductId::new(1);
const RUNNER: ProductId = ProductId::new(2);
const SANDAL: ProductId = ProductId::new(3);

#[tokio::test]
async fn test_add_new_product_appends_single_unit() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();

    let cart = store.add_product(SHOE).await.unwrap();

    assert_eq!(cart.len(), 1);
    let item = cart.get(SHOE).unwrap();
    assert_eq!(item.amount.get(), 1);
    assert_eq!(item.title, "Shoe");
    assert_eq!(item.price, Decimal::from(100));
    assert_eq!(item.image, "x");
    assert_eq!(store.cart(), cart);
}

#[tokio::test]
async fn test_add_existing_product_increments_within_stock() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();

    store.add_product(SHOE).await.unwrap();
    let cart = store.add_product(SHOE).await.unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get(SHOE).unwrap().amount.get(), 2);
}

#[tokio::test]
async fn test_set_quantity_beyond_stock_is_rejected() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();
    let before = store.add_product(RUNNER).await.unwrap();

    let notification = store.set_quantity(RUNNER, amount(2)).await.unwrap_err();

    assert_eq!(notification.message, Notification::OUT_OF_STOCK);
    assert_eq!(notification.operation, CartOperation::UpdateQuantity);
    assert_eq!(store.cart(), before);
}

#[tokio::test]
async fn test_remove_present_product_empties_cart() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();
    store.add_product(SHOE).await.unwrap();

    let cart = store.remove_product(SHOE).await.unwrap();

    assert!(cart.is_empty());
    assert_eq!(ctx.snapshot().await.unwrap()["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_remove_absent_product_reports_failure() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();

    let notification = store.remove_product(ProductId::new(99)).await.unwrap_err();

    assert_eq!(notification.message, Notification::REMOVE_FAILED);
    assert!(store.cart().is_empty());
    assert!(ctx.snapshot().await.is_none());
}

#[tokio::test]
async fn test_unknown_product_reports_add_failure() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();

    let notification = store.add_product(ProductId::new(42)).await.unwrap_err();

    assert_eq!(notification.message, Notification::ADD_FAILED);
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_stock_service_failure_reports_update_failure() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();
    let before = store.add_product(SANDAL).await.unwrap();

    let notification = store.add_product(SANDAL).await.unwrap_err();

    assert_eq!(notification.message, Notification::UPDATE_FAILED);
    assert_eq!(store.cart(), before);
}

#[tokio::test]
async fn test_unreachable_service_reports_add_failure() {
    let ctx = TestContext::start().await;
    // Nothing listens on the discard port.
    let api = ApiClient::new(Url::parse("http://127.0.0.1:9/").unwrap());
    let store = CartStore::open(
        Arc::new(api.clone()),
        Arc::new(api),
        Arc::new(FileSlot::new(ctx.cart_path.clone())),
    )
    .await
    .unwrap();

    let notification = store.add_product(SHOE).await.unwrap_err();

    assert_eq!(notification.message, Notification::ADD_FAILED);
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_reopened_store_sees_identical_cart() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();

    store.add_product(SHOE).await.unwrap();
    store.add_product(RUNNER).await.unwrap();
    store.add_product(SHOE).await.unwrap();
    store.set_quantity(SHOE, amount(4)).await.unwrap();
    let _ = store.set_quantity(RUNNER, amount(3)).await;
    let _ = store.remove_product(ProductId::new(7)).await;
    let committed = store.cart();
    drop(store);

    let reopened = ctx.open_store().await.unwrap();

    assert_eq!(reopened.cart(), committed);
    assert_eq!(committed.get(SHOE).unwrap().amount.get(), 4);
    assert_eq!(committed.get(RUNNER).unwrap().amount.get(), 1);
}

#[tokio::test]
async fn test_amounts_never_exceed_stock_at_call_time() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();
    store.add_product(SHOE).await.unwrap();

    for requested in 1..=8 {
        let available = 6 - requested.min(5);
        ctx.service.set_stock(1, available).await;

        if let Ok(cart) = store.set_quantity(SHOE, amount(requested)).await {
            assert!(cart.get(SHOE).unwrap().amount.get() <= available);
        }
    }
}

#[tokio::test]
async fn test_stock_drop_blocks_further_increments() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();
    store.add_product(SHOE).await.unwrap();
    store.add_product(SHOE).await.unwrap();

    ctx.service.set_stock(1, 2).await;
    let notification = store.add_product(SHOE).await.unwrap_err();

    assert_eq!(notification.message, Notification::OUT_OF_STOCK);
    assert_eq!(store.cart().get(SHOE).unwrap().amount.get(), 2);
}

#[tokio::test]
async fn test_mixed_operations_keep_ids_unique() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();

    for id in [1, 2, 1, 3, 2, 1, 99, 3] {
        let _ = store.add_product(ProductId::new(id)).await;
    }
    let _ = store.remove_product(RUNNER).await;
    let _ = store.add_product(RUNNER).await;

    let cart = store.cart();
    let mut ids: Vec<_> = cart.items().iter().map(|item| item.id).collect();
    let len = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), len);
    assert_eq!(len, 3);
}

#[tokio::test]
async fn test_failed_operations_leave_cart_and_snapshot_untouched() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();
    store.add_product(SHOE).await.unwrap();
    store.add_product(RUNNER).await.unwrap();
    let before: Cart = store.cart();
    let snapshot = ctx.snapshot().await;

    assert!(store.add_product(ProductId::new(42)).await.is_err());
    assert!(store.remove_product(ProductId::new(42)).await.is_err());
    assert!(store.set_quantity(RUNNER, amount(2)).await.is_err());
    assert!(store.set_quantity(ProductId::new(42), amount(1)).await.is_err());

    assert_eq!(store.cart(), before);
    assert_eq!(ctx.snapshot().await, snapshot);
}

#[tokio::test]
async fn test_each_failure_broadcasts_one_notification() {
    let ctx = TestContext::start().await;
    let store = ctx.open_store().await.unwrap();
    let mut notifications = store.notifications();

    let returned = store.remove_product(SHOE).await.unwrap_err();

    assert_eq!(notifications.recv().await.unwrap(), returned);
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
async fn test_corrupt_snapshot_refuses_to_open() {
    let ctx = TestContext::start().await;
    tokio::fs::create_dir_all(ctx.cart_path.parent().unwrap())
        .await
        .unwrap();
    tokio::fs::write(&ctx.cart_path, "[{not json").await.unwrap();

    let err = ctx.open_store().await.err().unwrap();

    assert!(matches!(err, CartError::Snapshot(_)));
    assert_eq!(
        tokio::fs::read_to_string(&ctx.cart_path).await.unwrap(),
        "[{not json"
    );
}

//! Integration tests for cart persistence.
//!
//! These tests write through one `CartStore` and hydrate a fresh one from the
//! same backend, the way a restarted process would.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use gomarket_cart::{CartStore, DEFAULT_STORAGE_KEY, KeyValueStore, MemoryStore};
use gomarket_integration_tests::{TestContext, product};

// =============================================================================
// Round Trips
// =============================================================================

#[tokio::test]
async fn test_file_round_trip_across_restart() {
    let ctx = TestContext::new();

    let first = ctx.open_store().await;
    first.add_to_cart(product("A", "Widget", 10));
    first.add_to_cart(product("B", "Gadget", 25));
    first.add_to_cart(product("A", "Widget", 10));
    first.increment("B").unwrap();
    first.decrement("A").unwrap();
    first.flush().await.unwrap();
    let expected = first.products();
    drop(first);

    let second = ctx.open_store().await;
    assert_eq!(second.products(), expected);

    let quantities: Vec<(String, u32)> = second
        .products()
        .into_iter()
        .map(|item| (item.id.into_inner(), item.quantity))
        .collect();
    assert_eq!(
        quantities,
        vec![("A".to_string(), 1), ("B".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_memory_round_trip_shared_backend() {
    let backend = MemoryStore::new();
    let config = TestContext::new().config.clone();

    let first = CartStore::open(Arc::new(backend.clone()), &config).await;
    first.add_to_cart(product("A", "Widget", 10));
    first.flush().await.unwrap();

    let second = CartStore::open(Arc::new(backend), &config).await;
    assert_eq!(second.products(), first.products());
}

#[tokio::test]
async fn test_emptied_cart_persists_as_empty_array() {
    let ctx = TestContext::new();

    let store = ctx.open_store().await;
    store.add_to_cart(product("A", "Widget", 10));
    store.decrement("A").unwrap();
    store.flush().await.unwrap();

    let blob = ctx.storage().get(DEFAULT_STORAGE_KEY).await.unwrap().unwrap();
    assert_eq!(blob, "[]");
    assert!(ctx.open_store().await.is_empty());
}

// =============================================================================
// Stored Format
// =============================================================================

#[tokio::test]
async fn test_hydrates_existing_blob() {
    let ctx = TestContext::new();
    ctx.storage()
        .set(
            DEFAULT_STORAGE_KEY,
            r#"[{"id":"A","title":"Widget","image_url":"u","price":10,"quantity":2}]"#,
        )
        .await
        .unwrap();

    let store = ctx.open_store().await;
    let products = store.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "A");
    assert_eq!(products[0].title, "Widget");
    assert_eq!(products[0].quantity, 2);
}

#[tokio::test]
async fn test_written_blob_uses_stored_field_names() {
    let ctx = TestContext::new();

    let store = ctx.open_store().await;
    store.add_to_cart(product("A", "Widget", 10));
    store.flush().await.unwrap();

    let blob = ctx.storage().get(DEFAULT_STORAGE_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    let entry = &value[0];
    assert_eq!(entry["id"], "A");
    assert_eq!(entry["title"], "Widget");
    assert_eq!(entry["image_url"], "https://cdn.example.com/A.png");
    assert_eq!(entry["price"].as_f64(), Some(10.0));
    assert_eq!(entry["quantity"], 1);
}

#[tokio::test]
async fn test_invalid_entries_are_normalized_on_load() {
    let ctx = TestContext::new();
    ctx.storage()
        .set(
            DEFAULT_STORAGE_KEY,
            r#"[
                {"id":"A","title":"Widget","image_url":"u","price":10,"quantity":2},
                {"id":"B","title":"Gone","image_url":"u","price":1,"quantity":0},
                {"id":"A","title":"Dup","image_url":"u","price":1,"quantity":7}
            ]"#,
        )
        .await
        .unwrap();

    let store = ctx.open_store().await;
    let products = store.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Widget");
    assert_eq!(products[0].quantity, 2);
}

#[tokio::test]
async fn test_malformed_blob_is_replaced_on_next_write() {
    let ctx = TestContext::new();
    ctx.storage()
        .set(DEFAULT_STORAGE_KEY, "{ definitely not a cart")
        .await
        .unwrap();

    let store = ctx.open_store().await;
    assert!(store.is_empty());

    store.add_to_cart(product("A", "Widget", 10));
    store.flush().await.unwrap();

    let reopened = ctx.open_store().await;
    assert_eq!(reopened.len(), 1);
}

#[tokio::test]
async fn test_custom_storage_key_is_isolated() {
    let ctx = TestContext::new();
    let mut other_config = ctx.config.clone();
    other_config.storage_key = "@GoMarketplace:wishlist".to_string();

    let cart = ctx.open_store().await;
    cart.add_to_cart(product("A", "Widget", 10));
    cart.flush().await.unwrap();

    let other = CartStore::open(ctx.storage(), &other_config).await;
    assert!(other.is_empty());
    assert_eq!(other.storage_key(), "@GoMarketplace:wishlist");
}

// =============================================================================
// Shared Directory
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_stores_writing_one_directory() {
    let ctx = TestContext::new();
    let left = ctx.open_store().await;
    let right = ctx.open_store().await;

    for _ in 0..20 {
        left.add_to_cart(product("L", "Left", 1));
        right.add_to_cart(product("R", "Right", 1));
        let (a, b) = tokio::join!(left.flush(), right.flush());
        a.unwrap();
        b.unwrap();
    }

    // Last writer wins: the stored cart is exactly one of the two
    let reopened = ctx.open_store().await;
    let products = reopened.products();
    assert!(products == left.products() || products == right.products());
    assert_eq!(products[0].quantity, 20);
}

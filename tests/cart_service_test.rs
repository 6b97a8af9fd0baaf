mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use storefront_api::{
    entities::CartItem,
    errors::ServiceError,
    services::{
        carts::AddToCartInput,
        catalog::{CreateCollectionInput, CreateProductInput},
    },
};
use uuid::Uuid;

async fn setup_product(app: &TestApp, slug: &str) -> Uuid {
    let collection = app
        .catalog()
        .create_collection(CreateCollectionInput {
            title: format!("Collection for {}", slug),
            featured_product_id: None,
        })
        .await
        .expect("Failed to create collection");

    app.catalog()
        .create_product(CreateProductInput {
            title: format!("Product {}", slug),
            description: String::new(),
            slug: slug.to_string(),
            unit_price: dec!(9.99),
            inventory: 50,
            collection_id: collection.id,
        })
        .await
        .expect("Failed to create product")
        .id
}

#[tokio::test]
async fn test_add_item_merges_existing_line() {
    let app = TestApp::new().await;
    let product_id = setup_product(&app, "stackable").await;
    let cart = app.carts().create_cart().await.expect("Failed to create cart");

    app.carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 2,
            },
        )
        .await
        .expect("Failed to add item");

    let merged = app
        .carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 3,
            },
        )
        .await
        .expect("Failed to add item again");

    assert_eq!(merged.quantity, 5);

    let items = app.carts().get_cart_items(cart.id).await.unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_add_item_validation() {
    let app = TestApp::new().await;
    let product_id = setup_product(&app, "strict").await;
    let cart = app.carts().create_cart().await.expect("Failed to create cart");

    let bad_qty = app
        .carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 0,
            },
        )
        .await;
    assert_matches!(bad_qty, Err(ServiceError::ValidationError(_)));

    let bad_product = app
        .carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
            },
        )
        .await;
    assert_matches!(bad_product, Err(ServiceError::ValidationError(_)));

    let bad_cart = app
        .carts()
        .add_item(
            Uuid::new_v4(),
            AddToCartInput {
                product_id,
                quantity: 1,
            },
        )
        .await;
    assert_matches!(bad_cart, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_merged_quantity_cannot_overflow() {
    let app = TestApp::new().await;
    let product_id = setup_product(&app, "bulk").await;
    let cart = app.carts().create_cart().await.expect("Failed to create cart");

    app.carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 32000,
            },
        )
        .await
        .expect("Failed to add item");

    // Merging past i16::MAX is refused instead of wrapping negative.
    let result = app
        .carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 32000,
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // The existing line keeps its quantity.
    let items = app.carts().get_cart_items(cart.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 32000);
}

#[tokio::test]
async fn test_update_and_remove_item() {
    let app = TestApp::new().await;
    let product_id = setup_product(&app, "editable").await;
    let cart = app.carts().create_cart().await.expect("Failed to create cart");

    let item = app
        .carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 1,
            },
        )
        .await
        .expect("Failed to add item");

    let updated = app
        .carts()
        .update_item_quantity(item.id, 4)
        .await
        .expect("Failed to update quantity");
    assert_eq!(updated.quantity, 4);

    assert_matches!(
        app.carts().update_item_quantity(item.id, 0).await,
        Err(ServiceError::ValidationError(_))
    );

    app.carts()
        .remove_item(item.id)
        .await
        .expect("Failed to remove item");

    let items = app.carts().get_cart_items(cart.id).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_delete_cart_cascades_items() {
    let app = TestApp::new().await;
    let product_id = setup_product(&app, "doomed").await;
    let cart = app.carts().create_cart().await.expect("Failed to create cart");

    app.carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 2,
            },
        )
        .await
        .expect("Failed to add item");

    app.carts()
        .delete_cart(cart.id)
        .await
        .expect("Failed to delete cart");

    assert_matches!(
        app.carts().get_cart(cart.id).await,
        Err(ServiceError::NotFound(_))
    );

    // No orphaned lines survive the cascade.
    let orphans = CartItem::find()
        .all(&*app.state.db)
        .await
        .expect("Failed to query cart items");
    assert!(orphans.is_empty());

    // The product is untouched.
    app.catalog()
        .get_product(product_id)
        .await
        .expect("Product should survive cart deletion");
}

#[tokio::test]
async fn test_cart_timestamp_tracks_writes() {
    let app = TestApp::new().await;
    let product_id = setup_product(&app, "fresh").await;
    let cart = app.carts().create_cart().await.expect("Failed to create cart");

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    app.carts()
        .add_item(
            cart.id,
            AddToCartInput {
                product_id,
                quantity: 1,
            },
        )
        .await
        .expect("Failed to add item");

    let reloaded = app.carts().get_cart(cart.id).await.unwrap();
    assert!(reloaded.created_at > cart.created_at);
}

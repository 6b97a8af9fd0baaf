mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use storefront_api::{
    entities::{CartItem, Product, ProductPromotion},
    errors::ServiceError,
    services::catalog::{
        CreateCollectionInput, CreateProductInput, CreatePromotionInput, UpdateProductInput,
    },
};
use uuid::Uuid;

async fn setup_collection(app: &TestApp, title: &str) -> Uuid {
    app.catalog()
        .create_collection(CreateCollectionInput {
            title: title.to_string(),
            featured_product_id: None,
        })
        .await
        .expect("Failed to create collection")
        .id
}

async fn setup_product(app: &TestApp, collection_id: Uuid, slug: &str) -> Uuid {
    app.catalog()
        .create_product(CreateProductInput {
            title: format!("Product {}", slug),
            description: "A test product".to_string(),
            slug: slug.to_string(),
            unit_price: dec!(19.99),
            inventory: 10,
            collection_id,
        })
        .await
        .expect("Failed to create product")
        .id
}

#[tokio::test]
async fn test_product_round_trip() {
    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Beverages").await;

    let created = app
        .catalog()
        .create_product(CreateProductInput {
            title: "Cold Brew".to_string(),
            description: "12oz can".to_string(),
            slug: "cold-brew".to_string(),
            unit_price: dec!(34.99),
            inventory: 42,
            collection_id,
        })
        .await
        .expect("Failed to create product");

    let fetched = app
        .catalog()
        .get_product(created.id)
        .await
        .expect("Failed to fetch product");

    assert_eq!(fetched.title, "Cold Brew");
    assert_eq!(fetched.slug, "cold-brew");
    assert_eq!(fetched.unit_price, dec!(34.99));
    assert_eq!(fetched.collection_id, collection_id);

    let by_slug = app
        .catalog()
        .get_product_by_slug("cold-brew")
        .await
        .expect("Failed to fetch product by slug");
    assert_eq!(by_slug.id, created.id);
}

#[tokio::test]
async fn test_create_product_requires_existing_collection() {
    let app = TestApp::new().await;

    let result = app
        .catalog()
        .create_product(CreateProductInput {
            title: "Orphan".to_string(),
            description: String::new(),
            slug: "orphan".to_string(),
            unit_price: dec!(1.00),
            inventory: 1,
            collection_id: Uuid::new_v4(),
        })
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn test_invalid_slug_rejected() {
    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Misc").await;

    let result = app
        .catalog()
        .create_product(CreateProductInput {
            title: "Bad Slug".to_string(),
            description: String::new(),
            slug: "Not A Slug!".to_string(),
            unit_price: dec!(1.00),
            inventory: 1,
            collection_id,
        })
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn test_delete_collection_with_products_is_refused() {
    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Snacks").await;
    let product_id = setup_product(&app, collection_id, "trail-mix").await;

    let result = app.catalog().delete_collection(collection_id).await;
    assert_matches!(result, Err(ServiceError::IntegrityError(_)));

    // Collection survives the refused delete.
    app.catalog()
        .get_collection(collection_id)
        .await
        .expect("Collection should still exist");

    // Once the product is gone the collection can be deleted.
    app.catalog()
        .delete_product(product_id)
        .await
        .expect("Failed to delete product");
    app.catalog()
        .delete_collection(collection_id)
        .await
        .expect("Failed to delete empty collection");
}

#[tokio::test]
async fn test_deleting_featured_product_clears_reference() {
    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Featured").await;
    let product_id = setup_product(&app, collection_id, "headliner").await;

    app.catalog()
        .set_featured_product(collection_id, Some(product_id))
        .await
        .expect("Failed to set featured product");

    app.catalog()
        .delete_product(product_id)
        .await
        .expect("Failed to delete featured product");

    let collection = app
        .catalog()
        .get_collection(collection_id)
        .await
        .expect("Collection should survive featured product deletion");
    assert_eq!(collection.featured_product_id, None);
}

#[tokio::test]
async fn test_update_product_restamps_last_update() {
    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Clocks").await;
    let product_id = setup_product(&app, collection_id, "wall-clock").await;

    let before = app.catalog().get_product(product_id).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let after = app
        .catalog()
        .update_product(
            product_id,
            UpdateProductInput {
                title: Some("Wall Clock v2".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update product");

    assert!(after.last_update > before.last_update);
}

#[tokio::test]
async fn test_promotion_links_and_cascade() {
    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Deals").await;
    let product_id = setup_product(&app, collection_id, "discounted").await;

    let promotion = app
        .catalog()
        .create_promotion(CreatePromotionInput {
            description: "Summer sale".to_string(),
            discount: 0.15,
        })
        .await
        .expect("Failed to create promotion");

    app.catalog()
        .attach_promotion(product_id, promotion.id)
        .await
        .expect("Failed to attach promotion");
    // Attaching twice is a no-op, not an error.
    app.catalog()
        .attach_promotion(product_id, promotion.id)
        .await
        .expect("Repeated attach should succeed");

    let promotions = app
        .catalog()
        .promotions_for_product(product_id)
        .await
        .expect("Failed to list promotions");
    assert_eq!(promotions.len(), 1);
    assert_eq!(promotions[0].id, promotion.id);

    let products = app
        .catalog()
        .products_for_promotion(promotion.id)
        .await
        .expect("Failed to list products");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, product_id);

    // Deleting the promotion removes the join rows but not the product.
    app.catalog()
        .delete_promotion(promotion.id)
        .await
        .expect("Failed to delete promotion");

    let links = ProductPromotion::find()
        .all(&*app.state.db)
        .await
        .expect("Failed to query join table");
    assert!(links.is_empty());

    app.catalog()
        .get_product(product_id)
        .await
        .expect("Product should survive promotion deletion");
}

#[tokio::test]
async fn test_delete_product_with_order_items_is_refused() {
    use storefront_api::services::customers::CreateCustomerInput;
    use storefront_api::services::orders::{CreateOrderInput, OrderItemInput};

    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Ordered").await;
    let product_id = setup_product(&app, collection_id, "popular").await;

    let customer = app
        .customers()
        .create_customer(CreateCustomerInput {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            birth_date: None,
            membership_type: None,
        })
        .await
        .expect("Failed to create customer");

    app.orders()
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            payment_status: None,
            items: vec![OrderItemInput {
                product_id,
                quantity: 1,
                unit_price: None,
            }],
        })
        .await
        .expect("Failed to create order");

    let result = app.catalog().delete_product(product_id).await;
    assert_matches!(result, Err(ServiceError::IntegrityError(_)));

    // Nothing was removed by the refused delete.
    app.catalog()
        .get_product(product_id)
        .await
        .expect("Product should still exist");
}

#[tokio::test]
async fn test_delete_product_cascades_cart_items() {
    use storefront_api::services::carts::AddToCartInput;

    let app = TestApp::new().await;
    let collection_id = setup_collection(&app, "Carted").await;
    let product_id = setup_product(&app, collection_id, "impulse-buy").await;

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
        .expect("Failed to add cart item");

    app.catalog()
        .delete_product(product_id)
        .await
        .expect("Failed to delete carted product");

    // The cart line is gone, the cart itself is untouched.
    let items = app
        .carts()
        .get_cart_items(cart.id)
        .await
        .expect("Cart should still exist");
    assert!(items.is_empty());

    let orphans = CartItem::find()
        .all(&*app.state.db)
        .await
        .expect("Failed to query cart items");
    assert!(orphans.is_empty());

    assert!(Product::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .expect("Failed to query products")
        .is_none());
}

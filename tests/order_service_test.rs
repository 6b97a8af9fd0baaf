mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::{
    entities::PaymentStatus,
    errors::ServiceError,
    services::{
        catalog::{CreateCollectionInput, CreateProductInput, UpdateProductInput},
        customers::CreateCustomerInput,
        orders::{CreateOrderInput, OrderItemInput},
    },
};
use uuid::Uuid;

async fn setup_customer(app: &TestApp, email: &str) -> Uuid {
    app.customers()
        .create_customer(CreateCustomerInput {
            first_name: "Test".to_string(),
            last_name: "Buyer".to_string(),
            email: email.to_string(),
            phone: "555-0102".to_string(),
            birth_date: None,
            membership_type: None,
        })
        .await
        .expect("Failed to create customer")
        .id
}

async fn setup_product(app: &TestApp, slug: &str, price: rust_decimal::Decimal) -> Uuid {
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
            unit_price: price,
            inventory: 100,
            collection_id: collection.id,
        })
        .await
        .expect("Failed to create product")
        .id
}

#[tokio::test]
async fn test_create_order_defaults() {
    let app = TestApp::new().await;
    let customer_id = setup_customer(&app, "order@example.com").await;
    let product_id = setup_product(&app, "thing", dec!(10.00)).await;

    let order = app
        .orders()
        .create_order(CreateOrderInput {
            customer_id,
            payment_status: None,
            items: vec![OrderItemInput {
                product_id,
                quantity: 3,
                unit_price: None,
            }],
        })
        .await
        .expect("Failed to create order");

    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.customer_id, customer_id);

    let items = app
        .orders()
        .get_order_items(order.id)
        .await
        .expect("Failed to fetch order items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].unit_price, dec!(10.00));
}

#[tokio::test]
async fn test_order_requires_existing_customer() {
    let app = TestApp::new().await;

    let result = app
        .orders()
        .create_order(CreateOrderInput {
            customer_id: Uuid::new_v4(),
            payment_status: None,
            items: vec![],
        })
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn test_nonpositive_quantity_rejected() {
    let app = TestApp::new().await;
    let customer_id = setup_customer(&app, "qty@example.com").await;
    let product_id = setup_product(&app, "qty-thing", dec!(10.00)).await;

    let result = app
        .orders()
        .create_order(CreateOrderInput {
            customer_id,
            payment_status: None,
            items: vec![OrderItemInput {
                product_id,
                quantity: 0,
                unit_price: None,
            }],
        })
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // The failed transaction left no order behind.
    let orders = app
        .orders()
        .list_orders_for_customer(customer_id)
        .await
        .expect("Failed to list orders");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_unit_price_is_a_snapshot() {
    let app = TestApp::new().await;
    let customer_id = setup_customer(&app, "snapshot@example.com").await;
    let product_id = setup_product(&app, "volatile", dec!(19.99)).await;

    let order = app
        .orders()
        .create_order(CreateOrderInput {
            customer_id,
            payment_status: None,
            items: vec![OrderItemInput {
                product_id,
                quantity: 1,
                unit_price: None,
            }],
        })
        .await
        .expect("Failed to create order");

    // Reprice the product after the order was placed.
    app.catalog()
        .update_product(
            product_id,
            UpdateProductInput {
                unit_price: Some(dec!(25.00)),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to reprice product");

    let items = app
        .orders()
        .get_order_items(order.id)
        .await
        .expect("Failed to fetch order items");
    assert_eq!(items[0].unit_price, dec!(19.99));

    let product = app
        .catalog()
        .get_product(product_id)
        .await
        .expect("Failed to fetch product");
    assert_eq!(product.unit_price, dec!(25.00));
}

#[tokio::test]
async fn test_explicit_unit_price_overrides_product_price() {
    let app = TestApp::new().await;
    let customer_id = setup_customer(&app, "override@example.com").await;
    let product_id = setup_product(&app, "fixed", dec!(50.00)).await;

    let order = app
        .orders()
        .create_order(CreateOrderInput {
            customer_id,
            payment_status: None,
            items: vec![OrderItemInput {
                product_id,
                quantity: 2,
                unit_price: Some(dec!(45.00)),
            }],
        })
        .await
        .expect("Failed to create order");

    let items = app.orders().get_order_items(order.id).await.unwrap();
    assert_eq!(items[0].unit_price, dec!(45.00));
}

#[tokio::test]
async fn test_delete_order_with_items_is_refused() {
    let app = TestApp::new().await;
    let customer_id = setup_customer(&app, "protect@example.com").await;
    let product_id = setup_product(&app, "kept", dec!(10.00)).await;

    let order = app
        .orders()
        .create_order(CreateOrderInput {
            customer_id,
            payment_status: None,
            items: vec![OrderItemInput {
                product_id,
                quantity: 1,
                unit_price: None,
            }],
        })
        .await
        .expect("Failed to create order");

    let result = app.orders().delete_order(order.id).await;
    assert_matches!(result, Err(ServiceError::IntegrityError(_)));

    // Removing the line lifts the protection.
    let items = app.orders().get_order_items(order.id).await.unwrap();
    app.orders()
        .remove_item(items[0].id)
        .await
        .expect("Failed to remove order item");
    app.orders()
        .delete_order(order.id)
        .await
        .expect("Failed to delete empty order");
}

#[tokio::test]
async fn test_update_payment_status() {
    let app = TestApp::new().await;
    let customer_id = setup_customer(&app, "pay@example.com").await;

    let order = app
        .orders()
        .create_order(CreateOrderInput {
            customer_id,
            payment_status: None,
            items: vec![],
        })
        .await
        .expect("Failed to create order");
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    let updated = app
        .orders()
        .update_payment_status(order.id, PaymentStatus::Complete)
        .await
        .expect("Failed to update payment status");
    assert_eq!(updated.payment_status, PaymentStatus::Complete);

    // placed_at is set once and survives the status update.
    assert_eq!(updated.placed_at, order.placed_at);
}

#[tokio::test]
async fn test_update_missing_order_is_not_found() {
    let app = TestApp::new().await;

    let result = app
        .orders()
        .update_payment_status(Uuid::new_v4(), PaymentStatus::Failed)
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

use crate::{
    entities::{
        order, order_item, Customer, Order, OrderItem, OrderItemModel, OrderModel, PaymentStatus,
        Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Order service.
///
/// An order line's `unit_price` is captured when the line is written and
/// never recomputed from the product afterwards. Orders and products are
/// protected from deletion while order lines reference them; the order
/// side of that rule lives in [`OrderService::delete_order`], the product
/// side in the catalog service.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Places an order for a customer, atomically with its lines.
    ///
    /// Each line snapshots the product's current price unless the caller
    /// supplies one. `placed_at` is stamped by the entity hook and the
    /// payment status starts out Pending.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<OrderModel, ServiceError> {
        let txn = self.db.begin().await?;

        Customer::find_by_id(input.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Customer {} does not exist",
                    input.customer_id
                ))
            })?;

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            payment_status: Set(input.payment_status.unwrap_or_default()),
            customer_id: Set(input.customer_id),
            ..Default::default()
        };
        let order = order.insert(&txn).await?;

        for item in input.items {
            self.insert_item(&txn, order_id, item).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!("Created order: {}", order_id);
        Ok(order)
    }

    /// Adds a line to an existing order.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: Uuid,
        input: OrderItemInput,
    ) -> Result<OrderItemModel, ServiceError> {
        let txn = self.db.begin().await?;

        Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let item = self.insert_item(&txn, order_id, input).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderItemAdded {
                order_id,
                order_item_id: item.id,
            })
            .await;

        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, order_item_id: Uuid) -> Result<(), ServiceError> {
        let item = OrderItem::find_by_id(order_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order item {} not found", order_item_id))
            })?;

        let order_id = item.order_id;
        item.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderItemRemoved {
                order_id,
                order_item_id,
            })
            .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        status: PaymentStatus,
    ) -> Result<OrderModel, ServiceError> {
        let order = self.get_order(order_id).await?;
        let old_status = order.payment_status;

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(status);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PaymentStatusChanged {
                order_id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", status),
            })
            .await;

        Ok(updated)
    }

    /// Deletes an order. Refused while any line still belongs to it.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.get_order(order_id).await?;

        let item_count = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .count(&*self.db)
            .await?;

        if item_count > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Order {} still has {} item(s)",
                order_id, item_count
            )));
        }

        order.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderDeleted(order_id))
            .await;

        info!("Deleted order: {}", order_id);
        Ok(())
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    pub async fn get_order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemModel>, ServiceError> {
        let order = self.get_order(order_id).await?;
        Ok(order.find_related(OrderItem).all(&*self.db).await?)
    }

    pub async fn list_orders_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        Ok(Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::PlacedAt)
            .all(&*self.db)
            .await?)
    }

    async fn insert_item<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        input: OrderItemInput,
    ) -> Result<OrderItemModel, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Order item quantity must be positive".to_string(),
            ));
        }

        let product = Product::find_by_id(input.product_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Product {} does not exist",
                    input.product_id
                ))
            })?;

        // Price snapshot: the product's current price unless overridden.
        let unit_price = input.unit_price.unwrap_or(product.unit_price);

        let item = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            unit_price: Set(unit_price),
        };

        Ok(item.insert(conn).await?)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    /// Defaults to Pending when omitted.
    pub payment_status: Option<PaymentStatus>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i16,
    /// Price for this line; falls back to the product's current price.
    pub unit_price: Option<Decimal>,
}

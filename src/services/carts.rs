use crate::{
    entities::{cart, cart_item, Cart, CartItem, CartItemModel, CartModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shopping cart service.
///
/// Cart lines die with their cart, and with their product: both removals
/// cascade. Adding a product already in the cart increments the existing
/// line instead of duplicating it.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<CartModel, ServiceError> {
        let cart_id = Uuid::new_v4();
        let cart = cart::ActiveModel {
            id: Set(cart_id),
            ..Default::default()
        };

        let cart = cart.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartCreated(cart_id))
            .await;

        info!("Created cart: {}", cart_id);
        Ok(cart)
    }

    /// Adds a product to the cart, merging with an existing line.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartItemModel, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Cart item quantity must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let cart = Cart::find_by_id(cart_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Product {} does not exist",
                    input.product_id
                ))
            })?;

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        let item = match existing {
            Some(item) => {
                let quantity = item.quantity.checked_add(input.quantity).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Cart item quantity cannot exceed {}",
                        i16::MAX
                    ))
                })?;
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(quantity);
                active.update(&txn).await?
            }
            None => {
                let active = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart_id),
                    product_id: Set(input.product_id),
                    quantity: Set(input.quantity),
                };
                active.insert(&txn).await?
            }
        };

        // Touch the cart row; its timestamp tracks the last write.
        let cart_active: cart::ActiveModel = cart.into();
        cart_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id,
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .await;

        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        cart_item_id: Uuid,
        quantity: i16,
    ) -> Result<CartItemModel, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Cart item quantity must be positive".to_string(),
            ));
        }

        let item = CartItem::find_by_id(cart_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Cart item {} not found", cart_item_id))
            })?;

        let cart_id = item.cart_id;
        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                cart_id,
                cart_item_id,
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_item_id: Uuid) -> Result<(), ServiceError> {
        let item = CartItem::find_by_id(cart_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Cart item {} not found", cart_item_id))
            })?;

        let cart_id = item.cart_id;
        item.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id,
                cart_item_id,
            })
            .await;

        Ok(())
    }

    /// Deletes a cart and all of its lines atomically.
    #[instrument(skip(self))]
    pub async fn delete_cart(&self, cart_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let cart = Cart::find_by_id(cart_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await?;

        cart.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartDeleted(cart_id))
            .await;

        info!("Deleted cart: {}", cart_id);
        Ok(())
    }

    pub async fn get_cart(&self, cart_id: Uuid) -> Result<CartModel, ServiceError> {
        Cart::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }

    pub async fn get_cart_items(&self, cart_id: Uuid) -> Result<Vec<CartItemModel>, ServiceError> {
        let cart = self.get_cart(cart_id).await?;
        Ok(cart.find_related(CartItem).all(&*self.db).await?)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    pub quantity: i16,
}

use crate::{
    entities::{
        collection, product, product_promotion, promotion, Collection, CollectionModel, OrderItem,
        Product, ProductModel, ProductPromotion, Promotion, PromotionModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Catalog service covering collections, products, and promotions.
///
/// Deletion policies enforced here:
/// - a collection cannot be deleted while products reference it (protect)
/// - deleting a product removes its cart lines and join rows, and clears
///   any collection that featured it (cascade / set-null), but is refused
///   while order lines reference it (protect)
/// - deleting a promotion removes its join rows (cascade)
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // Collections

    #[instrument(skip(self))]
    pub async fn create_collection(
        &self,
        input: CreateCollectionInput,
    ) -> Result<CollectionModel, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Collection title must not be empty".to_string(),
            ));
        }

        if let Some(product_id) = input.featured_product_id {
            self.get_product(product_id).await.map_err(|_| {
                ServiceError::ValidationError(format!(
                    "Featured product {} does not exist",
                    product_id
                ))
            })?;
        }

        let collection_id = Uuid::new_v4();
        let collection = collection::ActiveModel {
            id: Set(collection_id),
            title: Set(input.title),
            featured_product_id: Set(input.featured_product_id),
        };

        let collection = collection.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CollectionCreated(collection_id))
            .await;

        info!("Created collection: {}", collection_id);
        Ok(collection)
    }

    #[instrument(skip(self))]
    pub async fn update_collection(
        &self,
        collection_id: Uuid,
        input: UpdateCollectionInput,
    ) -> Result<CollectionModel, ServiceError> {
        let collection = self.get_collection(collection_id).await?;
        let mut active: collection::ActiveModel = collection.into();

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Collection title must not be empty".to_string(),
                ));
            }
            active.title = Set(title);
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CollectionUpdated(collection_id))
            .await;

        Ok(updated)
    }

    /// Sets or clears the collection's featured product.
    #[instrument(skip(self))]
    pub async fn set_featured_product(
        &self,
        collection_id: Uuid,
        product_id: Option<Uuid>,
    ) -> Result<CollectionModel, ServiceError> {
        let collection = self.get_collection(collection_id).await?;

        if let Some(product_id) = product_id {
            self.get_product(product_id).await.map_err(|_| {
                ServiceError::ValidationError(format!(
                    "Featured product {} does not exist",
                    product_id
                ))
            })?;
        }

        let mut active: collection::ActiveModel = collection.into();
        active.featured_product_id = Set(product_id);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CollectionUpdated(collection_id))
            .await;

        Ok(updated)
    }

    /// Deletes a collection. Refused while any product belongs to it.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, collection_id: Uuid) -> Result<(), ServiceError> {
        let collection = self.get_collection(collection_id).await?;

        let product_count = Product::find()
            .filter(product::Column::CollectionId.eq(collection_id))
            .count(&*self.db)
            .await?;

        if product_count > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Collection {} still owns {} product(s)",
                collection_id, product_count
            )));
        }

        collection.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CollectionDeleted(collection_id))
            .await;

        info!("Deleted collection: {}", collection_id);
        Ok(())
    }

    pub async fn get_collection(
        &self,
        collection_id: Uuid,
    ) -> Result<CollectionModel, ServiceError> {
        Collection::find_by_id(collection_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Collection {} not found", collection_id))
            })
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionModel>, ServiceError> {
        Ok(Collection::find()
            .order_by_asc(collection::Column::Title)
            .all(&*self.db)
            .await?)
    }

    // Products

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        validate_title(&input.title)?;
        validate_slug(&input.slug)?;

        // The owning collection is a required reference.
        self.get_collection(input.collection_id).await.map_err(|_| {
            ServiceError::ValidationError(format!(
                "Collection {} does not exist",
                input.collection_id
            ))
        })?;

        let product_id = Uuid::new_v4();
        let product = product::ActiveModel {
            id: Set(product_id),
            title: Set(input.title),
            description: Set(input.description),
            slug: Set(input.slug),
            unit_price: Set(input.unit_price),
            inventory: Set(input.inventory),
            collection_id: Set(input.collection_id),
            ..Default::default()
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {} ({})", product_id, product.slug);
        Ok(product)
    }

    /// Updates a product. `last_update` is restamped by the entity hook.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let product = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = product.into();

        if let Some(title) = input.title {
            validate_title(&title)?;
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(slug) = input.slug {
            validate_slug(&slug)?;
            active.slug = Set(slug);
        }
        if let Some(unit_price) = input.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(inventory) = input.inventory {
            active.inventory = Set(inventory);
        }
        if let Some(collection_id) = input.collection_id {
            self.get_collection(collection_id).await.map_err(|_| {
                ServiceError::ValidationError(format!(
                    "Collection {} does not exist",
                    collection_id
                ))
            })?;
            active.collection_id = Set(collection_id);
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(updated)
    }

    /// Deletes a product atomically.
    ///
    /// Refused while order lines reference it. Otherwise removes the
    /// product's cart lines and promotion links, and clears it from any
    /// collection that featured it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        use crate::entities::{cart_item, order_item, CartItem};

        let txn = self.db.begin().await?;

        let product = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let order_item_count = OrderItem::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(&txn)
            .await?;

        if order_item_count > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Product {} is referenced by {} order item(s)",
                product_id, order_item_count
            )));
        }

        CartItem::delete_many()
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;

        ProductPromotion::delete_many()
            .filter(product_promotion::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;

        Collection::update_many()
            .col_expr(
                collection::Column::FeaturedProductId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(collection::Column::FeaturedProductId.eq(product_id))
            .exec(&txn)
            .await?;

        product.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!("Deleted product: {}", product_id);
        Ok(())
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))
    }

    /// Lists products, optionally restricted to one collection.
    pub async fn list_products(
        &self,
        collection_id: Option<Uuid>,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let mut query = Product::find().order_by_asc(product::Column::Title);
        if let Some(collection_id) = collection_id {
            query = query.filter(product::Column::CollectionId.eq(collection_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    // Promotions

    #[instrument(skip(self))]
    pub async fn create_promotion(
        &self,
        input: CreatePromotionInput,
    ) -> Result<PromotionModel, ServiceError> {
        if input.description.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Promotion description must not be empty".to_string(),
            ));
        }
        if !input.discount.is_finite() || input.discount < 0.0 {
            return Err(ServiceError::ValidationError(
                "Promotion discount must be a non-negative number".to_string(),
            ));
        }

        let promotion_id = Uuid::new_v4();
        let promotion = promotion::ActiveModel {
            id: Set(promotion_id),
            description: Set(input.description),
            discount: Set(input.discount),
        };

        let promotion = promotion.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PromotionCreated(promotion_id))
            .await;

        Ok(promotion)
    }

    /// Deletes a promotion together with its product links.
    #[instrument(skip(self))]
    pub async fn delete_promotion(&self, promotion_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let promotion = Promotion::find_by_id(promotion_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Promotion {} not found", promotion_id))
            })?;

        ProductPromotion::delete_many()
            .filter(product_promotion::Column::PromotionId.eq(promotion_id))
            .exec(&txn)
            .await?;

        promotion.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PromotionDeleted(promotion_id))
            .await;

        Ok(())
    }

    /// Links a promotion to a product. A no-op when the link already exists.
    #[instrument(skip(self))]
    pub async fn attach_promotion(
        &self,
        product_id: Uuid,
        promotion_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.get_product(product_id).await.map_err(|_| {
            ServiceError::ValidationError(format!("Product {} does not exist", product_id))
        })?;
        Promotion::find_by_id(promotion_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Promotion {} does not exist", promotion_id))
            })?;

        let existing = ProductPromotion::find_by_id((product_id, promotion_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let link = product_promotion::ActiveModel {
            product_id: Set(product_id),
            promotion_id: Set(promotion_id),
        };
        link.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PromotionAttached {
                product_id,
                promotion_id,
            })
            .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn detach_promotion(
        &self,
        product_id: Uuid,
        promotion_id: Uuid,
    ) -> Result<(), ServiceError> {
        let link = ProductPromotion::find_by_id((product_id, promotion_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product {} has no link to promotion {}",
                    product_id, promotion_id
                ))
            })?;

        link.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PromotionDetached {
                product_id,
                promotion_id,
            })
            .await;

        Ok(())
    }

    /// Promotions applied to the given product, through the join table.
    pub async fn promotions_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<PromotionModel>, ServiceError> {
        let product = self.get_product(product_id).await?;
        Ok(product.find_related(Promotion).all(&*self.db).await?)
    }

    /// Products a promotion applies to, through the join table.
    pub async fn products_for_promotion(
        &self,
        promotion_id: Uuid,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let promotion = Promotion::find_by_id(promotion_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Promotion {} not found", promotion_id))
            })?;
        Ok(promotion.find_related(Product).all(&*self.db).await?)
    }
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Product title must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), ServiceError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        return Err(ServiceError::ValidationError(format!(
            "Slug '{}' must contain only lowercase letters, digits, hyphens, or underscores",
            slug
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCollectionInput {
    pub title: String,
    pub featured_product_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCollectionInput {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateProductInput {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub unit_price: Decimal,
    pub inventory: i32,
    pub collection_id: Uuid,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub unit_price: Option<Decimal>,
    pub inventory: Option<i32>,
    pub collection_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePromotionInput {
    pub description: String,
    pub discount: f64,
}

/// Catalog and order entities
pub mod address;
pub mod cart;
pub mod cart_item;
pub mod collection;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_promotion;
pub mod promotion;

// Re-export entities
pub use address::{Entity as Address, Model as AddressModel};
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use collection::{Entity as Collection, Model as CollectionModel};
pub use customer::{Entity as Customer, MembershipType, Model as CustomerModel};
pub use order::{Entity as Order, Model as OrderModel, PaymentStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_promotion::{Entity as ProductPromotion, Model as ProductPromotionModel};
pub use promotion::{Entity as Promotion, Model as PromotionModel};

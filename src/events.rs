use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;

/// Handle for publishing domain events from the services.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is
    /// closed. Event delivery is never allowed to fail a committed write.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            error!("Failed to publish event {:?}: {}", event, e);
        }
    }
}

/// Creates an event channel with the given buffer size.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

// The various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    CollectionCreated(Uuid),
    CollectionUpdated(Uuid),
    CollectionDeleted(Uuid),
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    PromotionCreated(Uuid),
    PromotionDeleted(Uuid),
    PromotionAttached {
        product_id: Uuid,
        promotion_id: Uuid,
    },
    PromotionDetached {
        product_id: Uuid,
        promotion_id: Uuid,
    },

    // Customer events
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),
    AddressUpserted(Uuid),

    // Order events
    OrderCreated(Uuid),
    OrderDeleted(Uuid),
    OrderItemAdded {
        order_id: Uuid,
        order_item_id: Uuid,
    },
    OrderItemRemoved {
        order_id: Uuid,
        order_item_id: Uuid,
    },
    PaymentStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Cart events
    CartCreated(Uuid),
    CartDeleted(Uuid),
    CartItemAdded {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i16,
    },
    CartItemUpdated {
        cart_id: Uuid,
        cart_item_id: Uuid,
    },
    CartItemRemoved {
        cart_id: Uuid,
        cart_item_id: Uuid,
    },
}

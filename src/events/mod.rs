use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

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

    /// Sends an event, logging instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "dropping domain event");
        }
    }
}

/// Domain events emitted after state changes are committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        customer_id: Uuid,
        net_total: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(Uuid),
    StockDecremented {
        product_id: Uuid,
        quantity: i32,
    },
    InvoiceIssued {
        invoice_id: Uuid,
        order_id: Uuid,
    },
    PaymentInitiated {
        order_id: Uuid,
        gateway_order_id: String,
    },
    PaymentVerified {
        order_id: Uuid,
        gateway_payment_id: String,
    },
    PaymentFailed {
        order_id: Uuid,
        gateway_order_id: String,
    },
    DeliveryStatusChanged {
        order_id: Uuid,
        status: String,
    },
    CustomerRegistered(Uuid),
    ReviewSubmitted {
        review_id: Uuid,
        product_id: Uuid,
    },
    CheckoutCompleted {
        customer_id: Uuid,
        order_id: Uuid,
    },
}

impl Event {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderCreated { .. } => "order.created",
            Event::OrderStatusChanged { .. } => "order.status_changed",
            Event::OrderDeleted(_) => "order.deleted",
            Event::StockDecremented { .. } => "product.stock_decremented",
            Event::InvoiceIssued { .. } => "invoice.issued",
            Event::PaymentInitiated { .. } => "payment.initiated",
            Event::PaymentVerified { .. } => "payment.verified",
            Event::PaymentFailed { .. } => "payment.failed",
            Event::DeliveryStatusChanged { .. } => "delivery.status_changed",
            Event::CustomerRegistered(_) => "customer.registered",
            Event::ReviewSubmitted { .. } => "review.submitted",
            Event::CheckoutCompleted { .. } => "checkout.completed",
        }
    }
}

pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                customer_id,
                net_total,
            } => {
                info!(event = event.name(), %order_id, %customer_id, %net_total, "order placed");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(event = event.name(), %order_id, old_status, new_status, "order status changed");
            }
            Event::PaymentFailed {
                order_id,
                gateway_order_id,
            } => {
                warn!(event = event.name(), %order_id, gateway_order_id, "payment signature rejected");
            }
            other => {
                let payload = serde_json::to_string(other).unwrap_or_default();
                info!(event = other.name(), payload = %payload, "domain event");
            }
        }
    }

    info!("Event channel closed; event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();
        sender.send(Event::OrderDeleted(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderDeleted(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::CustomerRegistered(Uuid::new_v4())).await.is_err());
        // send_or_log swallows the error
        sender.send_or_log(Event::CustomerRegistered(Uuid::new_v4())).await;
    }
}

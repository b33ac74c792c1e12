use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        cart::CartService,
        orders::{CreateOrderInput, OrderDetails, OrderLineInput, OrderService},
    },
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Turns a customer's cart into an order
#[derive(Clone)]
pub struct CheckoutService {
    cart: Arc<CartService>,
    orders: Arc<OrderService>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(
        cart: Arc<CartService>,
        orders: Arc<OrderService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            cart,
            orders,
            event_sender,
        }
    }

    /// Places an order for every purchasable cart line and empties the cart, dropping
    /// lines whose product was deleted or deactivated. The cart is left untouched
    /// when order creation fails.
    #[instrument(skip(self, input))]
    pub async fn checkout(
        &self,
        customer_id: Uuid,
        input: CheckoutInput,
    ) -> Result<OrderDetails, ServiceError> {
        let (lines, unavailable) = self.cart.partition_lines(customer_id).await?;
        if lines.is_empty() {
            let reason = if unavailable.is_empty() {
                "cart is empty"
            } else {
                "no cart items are available for purchase"
            };
            return Err(ServiceError::ValidationError(reason.to_string()));
        }

        let details = self
            .orders
            .create_order(CreateOrderInput {
                customer_id: Some(customer_id),
                items: lines
                    .iter()
                    .map(|(line, _)| OrderLineInput {
                        product_id: line.product_id,
                        quantity: line.quantity,
                    })
                    .collect(),
                shipping_address: input.shipping_address,
                notes: input.notes,
            })
            .await?;

        self.cart.clear(customer_id).await?;
        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                customer_id,
                order_id: details.order.id,
            })
            .await;

        info!(
            %customer_id,
            order_id = %details.order.id,
            dropped = unavailable.len(),
            "Checkout completed"
        );
        Ok(details)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutInput {
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_customer, seed_product, setup};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::ModelTrait;

    async fn checkout_service() -> (CheckoutService, Arc<CartService>, Arc<sea_orm::DatabaseConnection>) {
        let (db, events) = setup().await;
        let cart = Arc::new(CartService::new(db.clone()));
        let orders = Arc::new(OrderService::new(db.clone(), events.clone(), "INR".into(), 7));
        (CheckoutService::new(cart.clone(), orders, events), cart, db)
    }

    #[tokio::test]
    async fn checkout_places_order_and_empties_cart() {
        let (checkout, cart, db) = checkout_service().await;
        let customer = seed_customer(&db, None).await;
        let pen = seed_product(&db, "Pen", dec!(2.5), 10).await;
        cart.add_item(customer.id, pen.id, 4).await.unwrap();

        let details = checkout
            .checkout(customer.id, CheckoutInput::default())
            .await
            .unwrap();
        assert_eq!(details.order.subtotal, dec!(10));
        assert_eq!(details.items.len(), 1);
        assert!(cart.view_cart(customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_checkout_keeps_cart() {
        let (checkout, cart, db) = checkout_service().await;
        let customer = seed_customer(&db, None).await;
        assert_matches!(
            checkout.checkout(customer.id, CheckoutInput::default()).await,
            Err(ServiceError::ValidationError(_))
        );

        let pen = seed_product(&db, "Pen", dec!(2.5), 1).await;
        cart.add_item(customer.id, pen.id, 3).await.unwrap();
        assert_matches!(
            checkout.checkout(customer.id, CheckoutInput::default()).await,
            Err(ServiceError::InsufficientStock(_))
        );
        assert_eq!(cart.view_cart(customer.id).await.unwrap().item_count, 3);
    }

    #[tokio::test]
    async fn lines_for_deleted_products_are_dropped() {
        let (checkout, cart, db) = checkout_service().await;
        let customer = seed_customer(&db, None).await;
        let mug = seed_product(&db, "Mug", dec!(10), 5).await;
        let pot = seed_product(&db, "Pot", dec!(30), 5).await;
        cart.add_item(customer.id, mug.id, 1).await.unwrap();
        cart.add_item(customer.id, pot.id, 1).await.unwrap();
        pot.clone().delete(&*db).await.unwrap();

        let view = cart.view_cart(customer.id).await.unwrap();
        assert_eq!(view.subtotal, dec!(10));
        assert_eq!(view.unavailable, vec![pot.id]);

        let details = checkout
            .checkout(customer.id, CheckoutInput::default())
            .await
            .unwrap();
        assert_eq!(details.order.subtotal, dec!(10));
        assert_eq!(details.items.len(), 1);
        assert!(cart.lines(customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cart_of_only_unavailable_products_is_rejected() {
        let (checkout, cart, db) = checkout_service().await;
        let customer = seed_customer(&db, None).await;
        let vase = seed_product(&db, "Vase", dec!(15), 5).await;
        cart.add_item(customer.id, vase.id, 2).await.unwrap();
        vase.delete(&*db).await.unwrap();

        assert_matches!(
            checkout.checkout(customer.id, CheckoutInput::default()).await,
            Err(ServiceError::ValidationError(msg)) if msg.contains("available")
        );
        assert_eq!(cart.lines(customer.id).await.unwrap().len(), 1);
    }
}

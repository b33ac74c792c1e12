use crate::{
    entities::{
        delivery_tracking::{self, DeliveryStatus, Entity as DeliveryTracking},
        order::{self, OrderStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::page_index;

/// Delivery tracking records, one per order
#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_tracking(
        &self,
        page: u64,
        limit: u64,
        status: Option<DeliveryStatus>,
    ) -> Result<(Vec<delivery_tracking::Model>, u64), ServiceError> {
        let mut query = DeliveryTracking::find();
        if let Some(status) = status {
            query = query.filter(delivery_tracking::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(delivery_tracking::Column::UpdatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page_index(page)).await?;
        Ok((records, total))
    }

    #[instrument(skip(self))]
    pub async fn get_tracking(&self, id: Uuid) -> Result<delivery_tracking::Model, ServiceError> {
        DeliveryTracking::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Delivery tracking", id))
    }

    #[instrument(skip(self))]
    pub async fn get_tracking_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<delivery_tracking::Model, ServiceError> {
        DeliveryTracking::find()
            .filter(delivery_tracking::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No delivery tracking for order {}", order_id))
            })
    }

    /// Updates a tracking record. Shipping and delivery milestones are mirrored
    /// onto the order status in the same transaction.
    #[instrument(skip(self))]
    pub async fn update_tracking(
        &self,
        id: Uuid,
        input: UpdateTrackingInput,
    ) -> Result<delivery_tracking::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = DeliveryTracking::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Delivery tracking", id))?;
        let old_status = existing.status;
        let order_id = existing.order_id;

        let mut active: delivery_tracking::ActiveModel = existing.into();
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(carrier) = input.carrier {
            active.carrier = Set(Some(carrier));
        }
        if let Some(tracking_number) = input.tracking_number {
            active.tracking_number = Set(Some(tracking_number));
        }
        if let Some(estimated_delivery) = input.estimated_delivery {
            active.estimated_delivery = Set(Some(estimated_delivery));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let status_changed = updated.status != old_status;
        if status_changed {
            if let Some(order_status) = mirrored_order_status(updated.status) {
                if let Some(order) = order::Entity::find_by_id(order_id).one(&txn).await? {
                    if order.status != OrderStatus::Cancelled && order.status != order_status {
                        let mut order: order::ActiveModel = order.into();
                        order.status = Set(order_status);
                        order.updated_at = Set(Utc::now());
                        order.update(&txn).await?;
                    }
                }
            }
        }

        txn.commit().await?;

        if status_changed {
            self.event_sender
                .send_or_log(Event::DeliveryStatusChanged {
                    order_id,
                    status: updated.status.to_string(),
                })
                .await;
            info!(tracking_id = %id, order_id = %order_id, status = %updated.status, "Delivery status updated");
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_tracking(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_tracking(id).await?;
        existing.delete(&*self.db).await?;
        info!(tracking_id = %id, "Deleted delivery tracking");
        Ok(())
    }
}

/// Order status implied by a delivery milestone
pub fn mirrored_order_status(status: DeliveryStatus) -> Option<OrderStatus> {
    match status {
        DeliveryStatus::Shipped | DeliveryStatus::InTransit => Some(OrderStatus::Shipped),
        DeliveryStatus::Delivered => Some(OrderStatus::Delivered),
        DeliveryStatus::Pending | DeliveryStatus::Packed | DeliveryStatus::Cancelled => None,
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateTrackingInput {
    pub status: Option<DeliveryStatus>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::orders::{CreateOrderInput, OrderLineInput, OrderService};
    use crate::services::test_support::{seed_customer, seed_product, setup};
    use rust_decimal_macros::dec;

    #[test]
    fn only_shipping_milestones_touch_the_order() {
        assert_eq!(mirrored_order_status(DeliveryStatus::Packed), None);
        assert_eq!(
            mirrored_order_status(DeliveryStatus::InTransit),
            Some(OrderStatus::Shipped)
        );
        assert_eq!(
            mirrored_order_status(DeliveryStatus::Delivered),
            Some(OrderStatus::Delivered)
        );
    }

    #[tokio::test]
    async fn delivered_tracking_marks_order_delivered() {
        let (db, events) = setup().await;
        let customer = seed_customer(&db, None).await;
        let mug = seed_product(&db, "Mug", dec!(25), 3).await;
        let details = OrderService::new(db.clone(), events.clone(), "INR".into(), 7)
            .create_order(CreateOrderInput {
                customer_id: Some(customer.id),
                items: vec![OrderLineInput { product_id: mug.id, quantity: 1 }],
                ..Default::default()
            })
            .await
            .unwrap();

        let service = DeliveryService::new(db.clone(), events);
        let tracking = service.get_tracking_for_order(details.order.id).await.unwrap();
        let updated = service
            .update_tracking(
                tracking.id,
                UpdateTrackingInput {
                    status: Some(DeliveryStatus::Delivered),
                    carrier: Some("BlueDart".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.carrier.as_deref(), Some("BlueDart"));

        let order = order::Entity::find_by_id(details.order.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
    }
}

use crate::{
    entities::{
        order, order_item,
        return_request::{self, Entity as ReturnRequest, ReturnStatus},
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::page_index;

/// Return requests against individual order items
#[derive(Clone)]
pub struct ReturnService {
    db: Arc<DatabaseConnection>,
}

impl ReturnService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Opens a return. The item must belong to the order, and the quantity may not
    /// exceed what was bought less what other open returns already claim.
    #[instrument(skip(self))]
    pub async fn create_return(
        &self,
        input: CreateReturnInput,
    ) -> Result<return_request::Model, ServiceError> {
        let order = order::Entity::find_by_id(input.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", input.order_id))?;

        let item = order_item::Entity::find_by_id(input.order_item_id)
            .one(&*self.db)
            .await?
            .filter(|item| item.order_id == order.id)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Order item {} does not belong to order {}",
                    input.order_item_id, order.id
                ))
            })?;

        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        self.ensure_returnable(&item, input.quantity, None).await?;

        let now = Utc::now();
        let request = return_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            order_item_id: Set(item.id),
            customer_id: Set(order.customer_id),
            reason: Set(input.reason),
            quantity: Set(input.quantity),
            status: Set(ReturnStatus::Requested),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(return_id = %request.id, order_id = %order.id, "Return requested");
        Ok(request)
    }

    #[instrument(skip(self))]
    pub async fn get_return(&self, id: Uuid) -> Result<return_request::Model, ServiceError> {
        ReturnRequest::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Return request", id))
    }

    #[instrument(skip(self))]
    pub async fn list_returns(
        &self,
        page: u64,
        limit: u64,
        status: Option<ReturnStatus>,
    ) -> Result<(Vec<return_request::Model>, u64), ServiceError> {
        let mut query = ReturnRequest::find();
        if let Some(status) = status {
            query = query.filter(return_request::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(return_request::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let returns = paginator.fetch_page(page_index(page)).await?;
        Ok((returns, total))
    }

    #[instrument(skip(self))]
    pub async fn update_return(
        &self,
        id: Uuid,
        input: UpdateReturnInput,
    ) -> Result<return_request::Model, ServiceError> {
        let existing = self.get_return(id).await?;
        let reopening = existing.status == ReturnStatus::Rejected
            && input
                .status
                .is_some_and(|status| status != ReturnStatus::Rejected);
        if reopening {
            let item = order_item::Entity::find_by_id(existing.order_item_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Order item", existing.order_item_id))?;
            self.ensure_returnable(&item, existing.quantity, Some(existing.id))
                .await?;
        }
        let mut active: return_request::ActiveModel = existing.into();
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(reason) = input.reason {
            active.reason = Set(reason);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(return_id = %id, status = %updated.status, "Return updated");
        Ok(updated)
    }

    /// Rejects `quantity` when it exceeds what was bought less what other
    /// non-rejected returns on the same item already claim.
    async fn ensure_returnable(
        &self,
        item: &order_item::Model,
        quantity: i32,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = ReturnRequest::find()
            .filter(return_request::Column::OrderItemId.eq(item.id))
            .filter(return_request::Column::Status.ne(ReturnStatus::Rejected));
        if let Some(id) = exclude {
            query = query.filter(return_request::Column::Id.ne(id));
        }
        let already_claimed: i32 = query
            .all(&*self.db)
            .await?
            .iter()
            .map(|r| r.quantity)
            .sum();
        let returnable = item.quantity - already_claimed;
        if quantity > returnable {
            return Err(ServiceError::ValidationError(format!(
                "Only {} unit(s) of {} can be returned",
                returnable.max(0),
                item.product_name
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_return(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_return(id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateReturnInput {
    pub order_id: Uuid,
    pub order_item_id: Uuid,
    pub reason: String,
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateReturnInput {
    pub status: Option<ReturnStatus>,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::orders::{CreateOrderInput, OrderLineInput, OrderService};
    use crate::services::test_support::{seed_customer, seed_product, setup};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn return_quantity_is_bounded_by_purchase() {
        let (db, events) = setup().await;
        let customer = seed_customer(&db, None).await;
        let mug = seed_product(&db, "Mug", dec!(25), 5).await;
        let details = OrderService::new(db.clone(), events, "INR".into(), 7)
            .create_order(CreateOrderInput {
                customer_id: Some(customer.id),
                items: vec![OrderLineInput { product_id: mug.id, quantity: 3 }],
                ..Default::default()
            })
            .await
            .unwrap();
        let item = &details.items[0];

        let service = ReturnService::new(db);
        let first = service
            .create_return(CreateReturnInput {
                order_id: details.order.id,
                order_item_id: item.id,
                reason: "Chipped".to_string(),
                quantity: 2,
            })
            .await
            .unwrap();
        assert_eq!(first.customer_id, customer.id);

        let too_many = service
            .create_return(CreateReturnInput {
                order_id: details.order.id,
                order_item_id: item.id,
                reason: "Changed mind".to_string(),
                quantity: 2,
            })
            .await;
        assert_matches!(too_many, Err(ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn item_must_belong_to_order() {
        let (db, events) = setup().await;
        let customer = seed_customer(&db, None).await;
        let mug = seed_product(&db, "Mug", dec!(25), 5).await;
        let orders = OrderService::new(db.clone(), events, "INR".into(), 7);
        let make = || CreateOrderInput {
            customer_id: Some(customer.id),
            items: vec![OrderLineInput { product_id: mug.id, quantity: 1 }],
            ..Default::default()
        };
        let first = orders.create_order(make()).await.unwrap();
        let second = orders.create_order(make()).await.unwrap();

        let result = ReturnService::new(db)
            .create_return(CreateReturnInput {
                order_id: first.order.id,
                order_item_id: second.items[0].id,
                reason: "Wrong order".to_string(),
                quantity: 1,
            })
            .await;
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn reopening_a_rejected_return_rechecks_quantity() {
        let (db, events) = setup().await;
        let customer = seed_customer(&db, None).await;
        let mug = seed_product(&db, "Mug", dec!(25), 5).await;
        let details = OrderService::new(db.clone(), events, "INR".into(), 7)
            .create_order(CreateOrderInput {
                customer_id: Some(customer.id),
                items: vec![OrderLineInput { product_id: mug.id, quantity: 2 }],
                ..Default::default()
            })
            .await
            .unwrap();
        let item = &details.items[0];
        let service = ReturnService::new(db);
        let open = |reason: &str| CreateReturnInput {
            order_id: details.order.id,
            order_item_id: item.id,
            reason: reason.to_string(),
            quantity: 2,
        };

        let first = service.create_return(open("Cracked")).await.unwrap();
        service
            .update_return(
                first.id,
                UpdateReturnInput {
                    status: Some(ReturnStatus::Rejected),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = service.create_return(open("Leaks")).await.unwrap();

        let reopened = service
            .update_return(
                first.id,
                UpdateReturnInput {
                    status: Some(ReturnStatus::Approved),
                    ..Default::default()
                },
            )
            .await;
        assert_matches!(reopened, Err(ServiceError::ValidationError(_)));
        assert_eq!(
            service.get_return(first.id).await.unwrap().status,
            ReturnStatus::Rejected
        );

        service
            .update_return(
                second.id,
                UpdateReturnInput {
                    status: Some(ReturnStatus::Rejected),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let reopened = service
            .update_return(
                first.id,
                UpdateReturnInput {
                    status: Some(ReturnStatus::Approved),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(reopened.status, ReturnStatus::Approved);
    }
}

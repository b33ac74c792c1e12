use crate::{
    entities::{
        order,
        refund_request::{self, Entity as RefundRequest, RefundStatus},
        return_request,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::page_index;

#[derive(Clone)]
pub struct RefundService {
    db: Arc<DatabaseConnection>,
}

impl RefundService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records a refund request. The amount is capped at the order's net total and a
    /// linked return must be for the same order.
    #[instrument(skip(self))]
    pub async fn create_refund(
        &self,
        input: CreateRefundInput,
    ) -> Result<refund_request::Model, ServiceError> {
        let order = order::Entity::find_by_id(input.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", input.order_id))?;

        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be greater than zero".to_string(),
            ));
        }
        if input.amount > order.net_total {
            return Err(ServiceError::ValidationError(format!(
                "amount {} exceeds order total {}",
                input.amount, order.net_total
            )));
        }

        if let Some(return_id) = input.return_request_id {
            let linked = return_request::Entity::find_by_id(return_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Return request", return_id))?;
            if linked.order_id != order.id {
                return Err(ServiceError::ValidationError(format!(
                    "Return request {} is for a different order",
                    return_id
                )));
            }
        }

        let now = Utc::now();
        let refund = refund_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            return_request_id: Set(input.return_request_id),
            customer_id: Set(order.customer_id),
            amount: Set(input.amount),
            reason: Set(input.reason),
            status: Set(RefundStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(refund_id = %refund.id, order_id = %order.id, amount = %refund.amount, "Refund requested");
        Ok(refund)
    }

    #[instrument(skip(self))]
    pub async fn get_refund(&self, id: Uuid) -> Result<refund_request::Model, ServiceError> {
        RefundRequest::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Refund request", id))
    }

    #[instrument(skip(self))]
    pub async fn list_refunds(
        &self,
        page: u64,
        limit: u64,
        status: Option<RefundStatus>,
    ) -> Result<(Vec<refund_request::Model>, u64), ServiceError> {
        let mut query = RefundRequest::find();
        if let Some(status) = status {
            query = query.filter(refund_request::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(refund_request::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let refunds = paginator.fetch_page(page_index(page)).await?;
        Ok((refunds, total))
    }

    #[instrument(skip(self))]
    pub async fn update_refund(
        &self,
        id: Uuid,
        input: UpdateRefundInput,
    ) -> Result<refund_request::Model, ServiceError> {
        let existing = self.get_refund(id).await?;
        let mut active: refund_request::ActiveModel = existing.into();
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(reason) = input.reason {
            active.reason = Set(Some(reason));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(refund_id = %id, status = %updated.status, "Refund updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_refund(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_refund(id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateRefundInput {
    pub order_id: Uuid,
    pub return_request_id: Option<Uuid>,
    pub amount: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateRefundInput {
    pub status: Option<RefundStatus>,
    pub reason: Option<String>,
}

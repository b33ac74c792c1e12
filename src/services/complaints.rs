use crate::{
    entities::{
        complaint::{self, ComplaintStatus, Entity as Complaint},
        customer, order,
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

#[derive(Clone)]
pub struct ComplaintService {
    db: Arc<DatabaseConnection>,
}

impl ComplaintService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Files a complaint. A referenced order must belong to the complaining customer.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_complaint(
        &self,
        input: CreateComplaintInput,
    ) -> Result<complaint::Model, ServiceError> {
        customer::Entity::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", input.customer_id))?;

        if let Some(order_id) = input.order_id {
            let order = order::Entity::find_by_id(order_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
            if order.customer_id != input.customer_id {
                return Err(ServiceError::ValidationError(format!(
                    "Order {} does not belong to customer {}",
                    order_id, input.customer_id
                )));
            }
        }

        let now = Utc::now();
        let complaint = complaint::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(input.customer_id),
            order_id: Set(input.order_id),
            subject: Set(input.subject),
            message: Set(input.message),
            status: Set(ComplaintStatus::Open),
            resolution: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(complaint_id = %complaint.id, "Complaint filed");
        Ok(complaint)
    }

    #[instrument(skip(self))]
    pub async fn get_complaint(&self, id: Uuid) -> Result<complaint::Model, ServiceError> {
        Complaint::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Complaint", id))
    }

    #[instrument(skip(self))]
    pub async fn list_complaints(
        &self,
        page: u64,
        limit: u64,
        status: Option<ComplaintStatus>,
    ) -> Result<(Vec<complaint::Model>, u64), ServiceError> {
        let mut query = Complaint::find();
        if let Some(status) = status {
            query = query.filter(complaint::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(complaint::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let complaints = paginator.fetch_page(page_index(page)).await?;
        Ok((complaints, total))
    }

    #[instrument(skip(self))]
    pub async fn update_complaint(
        &self,
        id: Uuid,
        input: UpdateComplaintInput,
    ) -> Result<complaint::Model, ServiceError> {
        let existing = self.get_complaint(id).await?;
        let mut active: complaint::ActiveModel = existing.into();
        if let Some(subject) = input.subject {
            active.subject = Set(subject);
        }
        if let Some(message) = input.message {
            active.message = Set(message);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(resolution) = input.resolution {
            active.resolution = Set(Some(resolution));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(complaint_id = %id, status = %updated.status, "Complaint updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_complaint(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_complaint(id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateComplaintInput {
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateComplaintInput {
    pub subject: Option<String>,
    pub message: Option<String>,
    pub status: Option<ComplaintStatus>,
    pub resolution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_customer, setup};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn complaint_lifecycle() {
        let (db, _) = setup().await;
        let customer = seed_customer(&db, None).await;
        let service = ComplaintService::new(db);

        let complaint = service
            .create_complaint(CreateComplaintInput {
                customer_id: customer.id,
                order_id: None,
                subject: "Damaged box".to_string(),
                message: "The lid was cracked".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(complaint.status, ComplaintStatus::Open);

        let resolved = service
            .update_complaint(
                complaint.id,
                UpdateComplaintInput {
                    status: Some(ComplaintStatus::Resolved),
                    resolution: Some("Replacement shipped".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, ComplaintStatus::Resolved);

        let (open, _) = service
            .list_complaints(1, 10, Some(ComplaintStatus::Open))
            .await
            .unwrap();
        assert!(open.is_empty());
    }

    #[tokio::test]
    async fn unknown_customer_or_order_is_rejected() {
        let (db, _) = setup().await;
        let customer = seed_customer(&db, None).await;
        let service = ComplaintService::new(db);

        assert_matches!(
            service
                .create_complaint(CreateComplaintInput {
                    customer_id: Uuid::new_v4(),
                    order_id: None,
                    subject: "x".to_string(),
                    message: "y".to_string(),
                })
                .await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            service
                .create_complaint(CreateComplaintInput {
                    customer_id: customer.id,
                    order_id: Some(Uuid::new_v4()),
                    subject: "x".to_string(),
                    message: "y".to_string(),
                })
                .await,
            Err(ServiceError::NotFound(_))
        );
    }
}

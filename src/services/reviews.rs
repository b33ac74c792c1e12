use crate::{
    entities::{
        customer, product,
        review::{self, Entity as Review},
    },
    errors::ServiceError,
    events::{Event, EventSender},
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

use super::{non_blank, page_index};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Product reviews. New reviews wait for moderation before the storefront shows them.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(rating = input.rating))]
    pub async fn submit_review(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        input: SubmitReviewInput,
    ) -> Result<review::Model, ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(ServiceError::ValidationError(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;

        let now = Utc::now();
        let review = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            customer_id: Set(customer_id),
            rating: Set(input.rating),
            title: Set(non_blank(input.title)),
            comment: Set(non_blank(input.comment)),
            is_approved: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ReviewSubmitted {
                review_id: review.id,
                product_id,
            })
            .await;
        info!(review_id = %review.id, product_id = %product_id, "Review submitted");
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn get_review(&self, id: Uuid) -> Result<review::Model, ServiceError> {
        Review::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review", id))
    }

    /// Moderation queue view
    #[instrument(skip(self))]
    pub async fn list_reviews(
        &self,
        page: u64,
        limit: u64,
        filter: ReviewFilter,
    ) -> Result<(Vec<review::Model>, u64), ServiceError> {
        let mut query = Review::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(review::Column::ProductId.eq(product_id));
        }
        if let Some(approved) = filter.approved {
            query = query.filter(review::Column::IsApproved.eq(approved));
        }
        let paginator = query
            .order_by_desc(review::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let reviews = paginator.fetch_page(page_index(page)).await?;
        Ok((reviews, total))
    }

    /// Approved reviews for one product, newest first
    #[instrument(skip(self))]
    pub async fn list_approved_for_product(
        &self,
        product_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<review::Model>, u64), ServiceError> {
        self.list_reviews(
            page,
            limit,
            ReviewFilter {
                product_id: Some(product_id),
                approved: Some(true),
            },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn moderate_review(
        &self,
        id: Uuid,
        is_approved: bool,
    ) -> Result<review::Model, ServiceError> {
        let existing = self.get_review(id).await?;
        let mut active: review::ActiveModel = existing.into();
        active.is_approved = Set(is_approved);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        info!(review_id = %id, is_approved, "Review moderated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_review(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_review(id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SubmitReviewInput {
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReviewFilter {
    pub product_id: Option<Uuid>,
    pub approved: Option<bool>,
}

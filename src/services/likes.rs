use crate::{
    entities::{
        like::{self, Entity as Like},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct LikeService {
    db: Arc<DatabaseConnection>,
}

impl LikeService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Products the customer has liked, most recent first
    #[instrument(skip(self))]
    pub async fn liked_products(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let likes = Like::find()
            .filter(like::Column::CustomerId.eq(customer_id))
            .order_by_desc(like::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let ids: Vec<Uuid> = likes.iter().map(|l| l.product_id).collect();

        let mut products = Product::find()
            .filter(product::Column::Id.is_in(ids.clone()))
            .all(&*self.db)
            .await?;
        products.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(products)
    }

    /// Likes a product; liking it again is a no-op
    #[instrument(skip(self))]
    pub async fn like(&self, customer_id: Uuid, product_id: Uuid) -> Result<like::Model, ServiceError> {
        Product::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        if let Some(existing) = self.find(customer_id, product_id).await? {
            return Ok(existing);
        }

        let like = like::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(product_id),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;
        debug!(%customer_id, %product_id, "Product liked");
        Ok(like)
    }

    /// Removes a like if present
    #[instrument(skip(self))]
    pub async fn unlike(&self, customer_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        Like::delete_many()
            .filter(like::Column::CustomerId.eq(customer_id))
            .filter(like::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn find(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<like::Model>, ServiceError> {
        Ok(Like::find()
            .filter(like::Column::CustomerId.eq(customer_id))
            .filter(like::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_customer, seed_product, setup};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn liking_is_idempotent() {
        let (db, _) = setup().await;
        let customer = seed_customer(&db, None).await;
        let rug = seed_product(&db, "Rug", dec!(80), 1).await;
        let likes = LikeService::new(db);

        let first = likes.like(customer.id, rug.id).await.unwrap();
        let second = likes.like(customer.id, rug.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(likes.liked_products(customer.id).await.unwrap().len(), 1);

        likes.unlike(customer.id, rug.id).await.unwrap();
        likes.unlike(customer.id, rug.id).await.unwrap();
        assert!(likes.liked_products(customer.id).await.unwrap().is_empty());
    }
}

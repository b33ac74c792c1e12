use crate::{
    entities::plan::{self, BillingCycle, Entity as Plan},
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

/// Subscription plans shown on the pricing page
#[derive(Clone)]
pub struct PlanService {
    db: Arc<DatabaseConnection>,
}

impl PlanService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_plan(&self, input: CreatePlanInput) -> Result<plan::Model, ServiceError> {
        self.ensure_unique_name(&input.name, None).await?;

        let now = Utc::now();
        let plan = plan::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            price: Set(input.price),
            billing_cycle: Set(input.billing_cycle),
            features: Set(features_json(input.features)),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(plan_id = %plan.id, name = %plan.name, "Created plan");
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn get_plan(&self, id: Uuid) -> Result<plan::Model, ServiceError> {
        Plan::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Plan", id))
    }

    #[instrument(skip(self))]
    pub async fn list_plans(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<plan::Model>, u64), ServiceError> {
        let paginator = Plan::find()
            .order_by_asc(plan::Column::Price)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let plans = paginator.fetch_page(page_index(page)).await?;
        Ok((plans, total))
    }

    /// Active plans, cheapest first
    #[instrument(skip(self))]
    pub async fn list_active_plans(&self) -> Result<Vec<plan::Model>, ServiceError> {
        Plan::find()
            .filter(plan::Column::IsActive.eq(true))
            .order_by_asc(plan::Column::Price)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn update_plan(
        &self,
        id: Uuid,
        input: UpdatePlanInput,
    ) -> Result<plan::Model, ServiceError> {
        let existing = self.get_plan(id).await?;
        if let Some(name) = input.name.as_deref() {
            if name != existing.name {
                self.ensure_unique_name(name, Some(id)).await?;
            }
        }

        let mut active: plan::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(billing_cycle) = input.billing_cycle {
            active.billing_cycle = Set(billing_cycle);
        }
        if let Some(features) = input.features {
            active.features = Set(features_json(features));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_plan(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_plan(id).await?;
        existing.delete(&*self.db).await?;
        info!(plan_id = %id, "Deleted plan");
        Ok(())
    }

    async fn ensure_unique_name(&self, name: &str, exclude_id: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = Plan::find().filter(plan::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(plan::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("Plan {} already exists", name)));
        }
        Ok(())
    }
}

/// Blank feature lines are dropped
fn features_json(features: Vec<String>) -> serde_json::Value {
    let features: Vec<String> = features
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    serde_json::json!(features)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePlanInput {
    pub name: String,
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub features: Vec<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdatePlanInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use rust_decimal_macros::dec;

    fn input(name: &str, price: Decimal, active: bool) -> CreatePlanInput {
        CreatePlanInput {
            name: name.to_string(),
            price,
            billing_cycle: BillingCycle::Monthly,
            features: vec![" 5 products ".to_string(), "".to_string()],
            is_active: Some(active),
        }
    }

    #[tokio::test]
    async fn active_plans_are_sorted_by_price() {
        let (db, _) = setup().await;
        let service = PlanService::new(db);

        service.create_plan(input("Growth", dec!(25), true)).await.unwrap();
        let starter = service.create_plan(input("Starter", dec!(10.5), true)).await.unwrap();
        service.create_plan(input("Legacy", dec!(1), false)).await.unwrap();

        assert_eq!(starter.features, serde_json::json!(["5 products"]));

        let names: Vec<String> = service
            .list_active_plans()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Starter".to_string(), "Growth".to_string()]);
    }
}

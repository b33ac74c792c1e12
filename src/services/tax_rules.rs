use crate::{
    entities::tax_rule::{self, Entity as TaxRule},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::page_index;

/// Per-state tax rates applied to order subtotals
#[derive(Clone)]
pub struct TaxRuleService {
    db: Arc<DatabaseConnection>,
}

impl TaxRuleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_tax_rule(
        &self,
        input: CreateTaxRuleInput,
    ) -> Result<tax_rule::Model, ServiceError> {
        let state = normalize_state(&input.state);
        if state.is_empty() {
            return Err(ServiceError::ValidationError(
                "state cannot be blank".to_string(),
            ));
        }
        ensure_rate_in_range(input.rate)?;
        self.ensure_unique_state(&state, None).await?;

        let now = Utc::now();
        let rule = tax_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            state: Set(state),
            rate: Set(input.rate),
            description: Set(input.description),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(tax_rule_id = %rule.id, state = %rule.state, rate = %rule.rate, "Created tax rule");
        Ok(rule)
    }

    #[instrument(skip(self))]
    pub async fn get_tax_rule(&self, id: Uuid) -> Result<tax_rule::Model, ServiceError> {
        TaxRule::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tax rule", id))
    }

    #[instrument(skip(self))]
    pub async fn list_tax_rules(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<tax_rule::Model>, u64), ServiceError> {
        let paginator = TaxRule::find()
            .order_by_asc(tax_rule::Column::State)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rules = paginator.fetch_page(page_index(page)).await?;
        Ok((rules, total))
    }

    #[instrument(skip(self))]
    pub async fn update_tax_rule(
        &self,
        id: Uuid,
        input: UpdateTaxRuleInput,
    ) -> Result<tax_rule::Model, ServiceError> {
        let existing = self.get_tax_rule(id).await?;

        let state = input.state.as_deref().map(normalize_state);
        if let Some(state) = state.as_deref() {
            if state.is_empty() {
                return Err(ServiceError::ValidationError(
                    "state cannot be blank".to_string(),
                ));
            }
            if state != existing.state {
                self.ensure_unique_state(state, Some(id)).await?;
            }
        }
        if let Some(rate) = input.rate {
            ensure_rate_in_range(rate)?;
        }

        let mut active: tax_rule::ActiveModel = existing.into();
        if let Some(state) = state {
            active.state = Set(state);
        }
        if let Some(rate) = input.rate {
            active.rate = Set(rate);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_tax_rule(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_tax_rule(id).await?;
        existing.delete(&*self.db).await?;
        info!(tax_rule_id = %id, "Deleted tax rule");
        Ok(())
    }

    async fn ensure_unique_state(
        &self,
        state: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = TaxRule::find().filter(tax_rule::Column::State.eq(state));
        if let Some(id) = exclude_id {
            query = query.filter(tax_rule::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A tax rule for state {} already exists",
                state
            )));
        }
        Ok(())
    }
}

/// Canonical form of a state code: trimmed and upper-case
pub fn normalize_state(state: &str) -> String {
    state.trim().to_uppercase()
}

fn ensure_rate_in_range(rate: Decimal) -> Result<(), ServiceError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(ServiceError::ValidationError(format!(
            "rate must be between 0 and 100, got {}",
            rate
        )));
    }
    Ok(())
}

/// Rate of the active rule for `state`; zero when the state is unknown or has no rule
pub async fn active_rate_for_state<C>(db: &C, state: Option<&str>) -> Result<Decimal, DbErr>
where
    C: ConnectionTrait,
{
    let state = match state.map(normalize_state).filter(|s| !s.is_empty()) {
        Some(state) => state,
        None => return Ok(Decimal::ZERO),
    };

    let rule = TaxRule::find()
        .filter(tax_rule::Column::State.eq(state.as_str()))
        .filter(tax_rule::Column::IsActive.eq(true))
        .one(db)
        .await?;

    let rate = rule.map(|r| r.rate).unwrap_or(Decimal::ZERO);
    debug!(%state, %rate, "Resolved tax rate");
    Ok(rate)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateTaxRuleInput {
    pub state: String,
    pub rate: Decimal,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateTaxRuleInput {
    pub state: Option<String>,
    pub rate: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

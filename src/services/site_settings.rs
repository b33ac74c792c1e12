use crate::{
    entities::site_setting::{self, Entity as SiteSetting},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const MAX_KEY_LENGTH: usize = 100;

/// Key/value site content (banner text, contact details, theme colours)
#[derive(Clone)]
pub struct SiteSettingService {
    db: Arc<DatabaseConnection>,
}

impl SiteSettingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_settings(&self) -> Result<Vec<site_setting::Model>, ServiceError> {
        SiteSetting::find()
            .order_by_asc(site_setting::Column::Key)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// All settings as a key to value map
    pub async fn settings_map(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        Ok(self
            .list_settings()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect())
    }

    /// Inserts or replaces the value stored under `key`
    #[instrument(skip(self, value))]
    pub async fn upsert_setting(
        &self,
        key: &str,
        value: String,
    ) -> Result<site_setting::Model, ServiceError> {
        let key = normalize_key(key)?;

        let existing = SiteSetting::find()
            .filter(site_setting::Column::Key.eq(key.as_str()))
            .one(&*self.db)
            .await?;

        let setting = match existing {
            Some(existing) => {
                let mut active: site_setting::ActiveModel = existing.into();
                active.value = Set(value);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?
            }
            None => {
                site_setting::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    key: Set(key),
                    value: Set(value),
                    updated_at: Set(Utc::now()),
                }
                .insert(&*self.db)
                .await?
            }
        };

        info!(key = %setting.key, "Saved site setting");
        Ok(setting)
    }

    #[instrument(skip(self))]
    pub async fn delete_setting(&self, key: &str) -> Result<(), ServiceError> {
        let key = normalize_key(key)?;
        let existing = SiteSetting::find()
            .filter(site_setting::Column::Key.eq(key.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Site setting", &key))?;
        existing.delete(&*self.db).await?;
        info!(key = %key, "Deleted site setting");
        Ok(())
    }
}

fn normalize_key(key: &str) -> Result<String, ServiceError> {
    let key = key.trim();
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(ServiceError::ValidationError(format!(
            "setting key must be 1 to {} characters",
            MAX_KEY_LENGTH
        )));
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn upsert_replaces_existing_value() {
        let (db, _) = setup().await;
        let service = SiteSettingService::new(db);

        let first = service.upsert_setting("banner", "Monsoon sale".into()).await.unwrap();
        let second = service.upsert_setting(" banner ", "Diwali sale".into()).await.unwrap();
        assert_eq!(first.id, second.id);

        let map = service.settings_map().await.unwrap();
        assert_eq!(map.get("banner").map(String::as_str), Some("Diwali sale"));
    }

    #[tokio::test]
    async fn deleting_unknown_key_is_not_found() {
        let (db, _) = setup().await;
        let service = SiteSettingService::new(db);
        assert_matches!(service.delete_setting("nope").await, Err(ServiceError::NotFound(_)));
        assert_matches!(
            service.upsert_setting("   ", "x".into()).await,
            Err(ServiceError::ValidationError(_))
        );
    }
}

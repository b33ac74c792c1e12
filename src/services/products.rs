use crate::{
    entities::product::{self, Entity as Product},
    errors::ServiceError,
};
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

/// Product catalog service backing both the vendor catalog and the storefront listing
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new product
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        self.ensure_unique_sku(&input.sku, None).await?;

        let id = Uuid::new_v4();
        let slug = match input.slug {
            Some(slug) => {
                let slug = slugify(&slug);
                self.ensure_unique_slug(&slug, None).await?;
                slug
            }
            None => self.available_slug(&slugify(&input.name), id).await?,
        };

        let product = product::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            sku: Set(input.sku),
            price: Set(input.price),
            stock: Set(input.stock),
            category: Set(input.category),
            image_url: Set(input.image_url),
            is_active: Set(input.is_active),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %product.id, sku = %product.sku, "Created product");
        Ok(product)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    /// Get a product visible on the storefront; inactive products read as missing
    #[instrument(skip(self))]
    pub async fn get_active_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    /// Lists products matching `filter`, newest first
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
        filter: ProductFilter,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = Product::find();

        if let Some(search) = filter.search.as_deref() {
            query = query.filter(
                product::Column::Name
                    .contains(search)
                    .or(product::Column::Sku.contains(search)),
            );
        }
        if let Some(category) = filter.category.as_deref() {
            query = query.filter(product::Column::Category.eq(category));
        }
        if filter.active_only {
            query = query.filter(product::Column::IsActive.eq(true));
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page_index(page)).await?;

        Ok((products, total))
    }

    /// Update a product
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;

        if let Some(sku) = input.sku.as_deref() {
            if sku != existing.sku {
                self.ensure_unique_sku(sku, Some(id)).await?;
            }
        }
        let slug = match input.slug.as_deref() {
            Some(slug) => {
                let slug = slugify(slug);
                self.ensure_unique_slug(&slug, Some(id)).await?;
                Some(slug)
            }
            None => None,
        };

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(sku) = input.sku {
            active.sku = Set(sku);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(&*self.db).await?;
        info!(product_id = %id, "Updated product");
        Ok(updated)
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(id).await?;
        existing.delete(&*self.db).await?;
        info!(product_id = %id, "Deleted product");
        Ok(())
    }

    async fn ensure_unique_sku(
        &self,
        sku: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
        }

        Ok(())
    }

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "slug must contain letters or digits".to_string(),
            ));
        }

        let mut query = Product::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("Slug {} already exists", slug)));
        }

        Ok(())
    }

    /// Derived slugs never conflict: a short id suffix is appended on collision
    async fn available_slug(&self, base: &str, id: Uuid) -> Result<String, ServiceError> {
        let suffix = id.simple().to_string();
        let base = if base.is_empty() { "product" } else { base };

        let taken = Product::find()
            .filter(product::Column::Slug.eq(base))
            .one(&*self.db)
            .await?
            .is_some();

        if taken {
            Ok(format!("{}-{}", base, &suffix[..8]))
        } else {
            Ok(base.to_string())
        }
    }
}

/// Lowercase ASCII slug with single dashes between words
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Input for creating a product
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateProductInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// Input for updating a product
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub active_only: bool,
}

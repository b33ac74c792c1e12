use crate::{
    entities::{
        cart_item::{self, Entity as CartItem},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Per-customer cart, one line per product
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Priced view of the cart. Lines whose product was deleted or deactivated
    /// are listed under `unavailable` and excluded from the totals.
    #[instrument(skip(self))]
    pub async fn view_cart(&self, customer_id: Uuid) -> Result<CartView, ServiceError> {
        let (available, unavailable) = self.partition_lines(customer_id).await?;
        let lines = available
            .into_iter()
            .map(|(item, product)| CartLine {
                product_id: product.id,
                name: product.name,
                unit_price: product.price,
                quantity: item.quantity,
                line_total: product.price * Decimal::from(item.quantity),
                image_url: product.image_url,
            })
            .collect();
        let mut view = CartView::from_lines(lines);
        view.unavailable = unavailable.into_iter().map(|item| item.product_id).collect();
        Ok(view)
    }

    /// Splits the cart into lines that can be bought and lines whose product is
    /// gone or inactive
    pub async fn partition_lines(
        &self,
        customer_id: Uuid,
    ) -> Result<(Vec<(cart_item::Model, product::Model)>, Vec<cart_item::Model>), ServiceError> {
        let items = self.lines(customer_id).await?;
        let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        let mut products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut available = Vec::with_capacity(items.len());
        let mut unavailable = Vec::new();
        for item in items {
            match products.remove(&item.product_id) {
                Some(product) => available.push((item, product)),
                None => unavailable.push(item),
            }
        }
        Ok((available, unavailable))
    }

    /// Raw cart rows, oldest first
    pub async fn lines(&self, customer_id: Uuid) -> Result<Vec<cart_item::Model>, ServiceError> {
        CartItem::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Adds `quantity` units, incrementing an existing line
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        self.ensure_purchasable(product_id).await?;

        match self.find_line(customer_id, product_id).await? {
            Some(line) => {
                let new_quantity = line.quantity.saturating_add(quantity);
                let mut active: cart_item::ActiveModel = line.into();
                active.quantity = Set(new_quantity);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?;
            }
            None => self.insert_line(customer_id, product_id, quantity).await?,
        }

        debug!(%customer_id, %product_id, quantity, "Added to cart");
        self.view_cart(customer_id).await
    }

    /// Sets the line quantity; zero removes the line
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "quantity must not be negative".to_string(),
            ));
        }
        let existing = self.find_line(customer_id, product_id).await?;

        match (existing, quantity) {
            (Some(line), 0) => {
                line.delete(&*self.db).await?;
            }
            (None, 0) => {}
            (Some(line), quantity) => {
                let mut active: cart_item::ActiveModel = line.into();
                active.quantity = Set(quantity);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?;
            }
            (None, quantity) => {
                self.ensure_purchasable(product_id).await?;
                self.insert_line(customer_id, product_id, quantity).await?;
            }
        }

        self.view_cart(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let line = self
            .find_line(customer_id, product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart item", product_id))?;
        line.delete(&*self.db).await?;
        self.view_cart(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .exec(&*self.db)
            .await?;
        info!(%customer_id, removed = result.rows_affected, "Cart cleared");
        Ok(())
    }

    async fn find_line(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<cart_item::Model>, ServiceError> {
        Ok(CartItem::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?)
    }

    async fn insert_line(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;
        Ok(())
    }

    async fn ensure_purchasable(&self, product_id: Uuid) -> Result<(), ServiceError> {
        Product::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: i32,
    /// Products still in the cart that can no longer be bought
    pub unavailable: Vec<Uuid>,
}

impl CartView {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let subtotal = lines.iter().map(|line| line.line_total).sum();
        let item_count = lines.iter().map(|line| line.quantity).sum();
        Self {
            lines,
            subtotal,
            item_count,
            unavailable: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_customer, seed_product, setup};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn adding_twice_increments_one_line() {
        let (db, _) = setup().await;
        let customer = seed_customer(&db, None).await;
        let tea = seed_product(&db, "Tea", dec!(4.5), 10).await;
        let cart = CartService::new(db);

        cart.add_item(customer.id, tea.id, 1).await.unwrap();
        let view = cart.add_item(customer.id, tea.id, 2).await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, dec!(13.5));
    }

    #[tokio::test]
    async fn zero_quantity_removes_line() {
        let (db, _) = setup().await;
        let customer = seed_customer(&db, None).await;
        let tea = seed_product(&db, "Tea", dec!(4.5), 10).await;
        let cup = seed_product(&db, "Cup", dec!(3), 10).await;
        let cart = CartService::new(db);

        cart.add_item(customer.id, tea.id, 1).await.unwrap();
        cart.add_item(customer.id, cup.id, 2).await.unwrap();
        let view = cart.set_quantity(customer.id, tea.id, 0).await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].product_id, cup.id);
        assert_eq!(view.subtotal, dec!(6));

        assert_matches!(
            cart.remove_item(customer.id, tea.id).await,
            Err(ServiceError::NotFound(_))
        );
        cart.clear(customer.id).await.unwrap();
        assert!(cart.view_cart(customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_cannot_be_added() {
        let (db, _) = setup().await;
        let customer = seed_customer(&db, None).await;
        let cart = CartService::new(db);
        assert_matches!(
            cart.add_item(customer.id, Uuid::new_v4(), 1).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn retired_products_are_reported_not_priced() {
        let (db, _) = setup().await;
        let customer = seed_customer(&db, None).await;
        let tea = seed_product(&db, "Tea", dec!(4.5), 10).await;
        let cup = seed_product(&db, "Cup", dec!(3), 10).await;
        let cart = CartService::new(db.clone());
        cart.add_item(customer.id, tea.id, 2).await.unwrap();
        cart.add_item(customer.id, cup.id, 1).await.unwrap();

        let mut retired: product::ActiveModel = cup.clone().into();
        retired.is_active = Set(false);
        retired.update(&*db).await.unwrap();

        let view = cart.view_cart(customer.id).await.unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.subtotal, dec!(9));
        assert_eq!(view.unavailable, vec![cup.id]);
    }
}

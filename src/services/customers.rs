use crate::{
    auth::password::hash_password,
    entities::{
        cart_item,
        customer::{self, Entity as Customer},
        like, order,
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

use super::{page_index, tax_rules::normalize_state};

/// Customer records, shared by the vendor admin and storefront registration
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a customer. A password, when given, is stored as an argon2 hash.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        let email = input.email.trim().to_lowercase();
        self.ensure_unique_email(&email, None).await?;

        let password_hash = match input.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        let registered = password_hash.is_some();

        let now = Utc::now();
        let customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(email),
            phone: Set(input.phone),
            password_hash: Set(password_hash),
            address_line: Set(input.address_line),
            city: Set(input.city),
            state: Set(input.state.as_deref().map(normalize_state)),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        if registered {
            self.event_sender
                .send_or_log(Event::CustomerRegistered(customer.id))
                .await;
        }

        info!(customer_id = %customer.id, "Created customer");
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    /// Looks a customer up by (case-insensitive) email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<customer::Model>, ServiceError> {
        Customer::find()
            .filter(customer::Column::Email.eq(email.trim().to_lowercase()))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let mut query = Customer::find();
        if let Some(search) = search.as_deref() {
            query = query.filter(
                customer::Column::Name
                    .contains(search)
                    .or(customer::Column::Email.contains(search)),
            );
        }

        let paginator = query
            .order_by_desc(customer::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page_index(page)).await?;
        Ok((customers, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        let existing = self.get_customer(id).await?;

        let email = input.email.map(|e| e.trim().to_lowercase());
        if let Some(email) = email.as_deref() {
            if email != existing.email {
                self.ensure_unique_email(email, Some(id)).await?;
            }
        }

        let mut active: customer::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address_line) = input.address_line {
            active.address_line = Set(Some(address_line));
        }
        if let Some(city) = input.city {
            active.city = Set(Some(city));
        }
        if let Some(state) = input.state {
            active.state = Set(Some(normalize_state(&state)));
        }
        if let Some(postal_code) = input.postal_code {
            active.postal_code = Set(Some(postal_code));
        }
        if let Some(country) = input.country {
            active.country = Set(Some(country));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(customer_id = %id, "Updated customer");
        Ok(updated)
    }

    /// Deletes a customer without orders, along with their cart and likes
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_customer(id).await?;

        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(id))
            .count(&*self.db)
            .await?;
        if orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} has {} order(s) and cannot be deleted",
                id, orders
            )));
        }

        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CustomerId.eq(id))
            .exec(&*self.db)
            .await?;
        like::Entity::delete_many()
            .filter(like::Column::CustomerId.eq(id))
            .exec(&*self.db)
            .await?;
        existing.delete(&*self.db).await?;

        info!(customer_id = %id, "Deleted customer");
        Ok(())
    }

    async fn ensure_unique_email(
        &self,
        email: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Customer::find().filter(customer::Column::Email.eq(email));
        if let Some(id) = exclude_id {
            query = query.filter(customer::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A customer with email {} already exists",
                email
            )));
        }
        Ok(())
    }
}

/// Input for creating a customer
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Input for updating a customer
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use assert_matches::assert_matches;

    fn input(email: &str) -> CreateCustomerInput {
        CreateCustomerInput {
            name: "Meera".to_string(),
            email: email.to_string(),
            state: Some(" ka ".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn email_is_unique_case_insensitively() {
        let (db, events) = setup().await;
        let service = CustomerService::new(db, events);

        let created = service.create_customer(input("Meera@Example.com")).await.unwrap();
        assert_eq!(created.email, "meera@example.com");
        assert_eq!(created.state.as_deref(), Some("KA"));

        let err = service
            .create_customer(input("meera@example.com"))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }

    #[tokio::test]
    async fn password_is_hashed_and_hidden() {
        let (db, events) = setup().await;
        let service = CustomerService::new(db, events);

        let mut with_password = input("ravi@example.com");
        with_password.password = Some("s3cret-pass".to_string());
        let created = service.create_customer(with_password).await.unwrap();

        let hash = created.password_hash.clone().unwrap();
        assert!(hash.starts_with("$argon2"));
        let json = serde_json::to_value(&created).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn delete_missing_customer_is_not_found() {
        let (db, events) = setup().await;
        let service = CustomerService::new(db, events);
        assert_matches!(
            service.delete_customer(Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        );
    }
}

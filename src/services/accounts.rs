use crate::{
    auth::{
        password::{verify_password, MIN_PASSWORD_LENGTH},
        AccessToken, AuthError, AuthService, TokenSubject, CUSTOMER_ROLE,
    },
    errors::ServiceError,
    services::{
        access::AccessService,
        customers::{CreateCustomerInput, CustomerService},
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Staff login plus storefront customer registration and login
#[derive(Clone)]
pub struct AccountService {
    auth: Arc<AuthService>,
    access: Arc<AccessService>,
    customers: Arc<CustomerService>,
}

impl AccountService {
    pub fn new(
        auth: Arc<AuthService>,
        access: Arc<AccessService>,
        customers: Arc<CustomerService>,
    ) -> Self {
        Self {
            auth,
            access,
            customers,
        }
    }

    /// Authenticates a vendor staff user. The token carries the user's role
    /// name and that role's permission keys.
    #[instrument(skip(self, password))]
    pub async fn staff_login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let user = match self.access.find_user_by_email(email).await? {
            Some(user) if user.is_active && verify_password(password, &user.password_hash) => user,
            Some(user) => {
                warn!(user_id = %user.id, active = user.is_active, "Staff login rejected");
                return Err(AuthError::InvalidCredentials.into());
            }
            None => return Err(AuthError::InvalidCredentials.into()),
        };

        let roles: Vec<String> = self.access.role_name(user.role_id).await?.into_iter().collect();
        let permissions = match user.role_id {
            Some(role_id) => self.access.permission_keys_for_role(role_id).await?,
            None => Vec::new(),
        };

        let subject = TokenSubject {
            id: user.id,
            name: user.name,
            email: user.email,
            roles,
            permissions,
        };
        let session = self.issue(subject)?;
        info!(user_id = %session.principal.id, "Staff user logged in");
        Ok(session)
    }

    /// Registers a storefront customer with a password and signs them in
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register_customer(
        &self,
        input: RegisterCustomerInput,
    ) -> Result<Session, ServiceError> {
        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::ValidationError(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let customer = self
            .customers
            .create_customer(CreateCustomerInput {
                name: input.name,
                email: input.email,
                password: Some(input.password),
                phone: input.phone,
                address_line: input.address_line,
                city: input.city,
                state: input.state,
                postal_code: input.postal_code,
                country: input.country,
            })
            .await?;

        self.issue(customer_subject(customer.id, customer.name, customer.email))
    }

    #[instrument(skip(self, password))]
    pub async fn customer_login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let customer = self
            .customers
            .find_by_email(email)
            .await?
            .filter(|c| {
                c.password_hash
                    .as_deref()
                    .map(|hash| verify_password(password, hash))
                    .unwrap_or(false)
            })
            .ok_or(AuthError::InvalidCredentials)?;

        info!(customer_id = %customer.id, "Customer logged in");
        self.issue(customer_subject(customer.id, customer.name, customer.email))
    }

    fn issue(&self, subject: TokenSubject) -> Result<Session, ServiceError> {
        let token = self.auth.generate_token(&subject)?;
        Ok(Session {
            token,
            principal: Principal {
                id: subject.id,
                name: subject.name,
                email: subject.email,
                roles: subject.roles,
                permissions: subject.permissions,
            },
        })
    }
}

fn customer_subject(id: Uuid, name: String, email: String) -> TokenSubject {
    TokenSubject {
        id,
        name,
        email,
        roles: vec![CUSTOMER_ROLE.to_string()],
        permissions: Vec::new(),
    }
}

/// Issued token plus who it identifies
#[derive(Debug, Serialize)]
pub struct Session {
    #[serde(flatten)]
    pub token: AccessToken,
    pub principal: Principal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCustomerInput {
    pub name: String,
    pub email: String,
    pub password: String,
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
    use crate::auth::AuthConfig;
    use crate::services::access::{CreateRoleInput, CreateUserInput};
    use crate::services::test_support::setup;
    use assert_matches::assert_matches;
    use std::time::Duration;

    async fn accounts() -> (AccountService, Arc<AccessService>, Arc<AuthService>) {
        let (db, events) = setup().await;
        let auth = Arc::new(AuthService::new(AuthConfig::new(
            "k8Jd02hfQm1zXv7Lp3Rt9Ws6Yb4Nc5Ae".to_string(),
            "storefront-clients".to_string(),
            "storefront-api".to_string(),
            Duration::from_secs(600),
        )));
        let access = Arc::new(AccessService::new(db.clone()));
        let customers = Arc::new(CustomerService::new(db, events));
        (
            AccountService::new(auth.clone(), access.clone(), customers),
            access,
            auth,
        )
    }

    fn registration(email: &str, password: &str) -> RegisterCustomerInput {
        RegisterCustomerInput {
            name: "Nila".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            phone: None,
            address_line: None,
            city: None,
            state: Some("tn".to_string()),
            postal_code: None,
            country: None,
        }
    }

    #[tokio::test]
    async fn staff_token_carries_role_permissions() {
        let (accounts, access, auth) = accounts().await;
        let role = access
            .create_role(CreateRoleInput {
                name: "orders-desk".to_string(),
                description: None,
                permissions: vec!["orders:manage".to_string()],
            })
            .await
            .unwrap();
        access
            .create_user(
                CreateUserInput {
                    name: "Dev".to_string(),
                    email: "dev@example.com".to_string(),
                    password: "desk-password".to_string(),
                    role_id: Some(role.role.id),
                    is_active: None,
                },
                false,
            )
            .await
            .unwrap();

        let session = accounts.staff_login("DEV@example.com", "desk-password").await.unwrap();
        let claims = auth.validate_token(&session.token.access_token).unwrap();
        assert_eq!(claims.roles, vec!["orders-desk".to_string()]);
        assert_eq!(claims.permissions, vec!["orders:manage".to_string()]);

        assert_matches!(
            accounts.staff_login("dev@example.com", "wrong-password").await,
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[tokio::test]
    async fn registered_customer_can_log_in() {
        let (accounts, _, auth) = accounts().await;

        let registered = accounts
            .register_customer(registration("nila@example.com", "tea-lover-1"))
            .await
            .unwrap();
        assert_eq!(registered.principal.roles, vec![CUSTOMER_ROLE.to_string()]);

        let session = accounts.customer_login("nila@example.com", "tea-lover-1").await.unwrap();
        let claims = auth.validate_token(&session.token.access_token).unwrap();
        assert_eq!(claims.sub, registered.principal.id.to_string());

        assert_matches!(
            accounts.customer_login("nila@example.com", "nope").await,
            Err(ServiceError::Unauthorized(_))
        );
        assert_matches!(
            accounts.register_customer(registration("short@example.com", "123")).await,
            Err(ServiceError::ValidationError(_))
        );
    }
}

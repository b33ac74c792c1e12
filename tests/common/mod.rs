#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use storefront_api::{
    auth::{AuthConfig, AuthService, TokenSubject, ADMIN_ROLE, CUSTOMER_ROLE},
    config::AppConfig,
    db::{self, DbConfig},
    entities::{customer, product, tax_rule},
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    services::payments::{GatewayOrder, GatewayOrderRequest, PaymentGateway},
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const PAYMENT_KEY_SECRET: &str = "gateway_test_secret";

/// Gateway stand-in that hands out sequential order ids
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<GatewayOrderRequest>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, ServiceError> {
        let mut requests = self.requests.lock().expect("gateway lock");
        let order = GatewayOrder {
            id: format!("order_test_{}", requests.len() + 1),
            amount: request.amount,
            currency: request.currency.clone(),
            status: Some("created".to_string()),
        };
        requests.push(request);
        Ok(order)
    }
}

/// Helper harness for spinning up the application over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    pub gateway: Arc<FakeGateway>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.payment_key_id = "rzp_test_key".to_string();
        cfg.payment_key_secret = PAYMENT_KEY_SECRET.to_string();

        let pool = db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg)));
        let gateway = Arc::new(FakeGateway::default());

        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            &cfg,
            auth_service.clone(),
            gateway.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = storefront_api::app_router(state.clone(), auth_service.clone());

        Self {
            router,
            state,
            auth_service,
            gateway,
            _event_task: event_task,
        }
    }

    fn token_for(&self, id: Uuid, roles: &[&str], permissions: &[&str]) -> String {
        self.auth_service
            .generate_token(&TokenSubject {
                id,
                name: "Test Principal".to_string(),
                email: format!("{}@example.com", id.simple()),
                roles: roles.iter().map(|r| r.to_string()).collect(),
                permissions: permissions.iter().map(|p| p.to_string()).collect(),
            })
            .expect("token")
            .access_token
    }

    /// Staff token with the admin role; bypasses every ability check
    pub fn admin_token(&self) -> String {
        self.token_for(Uuid::new_v4(), &[ADMIN_ROLE], &[])
    }

    /// Staff token carrying exactly the given permission keys
    pub fn staff_token(&self, permissions: &[&str]) -> String {
        self.token_for(Uuid::new_v4(), &["staff"], permissions)
    }

    pub fn customer_token(&self, customer_id: Uuid) -> String {
        self.token_for(customer_id, &[CUSTOMER_ROLE], &[])
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends the request and returns the status with the parsed JSON body (Null when empty)
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse response body")
        };
        (status, json)
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        let id = Uuid::new_v4();
        let now = Utc::now();
        product::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            slug: Set(format!("{}-{}", name.to_lowercase().replace(' ', "-"), id.simple())),
            description: Set(None),
            sku: Set(format!("SKU-{}", id.simple())),
            price: Set(price),
            stock: Set(stock),
            category: Set(Some("home".to_string())),
            image_url: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_customer(&self, state: Option<&str>) -> customer::Model {
        let id = Uuid::new_v4();
        let now = Utc::now();
        customer::ActiveModel {
            id: Set(id),
            name: Set("Meera Iyer".to_string()),
            email: Set(format!("meera-{}@example.com", id.simple())),
            phone: Set(None),
            password_hash: Set(None),
            address_line: Set(Some("4 Temple Street".to_string())),
            city: Set(Some("Chennai".to_string())),
            state: Set(state.map(str::to_string)),
            postal_code: Set(Some("600004".to_string())),
            country: Set(Some("IN".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed customer")
    }

    pub async fn seed_tax_rule(&self, state: &str, rate: Decimal) -> tax_rule::Model {
        let now = Utc::now();
        tax_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            state: Set(state.to_string()),
            rate: Set(rate),
            description: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed tax rule")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads a decimal serialized either as a string or a JSON number
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

pub fn id_of(value: &Value) -> Uuid {
    Uuid::parse_str(value["id"].as_str().expect("id field")).expect("uuid id")
}

use crate::{
    entities::{
        invoice::{self, InvoiceStatus},
        order::{self, OrderStatus, PaymentStatus},
        payment_record::{self, Entity as PaymentRecord, PaymentRecordStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Order request sent to the hosted-checkout gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayOrderRequest {
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Hosted-checkout payment gateway
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, ServiceError>;
}

/// Gateway client speaking JSON over HTTP with basic auth
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>, key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for payment gateway");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self), fields(receipt = %request.receipt))]
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, ServiceError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("Payment gateway unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Payment gateway rejected order");
            return Err(ServiceError::ExternalServiceError(format!(
                "Payment gateway returned {}",
                status
            )));
        }

        let order: GatewayOrder = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Invalid payment gateway response: {}", e))
        })?;
        info!(gateway_order_id = %order.id, "Gateway order created");
        Ok(order)
    }
}

/// Payment initiation and signature verification for storefront orders
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    gateway: Arc<dyn PaymentGateway>,
    key_id: String,
    key_secret: String,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn PaymentGateway>,
        key_id: String,
        key_secret: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            gateway,
            key_id,
            key_secret,
        }
    }

    /// Opens a gateway order for the customer's unpaid order
    #[instrument(skip(self))]
    pub async fn create_payment_order(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> Result<PaymentOrder, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        if order.customer_id != customer_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to another customer".to_string(),
            ));
        }
        if order.payment_status == PaymentStatus::Paid {
            return Err(ServiceError::Conflict(format!(
                "Order {} is already paid",
                order.order_number
            )));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(ServiceError::Conflict(format!(
                "Order {} is cancelled",
                order.order_number
            )));
        }

        let amount = to_minor_units(order.net_total)?;
        let gateway_order = self
            .gateway
            .create_order(GatewayOrderRequest {
                amount,
                currency: order.currency.clone(),
                receipt: order.order_number.clone(),
            })
            .await?;

        let now = Utc::now();
        payment_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            gateway_order_id: Set(gateway_order.id.clone()),
            gateway_payment_id: Set(None),
            amount: Set(amount),
            currency: Set(order.currency.clone()),
            status: Set(PaymentRecordStatus::Created),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::PaymentInitiated {
                order_id: order.id,
                gateway_order_id: gateway_order.id.clone(),
            })
            .await;

        Ok(PaymentOrder {
            order_id: order.id,
            gateway_order_id: gateway_order.id,
            amount,
            currency: order.currency,
            key_id: self.key_id.clone(),
        })
    }

    /// Checks the gateway signature. A match captures the payment and marks the order
    /// and its invoice paid; a mismatch records the failure.
    #[instrument(skip(self, input), fields(gateway_order_id = %input.gateway_order_id))]
    pub async fn verify_payment(
        &self,
        customer_id: Uuid,
        input: VerifyPaymentInput,
    ) -> Result<PaymentVerification, ServiceError> {
        let record = PaymentRecord::find()
            .filter(payment_record::Column::GatewayOrderId.eq(input.gateway_order_id.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment", &input.gateway_order_id))?;
        let order = order::Entity::find_by_id(record.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", record.order_id))?;
        if order.customer_id != customer_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to another customer".to_string(),
            ));
        }

        if record.status == PaymentRecordStatus::Captured {
            return Ok(PaymentVerification {
                order_id: order.id,
                gateway_payment_id: record.gateway_payment_id.unwrap_or_default(),
                payment_status: order.payment_status,
            });
        }

        let now = Utc::now();
        if !verify_signature(
            &self.key_secret,
            &input.gateway_order_id,
            &input.gateway_payment_id,
            &input.signature,
        ) {
            warn!(order_id = %order.id, "Payment signature mismatch");
            let txn = self.db.begin().await?;
            let mut active: payment_record::ActiveModel = record.into();
            active.gateway_payment_id = Set(Some(input.gateway_payment_id.clone()));
            active.status = Set(PaymentRecordStatus::Failed);
            active.updated_at = Set(now);
            active.update(&txn).await?;

            let order_id = order.id;
            // A paid order stays paid whatever happens to its other attempts
            if order.payment_status != PaymentStatus::Paid {
                let mut active: order::ActiveModel = order.into();
                active.payment_status = Set(PaymentStatus::Failed);
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
            txn.commit().await?;

            self.event_sender
                .send_or_log(Event::PaymentFailed {
                    order_id,
                    gateway_order_id: input.gateway_order_id,
                })
                .await;
            return Err(ServiceError::PaymentFailed(
                "Payment signature verification failed".to_string(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start payment capture transaction");
            ServiceError::DatabaseError(e)
        })?;

        let mut active: payment_record::ActiveModel = record.into();
        active.gateway_payment_id = Set(Some(input.gateway_payment_id.clone()));
        active.status = Set(PaymentRecordStatus::Captured);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        let order_id = order.id;
        let was_pending = order.status == OrderStatus::Pending;
        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Paid);
        if was_pending {
            active.status = Set(OrderStatus::Confirmed);
        }
        active.updated_at = Set(now);
        let order = active.update(&txn).await?;

        invoice::Entity::update_many()
            .col_expr(invoice::Column::Status, Expr::value(InvoiceStatus::Paid))
            .col_expr(invoice::Column::UpdatedAt, Expr::value(now))
            .filter(invoice::Column::OrderId.eq(order_id))
            .filter(invoice::Column::Status.ne(InvoiceStatus::Void))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentVerified {
                order_id,
                gateway_payment_id: input.gateway_payment_id.clone(),
            })
            .await;
        info!(%order_id, "Payment captured");

        Ok(PaymentVerification {
            order_id,
            gateway_payment_id: input.gateway_payment_id,
            payment_status: order.payment_status,
        })
    }
}

/// `hex(HMAC-SHA256(secret, "{gateway_order_id}|{gateway_payment_id}"))`
pub fn expected_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
) -> Result<String, ServiceError> {
    let mac = signing_mac(secret, gateway_order_id, gateway_payment_id)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of a hex signature against the expected MAC
pub fn verify_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    match signing_mac(secret, gateway_order_id, gateway_payment_id) {
        Ok(mac) => mac.verify_slice(&provided).is_ok(),
        Err(_) => false,
    }
}

fn signing_mac(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
) -> Result<HmacSha256, ServiceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::InternalError(format!("Invalid signing key: {}", e)))?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    Ok(mac)
}

/// Decimal amount to minor units (paise, cents)
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| ServiceError::InternalError(format!("Amount {} out of range", amount)))
}

/// What the client needs to open the hosted checkout
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOrder {
    pub order_id: Uuid,
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentInput {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentVerification {
    pub order_id: Uuid,
    pub gateway_payment_id: String,
    pub payment_status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::orders::{CreateOrderInput, OrderLineInput, OrderService};
    use crate::services::test_support::{seed_customer, seed_product, setup};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use wiremock::matchers::{basic_auth, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "gateway-secret";

    #[derive(Default)]
    struct RecordingGateway {
        requests: Mutex<Vec<GatewayOrderRequest>>,
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, ServiceError> {
            let mut requests = self.requests.lock().unwrap();
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

    #[test]
    fn signature_matches_known_vector() {
        let signature = expected_signature(SECRET, "order_1", "pay_1").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(SECRET, "order_1", "pay_1", &signature));
        assert!(verify_signature(SECRET, "order_1", "pay_1", &signature.to_uppercase()));
        assert!(!verify_signature(SECRET, "order_1", "pay_2", &signature));
        assert!(!verify_signature("other", "order_1", "pay_1", &signature));
        assert!(!verify_signature(SECRET, "order_1", "pay_1", "not-hex"));
    }

    #[test]
    fn minor_units_round_half_away() {
        assert_eq!(to_minor_units(dec!(10.005)).unwrap(), 1001);
        assert_eq!(to_minor_units(dec!(10.025)).unwrap(), 1003);
        assert_eq!(to_minor_units(dec!(59)).unwrap(), 5900);
        assert_eq!(to_minor_units(dec!(0.004)).unwrap(), 0);
    }

    async fn paid_flow() -> (PaymentService, Arc<RecordingGateway>, Uuid, Uuid, Arc<DatabaseConnection>) {
        let (db, events) = setup().await;
        let customer = seed_customer(&db, None).await;
        let vase = seed_product(&db, "Vase", dec!(12.345), 3).await;
        let details = OrderService::new(db.clone(), events.clone(), "INR".into(), 7)
            .create_order(CreateOrderInput {
                customer_id: Some(customer.id),
                items: vec![OrderLineInput { product_id: vase.id, quantity: 2 }],
                ..Default::default()
            })
            .await
            .unwrap();
        let gateway = Arc::new(RecordingGateway::default());
        let service = PaymentService::new(
            db.clone(),
            events,
            gateway.clone(),
            "key_test".to_string(),
            SECRET.to_string(),
        );
        (service, gateway, customer.id, details.order.id, db)
    }

    #[tokio::test]
    async fn correct_signature_marks_order_paid() {
        let (service, gateway, customer_id, order_id, db) = paid_flow().await;

        let payment_order = service.create_payment_order(customer_id, order_id).await.unwrap();
        assert_eq!(payment_order.amount, 2469);
        assert_eq!(payment_order.key_id, "key_test");
        assert_eq!(gateway.requests.lock().unwrap()[0].currency, "INR");

        let signature = expected_signature(SECRET, &payment_order.gateway_order_id, "pay_42").unwrap();
        let verified = service
            .verify_payment(
                customer_id,
                VerifyPaymentInput {
                    gateway_order_id: payment_order.gateway_order_id.clone(),
                    gateway_payment_id: "pay_42".to_string(),
                    signature,
                },
            )
            .await
            .unwrap();
        assert_eq!(verified.payment_status, PaymentStatus::Paid);

        let order = order::Entity::find_by_id(order_id).one(&*db).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        let invoice = invoice::Entity::find()
            .filter(invoice::Column::OrderId.eq(order_id))
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);

        assert_matches!(
            service.create_payment_order(customer_id, order_id).await,
            Err(ServiceError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn wrong_signature_records_failure() {
        let (service, _, customer_id, order_id, db) = paid_flow().await;
        let payment_order = service.create_payment_order(customer_id, order_id).await.unwrap();

        let result = service
            .verify_payment(
                customer_id,
                VerifyPaymentInput {
                    gateway_order_id: payment_order.gateway_order_id.clone(),
                    gateway_payment_id: "pay_42".to_string(),
                    signature: "00".repeat(32),
                },
            )
            .await;
        assert_matches!(result, Err(ServiceError::PaymentFailed(_)));

        let record = PaymentRecord::find()
            .filter(payment_record::Column::GatewayOrderId.eq(payment_order.gateway_order_id))
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PaymentRecordStatus::Failed);
        let order = order::Entity::find_by_id(order_id).one(&*db).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn failed_retry_does_not_unpay_a_paid_order() {
        let (service, _, customer_id, order_id, db) = paid_flow().await;
        let first = service.create_payment_order(customer_id, order_id).await.unwrap();
        let second = service.create_payment_order(customer_id, order_id).await.unwrap();

        let signature = expected_signature(SECRET, &first.gateway_order_id, "pay_1").unwrap();
        service
            .verify_payment(
                customer_id,
                VerifyPaymentInput {
                    gateway_order_id: first.gateway_order_id.clone(),
                    gateway_payment_id: "pay_1".to_string(),
                    signature,
                },
            )
            .await
            .unwrap();

        let result = service
            .verify_payment(
                customer_id,
                VerifyPaymentInput {
                    gateway_order_id: second.gateway_order_id.clone(),
                    gateway_payment_id: "pay_2".to_string(),
                    signature: "00".repeat(32),
                },
            )
            .await;
        assert_matches!(result, Err(ServiceError::PaymentFailed(_)));

        let order = order::Entity::find_by_id(order_id).one(&*db).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        let invoice = invoice::Entity::find()
            .filter(invoice::Column::OrderId.eq(order_id))
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn other_customers_cannot_pay() {
        let (service, _, _, order_id, _) = paid_flow().await;
        assert_matches!(
            service.create_payment_order(Uuid::new_v4(), order_id).await,
            Err(ServiceError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn http_gateway_posts_order_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .and(basic_auth("key_test", SECRET))
            .and(body_json(serde_json::json!({
                "amount": 5000,
                "currency": "INR",
                "receipt": "ORD-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "order_abc",
                "amount": 5000,
                "currency": "INR",
                "status": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = HttpPaymentGateway::new(format!("{}/v1/", server.uri()), "key_test", SECRET);
        let order = gateway
            .create_order(GatewayOrderRequest {
                amount: 5000,
                currency: "INR".to_string(),
                receipt: "ORD-1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(order.id, "order_abc");
    }

    #[tokio::test]
    async fn http_gateway_error_maps_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let gateway = HttpPaymentGateway::new(server.uri(), "key_test", "wrong");
        let result = gateway
            .create_order(GatewayOrderRequest {
                amount: 100,
                currency: "INR".to_string(),
                receipt: "ORD-2".to_string(),
            })
            .await;
        assert_matches!(result, Err(ServiceError::ExternalServiceError(_)));
    }
}

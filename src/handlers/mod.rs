pub mod access;
pub mod auth;
pub mod common;
pub mod customers;
pub mod delivery;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod plans;
pub mod products;
pub mod reviews;
pub mod site_settings;
pub mod storefront;
pub mod support;
pub mod tax_rules;

use crate::{
    auth::AuthService,
    config::AppConfig,
    events::EventSender,
    services::{
        access::AccessService, accounts::AccountService, cart::CartService,
        checkout::CheckoutService, complaints::ComplaintService, customers::CustomerService,
        delivery::DeliveryService, invoices::InvoiceService, likes::LikeService,
        orders::OrderService, payments::{PaymentGateway, PaymentService}, plans::PlanService,
        products::ProductService, refunds::RefundService, returns::ReturnService,
        reviews::ReviewService, site_settings::SiteSettingService, tax_rules::TaxRuleService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub customers: Arc<CustomerService>,
    pub reviews: Arc<ReviewService>,
    pub orders: Arc<OrderService>,
    pub invoices: Arc<InvoiceService>,
    pub delivery: Arc<DeliveryService>,
    pub access: Arc<AccessService>,
    pub accounts: Arc<AccountService>,
    pub plans: Arc<PlanService>,
    pub site_settings: Arc<SiteSettingService>,
    pub tax_rules: Arc<TaxRuleService>,
    pub complaints: Arc<ComplaintService>,
    pub returns: Arc<ReturnService>,
    pub refunds: Arc<RefundService>,
    pub cart: Arc<CartService>,
    pub likes: Arc<LikeService>,
    pub checkout: Arc<CheckoutService>,
    pub payments: Arc<PaymentService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
        auth: Arc<AuthService>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let customers = Arc::new(CustomerService::new(db.clone(), event_sender.clone()));
        let access = Arc::new(AccessService::new(db.clone()));
        let orders = Arc::new(OrderService::new(
            db.clone(),
            event_sender.clone(),
            config.default_currency.clone(),
            config.invoice_due_days,
        ));
        let cart = Arc::new(CartService::new(db.clone()));
        let checkout = Arc::new(CheckoutService::new(
            cart.clone(),
            orders.clone(),
            event_sender.clone(),
        ));
        let accounts = Arc::new(AccountService::new(auth, access.clone(), customers.clone()));
        let payments = Arc::new(PaymentService::new(
            db.clone(),
            event_sender.clone(),
            gateway,
            config.payment_key_id.clone(),
            config.payment_key_secret.clone(),
        ));

        Self {
            products: Arc::new(ProductService::new(db.clone())),
            customers,
            reviews: Arc::new(ReviewService::new(db.clone(), event_sender.clone())),
            orders,
            invoices: Arc::new(InvoiceService::new(db.clone())),
            delivery: Arc::new(DeliveryService::new(db.clone(), event_sender)),
            access,
            accounts,
            plans: Arc::new(PlanService::new(db.clone())),
            site_settings: Arc::new(SiteSettingService::new(db.clone())),
            tax_rules: Arc::new(TaxRuleService::new(db.clone())),
            complaints: Arc::new(ComplaintService::new(db.clone())),
            returns: Arc::new(ReturnService::new(db.clone())),
            refunds: Arc::new(RefundService::new(db.clone())),
            cart,
            likes: Arc::new(LikeService::new(db.clone())),
            checkout,
            payments,
        }
    }
}

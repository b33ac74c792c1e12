/*!
 * # Order Service
 *
 * Order creation prices each line from the catalog, applies the customer's
 * state tax rate, and writes the order, its items, an invoice and a
 * `pending` delivery-tracking record in one transaction. Stock is taken with
 * a conditional decrement so concurrent orders cannot oversell.
 */

use crate::{
    entities::{
        complaint, customer,
        delivery_tracking::{self, DeliveryStatus},
        invoice::{self, InvoiceStatus},
        order::{self, Entity as Order, OrderStatus, PaymentStatus},
        order_item, payment_record,
        product::{self, Entity as Product},
        refund_request, return_request,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{page_index, tax_rules::active_rate_for_state};

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    currency: String,
    invoice_due_days: i64,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        currency: String,
        invoice_due_days: i64,
    ) -> Self {
        Self {
            db,
            event_sender,
            currency,
            invoice_due_days,
        }
    }

    /// Creates an order with its items, invoice and delivery tracking
    #[instrument(skip(self, input), fields(customer_id = ?input.customer_id, lines = input.items.len()))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<OrderDetails, ServiceError> {
        let customer_id = input.customer_id.ok_or_else(|| {
            ServiceError::ValidationError("customer_id is required".to_string())
        })?;
        let lines = merge_lines(&input.items)?;

        let customer = customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;

        let product_ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = products.get(&line.product_id).ok_or_else(|| {
                ServiceError::BadRequest(format!("Unknown product {}", line.product_id))
            })?;
            if !product.is_active {
                return Err(ServiceError::BadRequest(format!(
                    "Product {} is no longer available",
                    product.id
                )));
            }
            priced.push(PricedLine {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
            });
        }

        let tax_rate = active_rate_for_state(&*self.db, customer.state.as_deref()).await?;
        let totals = compute_totals(&priced, tax_rate);

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let shipping_address = input
            .shipping_address
            .or_else(|| customer.formatted_address());

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(document_number("ORD", order_id, now)),
            customer_id: Set(customer.id),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Unpaid),
            subtotal: Set(totals.subtotal),
            tax_rate: Set(tax_rate),
            tax_amount: Set(totals.tax_amount),
            net_total: Set(totals.net_total),
            currency: Set(self.currency.clone()),
            shipping_address: Set(shipping_address),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for line in &priced {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                product_name: Set(line.product_name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        for line in &priced {
            let result = Product::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(line.quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                .filter(product::Column::Id.eq(line.product_id))
                .filter(product::Column::IsActive.eq(true))
                .filter(product::Column::Stock.gte(line.quantity))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                txn.rollback().await?;
                warn!(product_id = %line.product_id, requested = line.quantity, "Order rejected for insufficient stock");
                return Err(ServiceError::InsufficientStock(format!(
                    "{} has fewer than {} unit(s) in stock",
                    line.product_name, line.quantity
                )));
            }
        }

        let invoice_id = Uuid::new_v4();
        let invoice = invoice::ActiveModel {
            id: Set(invoice_id),
            order_id: Set(order_id),
            invoice_number: Set(document_number("INV", invoice_id, now)),
            customer_id: Set(customer.id),
            product_summary: Set(product_summary(&priced)),
            amount: Set(totals.net_total),
            status: Set(InvoiceStatus::Unpaid),
            issued_at: Set(now),
            due_date: Set(now + Duration::days(self.invoice_due_days)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let tracking = delivery_tracking::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(DeliveryStatus::Pending),
            carrier: Set(None),
            tracking_number: Set(None),
            estimated_delivery: Set(None),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id,
                customer_id: customer.id,
                net_total: order.net_total,
            })
            .await;
        for line in &priced {
            self.event_sender
                .send_or_log(Event::StockDecremented {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::InvoiceIssued {
                invoice_id,
                order_id,
            })
            .await;

        info!(
            order_id = %order_id,
            order_number = %order.order_number,
            net_total = %order.net_total,
            "Order created successfully"
        );

        Ok(OrderDetails {
            order,
            items,
            invoice: Some(invoice),
            delivery: Some(tracking),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }

    /// Order with its items, invoice and delivery tracking
    #[instrument(skip(self))]
    pub async fn get_order_details(&self, id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = self.get_order(id).await?;

        let items = order
            .find_related(order_item::Entity)
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let invoice = invoice::Entity::find()
            .filter(invoice::Column::OrderId.eq(id))
            .one(&*self.db)
            .await?;
        let delivery = delivery_tracking::Entity::find()
            .filter(delivery_tracking::Column::OrderId.eq(id))
            .one(&*self.db)
            .await?;

        Ok(OrderDetails {
            order,
            items,
            invoice,
            delivery,
        })
    }

    /// Lists orders newest first
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
        filter: OrderFilter,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = Order::find();
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page_index(page)).await?;
        Ok((orders, total))
    }

    /// Patches status, payment status, notes or shipping address
    #[instrument(skip(self))]
    pub async fn update_order(
        &self,
        id: Uuid,
        input: UpdateOrderInput,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;
        let old_status = existing.status;

        let mut active: order::ActiveModel = existing.into();
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(payment_status) = input.payment_status {
            active.payment_status = Set(payment_status);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(shipping_address) = input.shipping_address {
            active.shipping_address = Set(Some(shipping_address));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        if updated.status != old_status {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id: id,
                    old_status: old_status.to_string(),
                    new_status: updated.status.to_string(),
                })
                .await;
            info!(order_id = %id, old_status = %old_status, new_status = %updated.status, "Order status updated");
        }

        Ok(updated)
    }

    /// Deletes an order together with its items, invoice, tracking and payment records.
    /// Orders referenced by complaints, returns or refunds are kept (409).
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))?;

        let after_sales = complaint::Entity::find()
            .filter(complaint::Column::OrderId.eq(id))
            .count(&txn)
            .await?
            + return_request::Entity::find()
                .filter(return_request::Column::OrderId.eq(id))
                .count(&txn)
                .await?
            + refund_request::Entity::find()
                .filter(refund_request::Column::OrderId.eq(id))
                .count(&txn)
                .await?;
        if after_sales > 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "Order {} has {} complaint, return or refund record(s)",
                id, after_sales
            )));
        }

        order_item::Entity::delete_many()
            .filter(order_item::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        invoice::Entity::delete_many()
            .filter(invoice::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        delivery_tracking::Entity::delete_many()
            .filter(delivery_tracking::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        payment_record::Entity::delete_many()
            .filter(payment_record::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::OrderDeleted(id)).await;
        info!(order_id = %id, "Deleted order");
        Ok(())
    }
}

/// Requested order line
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Input for creating an order
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateOrderInput {
    pub customer_id: Option<Uuid>,
    pub items: Vec<OrderLineInput>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateOrderInput {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

/// An order and everything created alongside it
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    pub invoice: Option<invoice::Model>,
    pub delivery: Option<delivery_tracking::Model>,
}

/// Catalog-priced line used for totals and the invoice summary
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl PricedLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub net_total: Decimal,
}

/// `tax = subtotal × rate / 100`, kept to the 4 decimal places stored in the database
pub fn compute_totals(lines: &[PricedLine], tax_rate: Decimal) -> OrderTotals {
    let subtotal: Decimal = lines.iter().map(PricedLine::line_total).sum();
    let tax_amount = (subtotal * tax_rate / Decimal::ONE_HUNDRED).round_dp(4);
    OrderTotals {
        subtotal,
        tax_amount,
        net_total: subtotal + tax_amount,
    }
}

/// Human-readable invoice line summary: `"Name x qty, Name x qty"`
pub fn product_summary(lines: &[PricedLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} x {}", line.product_name, line.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rejects empty orders and non-positive quantities; repeated products are summed
fn merge_lines(items: &[OrderLineInput]) -> Result<Vec<OrderLineInput>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "items must contain at least one line".to_string(),
        ));
    }

    let mut merged: Vec<OrderLineInput> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                    ServiceError::ValidationError("quantity is too large".to_string())
                })?
            }
            None => merged.push(item.clone()),
        }
    }
    Ok(merged)
}

/// `PREFIX-YYYYMMDD-XXXXXXXX`, the suffix taken from the record id
fn document_number(prefix: &str, id: Uuid, at: DateTime<Utc>) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("{}-{}-{}", prefix, at.format("%Y%m%d"), &simple[..8])
}

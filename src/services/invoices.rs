use crate::{
    entities::invoice::{self, Entity as Invoice, InvoiceStatus},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::page_index;

/// Invoices are issued by order creation; the admin can read them and change their status
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
}

impl InvoiceService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        page: u64,
        limit: u64,
        status: Option<InvoiceStatus>,
    ) -> Result<(Vec<invoice::Model>, u64), ServiceError> {
        let mut query = Invoice::find();
        if let Some(status) = status {
            query = query.filter(invoice::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(invoice::Column::IssuedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page_index(page)).await?;
        Ok((invoices, total))
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: Uuid) -> Result<invoice::Model, ServiceError> {
        Invoice::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice", id))
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
    ) -> Result<invoice::Model, ServiceError> {
        let existing = self.get_invoice(id).await?;
        if existing.status == InvoiceStatus::Void && status != InvoiceStatus::Void {
            return Err(ServiceError::Conflict(format!(
                "Invoice {} is void and cannot be reopened",
                existing.invoice_number
            )));
        }

        let mut active: invoice::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        info!(invoice_id = %id, status = %status, "Invoice status updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::orders::{CreateOrderInput, OrderLineInput, OrderService};
    use crate::services::test_support::{seed_customer, seed_product, setup};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn void_invoices_stay_void() {
        let (db, events) = setup().await;
        let customer = seed_customer(&db, None).await;
        let mug = seed_product(&db, "Mug", dec!(25), 3).await;
        let details = OrderService::new(db.clone(), events, "INR".into(), 7)
            .create_order(CreateOrderInput {
                customer_id: Some(customer.id),
                items: vec![OrderLineInput { product_id: mug.id, quantity: 1 }],
                ..Default::default()
            })
            .await
            .unwrap();
        let invoice_id = details.invoice.unwrap().id;

        let service = InvoiceService::new(db);
        let (listed, total) = service
            .list_invoices(1, 10, Some(InvoiceStatus::Unpaid))
            .await
            .unwrap();
        assert_eq!((listed.len(), total), (1, 1));

        service.update_status(invoice_id, InvoiceStatus::Void).await.unwrap();
        assert_matches!(
            service.update_status(invoice_id, InvoiceStatus::Paid).await,
            Err(ServiceError::Conflict(_))
        );
    }
}

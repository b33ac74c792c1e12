//! SeaORM entities, one module per table.

pub mod cart_item;
pub mod complaint;
pub mod customer;
pub mod delivery_tracking;
pub mod invoice;
pub mod like;
pub mod order;
pub mod order_item;
pub mod payment_record;
pub mod permission;
pub mod plan;
pub mod product;
pub mod refund_request;
pub mod return_request;
pub mod review;
pub mod role;
pub mod role_permission;
pub mod site_setting;
pub mod tax_rule;
pub mod user;

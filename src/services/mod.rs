// Catalog and customers
pub mod customers;
pub mod products;
pub mod reviews;

// Orders and fulfilment
pub mod delivery;
pub mod invoices;
pub mod orders;

// Access control
pub mod access;
pub mod accounts;

// Store configuration
pub mod plans;
pub mod site_settings;
pub mod tax_rules;

// After-sales support
pub mod complaints;
pub mod refunds;
pub mod returns;

// Storefront
pub mod cart;
pub mod checkout;
pub mod likes;
pub mod payments;

/// Zero-based page index for SeaORM paginators; pages are 1-based on the wire.
pub(crate) fn page_index(page: u64) -> u64 {
    page.max(1) - 1
}

/// Trims a string and drops it when nothing is left
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! Order data model types.

use serde::{Deserialize, Serialize};

/// Order lifecycle states. Stored as their uppercase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PROCESSING" => Some(OrderStatus::Processing),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "RETURNED" => Some(OrderStatus::Returned),
            _ => None,
        }
    }
}

/// Payment states. No gateway is wired up — the field tracks what an
/// out-of-band payment flow reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "FAILED" => Some(PaymentStatus::Failed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub address_id: String,
    pub status: String,
    pub payment_status: String,
    pub total_cents: i64,
    pub tracking_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OrderItemRow {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub size_id: String,
    pub color_id: String,
    pub quantity: i64,
    /// Unit price at order time.
    pub price_cents: i64,
    pub design_url: Option<String>,
}

/// An order item with display fields joined in for list/detail responses.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OrderItemDetailRow {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub size_name: String,
    pub color_name: String,
    pub hex_code: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub design_url: Option<String>,
    pub image_url: Option<String>,
}

/// One requested line item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub size_id: String,
    pub color_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub design_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

/// Maximum quantity accepted for a single line item.
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Sum of `unit_price * quantity` over the line items, in cents.
/// Saturating so a hostile quantity cannot wrap the total.
pub fn compute_total_cents(lines: &[(i64, i64)]) -> i64 {
    lines
        .iter()
        .fold(0i64, |acc, (price, qty)| {
            acc.saturating_add(price.saturating_mul(*qty))
        })
}

/// Typed failures for order placement and cancellation.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid address")]
    AddressNotFound,
    #[error("No items in order")]
    EmptyOrder,
    #[error("Too many items in order (max {max})")]
    TooManyItems { max: usize },
    #[error("Invalid item in order")]
    InvalidItem,
    #[error("Product {product_id} not found or inactive")]
    ProductUnavailable { product_id: String },
    #[error("Product {product_id} not available in selected size and color")]
    VariantUnavailable { product_id: String },
    #[error("Not enough stock for {product_name}. Available: {available}")]
    InsufficientStock {
        product_name: String,
        available: i64,
    },
    #[error("Order not found")]
    NotFound,
    #[error("Only orders in PENDING status can be cancelled")]
    NotPending,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

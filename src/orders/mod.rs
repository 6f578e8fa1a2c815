//! Order placement, cancellation, and fulfilment.

pub mod model;
pub mod storage;

pub use model::{
    compute_total_cents, NewOrderItem, OrderError, OrderItemDetailRow, OrderItemRow, OrderRow,
    OrderStatus, PaymentStatus, PlaceOrderRequest, MAX_ITEM_QUANTITY,
};
pub use storage::OrderStorage;

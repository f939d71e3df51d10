//! Use cases.
//!
//! Services check who is acting, open one transaction per mutation through
//! the [`Transactor`](crate::db::Transactor), drive the repositories inside it
//! and publish events once it has committed.

pub mod checkout;
pub mod fulfillment;
pub mod order_status;
pub mod orders;
pub mod payments;
pub mod rate_quote;
pub mod shipment_pricing;
pub mod stock_requests;

pub use checkout::CheckoutService;
pub use fulfillment::FulfillmentService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use stock_requests::StockRequestService;

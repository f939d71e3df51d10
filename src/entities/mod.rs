pub mod cart_item;
pub mod drug;
pub mod order;
pub mod order_detail;
pub mod payment;
pub mod pharmacy;
pub mod pharmacy_drug;
pub mod pharmacy_shipment_method;
pub mod shipment_method;
pub mod stock_journal;
pub mod stock_request;
pub mod stock_request_drug;
pub mod user_address;

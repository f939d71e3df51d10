//! SQL access.
//!
//! Repositories hold no connection. Every method takes the connection or
//! transaction it must run on, so the transaction scope stays visible at the
//! call site.

pub mod address_repository;
pub mod cart_repository;
pub mod inventory_ledger;
pub mod order_repository;
pub mod payment_repository;
pub mod pharmacy_repository;
pub mod shipment_repository;
pub mod stock_request_repository;

pub use address_repository::{AddressResolver, ResolvedAddress, UserAddressRepository};
pub use cart_repository::{CartRepository, LockedCartItem};
pub use inventory_ledger::{InventoryLedger, JournalEntry, StockAdjustments};
pub use order_repository::{LockedOrderLine, OrderRepository};
pub use payment_repository::PaymentRepository;
pub use pharmacy_repository::{DonorCandidate, PharmacyRepository};
pub use shipment_repository::ShipmentRepository;
pub use stock_request_repository::StockRequestRepository;

pub mod audit_service;
pub mod commission_service;
pub mod import_service;
pub mod order_service;
pub mod payout_service;
pub mod seller_service;

pub use audit_service::*;
pub use commission_service::*;
pub use import_service::*;
pub use order_service::*;
pub use payout_service::*;
pub use seller_service::*;

pub mod jwt;
pub mod keyed_lock;
pub mod kyc;
pub mod money;
pub mod pagination;

pub use jwt::*;
pub use keyed_lock::KeyedLocks;
pub use kyc::BankDetails;
pub use money::{bp_to_percent, decimal_to_paise, paise_to_decimal, percent_to_bp};
pub use pagination::{PaginatedResponse, PaginationInfo, PaginationParams};

pub mod audit_logs;
pub mod global_commission_settings;
pub mod order_events;
pub mod orders;
pub mod seller_commissions;
pub mod seller_payouts;
pub mod sellers;

pub use audit_logs as audit_log_entity;
pub use global_commission_settings as global_commission_entity;
pub use order_events as order_event_entity;
pub use orders as order_entity;
pub use seller_commissions as seller_commission_entity;
pub use seller_payouts as seller_payout_entity;
pub use sellers as seller_entity;

pub use audit_logs::AuditAction;
pub use global_commission_settings::PayoutCycle;
pub use order_events::ActorRole;
pub use orders::{OrderStatus, PaymentMethod, PaymentStatus};

//! Order lifecycle rules that do not touch the database.
//!
//! Services load rows, hand them to these functions and persist what comes back.

pub mod attribution;
pub mod legacy;
pub mod payout;
pub mod timeline;
pub mod transition;

pub mod audit;
pub mod import;
pub mod order;
pub mod payment;
pub mod settings;

pub use audit::*;
pub use import::*;
pub use order::*;
pub use payment::*;
pub use settings::*;

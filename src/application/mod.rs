//! Application layer: reparenting engine and services
//!
//! This layer orchestrates domain rules inside store transactions.

pub mod ancestry;
pub mod error;
pub mod error_ext;
mod lookup;
pub mod recalibrate;
pub mod reparent;
pub mod services;

pub use ancestry::locate_bridge_child;
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::StoreResultExt;
pub use recalibrate::recalibrate;
pub use reparent::set_parent;

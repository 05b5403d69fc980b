//! Handler roster and load-balanced assignment.

pub mod balancer;
pub mod roster;

pub use balancer::select_handler;
pub use roster::{Handler, HandlerRoster};

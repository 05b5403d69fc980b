//! # Pipeline Module
//!
//! The ticket intake pipeline and the actor handle that fronts it.

pub mod handle;
pub mod intake;

pub use handle::{IntakeHandle, IntakeMessage};
pub use intake::{Clock, FixedClock, IntakeOutcome, IntakePipeline, SystemClock};

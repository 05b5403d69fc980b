// Deskflow V1 Core
// Ticket intake and disposition engine: classify, auto-resolve, route, estimate.

pub mod assignment;
pub mod classify;
pub mod config;
pub mod error;
pub mod estimate;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod resolve;

pub use config::DeskConfig;
pub use error::{DeskError, Result};
pub use models::{Category, Priority, ResolutionSource, Status, Ticket, TicketRequest, TicketView};
pub use pipeline::{IntakeHandle, IntakeOutcome, IntakePipeline};

#[cfg(test)]
mod tests;

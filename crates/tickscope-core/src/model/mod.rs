//! Typed views over the canonical ticket table.

pub mod priority;
pub mod ticket;

pub use priority::Priority;
pub use ticket::{TicketColumns, TicketView, tickets};

//! Mailbox actions module
//!
//! Provides handlers for grid mass actions such as marking threads
//! read or unread.

mod handler;

pub use handler::{MassActionHandler, MassActionRequest, MassActionResult};

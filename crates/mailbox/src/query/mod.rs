//! Query building for mailbox associations
//!
//! [`EmailUserQuery`] is the handle returned to callers that want to refine
//! a selection before running it; both storage backends execute the same
//! predicates.

mod builder;
mod predicate;

pub use builder::{EmailUserQuery, Order};
pub use predicate::{EmailUserView, Join, Predicate};

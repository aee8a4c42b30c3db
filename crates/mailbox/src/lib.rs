//! Mailbox crate - Ownership queries for a CRM mail client
//!
//! This crate provides the query layer over the `email_user` table, which
//! records which user owns which email in which folder:
//! - Domain models (EmailUser, Email, EmailFolder, EmailOrigin)
//! - A composable query builder executed lazily against a store
//! - Storage trait with SQLite and in-memory backends
//! - Repository operations for lookups and the bulk seen flag
//! - Mass action handling for grid selections
//! - Unseen counter for notification badges

pub mod actions;
pub mod config;
pub mod error;
pub mod models;
pub mod notification;
pub mod query;
pub mod repository;
pub mod storage;

pub use actions::{MassActionHandler, MassActionRequest, MassActionResult};
pub use config::{Backend, CONFIG_FILE, MailboxConfig};
pub use error::{MailboxError, parse_id_list};
pub use models::{
    Email, EmailFolder, EmailId, EmailOrigin, EmailThread, EmailUser, EmailUserId, FolderId,
    FolderType, MailboxId, NewEmailUser, OrganizationId, OriginId, SeenFilter, ThreadId, UserId,
};
pub use notification::{DEFAULT_BADGE_CAP, count_unseen, format_badge};
pub use query::{EmailUserQuery, Order, Predicate};
pub use repository::EmailUserRepository;
pub use storage::{EmailUserStore, InMemoryEmailUserStore, SqliteEmailUserStore};

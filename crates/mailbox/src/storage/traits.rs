//! Storage trait definitions

use crate::models::{
    Email, EmailFolder, EmailId, EmailOrigin, EmailThread, EmailUser, EmailUserId, NewEmailUser,
    ThreadId,
};
use crate::query::EmailUserQuery;
use anyhow::Result;

/// Trait for mailbox association storage
///
/// Backends execute [`EmailUserQuery`] handles and own the single bulk
/// mutation of this layer, the seen flag. Records are written by the
/// importer through the `upsert_*`/`insert_*` methods.
pub trait EmailUserStore: Send + Sync {
    /// Insert or update a mail origin
    fn upsert_origin(&self, origin: EmailOrigin) -> Result<()>;

    /// Insert or update a folder
    fn upsert_folder(&self, folder: EmailFolder) -> Result<()>;

    /// Insert or update a thread
    fn upsert_thread(&self, thread: EmailThread) -> Result<()>;

    /// Insert or update an email
    fn upsert_email(&self, email: Email) -> Result<()>;

    /// Get an email by id
    fn get_email(&self, id: EmailId) -> Result<Option<Email>>;

    /// Store a new association row and return its id
    fn insert_email_user(&self, row: NewEmailUser) -> Result<EmailUserId>;

    /// Get an association row by id
    fn get_email_user(&self, id: EmailUserId) -> Result<Option<EmailUser>>;

    /// Run a query and load the matching rows
    fn fetch(&self, query: &EmailUserQuery) -> Result<Vec<EmailUser>>;

    /// Run a query and load only row ids
    fn fetch_ids(&self, query: &EmailUserQuery) -> Result<Vec<EmailUserId>>;

    /// Distinct threads of the emails behind the matching rows, ascending
    ///
    /// Emails without a thread are skipped.
    fn fetch_thread_ids(&self, query: &EmailUserQuery) -> Result<Vec<ThreadId>>;

    /// Count rows matching a query, ignoring its limit and offset
    fn count(&self, query: &EmailUserQuery) -> Result<usize>;

    /// Set the seen flag on every listed row in one atomic step
    ///
    /// Ids with no row are skipped. Returns the number of rows matched.
    fn set_seen(&self, ids: &[EmailUserId], seen: bool) -> Result<usize>;

    /// Clear all data (for testing)
    fn clear(&self) -> Result<()>;
}

//! Mailbox association lookups
//!
//! Answers "which `email_user` rows match these filters" and flips the seen
//! flag for an id set. Methods returning [`EmailUserQuery`] do not touch the
//! store; the caller refines and executes them.

use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;

use crate::models::{
    EmailId, EmailUser, EmailUserId, FolderId, FolderType, OrganizationId, SeenFilter, ThreadId,
    UserId,
};
use crate::query::{EmailUserQuery, Predicate};
use crate::storage::EmailUserStore;

/// Query layer over the `email_user` table
#[derive(Clone)]
pub struct EmailUserRepository {
    store: Arc<dyn EmailUserStore>,
}

impl EmailUserRepository {
    pub fn new(store: Arc<dyn EmailUserStore>) -> Self {
        Self { store }
    }

    /// The backing store, for executing returned query handles
    pub fn store(&self) -> &dyn EmailUserStore {
        self.store.as_ref()
    }

    /// Rows of one email owned by a user within an organization
    pub fn find_by_email_and_owner(
        &self,
        email: EmailId,
        user: UserId,
        organization: OrganizationId,
    ) -> Result<Vec<EmailUser>> {
        EmailUserQuery::new()
            .and_where(Predicate::Email(email))
            .and_where(Predicate::Owner(user))
            .and_where(Predicate::Organization(organization))
            .fetch(self.store())
    }

    /// Rows of one email that belong to a shared mailbox
    pub fn find_by_email_for_mailbox(&self, email: EmailId) -> Result<Vec<EmailUser>> {
        EmailUserQuery::new()
            .and_where(Predicate::Email(email))
            .and_where(Predicate::HasMailboxOwner)
            .fetch(self.store())
    }

    /// A user's rows in folders of active origins
    ///
    /// An empty `folder_types` slice means any folder type.
    pub fn get_email_user_list(
        &self,
        user: UserId,
        organization: OrganizationId,
        folder_types: &[FolderType],
        seen: SeenFilter,
    ) -> Result<Vec<EmailUser>> {
        let mut query = EmailUserQuery::new()
            .and_where(Predicate::Owner(user))
            .and_where(Predicate::Organization(organization))
            .and_where(Predicate::OriginActive(true));

        if !folder_types.is_empty() {
            query.push(Predicate::FolderTypes(folder_types.to_vec()));
        }

        if let Some(seen) = seen.required() {
            query.push(Predicate::Seen(seen));
        }

        query.fetch(self.store())
    }

    /// Ids of the folder's rows that are not in `ids`
    ///
    /// Backs "select all except these" in the grid. With no ids nothing is
    /// excluded and every id in the folder comes back.
    pub fn get_inverted_ids_from_folder(
        &self,
        ids: &[EmailUserId],
        folder: FolderId,
    ) -> Result<Vec<EmailUserId>> {
        let mut query = self.get_email_user_by_folder(folder);
        if !ids.is_empty() {
            query.push(Predicate::ExcludeIds(ids.to_vec()));
        }
        query.fetch_ids(self.store())
    }

    /// Set the seen flag for exactly the given rows in one update
    ///
    /// Unknown ids are skipped. Returns the number of rows matched.
    pub fn set_email_users_seen(&self, ids: &[EmailUserId], seen: bool) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let matched = self.store.set_seen(ids, seen)?;
        info!(
            "Marked {} of {} email_user rows as {}",
            matched,
            ids.len(),
            if seen { "seen" } else { "unseen" }
        );
        Ok(matched)
    }

    /// Unseen rows of a user, for notification counters
    pub fn find_unseen_user_email(
        &self,
        user: UserId,
        organization: OrganizationId,
    ) -> EmailUserQuery {
        EmailUserQuery::new()
            .and_where(Predicate::Owner(user))
            .and_where(Predicate::Organization(organization))
            .and_where(Predicate::Seen(false))
    }

    /// Selection for grid mass actions (move, delete, mark read/unread)
    ///
    /// Only thread heads are selected. When `is_all_selected` is set the id
    /// list is ignored, even if it is not empty. An empty id list without
    /// `is_all_selected` applies no id restriction either.
    pub fn get_email_user_builder_for_mass_action(
        &self,
        ids: &[EmailUserId],
        user: UserId,
        folder_type: Option<FolderType>,
        is_all_selected: bool,
    ) -> EmailUserQuery {
        let mut query = EmailUserQuery::new()
            .and_where(Predicate::Owner(user))
            .and_where(Predicate::Head(true));

        if let Some(folder_type) = folder_type {
            query.push(Predicate::FolderTypes(vec![folder_type]));
        }

        if !is_all_selected && !ids.is_empty() {
            query.push(Predicate::Ids(ids.to_vec()));
        }

        debug!(
            "Mass action selection for user {}: {} ids, folder type {:?}, all selected: {}",
            user,
            ids.len(),
            folder_type,
            is_all_selected
        );
        query
    }

    /// The non-head rows of the given threads owned by a user
    ///
    /// Used to reach the rest of a thread once its head row is known.
    pub fn get_email_user_by_thread_id(
        &self,
        thread_ids: &[ThreadId],
        user: UserId,
    ) -> EmailUserQuery {
        EmailUserQuery::new()
            .and_where(Predicate::Owner(user))
            .and_where(Predicate::Head(false))
            .and_where(Predicate::Threads(thread_ids.to_vec()))
    }

    pub fn get_email_user_by_folder(&self, folder: FolderId) -> EmailUserQuery {
        EmailUserQuery::new().and_where(Predicate::Folder(folder))
    }

    /// Rows in a folder whose email carries one of the Message-IDs
    pub fn get_email_users_by_folder_and_message_ids(
        &self,
        folder: FolderId,
        message_ids: &[String],
    ) -> Result<Vec<EmailUser>> {
        self.get_email_user_by_folder(folder)
            .and_where(Predicate::MessageIds(message_ids.to_vec()))
            .fetch(self.store())
    }
}

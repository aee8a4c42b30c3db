//! Mass action handler for mailbox grids
//!
//! Resolves a grid selection into `email_user` rows and applies the
//! read/unread change to whole threads.

use anyhow::Result;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{MailboxError, parse_id_list};
use crate::models::{EmailUserId, FolderType, UserId};
use crate::query::{EmailUserQuery, Predicate};
use crate::repository::EmailUserRepository;
use crate::storage::EmailUserStore;

/// A selection made in the mailbox grid
#[derive(Debug, Clone, PartialEq)]
pub struct MassActionRequest {
    /// Explicitly selected rows; ignored when `is_all_selected` is set
    pub ids: Vec<EmailUserId>,
    pub user: UserId,
    pub folder_type: Option<FolderType>,
    pub is_all_selected: bool,
    /// Rows unticked after "select all"
    pub excluded: Vec<EmailUserId>,
}

impl MassActionRequest {
    /// Select exactly the given rows
    pub fn selected(ids: Vec<EmailUserId>, user: UserId) -> Self {
        Self {
            ids,
            user,
            folder_type: None,
            is_all_selected: false,
            excluded: Vec::new(),
        }
    }

    /// Select every row of the user, minus `excluded`
    pub fn all_except(excluded: Vec<EmailUserId>, user: UserId) -> Self {
        Self {
            ids: Vec::new(),
            user,
            folder_type: None,
            is_all_selected: true,
            excluded,
        }
    }

    /// Build from grid parameters
    ///
    /// `values` is the comma separated id list. With `inset` the ids are
    /// the selection; without it they are the rows left out of "select all".
    pub fn from_grid(
        values: &str,
        inset: bool,
        user: UserId,
        folder_type: Option<&str>,
    ) -> Result<Self, MailboxError> {
        let ids: Vec<EmailUserId> = parse_id_list(values)?
            .into_iter()
            .map(EmailUserId)
            .collect();
        let folder_type = folder_type
            .filter(|t| !t.trim().is_empty())
            .map(str::parse::<FolderType>)
            .transpose()?;

        let request = if inset {
            Self::selected(ids, user)
        } else {
            Self::all_except(ids, user)
        };
        Ok(request.in_folder_type(folder_type))
    }

    pub fn in_folder_type(mut self, folder_type: Option<FolderType>) -> Self {
        self.folder_type = folder_type;
        self
    }

    /// Whether the request selects nothing at all
    pub fn is_empty(&self) -> bool {
        !self.is_all_selected && self.ids.is_empty()
    }
}

/// Outcome of a mass action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MassActionResult {
    /// Thread-head rows selected
    pub selected: usize,
    /// Other rows of the same threads pulled in
    pub thread_rows: usize,
    /// Rows the store updated
    pub updated: usize,
}

/// Handler for grid mass actions
pub struct MassActionHandler {
    repository: EmailUserRepository,
}

impl MassActionHandler {
    /// Create a new mass action handler
    pub fn new(store: Arc<dyn EmailUserStore>) -> Self {
        Self {
            repository: EmailUserRepository::new(store),
        }
    }

    /// Share an existing repository
    pub fn with_repository(repository: EmailUserRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &EmailUserRepository {
        &self.repository
    }

    /// The head-row query a request resolves to
    pub fn selection(&self, request: &MassActionRequest) -> EmailUserQuery {
        let query = self.repository.get_email_user_builder_for_mass_action(
            &request.ids,
            request.user,
            request.folder_type,
            request.is_all_selected,
        );
        if request.is_all_selected && !request.excluded.is_empty() {
            query.and_where(Predicate::ExcludeIds(request.excluded.clone()))
        } else {
            query
        }
    }

    /// Mark the selected threads as read (`seen = true`) or unread
    ///
    /// Every message of a selected thread owned by the user is updated, not
    /// only the thread head shown in the grid.
    pub fn mark_seen(&self, request: &MassActionRequest, seen: bool) -> Result<MassActionResult> {
        if request.is_empty() {
            debug!("Empty mass action selection for user {}, nothing to do", request.user);
            return Ok(MassActionResult::default());
        }

        let store = self.repository.store();
        let selection = self.selection(request);
        let heads = selection.fetch_ids(store)?;
        if heads.is_empty() {
            return Ok(MassActionResult::default());
        }

        let threads = selection.fetch_thread_ids(store)?;
        let thread_rows = if threads.is_empty() {
            Vec::new()
        } else {
            self.repository
                .get_email_user_by_thread_id(&threads, request.user)
                .fetch_ids(store)?
        };

        let selected = heads.len();
        let mut ids: Vec<EmailUserId> = heads;
        ids.extend(thread_rows.iter().copied());

        let updated = self.repository.set_email_users_seen(&ids, seen)?;
        info!(
            "Mass {} for user {}: {} threads, {} rows updated",
            if seen { "mark read" } else { "mark unread" },
            request.user,
            selected,
            updated
        );

        Ok(MassActionResult {
            selected,
            thread_rows: thread_rows.len(),
            updated,
        })
    }
}

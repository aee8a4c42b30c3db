//! Mailbox association between an email and its owner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EmailId, EmailUserId, FolderId, MailboxId, OrganizationId, UserId};

/// Placement of one email in one owner's folder
///
/// The same `(email, owner, organization)` triple appears once per folder
/// the email is filed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailUser {
    pub id: EmailUserId,
    pub email: EmailId,
    pub owner: UserId,
    pub organization: OrganizationId,
    pub folder: FolderId,
    /// Set only for rows that live in a shared mailbox
    pub mailbox_owner: Option<MailboxId>,
    pub seen: bool,
    pub received_at: DateTime<Utc>,
}

/// An association row that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmailUser {
    pub email: EmailId,
    pub owner: UserId,
    pub organization: OrganizationId,
    pub folder: FolderId,
    pub mailbox_owner: Option<MailboxId>,
    pub seen: bool,
    pub received_at: DateTime<Utc>,
}

impl NewEmailUser {
    pub fn new(
        email: EmailId,
        owner: UserId,
        organization: OrganizationId,
        folder: FolderId,
    ) -> Self {
        Self {
            email,
            owner,
            organization,
            folder,
            mailbox_owner: None,
            seen: false,
            received_at: Utc::now(),
        }
    }

    pub fn seen(mut self, seen: bool) -> Self {
        self.seen = seen;
        self
    }

    pub fn mailbox_owner(mut self, mailbox: MailboxId) -> Self {
        self.mailbox_owner = Some(mailbox);
        self
    }

    pub fn received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// Attach the id assigned by the store
    pub fn into_stored(self, id: EmailUserId) -> EmailUser {
        EmailUser {
            id,
            email: self.email,
            owner: self.owner,
            organization: self.organization,
            folder: self.folder,
            mailbox_owner: self.mailbox_owner,
            seen: self.seen,
            received_at: self.received_at,
        }
    }
}

/// Seen-state filter for mailbox listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeenFilter {
    #[default]
    Any,
    SeenOnly,
    UnseenOnly,
}

impl SeenFilter {
    /// The `seen` value rows must have, or `None` when unfiltered
    pub fn required(self) -> Option<bool> {
        match self {
            SeenFilter::Any => None,
            SeenFilter::SeenOnly => Some(true),
            SeenFilter::UnseenOnly => Some(false),
        }
    }
}

impl From<Option<bool>> for SeenFilter {
    fn from(seen: Option<bool>) -> Self {
        match seen {
            None => SeenFilter::Any,
            Some(true) => SeenFilter::SeenOnly,
            Some(false) => SeenFilter::UnseenOnly,
        }
    }
}

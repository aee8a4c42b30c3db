//! Folder and origin models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{FolderId, OriginId};
use crate::error::MailboxError;

/// Kind of a mail folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    Inbox,
    Sent,
    Drafts,
    Trash,
    Spam,
    Other,
}

impl FolderType {
    pub const ALL: [FolderType; 6] = [
        FolderType::Inbox,
        FolderType::Sent,
        FolderType::Drafts,
        FolderType::Trash,
        FolderType::Spam,
        FolderType::Other,
    ];

    /// Name stored in the `type` column
    pub fn as_str(self) -> &'static str {
        match self {
            FolderType::Inbox => "inbox",
            FolderType::Sent => "sent",
            FolderType::Drafts => "drafts",
            FolderType::Trash => "trash",
            FolderType::Spam => "spam",
            FolderType::Other => "other",
        }
    }
}

impl fmt::Display for FolderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolderType {
    type Err = MailboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| MailboxError::UnknownFolderType(s.to_string()))
    }
}

/// A mail account or other message source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailOrigin {
    pub id: OriginId,
    pub name: String,
    /// Folders of inactive origins are hidden from mailbox listings
    pub is_active: bool,
}

impl EmailOrigin {
    pub fn new(id: OriginId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// A folder inside an origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailFolder {
    pub id: FolderId,
    pub origin: OriginId,
    /// Short display name (e.g. "Inbox")
    pub name: String,
    /// Full path on the server (e.g. "INBOX/Projects")
    pub full_name: String,
    pub folder_type: FolderType,
}

impl EmailFolder {
    pub fn new(
        id: FolderId,
        origin: OriginId,
        folder_type: FolderType,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            origin,
            full_name: name.clone(),
            name,
            folder_type,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }
}

//! Filter predicates over `email_user` rows

use crate::models::{
    Email, EmailFolder, EmailId, EmailOrigin, EmailUser, EmailUserId, FolderId, FolderType,
    OrganizationId, ThreadId, UserId,
};

/// Related record a predicate needs joined to the association row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Join {
    None,
    Folder,
    /// Origin is reached through the folder, so it implies `Folder`
    Origin,
    Email,
}

/// A single condition on an association row
///
/// All predicates of a query are AND-ed together. List predicates follow SQL
/// `IN` semantics: an empty `Ids` list matches nothing, an empty
/// `ExcludeIds` list excludes nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Ids(Vec<EmailUserId>),
    ExcludeIds(Vec<EmailUserId>),
    Owner(UserId),
    Organization(OrganizationId),
    Email(EmailId),
    Folder(FolderId),
    FolderTypes(Vec<FolderType>),
    OriginActive(bool),
    Seen(bool),
    HasMailboxOwner,
    Head(bool),
    Threads(Vec<ThreadId>),
    MessageIds(Vec<String>),
}

impl Predicate {
    pub fn join(&self) -> Join {
        match self {
            Predicate::FolderTypes(_) => Join::Folder,
            Predicate::OriginActive(_) => Join::Origin,
            Predicate::Head(_) | Predicate::Threads(_) | Predicate::MessageIds(_) => Join::Email,
            _ => Join::None,
        }
    }

    /// Evaluate against a row and its joined records
    pub fn matches(&self, view: &EmailUserView<'_>) -> bool {
        let row = view.row;
        match self {
            Predicate::Ids(ids) => ids.contains(&row.id),
            Predicate::ExcludeIds(ids) => !ids.contains(&row.id),
            Predicate::Owner(owner) => row.owner == *owner,
            Predicate::Organization(org) => row.organization == *org,
            Predicate::Email(email) => row.email == *email,
            Predicate::Folder(folder) => row.folder == *folder,
            Predicate::FolderTypes(types) => view
                .folder
                .is_some_and(|f| types.contains(&f.folder_type)),
            Predicate::OriginActive(active) => view
                .folder
                .and(view.origin)
                .is_some_and(|o| o.is_active == *active),
            Predicate::Seen(seen) => row.seen == *seen,
            Predicate::HasMailboxOwner => row.mailbox_owner.is_some(),
            Predicate::Head(head) => view.email.is_some_and(|e| e.head == *head),
            Predicate::Threads(threads) => view
                .email
                .and_then(|e| e.thread)
                .is_some_and(|t| threads.contains(&t)),
            Predicate::MessageIds(message_ids) => view
                .email
                .is_some_and(|e| message_ids.iter().any(|m| *m == e.message_id)),
        }
    }
}

/// An association row together with the records it references
///
/// A missing related record behaves like a failed inner join: predicates
/// that need it never match.
#[derive(Debug, Clone, Copy)]
pub struct EmailUserView<'a> {
    pub row: &'a EmailUser,
    pub folder: Option<&'a EmailFolder>,
    pub origin: Option<&'a EmailOrigin>,
    pub email: Option<&'a Email>,
}
